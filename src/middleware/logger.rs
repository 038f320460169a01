use crate::http::Request;
use crate::middleware::{Middleware, MiddlewareResult, Next};
use log::info;
use std::time::Instant;

/// Logs one line per routed request: method, path, status and latency.
pub struct RequestLog;

impl Middleware for RequestLog {
    fn call(&self, req: Request, next: Next) -> MiddlewareResult {
        Box::pin(async move {
            let start = Instant::now();
            let method = req.method;
            let path = req.path.clone();
            let result = next.handle(req).await;
            let status = match &result {
                Ok(response) => response.status,
                Err(err) => err.status_code(),
            };
            info!(
                "{} {} -> {} ({}ms)",
                method,
                path,
                status,
                start.elapsed().as_millis()
            );
            result
        })
    }

    fn clone_box(&self) -> Box<dyn Middleware> {
        Box::new(RequestLog)
    }
}

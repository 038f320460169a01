use crate::error::ServerResult;
use crate::http::Request;
use crate::http::Response;
use futures::future::BoxFuture;
use std::future::Future;

pub type HttpResponse = ServerResult<Response>;

/// Anything a handler body may evaluate to. Lets route closures return a
/// bare `Response`, a `ServerResult<Response>`, or a string literal.
pub trait IntoResponse: Send {
    fn into_response(self) -> HttpResponse;
}

impl IntoResponse for Response {
    fn into_response(self) -> HttpResponse {
        Ok(self)
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> HttpResponse {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> HttpResponse {
        Ok(Response::text(self))
    }
}

impl IntoResponse for String {
    fn into_response(self) -> HttpResponse {
        Ok(Response::text(self))
    }
}

pub trait Handler: Send + Sync + 'static {
    fn handle(&self, req: Request) -> BoxFuture<'static, HttpResponse>;

    fn dyn_clone<'s>(&self) -> Box<dyn Handler + 's>
    where
        Self: 's;
}

impl Clone for Box<dyn Handler> {
    fn clone(&self) -> Box<dyn Handler> {
        self.dyn_clone()
    }
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + 'static,
{
    fn handle(&self, req: Request) -> BoxFuture<'static, HttpResponse> {
        let fut = (self)(req);
        Box::pin(async move { fut.await.into_response() })
    }

    fn dyn_clone<'s>(&self) -> Box<dyn Handler + 's>
    where
        Self: 's,
    {
        Box::new((*self).clone())
    }
}

//! The server entry point.
//!
//! `Server` owns the route table and the accept loop: it binds a TCP
//! listener, parses each incoming request, dispatches it through the router
//! and writes the response back.
//!
//! # Examples
//!
//! ```no_run
//! use hellod::Server;
//!
//! let mut app = Server::new();
//! app.get("/", |_req| async { "Hello World!" });
//! app.listen("127.0.0.1:8080").unwrap();
//! ```

use crate::error::{ServerError, ServerResult};
use crate::handler::{HttpResponse, IntoResponse};
use crate::http::request::parse_request_line;
use crate::http::{Method, Request, Response};
use crate::middleware::Middleware;
use crate::router::{Route, RouteMatch, Router};
use futures::FutureExt;
use log::{debug, error, info, warn};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::runtime::Runtime;

/// The main application struct that represents your web server.
///
/// # Example
///
/// ```no_run
/// use hellod::{Response, Server};
///
/// let mut app = Server::new();
///
/// // Add a route
/// app.get("/", |_req| async { Response::text("Hello World!") });
///
/// // Start the server
/// app.listen("127.0.0.1:8080").unwrap();
/// ```
#[derive(Clone)]
pub struct Server {
    pub max_connections: usize,
    router: Router,
}

impl Server {
    /// Creates a new Server instance
    pub fn new() -> Self {
        Self {
            max_connections: 256,
            router: Router::new(),
        }
    }

    pub fn max_connections(&mut self, max_connections: usize) -> &mut Self {
        self.max_connections = max_connections;
        self
    }

    /// Registers a GET route handler
    ///
    /// # Arguments
    /// * `path` - The URL path to match
    /// * `handler` - The async handler function
    pub fn get<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.router.get(path, handler);
    }

    /// Registers a POST route handler
    pub fn post<F, Fut, R>(&mut self, path: &str, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.router.post(path, handler);
    }

    /// Registers a handler for an arbitrary method
    pub fn route<F, Fut, R>(&mut self, method: Method, path: &str, handler: F)
    where
        F: Fn(Request) -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        self.router.route(method, path, handler);
    }

    /// Adds a middleware that wraps every routed request
    pub fn middleware(&mut self, middleware: impl Middleware + 'static) {
        self.router.middleware(middleware);
    }

    /// Starts the HTTP server and blocks until SIGINT.
    ///
    /// Returns `Ok(())` after a graceful shutdown; startup failures such as
    /// an unavailable port surface as the error.
    ///
    /// # Arguments
    /// * `addr` - Address to listen on (e.g. "127.0.0.1:8080")
    pub fn listen(self, addr: &str) -> ServerResult<()> {
        let runtime = Runtime::new()?;
        runtime.block_on(async {
            let listener = TcpListener::bind(addr).await?;
            self.run(listener, async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    error!("failed to install shutdown signal handler: {}", err);
                }
            })
            .await
        })
    }

    /// The async serve loop: accepts connections from `listener` until the
    /// `shutdown` future resolves, then returns `Ok(())`.
    ///
    /// `listen` drives this with a SIGINT future; tests drive it with a
    /// channel and a port-0 listener.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> ServerResult<()>
    where
        F: Future<Output = ()> + Send,
    {
        info!("listening on http://{}", listener.local_addr()?);
        let connections = Arc::new(AtomicUsize::new(0));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown signal received, stopping");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            warn!("accept failed: {}", err);
                            continue;
                        }
                    };
                    debug!("connection from {}", peer);

                    let app = self.clone();
                    let connections = Arc::clone(&connections);
                    let at_capacity =
                        connections.fetch_add(1, Ordering::Relaxed) >= self.max_connections;
                    tokio::spawn(async move {
                        let result = if at_capacity {
                            app.shed(stream).await
                        } else {
                            app.handle_connection(stream).await
                        };
                        if let Err(err) = result {
                            warn!("connection error: {}", err);
                        }
                        connections.fetch_sub(1, Ordering::Relaxed);
                    });
                }
            }
        }
    }

    /// Serves one request off the stream and writes the response.
    async fn handle_connection<S>(&self, mut stream: S) -> ServerResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut buf_reader = BufReader::new(&mut stream);
        let mut request_line = String::new();
        buf_reader.read_line(&mut request_line).await?;

        // Client connected and went away without sending anything.
        if request_line.trim().is_empty() {
            return Ok(());
        }

        let response = match Self::read_request(&mut buf_reader, &request_line).await {
            Ok(request) => self.dispatch(request).await,
            Err(err) => Response::error(err),
        };
        stream.write_all(&response.into_bytes()).await?;
        Ok(())
    }

    /// Too many open connections: answer 503 without touching the router.
    async fn shed<S>(&self, mut stream: S) -> ServerResult<()>
    where
        S: AsyncWrite + Unpin,
    {
        warn!("connection limit reached, shedding");
        stream
            .write_all(&Response::service_unavailable().into_bytes())
            .await?;
        Ok(())
    }

    async fn read_request<R>(reader: &mut R, request_line: &str) -> ServerResult<Request>
    where
        R: AsyncBufRead + Unpin,
    {
        let (method, path, query) = parse_request_line(request_line)?;

        let mut headers = HashMap::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 || line.trim().is_empty() {
                break;
            }
            if let Some((key, value)) = line.trim().split_once(':') {
                headers.insert(key.trim().to_lowercase(), value.trim().to_string());
            }
        }

        let mut request = Request {
            method,
            path,
            query,
            headers,
            body: Vec::new(),
        };

        // Drain the body so the socket is clean before the response goes out.
        let content_length = request.content_length();
        if content_length > 0 {
            request.body.reserve(content_length);
            let mut take = reader.take(content_length as u64);
            take.read_to_end(&mut request.body).await?;
        }

        Ok(request)
    }

    /// Routes the request, converting handler panics and errors into the
    /// framework's default responses.
    async fn dispatch(&self, req: Request) -> Response {
        let method = req.method;
        let path = req.path.clone();

        let outcome = AssertUnwindSafe(self.handle(req)).catch_unwind().await;
        let result = match outcome {
            Ok(result) => result,
            Err(panic) => Err(ServerError::PanicError(panic_message(panic))),
        };
        let response = match result {
            Ok(response) => response,
            Err(err) => Response::error(err),
        };
        debug!("{} {} -> {}", method, path, response.status);
        response
    }

    async fn handle(&self, req: Request) -> HttpResponse {
        match self.router.lookup(req.method, &req.path) {
            RouteMatch::Found(route) => route.handle(req).await,
            RouteMatch::MethodNotAllowed(allowed) => match req.method {
                Method::HEAD => match self.router.route_for(Method::GET, &req.path) {
                    Some(route) => Self::handle_head(route, req).await,
                    None => Err(ServerError::MethodNotAllowed(allowed)),
                },
                Method::OPTIONS => Ok(Self::handle_options(allowed)),
                _ => Err(ServerError::MethodNotAllowed(allowed)),
            },
            RouteMatch::NotFound => Err(ServerError::NotFound),
        }
    }

    /// HEAD falls back to the GET handler with the body stripped.
    async fn handle_head(route: &Route, mut req: Request) -> HttpResponse {
        req.method = Method::GET;
        let mut response = route.handle(req).await?;
        response.body("");
        Ok(response)
    }

    fn handle_options(allowed: Vec<Method>) -> Response {
        let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
        let mut response = Response::no_content();
        response.header("Allow", allowed.join(", "));
        response
    }
}

impl Default for Server {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_app() -> Server {
        let mut app = Server::new();
        app.get("/", |_req| async { "Hello World!" });
        app
    }

    /// Feeds a raw request through an in-memory stream and returns the raw
    /// response.
    async fn roundtrip(app: &Server, raw: &str) -> String {
        let (mut client, server_side) = tokio::io::duplex(4096);
        client.write_all(raw.as_bytes()).await.unwrap();
        app.handle_connection(server_side).await.unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).await.unwrap();
        response
    }

    fn body_of(response: &str) -> &str {
        response.split("\r\n\r\n").nth(1).unwrap_or("")
    }

    #[tokio::test]
    async fn get_root_says_hello() {
        let response = roundtrip(&hello_app(), "GET / HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(response.contains("Content-Type: text/plain\r\n"));
        assert_eq!(body_of(&response), "Hello World!");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let response = roundtrip(&hello_app(), "GET /foo HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    }

    #[tokio::test]
    async fn wrong_method_is_405_with_allow() {
        let response = roundtrip(&hello_app(), "POST / HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(response.contains("Allow: GET\r\n"));
    }

    #[tokio::test]
    async fn head_reuses_get_without_a_body() {
        let response = roundtrip(&hello_app(), "HEAD / HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(body_of(&response), "");
    }

    #[tokio::test]
    async fn options_reports_allowed_methods() {
        let response = roundtrip(&hello_app(), "OPTIONS / HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 204 No Content\r\n"));
        assert!(response.contains("Allow: GET\r\n"));
    }

    #[tokio::test]
    async fn garbage_request_line_is_400() {
        let response = roundtrip(&hello_app(), "BREW / HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    #[tokio::test]
    async fn handler_panics_become_500() {
        async fn boom(_req: Request) -> Response {
            panic!("kaboom")
        }
        let mut app = Server::new();
        app.get("/boom", boom);
        let response = roundtrip(&app, "GET /boom HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    }

    #[tokio::test]
    async fn arbitrary_methods_can_be_routed() {
        let mut app = Server::new();
        app.route(Method::PUT, "/state", |_req| async { "stored" });
        let response = roundtrip(&app, "PUT /state HTTP/1.1\r\n\r\n").await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(body_of(&response), "stored");
    }

    #[tokio::test]
    async fn request_body_is_drained_before_responding() {
        let mut app = Server::new();
        app.post("/echo-length", |req: Request| async move {
            format!("{} bytes", req.body.len())
        });
        let raw = "POST /echo-length HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello";
        let response = roundtrip(&app, raw).await;
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(body_of(&response), "5 bytes");
    }
}

//! End-to-end tests: a real listener on a random port, raw TCP requests,
//! and a clean shutdown at the end.

use hellod::middleware::RequestLog;
use hellod::{Server, ServerResult};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    serving: JoinHandle<ServerResult<()>>,
}

impl TestServer {
    async fn start() -> TestServer {
        let mut app = Server::new();
        app.middleware(RequestLog);
        app.get("/", |_req| async { "Hello World!" });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop, shutdown) = oneshot::channel();
        let serving = tokio::spawn(app.run(listener, async {
            let _ = shutdown.await;
        }));

        TestServer {
            addr,
            stop,
            serving,
        }
    }

    async fn request(&self, raw: &str) -> String {
        let mut stream = TcpStream::connect(self.addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();

        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    async fn stop(self) -> ServerResult<()> {
        self.stop.send(()).unwrap();
        self.serving.await.unwrap()
    }
}

fn status_line(response: &str) -> &str {
    response.lines().next().unwrap_or("")
}

fn body(response: &str) -> &str {
    response.split("\r\n\r\n").nth(1).unwrap_or("")
}

#[tokio::test]
async fn get_root_returns_hello_world() {
    let server = TestServer::start().await;
    let response = server.request("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");
    assert_eq!(body(&response), "Hello World!");
    assert!(response.contains("Content-Type: text/plain\r\n"));
    assert!(response.contains("Content-Length: 12\r\n"));
}

#[tokio::test]
async fn any_other_path_is_not_found() {
    let server = TestServer::start().await;
    let response = server.request("GET /foo HTTP/1.1\r\nHost: localhost\r\n\r\n").await;

    assert_eq!(status_line(&response), "HTTP/1.1 404 Not Found");
}

#[tokio::test]
async fn non_get_on_root_is_method_not_allowed() {
    let server = TestServer::start().await;
    let response = server
        .request("POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n")
        .await;

    assert_eq!(status_line(&response), "HTTP/1.1 405 Method Not Allowed");
    assert!(response.contains("Allow: GET\r\n"));
}

#[tokio::test]
async fn repeated_gets_are_identical() {
    let server = TestServer::start().await;

    let mut seen = Vec::new();
    for _ in 0..5 {
        let response = server.request("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
        seen.push((status_line(&response).to_string(), body(&response).to_string()));
    }

    for observation in &seen {
        assert_eq!(
            observation,
            &("HTTP/1.1 200 OK".to_string(), "Hello World!".to_string())
        );
    }
}

#[tokio::test]
async fn connections_beyond_the_limit_are_shed() {
    let mut app = Server::new();
    app.max_connections(0);
    app.get("/", |_req| async { "Hello World!" });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (_stop, shutdown) = oneshot::channel::<()>();
    tokio::spawn(app.run(listener, async {
        let _ = shutdown.await;
    }));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    stream.shutdown().await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert_eq!(status_line(&response), "HTTP/1.1 503 Service Unavailable");
}

#[tokio::test]
async fn server_stops_cleanly_on_shutdown() {
    let server = TestServer::start().await;
    let response = server.request("GET / HTTP/1.1\r\nHost: localhost\r\n\r\n").await;
    assert_eq!(status_line(&response), "HTTP/1.1 200 OK");

    let result = server.stop().await;
    assert!(result.is_ok());
}

//! # hellod
//!
//! A tiny HTTP service that answers `GET /` with `Hello World!`, built on a
//! small embedded server: exact-path routing, async handlers, middleware and
//! graceful shutdown.
//!
//! ## Quick Start
//!
//! ```no_run
//! use hellod::Server;
//!
//! fn main() {
//!     let mut app = Server::new();
//!
//!     // Add the one route this service exists for
//!     app.get("/", |_req| async { "Hello World!" });
//!
//!     // Start the server
//!     app.listen("127.0.0.1:8080").unwrap();
//! }
//! ```
//!
//! Requests that match no route get the framework's default `404`; a known
//! path with the wrong method gets a `405` with an `Allow` header.

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod middleware;
pub mod router;

pub use app::Server;
pub use config::Config;
pub use error::{ServerError, ServerResult};
pub use http::{Method, Request, Response};
pub use router::Router;

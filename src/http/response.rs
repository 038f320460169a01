use crate::error::ServerError;
use crate::http::Method;
use serde::Serialize;
use std::collections::HashMap;
use std::time::SystemTime;

const SERVER_TOKEN: &str = concat!("hellod/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub struct Response {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl Response {
    pub fn new(status: u16) -> Response {
        Response {
            status,
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    // Chainable status setter
    pub fn status(&mut self, status: u16) -> &mut Self {
        self.status = status;
        self
    }

    // Generic body setter
    pub fn body<T: AsRef<str>>(&mut self, body: T) -> &mut Self {
        self.body = body.as_ref().to_string();
        self
    }

    // Generic header setter
    pub fn header<K: AsRef<str>, V: AsRef<str>>(&mut self, name: K, value: V) -> &mut Self {
        self.headers
            .insert(name.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<&mut Self, ServerError> {
        let json_string = serde_json::to_string(value)
            .map_err(|e| ServerError::InternalError(format!("JSON serialization error: {}", e)))?;
        self.header("Content-Type", "application/json");
        self.body(json_string);
        Ok(self)
    }

    pub fn ok<T: Serialize>(data: &T) -> Result<Response, ServerError> {
        let mut response = Response::new(200);
        response.json(data)?;
        Ok(response)
    }

    pub fn no_content() -> Response {
        Response::new(204)
    }

    pub fn text<T: AsRef<str>>(content: T) -> Response {
        let mut response = Response::new(200);
        response.header("Content-Type", "text/plain").body(content);
        response
    }

    pub fn html<T: AsRef<str>>(content: T) -> Response {
        let mut response = Response::new(200);
        response.header("Content-Type", "text/html").body(content);
        response
    }

    pub fn method_not_allowed(allowed: &[Method]) -> Response {
        let allowed: Vec<&str> = allowed.iter().map(Method::as_str).collect();
        let mut response = Response::new(405);
        response.header("Allow", allowed.join(", "));
        response.header("Content-Type", "application/json");
        response.body(
            serde_json::json!({
                "error": {
                    "message": "Method not allowed",
                    "allowed_methods": allowed
                }
            })
            .to_string(),
        );
        response
    }

    pub fn service_unavailable() -> Response {
        Response::error(ServerError::Overloaded)
    }

    /// The default error rendering for everything the application does not
    /// handle itself.
    pub fn error(err: ServerError) -> Response {
        if let Some(allowed) = err.allowed_methods() {
            return Response::method_not_allowed(allowed);
        }
        let status = err.status_code();
        let mut response = Response::new(status);
        response.header("Content-Type", "application/json");
        response.body(
            serde_json::json!({
                "error": {
                    "message": err.to_string(),
                    "status": status
                }
            })
            .to_string(),
        );
        response
    }

    /// Serializes the response for the wire, filling in the standard
    /// `Content-Length`, `Date` and `Server` headers when absent.
    pub(crate) fn into_bytes(mut self) -> Vec<u8> {
        if !self.headers.contains_key("Content-Length") {
            let length = self.body.len().to_string();
            self.header("Content-Length", length);
        }
        if !self.headers.contains_key("Date") {
            let date = httpdate::fmt_http_date(SystemTime::now());
            self.header("Date", date);
        }
        if !self.headers.contains_key("Server") {
            self.header("Server", SERVER_TOKEN);
        }

        let mut wire = format!("HTTP/1.1 {} {}\r\n", self.status, reason_phrase(self.status));
        for (name, value) in &self.headers {
            wire += &format!("{}: {}\r\n", name, value);
        }
        wire += "\r\n";
        wire += &self.body;
        wire.into_bytes()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

use crate::http::Method;
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum ServerError {
    IoError(io::Error),
    BadRequest(String),
    NotFound,
    MethodNotAllowed(Vec<Method>),
    ConfigError(String),
    InternalError(String),
    PanicError(String),
    Overloaded,
}

impl ServerError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::BadRequest(_) => 400,
            ServerError::NotFound => 404,
            ServerError::MethodNotAllowed(_) => 405,
            ServerError::Overloaded => 503,
            ServerError::IoError(_)
            | ServerError::ConfigError(_)
            | ServerError::InternalError(_)
            | ServerError::PanicError(_) => 500,
        }
    }

    /// Methods a client may use on the requested path, when known.
    pub fn allowed_methods(&self) -> Option<&[Method]> {
        match self {
            ServerError::MethodNotAllowed(allowed) => Some(allowed),
            _ => None,
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::IoError(err) => write!(f, "IO error: {}", err),
            ServerError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ServerError::NotFound => write!(f, "Not found"),
            ServerError::MethodNotAllowed(_) => write!(f, "Method not allowed"),
            ServerError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ServerError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ServerError::PanicError(msg) => write!(f, "Panic: {}", msg),
            ServerError::Overloaded => write!(f, "Server overloaded"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerError {
    fn from(err: io::Error) -> Self {
        ServerError::IoError(err)
    }
}

pub type ServerResult<T> = Result<T, ServerError>;

//! Listener configuration, read from the environment.
//!
//! The service has no CLI surface: where it listens is controlled by the
//! `HOST` and `PORT` variables, falling back to `127.0.0.1:8080`.

use crate::error::{ServerError, ServerResult};
use std::env;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> ServerResult<Config> {
        Self::from_vars(env::var("HOST").ok(), env::var("PORT").ok())
    }

    fn from_vars(host: Option<String>, port: Option<String>) -> ServerResult<Config> {
        let host = host.unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match port {
            Some(raw) => raw.parse::<u16>().map_err(|_| {
                ServerError::ConfigError(format!("PORT must be a port number, got {:?}", raw))
            })?,
            None => DEFAULT_PORT,
        };
        Ok(Config { host, port })
    }

    /// The bind address, `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

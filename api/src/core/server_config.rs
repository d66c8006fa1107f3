//! Listener and CORS settings for the HTTP surface.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use llm_service::{
    ConfigError,
    error_handler::env_or,
};

pub const DEFAULT_ADDRESS: &str = "0.0.0.0:8000";
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Where to listen and which browser origin may call the relay.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: SocketAddr,
    pub cors_origin: HeaderValue,
}

impl ServerConfig {
    /// Load from `API_ADDRESS` and `CORS_ALLOW_ORIGIN` through `get`.
    pub fn from_vars<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = env_or(&get, "API_ADDRESS", DEFAULT_ADDRESS)
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidFormat {
                var: "API_ADDRESS",
                reason: "expected host:port, e.g. 0.0.0.0:8000",
            })?;

        // Browsers send the origin without a trailing slash.
        let origin = env_or(&get, "CORS_ALLOW_ORIGIN", DEFAULT_CORS_ORIGIN);
        let cors_origin = HeaderValue::from_str(origin.trim().trim_end_matches('/')).map_err(|_| {
            ConfigError::InvalidFormat {
                var: "CORS_ALLOW_ORIGIN",
                reason: "must be a valid header value",
            }
        })?;

        Ok(Self {
            address,
            cors_origin,
        })
    }
}

//! Unified error handling for `llm-service`.
//!
//! This module exposes a single top-level error type [`LlmServiceError`] for
//! construction-time failures, plus two domain enums:
//!
//! - [`ConfigError`] — environment/config problems detected at startup.
//! - [`RelayError`]  — per-request upstream failures (unreachable upstream,
//!   non-2xx status, malformed JSON, unexpected envelope shape).
//!
//! Small helpers for reading/validating environment values are provided. They
//! take a variable lookup function so that callers can feed them either the
//! process environment or a fixed map.

pub use reqwest::StatusCode;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for service construction.
pub type Result<T> = std::result::Result<T, LlmServiceError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for building the chat-completion service.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LlmServiceError {
    /// Configuration/validation errors (startup).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The shared HTTP client could not be built.
    #[error("[LLM Service] failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A number failed to parse (timeouts, ports).
    #[error("[LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `LLM_TIMEOUT_SECS`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u64`).
        reason: &'static str,
    },

    /// Value had the wrong format (e.g., invalid URL or socket address).
    #[error("[LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `LLM_API_URL`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },
}

/* ------------------------------------------------------------------------- */
/* Relay errors                                                              */
/* ------------------------------------------------------------------------- */

/// Failure of a single upstream round trip.
///
/// Every variant is terminal for the request that produced it: nothing here
/// is retried. The `Display` strings are the messages returned to callers.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Connection refused, DNS failure, timeout, or the body could not be read.
    #[error("Error sending request: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// Upstream answered with a non-2xx status.
    #[error("API returned non-200 status: {status}\nBody: {body}")]
    UpstreamError {
        /// Status returned by the upstream API.
        status: StatusCode,
        /// Raw response body, unmodified.
        body: String,
    },

    /// Upstream 2xx body is not a JSON object.
    #[error("Error parsing JSON response: {0}")]
    MalformedUpstreamJson(#[source] serde_json::Error),

    /// Upstream JSON lacks `choices[0].message.content` as a string.
    #[error("Unexpected response structure from API")]
    UnexpectedUpstreamShape,
}

impl RelayError {
    /// Stable, machine-readable kind used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RelayError::UpstreamUnreachable(_) => "UpstreamUnreachable",
            RelayError::UpstreamError { .. } => "UpstreamError",
            RelayError::MalformedUpstreamJson(_) => "MalformedUpstreamJSON",
            RelayError::UnexpectedUpstreamShape => "UnexpectedUpstreamShape",
        }
    }
}

/* ------------------------------------------------------------------------- */
/* Env helpers                                                               */
/* ------------------------------------------------------------------------- */

/// Reads a non-empty variable through `get`, falling back to `default`.
pub fn env_or<F>(get: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    get(name)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Reads an optional, non-empty variable through `get`.
pub fn env_opt<F>(get: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(name).filter(|v| !v.trim().is_empty())
}

/// Parses an optional `u64` (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a
/// valid `u64`.
pub fn env_opt_u64<F>(get: &F, name: &'static str) -> std::result::Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match env_opt(get, name) {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            }),
        None => Ok(None),
    }
}

/* ------------------------------------------------------------------------- */
/* Validation helpers                                                        */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> std::result::Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        })
    }
}

/// Trims a response body for single-line log output.
pub fn make_snippet(body: &str) -> String {
    const MAX: usize = 512;
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}…", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

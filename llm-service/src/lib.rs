//! Upstream side of the ask relay.
//!
//! - [`config`] — the fixed chat-completion config and its env overrides.
//! - [`services`] — the HTTP client that sends one completion request per
//!   question and extracts the answer from the response envelope.
//! - [`error_handler`] — config and per-request error types.
//! - [`telemetry`] — the tracing layer shared by the relay's crates.

pub mod config;
pub mod error_handler;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use error_handler::{ConfigError, LlmServiceError, RelayError};
pub use services::chat_completion_service::ChatCompletionService;

//! Default chat-completion config and its environment overrides.
//!
//! The relay talks to a single upstream model with fixed sampling. Only the
//! deployment-specific parts (credential, URL, model id, timeout) come from
//! the environment; everything else is a constant of the relay.
//!
//! # Environment variables
//!
//! - `NVIDIA_API_KEY`   = bearer credential (optional, see below)
//! - `LLM_API_URL`      = chat-completions URL (default: NVIDIA NIM)
//! - `LLM_MODEL`        = model id (default: `meta/llama3-70b-instruct`)
//! - `LLM_TIMEOUT_SECS` = optional upstream timeout in seconds
//!
//! A missing credential is not an error here: the upstream rejects the call
//! and the relay reports that as an upstream error.

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{ConfigError, env_opt, env_opt_u64, env_or, validate_http_endpoint},
};

/// NVIDIA NIM chat-completions endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://integrate.api.nvidia.com/v1/chat/completions";

/// Default 70B instruction-tuned model.
pub const DEFAULT_MODEL: &str = "meta/llama3-70b-instruct";

/// Fixed system instruction for every conversation.
pub const SYSTEM_PROMPT: &str = "You are an AI that provides direct answers to coding questions.";

pub const TEMPERATURE: f32 = 0.5;
pub const TOP_P: f32 = 1.0;
pub const MAX_TOKENS: u32 = 1024;

/// Returns the relay's built-in config with no credential and no timeout.
pub fn default_chat_config() -> LlmModelConfig {
    LlmModelConfig {
        model: DEFAULT_MODEL.to_string(),
        endpoint: DEFAULT_ENDPOINT.to_string(),
        api_key: None,
        system_prompt: SYSTEM_PROMPT.to_string(),
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
        top_p: TOP_P,
        timeout_secs: None,
    }
}

/// Builds the config from a variable lookup (usually `std::env::var`).
///
/// # Errors
///
/// - [`ConfigError::InvalidFormat`] if `LLM_API_URL` is not http/https
/// - [`ConfigError::InvalidNumber`] if `LLM_TIMEOUT_SECS` is not a `u64`
pub fn config_from_vars<F>(get: F) -> Result<LlmModelConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let endpoint = env_or(&get, "LLM_API_URL", DEFAULT_ENDPOINT);
    validate_http_endpoint("LLM_API_URL", &endpoint)?;

    let model = env_or(&get, "LLM_MODEL", DEFAULT_MODEL);
    let timeout_secs = env_opt_u64(&get, "LLM_TIMEOUT_SECS")?;
    if timeout_secs == Some(0) {
        return Err(ConfigError::InvalidNumber {
            var: "LLM_TIMEOUT_SECS",
            reason: "must be greater than zero",
        });
    }

    Ok(LlmModelConfig {
        model,
        endpoint,
        api_key: env_opt(&get, "NVIDIA_API_KEY"),
        timeout_secs,
        ..default_chat_config()
    })
}

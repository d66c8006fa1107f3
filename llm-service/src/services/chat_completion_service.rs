//! Chat-completion client used by the relay.
//!
//! Minimal, non-streaming client around an OpenAI-compatible
//! `/chat/completions` endpoint (NVIDIA NIM by default). The URL in
//! `LlmModelConfig::endpoint` is used as-is.
//!
//! Constructor validation:
//! - `cfg.endpoint` must start with http:// or https://
//! - `cfg.api_key`, when present, must be a valid header value
//!
//! Each [`ChatCompletionService::ask`] issues exactly one POST. Nothing is
//! retried and nothing is cached.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::header;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::{
    config::llm_model_config::LlmModelConfig,
    error_handler::{ConfigError, LlmServiceError, RelayError, make_snippet, validate_http_endpoint},
    services::envelope::extract_answer,
};

/// Thin client for the upstream chat-completion API.
///
/// Constructed once from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (default headers, optional timeout) that
/// is shared by all clones of the service.
#[derive(Debug, Clone)]
pub struct ChatCompletionService {
    client: reqwest::Client,
    cfg: Arc<LlmModelConfig>,
}

impl ChatCompletionService {
    /// Creates a new [`ChatCompletionService`] from the given config.
    ///
    /// # Errors
    /// - [`LlmServiceError::Config`] if the endpoint or API key is unusable
    /// - [`LlmServiceError::HttpClient`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmServiceError> {
        validate_http_endpoint("LLM_API_URL", cfg.endpoint.trim())?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if let Some(key) = cfg.api_key.as_deref() {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {key}")).map_err(|_| {
                ConfigError::InvalidFormat {
                    var: "NVIDIA_API_KEY",
                    reason: "must be a valid HTTP header value",
                }
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(secs) = cfg.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = ?cfg.timeout_secs,
            has_api_key = cfg.api_key.is_some(),
            "ChatCompletionService initialized"
        );

        Ok(Self {
            client,
            cfg: Arc::new(cfg),
        })
    }

    /// Read-only view of the config this service was built with.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Sends `question` upstream and returns the first choice's content.
    ///
    /// `question` is forwarded verbatim as the user message.
    ///
    /// # Errors
    /// - [`RelayError::UpstreamUnreachable`] for client/network failures
    /// - [`RelayError::UpstreamError`] for non-2xx responses
    /// - [`RelayError::MalformedUpstreamJson`] / [`RelayError::UnexpectedUpstreamShape`]
    ///   if the 2xx body cannot be read as a completion envelope
    pub async fn ask(&self, question: &str) -> Result<String, RelayError> {
        let body = self.invoke(question).await?;
        extract_answer(&body)
    }

    /// Performs the single POST and returns the raw 2xx body.
    async fn invoke(&self, question: &str) -> Result<String, RelayError> {
        let started = Instant::now();
        let payload = ChatCompletionRequest::from_cfg(&self.cfg, question);

        debug!(
            model = %self.cfg.model,
            payload = %serde_json::to_string(&payload).unwrap_or_default(),
            "POST {}", self.cfg.endpoint
        );

        let resp = self
            .client
            .post(&self.cfg.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = %e,
                    endpoint = %self.cfg.endpoint,
                    latency_ms = started.elapsed().as_millis(),
                    "upstream request failed"
                );
                RelayError::UpstreamUnreachable(e)
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            error!(
                error = %e,
                %status,
                latency_ms = started.elapsed().as_millis(),
                "failed to read upstream response body"
            );
            RelayError::UpstreamUnreachable(e)
        })?;

        info!(
            %status,
            latency_ms = started.elapsed().as_millis(),
            body = %make_snippet(&body),
            "upstream responded"
        );

        if !status.is_success() {
            error!(
                %status,
                model = %self.cfg.model,
                endpoint = %self.cfg.endpoint,
                "upstream returned non-success status"
            );
            return Err(RelayError::UpstreamError { status, body });
        }

        Ok(body)
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

/// Request body for `/chat/completions` (non-streaming).
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    top_p: f32,
    max_tokens: u32,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Builds the fixed system + user conversation for `question`.
    pub(crate) fn from_cfg(cfg: &'a LlmModelConfig, question: &'a str) -> Self {
        Self {
            model: &cfg.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &cfg.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

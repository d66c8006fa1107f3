/// Configuration for the upstream chat-completion invocation.
///
/// Built once at startup (see [`crate::config::default_config`]) and shared
/// read-only by every request afterwards. Sampling values are fixed by the
/// relay and are never taken from callers.
///
/// # Fields
///
/// - `model`: Model identifier sent with every request (e.g. `"meta/llama3-70b-instruct"`).
/// - `endpoint`: Full chat-completions URL of the upstream API.
/// - `api_key`: Bearer credential; `None` sends the request unauthenticated.
/// - `system_prompt`: Fixed system instruction placed before the user message.
/// - `max_tokens`: Maximum number of tokens to generate.
/// - `temperature`: Sampling temperature.
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout; `None` keeps the transport default.
///
/// # Examples
///
/// ```
/// use llm_service::config::{default_config::default_chat_config, llm_model_config::LlmModelConfig};
///
/// let cfg = LlmModelConfig {
///     endpoint: "http://127.0.0.1:9000/v1/chat/completions".to_string(),
///     api_key: Some("nvapi-...".to_string()),
///     ..default_chat_config()
/// };
/// assert_eq!(cfg.max_tokens, 1024);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// Model identifier string.
    pub model: String,

    /// Chat-completions URL (must be http or https).
    pub endpoint: String,

    /// Optional bearer credential.
    pub api_key: Option<String>,

    /// System instruction sent as the first message.
    pub system_prompt: String,

    /// Maximum number of tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Nucleus sampling parameter.
    pub top_p: f32,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

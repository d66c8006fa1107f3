use llm_service::ChatCompletionService;

/// Shared state for all HTTP handlers.
///
/// Built once at startup and never mutated; handlers only read from it.
#[derive(Clone)]
pub struct AppState {
    /// Upstream chat-completion client (one shared HTTP connection pool).
    pub relay: ChatCompletionService,
}

impl AppState {
    pub fn new(relay: ChatCompletionService) -> Self {
        Self { relay }
    }
}

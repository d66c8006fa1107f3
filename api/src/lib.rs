use std::sync::Arc;

mod core;
mod error_handler;
mod middleware_layer;
mod routes;

use axum::{Router, extract::DefaultBodyLimit, routing::post};
use llm_service::{ChatCompletionService, config::default_config::config_from_vars};
use tokio::signal;
use tracing::{error, info, warn};

use crate::{
    middleware_layer::{access_log::access_log_layer, cors::cors_layer},
    routes::{
        chat::chat_route::chat,
        not_found_route::{method_not_allowed, not_found},
    },
};

pub use crate::core::{app_state::AppState, server_config::ServerConfig};
pub use crate::error_handler::{AppError, AppResult};
pub use crate::routes::chat::chat_request::{ChatResponse, parse_question};

/// Builds the relay router: `POST /chat/` plus JSON 404/405 fallbacks,
/// wrapped in CORS and access logging.
///
/// Question length is not capped, so axum's default body limit is lifted.
pub fn build_app(state: Arc<AppState>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/chat/", post(chat))
        .route("/chat", post(chat))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::disable())
        .layer(cors_layer(server.cors_origin.clone()))
        .layer(access_log_layer())
        .with_state(state)
}

/// Loads both configs from the process environment and serves.
pub async fn start_from_env() -> AppResult<()> {
    let (server, relay) = load_from_vars(|name| std::env::var(name).ok())?;
    start(server, relay).await
}

/// Builds the listener config and the upstream client from a variable lookup.
///
/// # Errors
/// - [`AppError::Config`] for unparsable variables
/// - [`AppError::Service`] if the upstream client cannot be built
pub fn load_from_vars<F>(get: F) -> AppResult<(ServerConfig, ChatCompletionService)>
where
    F: Fn(&str) -> Option<String>,
{
    let llm_cfg = config_from_vars(&get)?;
    if llm_cfg.api_key.is_none() {
        warn!("NVIDIA_API_KEY is not set; upstream calls will fail authentication");
    }
    let server = ServerConfig::from_vars(&get)?;
    let relay = ChatCompletionService::new(llm_cfg)?;
    Ok((server, relay))
}

/// Binds `server.address` and serves until Ctrl+C.
pub async fn start(server: ServerConfig, relay: ChatCompletionService) -> AppResult<()> {
    let state = Arc::new(AppState::new(relay));
    let app = build_app(state, &server);

    let listener = tokio::net::TcpListener::bind(server.address)
        .await
        .map_err(AppError::Bind)?;

    info!(
        address = %server.address,
        cors_origin = ?server.cors_origin,
        "relay listening"
    );

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("relay stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        // Without a signal handler the server simply runs until killed.
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

//! POST /chat/ — relays one question to the upstream model.

use std::sync::Arc;

use axum::{Json, body::Bytes, extract::State};
use tracing::info;

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    routes::chat::chat_request::{ChatResponse, parse_question},
};

/// Handler: POST /chat/
///
/// The body is read raw so that malformed JSON and a missing content type
/// both surface as `Invalid request body` rather than an axum rejection.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8000/chat/ \
///   -H 'content-type: application/json' \
///   -d '{"question":"How do I read a file line by line in Rust?"}'
/// ```
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> AppResult<Json<ChatResponse>> {
    info!(body_len = body.len(), "received request for chat");

    let question = parse_question(&body)?;
    let answer = state.relay.ask(&question).await?;

    info!(answer_len = answer.len(), "chat answered");
    Ok(Json(ChatResponse { answer }))
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use llm_service::{ConfigError, LlmServiceError, RelayError};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Service(#[from] LlmServiceError),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("Invalid request body")]
    InvalidBody,

    #[error("Invalid question format or empty question")]
    InvalidQuestion,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    // --- Upstream ---
    #[error(transparent)]
    Relay(#[from] RelayError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::InvalidBody | AppError::InvalidQuestion => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,

            // upstream status passed through
            AppError::Relay(RelayError::UpstreamError { status, .. }) => {
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
            }

            // 5xx
            AppError::Relay(_)
            | AppError::Config(_)
            | AppError::Service(_)
            | AppError::Bind(_)
            | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "Config",
            AppError::Service(_) => "Service",
            AppError::Bind(_) => "Bind",
            AppError::Server(_) => "Server",
            AppError::InvalidBody => "InvalidBody",
            AppError::InvalidQuestion => "InvalidQuestion",
            AppError::NotFound => "NotFound",
            AppError::MethodNotAllowed => "MethodNotAllowed",
            AppError::Relay(e) => e.kind(),
        }
    }
}

/// Body of every failed response. Never carries an `answer`.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(kind = self.kind(), %status, error = %self, "request failed");
        } else {
            warn!(kind = self.kind(), %status, error = %self, "request rejected");
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

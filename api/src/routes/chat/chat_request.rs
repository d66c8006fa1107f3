use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error_handler::AppError;

/// Response payload for /chat/.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Model answer, exactly as returned upstream.
    pub answer: String,
}

/// Pulls the question out of a raw `{"question": "..."}` body.
///
/// The question is returned untouched; blank-only strings are rejected but
/// never trimmed.
///
/// # Errors
/// - [`AppError::InvalidBody`] if the body is not JSON or not a JSON object
/// - [`AppError::InvalidQuestion`] if `question` is missing, not a string, or blank
pub fn parse_question(body: &[u8]) -> Result<String, AppError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        debug!(error = %e, body = %String::from_utf8_lossy(body), "request body is not JSON");
        AppError::InvalidBody
    })?;

    let Value::Object(mut fields) = value else {
        debug!("request body is not a JSON object");
        return Err(AppError::InvalidBody);
    };

    match fields.remove("question") {
        Some(Value::String(question)) if !question.trim().is_empty() => Ok(question),
        other => {
            debug!(question = ?other, "question missing, not a string, or blank");
            Err(AppError::InvalidQuestion)
        }
    }
}

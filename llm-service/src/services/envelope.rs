//! Typed view of the chat-completion response envelope.
//!
//! Only `choices[0].message.content` matters. Later choices are kept as raw
//! JSON and never decoded, so a malformed second choice cannot fail a request
//! whose first choice is fine.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error_handler::{RelayError, make_snippet};

#[derive(Debug, Deserialize)]
struct ChatCompletionEnvelope {
    choices: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Extracts the answer text from a 2xx upstream body.
///
/// # Errors
/// - [`RelayError::MalformedUpstreamJson`] if `body` is not a JSON object
/// - [`RelayError::UnexpectedUpstreamShape`] if `choices` is missing or empty,
///   or `choices[0].message.content` is missing or not a string
pub fn extract_answer(body: &str) -> Result<String, RelayError> {
    let root: Map<String, Value> = serde_json::from_str(body).map_err(|e| {
        error!(
            error = %e,
            body = %make_snippet(body),
            "upstream body is not a JSON object"
        );
        RelayError::MalformedUpstreamJson(e)
    })?;

    let envelope: ChatCompletionEnvelope =
        serde_json::from_value(Value::Object(root)).map_err(|e| unexpected_shape(body, &e))?;

    let first = envelope
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| unexpected_shape(body, &"`choices` is empty"))?;

    let choice: Choice = serde_json::from_value(first).map_err(|e| unexpected_shape(body, &e))?;

    debug!(answer_len = choice.message.content.len(), "answer extracted");
    Ok(choice.message.content)
}

fn unexpected_shape(body: &str, reason: &dyn std::fmt::Display) -> RelayError {
    error!(
        %reason,
        body = %make_snippet(body),
        "expected `choices[0].message.content` in upstream response"
    );
    RelayError::UnexpectedUpstreamShape
}

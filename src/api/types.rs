// API types module
// Response envelopes and the save-request payload

use serde::Serialize;
use serde_json::Value;

use super::error::ApiError;
use crate::store::{Message, NewMessage};

pub const STATUS_OK: &str = "all good";
pub const STATUS_RETRIEVE_FAILED: &str = "failed to retrieve messages from the database";
pub const STATUS_SAVE_FAILED: &str = "failed to save the message to the database";
pub const STATUS_BODY_FAILED: &str = "failed to parse the request body";
pub const STATUS_NOT_FOUND: &str = "no message matches the given id";

/// Decoded request body (JSON object or URL-encoded form)
pub type BodyFields = serde_json::Map<String, Value>;

/// `{ messages, status }`
#[derive(Debug, Serialize)]
pub struct MessagesEnvelope {
    pub messages: Vec<Message>,
    pub status: &'static str,
}

impl MessagesEnvelope {
    pub const fn ok(messages: Vec<Message>) -> Self {
        Self {
            messages,
            status: STATUS_OK,
        }
    }
}

/// `{ message, status }`
#[derive(Debug, Serialize)]
pub struct SavedEnvelope {
    pub message: Message,
    pub status: &'static str,
}

impl SavedEnvelope {
    pub const fn ok(message: Message) -> Self {
        Self {
            message,
            status: STATUS_OK,
        }
    }
}

/// `{ error, status }`
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ApiError,
    pub status: &'static str,
}

/// Build the insert payload for `POST /messages/save`
///
/// Text fields are coerced the way a schema-typed document store would:
/// strings pass through, numbers and booleans are stringified,
/// missing or null fields stay unset, and nested values are rejected.
pub fn new_message_from_body(body: &BodyFields) -> Result<NewMessage, ApiError> {
    Ok(NewMessage {
        name: coerce_text(body, "name")?,
        message: coerce_text(body, "message")?,
    })
}

fn coerce_text(body: &BodyFields, field: &str) -> Result<Option<String>, ApiError> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(ApiError::invalid_input(format!(
            "Cast to string failed for value {other} at path \"{field}\""
        ))),
    }
}

// Message board handlers module

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use std::convert::Infallible;

use super::error::{ApiError, ErrorKind};
use super::types::{
    new_message_from_body, BodyFields, ErrorEnvelope, MessagesEnvelope, SavedEnvelope,
    STATUS_NOT_FOUND, STATUS_RETRIEVE_FAILED, STATUS_SAVE_FAILED,
};
use crate::config::AppState;
use crate::http::json_response;
use crate::logger;
use crate::store::{Message, MessageId};

/// GET /about
#[allow(clippy::unnecessary_wraps)]
pub fn handle_about(state: &AppState) -> Result<Response<Full<Bytes>>, Infallible> {
    Ok(json_response(StatusCode::OK, &state.about))
}

/// GET /messages
pub async fn handle_list(state: &AppState) -> Result<Response<Full<Bytes>>, Infallible> {
    match state.store.find_all().await {
        Ok(messages) => Ok(json_response(
            StatusCode::OK,
            &MessagesEnvelope::ok(messages),
        )),
        Err(e) => Ok(error_response(
            state,
            "GET",
            "/messages",
            ApiError::from(e),
            STATUS_RETRIEVE_FAILED,
        )),
    }
}

/// GET /messages/:messageId
pub async fn handle_get(
    state: &AppState,
    path: &str,
    raw_id: &str,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match find_message(state, raw_id).await {
        Ok(messages) => Ok(json_response(
            StatusCode::OK,
            &MessagesEnvelope::ok(messages),
        )),
        Err(e) => {
            let status = if e.kind == ErrorKind::NotFound {
                STATUS_NOT_FOUND
            } else {
                STATUS_RETRIEVE_FAILED
            };
            Ok(error_response(state, "GET", path, e, status))
        }
    }
}

/// POST /messages/save
pub async fn handle_save(
    state: &AppState,
    body: &BodyFields,
) -> Result<Response<Full<Bytes>>, Infallible> {
    match save_message(state, body).await {
        Ok(message) => Ok(json_response(StatusCode::OK, &SavedEnvelope::ok(message))),
        Err(e) => Ok(error_response(
            state,
            "POST",
            "/messages/save",
            e,
            STATUS_SAVE_FAILED,
        )),
    }
}

async fn find_message(state: &AppState, raw_id: &str) -> Result<Vec<Message>, ApiError> {
    let id = MessageId::parse(raw_id)?;
    let messages = state.store.find_by_id(&id).await?;
    if messages.is_empty() && state.strict_status_codes {
        return Err(ApiError::not_found(format!("No message with id {id}")));
    }
    Ok(messages)
}

async fn save_message(state: &AppState, body: &BodyFields) -> Result<Message, ApiError> {
    let draft = new_message_from_body(body)?;
    Ok(state.store.insert(draft).await?)
}

/// Log a failure and shape its `{ error, status }` envelope
pub fn error_response(
    state: &AppState,
    method: &str,
    path: &str,
    error: ApiError,
    status_text: &'static str,
) -> Response<Full<Bytes>> {
    let status = error.kind.status(state.strict_status_codes);
    logger::log_api_failure(method, path, status.as_u16(), &error.message);
    json_response(
        status,
        &ErrorEnvelope {
            error,
            status: status_text,
        },
    )
}

// API module entry
// Message board REST routes

mod error;
mod handlers;
mod types;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Response};
use std::convert::Infallible;

use crate::config::AppState;
use crate::http;

// Re-export public types
pub use error::{ApiError, ErrorKind};
pub use handlers::error_response;
pub use types::{
    new_message_from_body, BodyFields, ErrorEnvelope, MessagesEnvelope, SavedEnvelope,
    STATUS_BODY_FAILED, STATUS_NOT_FOUND, STATUS_OK, STATUS_RETRIEVE_FAILED, STATUS_SAVE_FAILED,
};

/// API route handler
///
/// Dispatches to handler functions based on request method and path.
/// `HEAD` is routed like `GET`; the caller strips the body.
pub async fn route(
    method: &Method,
    path: &str,
    body: &BodyFields,
    state: &AppState,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = normalize_path(path);
    let read = *method == Method::GET || *method == Method::HEAD;

    match (read, method, path) {
        (true, _, "/about") => handlers::handle_about(state),
        (true, _, "/messages") => handlers::handle_list(state).await,
        (false, &Method::POST, "/messages/save") => handlers::handle_save(state, body).await,
        (true, _, _) => match message_id_param(path) {
            Some(raw_id) => handlers::handle_get(state, path, raw_id).await,
            None => Ok(http::build_404_response(method.as_str(), path)),
        },
        _ => Ok(http::build_404_response(method.as_str(), path)),
    }
}

/// Drop a single trailing slash so `/messages/` matches `/messages`
fn normalize_path(path: &str) -> &str {
    if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    }
}

/// Extract `:messageId` from `/messages/:messageId`
fn message_id_param(path: &str) -> Option<&str> {
    path.strip_prefix("/messages/")
        .filter(|id| !id.is_empty() && !id.contains('/'))
}

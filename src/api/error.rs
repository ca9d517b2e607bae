// API error module
// Typed failure kinds and their HTTP status mapping

use hyper::StatusCode;
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// Failure classification carried by every error envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    StorageUnavailable,
    Unknown,
}

impl ErrorKind {
    /// HTTP status for this kind
    ///
    /// Without `strict` every failure collapses to 400, the wire contract
    /// existing clients depend on.
    pub const fn status(self, strict: bool) -> StatusCode {
        if !strict {
            return StatusCode::BAD_REQUEST;
        }
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Route-level failure
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        let kind = match error {
            StoreError::InvalidId(_) => ErrorKind::InvalidInput,
            StoreError::Unavailable(_) => ErrorKind::StorageUnavailable,
            StoreError::Query(_) => ErrorKind::Unknown,
        };
        Self::new(kind, error.to_string())
    }
}

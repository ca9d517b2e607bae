//! Data access module
//!
//! Defines the persisted document shapes and the `MessageStore` seam that
//! route handlers call. Every implementation is a thin pass-through to its
//! engine: find-all, find-by-id and insert-one, one attempt each.

mod memory;
mod model;
mod mongo;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryStore;
pub use model::{Message, MessageId, NewMessage, User};
pub use mongo::MongoStore;

use crate::config::{DatabaseConfig, StorageBackend};
use crate::logger;

/// Data access failures
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Cast to ObjectId failed for value \"{0}\"")]
    InvalidId(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Storage operation failed: {0}")]
    Query(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(error: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;

        match *error.kind {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
                Self::Unavailable(error.to_string())
            }
            _ => Self::Query(error.to_string()),
        }
    }
}

/// Message persistence operations used by the route layer
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// All messages, in storage order
    async fn find_all(&self) -> Result<Vec<Message>, StoreError>;

    /// Messages whose identifier matches (zero or one)
    async fn find_by_id(&self, id: &MessageId) -> Result<Vec<Message>, StoreError>;

    /// Persist one message and return the stored record
    async fn insert(&self, draft: NewMessage) -> Result<Message, StoreError>;
}

pub type SharedStore = Arc<dyn MessageStore>;

/// Store used when the startup connection could not be established
///
/// The server keeps running; every storage call fails on its own.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MessageStore for UnavailableStore {
    async fn find_all(&self) -> Result<Vec<Message>, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    async fn find_by_id(&self, _id: &MessageId) -> Result<Vec<Message>, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }

    async fn insert(&self, _draft: NewMessage) -> Result<Message, StoreError> {
        Err(StoreError::Unavailable(self.reason.clone()))
    }
}

/// Open the configured store
///
/// Connection failure is logged and never fatal: the returned store answers
/// every call with `StoreError::Unavailable`.
pub async fn connect(config: &DatabaseConfig) -> SharedStore {
    match config.backend {
        StorageBackend::Memory => {
            logger::log_info("[DB] Using in-memory message store");
            Arc::new(MemoryStore::new())
        }
        StorageBackend::Mongodb => {
            let Some(uri) = config.connection_string.as_deref() else {
                let reason = "DB_CONNECTION_STRING is not set";
                logger::log_error(&format!("Failed to connect to MongoDB: {reason}"));
                return Arc::new(UnavailableStore::new(reason));
            };

            match MongoStore::connect(uri, &config.name).await {
                Ok(store) => {
                    store.spawn_ping();
                    Arc::new(store)
                }
                Err(e) => {
                    logger::log_error(&format!("Failed to connect to MongoDB: {e}"));
                    Arc::new(UnavailableStore::new(e.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let store = UnavailableStore::new("connection refused");
        let id = MessageId::generate();

        assert!(matches!(
            store.find_all().await,
            Err(StoreError::Unavailable(ref r)) if r == "connection refused"
        ));
        assert!(matches!(
            store.find_by_id(&id).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.insert(NewMessage::new("Ana", "Hi")).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_without_connection_string_fails_open() {
        let config = DatabaseConfig {
            backend: StorageBackend::Mongodb,
            connection_string: None,
            name: "message_board".to_string(),
        };
        let store = connect(&config).await;
        assert!(matches!(
            store.find_all().await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_connect_with_malformed_uri_fails_open() {
        let config = DatabaseConfig {
            backend: StorageBackend::Mongodb,
            connection_string: Some("not-a-mongodb-uri".to_string()),
            name: "message_board".to_string(),
        };
        let store = connect(&config).await;
        assert!(store.find_all().await.is_err());
    }

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let config = DatabaseConfig {
            backend: StorageBackend::Memory,
            connection_string: None,
            name: "message_board".to_string(),
        };
        let store = connect(&config).await;
        assert!(store.find_all().await.unwrap().is_empty());
    }
}

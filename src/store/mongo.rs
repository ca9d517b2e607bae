// MongoDB message store
// Maps the MessageStore operations onto find / insert_one against the messages collection

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId};
use mongodb::{Client, Collection, Database};
use serde::{Deserialize, Serialize};

use super::{Message, MessageId, MessageStore, NewMessage, StoreError};
use crate::logger;

const MESSAGES_COLLECTION: &str = "messages";

/// Message as stored in the collection
#[derive(Debug, Serialize, Deserialize)]
struct MessageDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(rename = "createdAt")]
    created_at: bson::DateTime,
}

impl From<&Message> for MessageDocument {
    fn from(msg: &Message) -> Self {
        Self {
            id: msg.id.object_id(),
            name: msg.name.clone(),
            message: msg.message.clone(),
            created_at: bson::DateTime::from_millis(msg.created_at.timestamp_millis()),
        }
    }
}

impl From<MessageDocument> for Message {
    fn from(doc: MessageDocument) -> Self {
        let created_at = DateTime::<Utc>::from_timestamp_millis(doc.created_at.timestamp_millis())
            .unwrap_or_default();
        Self {
            id: MessageId::from(doc.id),
            name: doc.name,
            message: doc.message,
            created_at,
        }
    }
}

/// Store backed by a single shared MongoDB client
#[derive(Debug, Clone)]
pub struct MongoStore {
    database: Database,
    messages: Collection<MessageDocument>,
}

impl MongoStore {
    /// Build the client from a connection string
    ///
    /// Only URI parsing and client construction happen here; the driver
    /// connects lazily on the first operation.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let database = client.database(database);
        let messages = database.collection::<MessageDocument>(MESSAGES_COLLECTION);
        Ok(Self { database, messages })
    }

    /// Check connectivity in the background and log the outcome
    pub fn spawn_ping(&self) {
        let database = self.database.clone();
        tokio::spawn(async move {
            match database.run_command(doc! { "ping": 1 }).await {
                Ok(_) => logger::log_info("[DB] Connected to MongoDB"),
                Err(e) => logger::log_error(&format!("Failed to connect to MongoDB: {e}")),
            }
        });
    }

    async fn find_with(&self, filter: bson::Document) -> Result<Vec<Message>, StoreError> {
        let cursor = self.messages.find(filter).await?;
        let documents: Vec<MessageDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(Message::from).collect())
    }
}

#[async_trait]
impl MessageStore for MongoStore {
    async fn find_all(&self) -> Result<Vec<Message>, StoreError> {
        self.find_with(doc! {}).await
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Vec<Message>, StoreError> {
        self.find_with(doc! { "_id": id.object_id() }).await
    }

    async fn insert(&self, draft: NewMessage) -> Result<Message, StoreError> {
        let message = Message::create(draft);
        self.messages
            .insert_one(MessageDocument::from(&message))
            .await?;
        Ok(message)
    }
}

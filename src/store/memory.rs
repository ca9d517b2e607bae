// In-memory message store
// Substitute for the document database in tests and local runs

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Message, MessageId, MessageStore, NewMessage, StoreError};

/// Process-local store keeping messages in insertion order
#[derive(Debug, Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn find_all(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.messages.read().await.clone())
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Vec<Message>, StoreError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().filter(|m| m.id == *id).cloned().collect())
    }

    async fn insert(&self, draft: NewMessage) -> Result<Message, StoreError> {
        let message = Message::create(draft);
        self.messages.write().await.push(message.clone());
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_then_find_by_id() {
        let store = MemoryStore::new();
        let saved = store.insert(NewMessage::new("Ana", "Hi")).await.unwrap();

        let found = store.find_by_id(&saved.id).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("Ana"));
        assert_eq!(found[0].message.as_deref(), Some("Hi"));
    }

    #[tokio::test]
    async fn test_find_by_unknown_id_is_empty() {
        let store = MemoryStore::new();
        store.insert(NewMessage::new("Ana", "Hi")).await.unwrap();

        let found = store.find_by_id(&MessageId::generate()).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_all_keeps_every_insert() {
        let store = MemoryStore::new();
        let mut ids = Vec::new();
        for i in 0..5 {
            let saved = store
                .insert(NewMessage::new(format!("user{i}"), "hello"))
                .await
                .unwrap();
            ids.push(saved.id);
        }

        let all = store.find_all().await.unwrap();
        assert_eq!(all.len(), 5);
        for id in ids {
            assert!(all.iter().any(|m| m.id == id));
        }
    }

    #[tokio::test]
    async fn test_ids_unique_across_inserts() {
        let store = MemoryStore::new();
        let a = store.insert(NewMessage::default()).await.unwrap();
        let b = store.insert(NewMessage::default()).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}

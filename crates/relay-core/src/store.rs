//! In-process conversation state.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::ports::ConversationStore;

#[derive(Debug, Clone)]
struct Entry {
    token: String,
    written_at: Instant,
}

/// Memory-resident [`ConversationStore`] with a size cap and idle expiry.
///
/// When full, writing a new chat evicts the chat whose token was written
/// longest ago. Entries older than the TTL read as absent and are purged on
/// the next write. Nothing survives a restart.
pub struct InMemoryConversationStore {
    entries: RwLock<HashMap<i64, Entry>>,
    capacity: usize,
    ttl: Duration,
}

impl InMemoryConversationStore {
    /// Create a store holding at most `capacity` chats, each for at most `ttl` since its last write.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    fn is_live(&self, entry: &Entry, now: Instant) -> bool {
        self.ttl.is_zero() || now.duration_since(entry.written_at) < self.ttl
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get(&self, chat_id: i64) -> Option<String> {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries
            .get(&chat_id)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| entry.token.clone())
    }

    async fn put(&self, chat_id: i64, token: String) {
        let mut entries = self.entries.write().await;
        let now = Instant::now();

        entries.retain(|_, entry| self.is_live(entry, now));

        if !entries.contains_key(&chat_id) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.written_at)
                .map(|(id, _)| *id);
            if let Some(evicted) = oldest {
                entries.remove(&evicted);
                debug!(chat_id = evicted, "Evicted conversation state (store full)");
            }
        }

        entries.insert(
            chat_id,
            Entry {
                token,
                written_at: now,
            },
        );
    }

    async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        let now = Instant::now();
        entries.values().filter(|e| self.is_live(e, now)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryConversationStore {
        InMemoryConversationStore::new(100, Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn test_get_absent() {
        let store = store();
        assert_eq!(store.get(42).await, None);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_put_then_get_and_overwrite() {
        let store = store();

        store.put(42, "r1".to_string()).await;
        assert_eq!(store.get(42).await.as_deref(), Some("r1"));

        store.put(42, "r2".to_string()).await;
        assert_eq!(store.get(42).await.as_deref(), Some("r2"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_chats_are_independent() {
        let store = store();
        store.put(1, "a".to_string()).await;
        store.put(2, "b".to_string()).await;

        assert_eq!(store.get(1).await.as_deref(), Some("a"));
        assert_eq!(store.get(2).await.as_deref(), Some("b"));
    }

    #[tokio::test]
    async fn test_capacity_evicts_oldest_write() {
        let store = InMemoryConversationStore::new(2, Duration::from_secs(3600));
        store.put(1, "a".to_string()).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        store.put(2, "b".to_string()).await;
        tokio::time::sleep(Duration::from_millis(2)).await;

        // Rewriting an existing chat never evicts.
        store.put(1, "a2".to_string()).await;
        assert_eq!(store.len().await, 2);
        tokio::time::sleep(Duration::from_millis(2)).await;

        store.put(3, "c".to_string()).await;
        assert_eq!(store.len().await, 2);
        assert_eq!(store.get(2).await, None);
        assert_eq!(store.get(1).await.as_deref(), Some("a2"));
        assert_eq!(store.get(3).await.as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = InMemoryConversationStore::new(10, Duration::from_millis(30));
        store.put(1, "a".to_string()).await;
        assert_eq!(store.get(1).await.as_deref(), Some("a"));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(store.get(1).await, None);
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_writes_for_different_chats() {
        let store = std::sync::Arc::new(store());

        let mut handles = Vec::new();
        for chat_id in 0..50i64 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.put(chat_id, format!("resp-{}", chat_id)).await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len().await, 50);
        for chat_id in 0..50i64 {
            assert_eq!(store.get(chat_id).await, Some(format!("resp-{}", chat_id)));
        }
    }
}

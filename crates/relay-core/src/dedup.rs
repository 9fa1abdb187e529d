//! Update de-duplication.
//!
//! Telegram redelivers a webhook update when our response is slow or fails.
//! Without a guard every redelivery would trigger another completion call and
//! another reply.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::ports::UpdateDeduplicator;

/// In-memory update deduplicator (single process only).
pub struct MemoryUpdateDeduplicator {
    ttl: Duration,
    seen: Mutex<HashMap<i64, Instant>>,
}

impl MemoryUpdateDeduplicator {
    /// Remember update ids for `ttl` (at least one millisecond).
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: ttl.max(Duration::from_millis(1)),
            seen: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl UpdateDeduplicator for MemoryUpdateDeduplicator {
    async fn is_duplicate(&self, update_id: i64) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock().await;
        seen.retain(|_, at| now.duration_since(*at) < self.ttl);

        if seen.contains_key(&update_id) {
            debug!(update_id, tracked_ids = seen.len(), "Duplicate update detected");
            return true;
        }

        seen.insert(update_id, now);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_delivery_is_not_duplicate() {
        let dedup = MemoryUpdateDeduplicator::new(Duration::from_secs(60));
        assert!(!dedup.is_duplicate(1).await);
        assert!(!dedup.is_duplicate(2).await);
    }

    #[tokio::test]
    async fn test_redelivery_is_duplicate() {
        let dedup = MemoryUpdateDeduplicator::new(Duration::from_secs(60));
        assert!(!dedup.is_duplicate(7).await);
        assert!(dedup.is_duplicate(7).await);
        assert!(dedup.is_duplicate(7).await);
    }

    #[tokio::test]
    async fn test_window_expires() {
        let dedup = MemoryUpdateDeduplicator::new(Duration::from_millis(30));
        assert!(!dedup.is_duplicate(7).await);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!dedup.is_duplicate(7).await);
    }
}

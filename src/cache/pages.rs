use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::time::{timeout, Duration};
use tracing::warn;

use crate::cache::store::KeyValueStore;
use crate::services::dto::EventDto;

const PAGE_NAMESPACE: &str = "events:page:";

fn page_key(page: u32) -> String {
    format!("{PAGE_NAMESPACE}{page}")
}

/// Read-through, write-invalidate cache over the paginated events feed.
///
/// The cache is a performance optimization, never a correctness dependency:
/// a dead or slow store turns every read into a miss and every invalidation
/// into a logged warning, and the surrounding mutation still succeeds. A
/// successful event write bulk-deletes the whole page namespace, because an
/// insert at the head shifts the contents of every page.
pub struct EventPageCache {
    store: Arc<dyn KeyValueStore>,
    ttl: Duration,
    op_timeout: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EventPageCache {
    pub fn new(store: Arc<dyn KeyValueStore>, ttl: Duration, op_timeout: Duration) -> Self {
        Self {
            store,
            ttl,
            op_timeout,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cached page lookup. `None` means miss, store failure or timeout;
    /// the caller falls through to persistence in all three cases.
    pub async fn get_page(&self, page: u32) -> Option<Vec<EventDto>> {
        let key = page_key(page);
        let raw = match timeout(self.op_timeout, self.store.get(&key)).await {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Ok(Err(err)) => {
                warn!(%key, error = %err, "cache read failed, degrading to persistence");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
            Err(_) => {
                warn!(%key, "cache read timed out, degrading to persistence");
                self.misses.fetch_add(1, Ordering::Relaxed);
                return None;
            }
        };

        match serde_json::from_str::<Vec<EventDto>>(&raw) {
            Ok(events) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(events)
            }
            Err(err) => {
                warn!(%key, error = %err, "cached page failed to deserialize, treating as miss");
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Populate a page without blocking the response path. The write runs
    /// on a detached task; its failure never reaches the request.
    pub fn populate(&self, page: u32, events: &[EventDto]) {
        let raw = match serde_json::to_string(events) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(page, error = %err, "failed to serialize page for caching");
                return;
            }
        };

        let store = Arc::clone(&self.store);
        let ttl = self.ttl;
        let op_timeout = self.op_timeout;
        tokio::spawn(async move {
            Self::write_raw(store.as_ref(), page, raw, ttl, op_timeout).await;
        });
    }

    /// Synchronous variant of [`populate`](Self::populate), used by the
    /// populate task and directly by tests.
    pub async fn write_page(&self, page: u32, events: &[EventDto]) {
        match serde_json::to_string(events) {
            Ok(raw) => {
                Self::write_raw(self.store.as_ref(), page, raw, self.ttl, self.op_timeout).await
            }
            Err(err) => warn!(page, error = %err, "failed to serialize page for caching"),
        }
    }

    async fn write_raw(
        store: &dyn KeyValueStore,
        page: u32,
        raw: String,
        ttl: Duration,
        op_timeout: Duration,
    ) {
        let key = page_key(page);
        match timeout(op_timeout, store.set_with_ttl(&key, raw, ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(%key, error = %err, "cache populate failed"),
            Err(_) => warn!(%key, "cache populate timed out"),
        }
    }

    /// Best-effort bulk delete of every cached page. A failure leaves the
    /// feed stale until TTL expiry, which is the accepted tradeoff.
    pub async fn invalidate_all(&self) {
        match timeout(self.op_timeout, self.store.delete_prefix(PAGE_NAMESPACE)).await {
            Ok(Ok(removed)) => {
                tracing::debug!(removed, "invalidated cached feed pages");
            }
            Ok(Err(err)) => warn!(error = %err, "cache invalidation failed, pages stale until TTL"),
            Err(_) => warn!("cache invalidation timed out, pages stale until TTL"),
        }
    }

    /// Store liveness for the health surface. An unreachable store is
    /// reported, not fatal.
    pub async fn ping(&self) -> bool {
        matches!(timeout(self.op_timeout, self.store.ping()).await, Ok(Ok(())))
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::{MemoryStore, StoreError};
    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    fn dto(title: &str) -> EventDto {
        EventDto {
            event_id: Uuid::new_v4(),
            title: title.to_string(),
            text: "body".to_string(),
            author_id: Uuid::new_v4(),
            photo: None,
            likes: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn cache() -> EventPageCache {
        EventPageCache::new(
            Arc::new(MemoryStore::new()),
            Duration::from_secs(600),
            Duration::from_millis(250),
        )
    }

    #[tokio::test]
    async fn round_trip_hits_counter_and_content() {
        let cache = cache();
        let events = vec![dto("first"), dto("second")];

        assert!(cache.get_page(1).await.is_none());
        assert_eq!(cache.misses(), 1);

        cache.write_page(1, &events).await;
        let cached = cache.get_page(1).await.expect("hit");
        assert_eq!(cache.hits(), 1);
        assert_eq!(
            serde_json::to_string(&cached).unwrap(),
            serde_json::to_string(&events).unwrap()
        );
    }

    #[tokio::test]
    async fn invalidation_empties_every_page() {
        let cache = cache();
        cache.write_page(1, &[dto("a")]).await;
        cache.write_page(2, &[dto("b")]).await;

        cache.invalidate_all().await;

        assert!(cache.get_page(1).await.is_none());
        assert!(cache.get_page(2).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pages_expire_after_ttl() {
        let cache = cache();
        cache.write_page(1, &[dto("a")]).await;

        tokio::time::advance(Duration::from_secs(601)).await;
        assert!(cache.get_page(1).await.is_none());
    }

    struct DeadStore;

    #[async_trait]
    impl KeyValueStore for DeadStore {
        async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn set_with_ttl(
            &self,
            _key: &str,
            _value: String,
            _ttl: Duration,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn delete_prefix(&self, _prefix: &str) -> Result<u64, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
        async fn ping(&self) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn dead_store_degrades_to_miss_not_error() {
        let cache = EventPageCache::new(
            Arc::new(DeadStore),
            Duration::from_secs(600),
            Duration::from_millis(250),
        );

        assert!(cache.get_page(1).await.is_none());
        assert_eq!(cache.misses(), 1);

        // Writes and invalidations swallow the failure too.
        cache.write_page(1, &[dto("a")]).await;
        cache.invalidate_all().await;
    }
}

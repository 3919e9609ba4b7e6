use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}

/// Key-value store with TTL-on-set and prefix-based bulk delete. The feed
/// cache treats any implementation as optional: every error degrades to the
/// uncached path.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Delete every key under `prefix`, returning how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, StoreError>;

    /// Liveness probe.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// In-process TTL store. Expired entries are dropped lazily on read; the
/// TTL bound is what keeps stale pages from accumulating.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some((value, deadline)) if *deadline > Instant::now() => {
                    return Ok(Some(value.clone()))
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Re-check under the write lock: a concurrent set may have
        // refreshed the entry since the read above.
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some((value, deadline)) if *deadline > Instant::now() => Ok(Some(value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let deadline = Instant::now() + ttl;
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, deadline));
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "v".into(), Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));

        tokio::time::advance(Duration::from_secs(601)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn refreshed_entry_survives_expired_read() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "old".into(), Duration::from_secs(10))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;

        // A set landing after the entry expired must win over the lazy
        // expiry sweep of a concurrent get.
        store
            .set_with_ttl("k", "fresh".into(), Duration::from_secs(600))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("fresh".to_string()));
        assert_eq!(store.get("k").await.unwrap(), Some("fresh".to_string()));
    }

    #[tokio::test]
    async fn delete_prefix_is_scoped() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);
        store.set_with_ttl("feed:1", "a".into(), ttl).await.unwrap();
        store.set_with_ttl("feed:2", "b".into(), ttl).await.unwrap();
        store.set_with_ttl("other", "c".into(), ttl).await.unwrap();

        assert_eq!(store.delete_prefix("feed:").await.unwrap(), 2);
        assert_eq!(store.get("other").await.unwrap(), Some("c".to_string()));
    }
}

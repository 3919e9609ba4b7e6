use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::cache::{EventPageCache, KeyValueStore, MemoryStore};
use crate::chat::ChatRoom;
use crate::config;
use crate::database::{MessageRepository, UserRepository};
use crate::jobs::JobQueue;
use crate::services::{EventService, UserService};

/// Shared application state handed to every request task.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub cache: Arc<EventPageCache>,
    pub queue: JobQueue,
    pub chat: Arc<ChatRoom>,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self::with_store(pool, Arc::new(MemoryStore::new()))
    }

    pub fn with_store(pool: PgPool, store: Arc<dyn KeyValueStore>) -> Self {
        let cache_cfg = &config::config().cache;
        let cache = Arc::new(EventPageCache::new(
            store,
            Duration::from_secs(cache_cfg.page_ttl_secs),
            Duration::from_millis(cache_cfg.op_timeout_ms),
        ));

        Self {
            pool: pool.clone(),
            cache,
            queue: JobQueue::new(pool),
            chat: Arc::new(ChatRoom::new()),
        }
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.pool.clone())
    }

    pub fn messages(&self) -> MessageRepository {
        MessageRepository::new(self.pool.clone())
    }

    pub fn user_service(&self) -> UserService {
        UserService::new(self.pool.clone())
    }

    pub fn event_service(&self) -> EventService {
        EventService::new(
            self.pool.clone(),
            Arc::clone(&self.cache),
            self.queue.clone(),
        )
    }
}

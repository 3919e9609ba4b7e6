use std::sync::Arc;

use sqlx::PgPool;
use tracing::error;
use uuid::Uuid;

use crate::cache::EventPageCache;
use crate::database::models::User;
use crate::database::EventRepository;
use crate::jobs::JobQueue;
use crate::roles;
use crate::services::dto::EventDto;
use crate::services::ServiceError;

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub text: String,
    /// Object-store key of the raw upload, if a photo was attached.
    pub photo: Option<String>,
}

/// Feed mutations and the read-through cached listing.
///
/// Ordering within a mutation: persistence write, then cache invalidation,
/// then response. Cache and enqueue failures never roll back or fail the
/// write.
#[derive(Clone)]
pub struct EventService {
    events: EventRepository,
    cache: Arc<EventPageCache>,
    queue: JobQueue,
}

impl EventService {
    pub fn new(pool: PgPool, cache: Arc<EventPageCache>, queue: JobQueue) -> Self {
        Self {
            events: EventRepository::new(pool),
            cache,
            queue,
        }
    }

    /// Create a feed event authored by `actor`.
    ///
    /// Returns as soon as the row is persisted; when a photo is attached
    /// the optimization job is enqueued and `photo` converges to the
    /// optimized URL asynchronously. Callers must not assume the field is
    /// final on return.
    pub async fn create_event(
        &self,
        actor: &User,
        new_event: NewEvent,
    ) -> Result<EventDto, ServiceError> {
        if !roles::is_privileged(&actor.roles) {
            return Err(ServiceError::Forbidden);
        }

        let event = self
            .events
            .create(
                &new_event.title,
                &new_event.text,
                actor.user_id,
                new_event.photo.as_deref(),
            )
            .await?;

        // Inserting at the head shifts every page.
        self.cache.invalidate_all().await;

        if let Some(photo) = &new_event.photo {
            if let Err(err) = self.queue.enqueue_optimize(event.event_id, photo).await {
                // Isolated from the mutation outcome: the event stands,
                // its photo just stays unoptimized.
                error!(event_id = %event.event_id, error = %err, "failed to enqueue photo optimization");
            }
        }

        Ok(event.into())
    }

    pub async fn delete_event(&self, actor: &User, event_id: Uuid) -> Result<Uuid, ServiceError> {
        if !roles::is_privileged(&actor.roles) {
            return Err(ServiceError::Forbidden);
        }

        self.events
            .find_by_id(event_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("event {event_id}")))?;

        let deleted = self
            .events
            .delete(event_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("event {event_id}")))?;

        // Deleted events must not linger in cached pages for a TTL window.
        self.cache.invalidate_all().await;

        Ok(deleted)
    }

    /// One feed page through the cache. Pages past the end are empty, not
    /// an error; a miss populates the cache off the response path.
    pub async fn list_events(&self, page: u32) -> Result<Vec<EventDto>, ServiceError> {
        if page < 1 {
            return Err(ServiceError::InvalidPage);
        }

        if let Some(cached) = self.cache.get_page(page).await {
            return Ok(cached);
        }

        let events = self.events.page(page).await?;
        let dtos: Vec<EventDto> = events.into_iter().map(EventDto::from).collect();
        self.cache.populate(page, &dtos);
        Ok(dtos)
    }
}

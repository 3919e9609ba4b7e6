use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::models::Event;

pub const PAGE_SIZE: i64 = 10;

/// Data access for feed events. Pages are 1-indexed, 10 rows each, newest
/// first.
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        title: &str,
        text: &str,
        author_id: Uuid,
        photo: Option<&str>,
    ) -> Result<Event, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            INSERT INTO events (title, text, author_id, photo)
            VALUES ($1, $2, $3, $4)
            RETURNING event_id, title, text, author_id, photo, likes, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(text)
        .bind(author_id)
        .bind(photo)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, event_id: Uuid) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, title, text, author_id, photo, likes, created_at, updated_at
            FROM events WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, event_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("DELETE FROM events WHERE event_id = $1 RETURNING event_id")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// One feed page, newest first. Pages past the end come back empty.
    pub async fn page(&self, page: u32) -> Result<Vec<Event>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"
            SELECT event_id, title, text, author_id, photo, likes, created_at, updated_at
            FROM events
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(PAGE_SIZE)
        .bind(page_offset(page))
        .fetch_all(&self.pool)
        .await
    }

    /// Conditional photo rewrite inside a caller-owned transaction scope.
    ///
    /// Returns None when the event no longer exists; the optimization
    /// worker treats that as a successful no-op.
    pub async fn update_photo(
        tx: &mut Transaction<'_, Postgres>,
        event_id: Uuid,
        photo: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE events SET photo = $2, updated_at = now() WHERE event_id = $1 RETURNING event_id",
        )
        .bind(event_id)
        .bind(photo)
        .fetch_optional(&mut **tx)
        .await
    }
}

fn page_offset(page: u32) -> i64 {
    (i64::from(page) - 1) * PAGE_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_one_indexed() {
        assert_eq!(page_offset(1), 0);
        assert_eq!(page_offset(2), 10);
        assert_eq!(page_offset(100), 990);
    }
}

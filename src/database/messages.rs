use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Message;

/// Append-only chat log. No edit or delete paths exist.
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        sender_id: Uuid,
        sender_name: &str,
        text: &str,
    ) -> Result<Message, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (sender_id, sender_name, text)
            VALUES ($1, $2, $3)
            RETURNING message_id, sender_id, sender_name, text, created_at
            "#,
        )
        .bind(sender_id)
        .bind(sender_name)
        .bind(text)
        .fetch_one(&self.pool)
        .await
    }

    /// The most recent `limit` messages in chronological order.
    pub async fn recent(&self, limit: i64) -> Result<Vec<Message>, sqlx::Error> {
        let mut messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT message_id, sender_id, sender_name, text, created_at
            FROM messages
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();
        Ok(messages)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Feed event row. `photo` is null or the raw upload reference until the
/// optimization worker converges it to the optimized URL.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub event_id: Uuid,
    pub title: String,
    pub text: String,
    pub author_id: Uuid,
    pub photo: Option<String>,
    pub likes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account row. The credential hash never leaves the persistence layer;
/// outward-facing shapes go through [`crate::services::dto::UserDto`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

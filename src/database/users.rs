use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::User;

/// Profile fields a caller may change. Role changes go through
/// [`replace_roles`](UserRepository::replace_roles) only.
#[derive(Debug, Default, Clone)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// Data access for account rows. Every mutation is a single conditional
/// statement keyed by id, returning the affected id so callers can
/// distinguish absent rows without a second read.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        name: &str,
        email: &str,
        hashed_password: &str,
        roles: &[String],
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, hashed_password, roles)
            VALUES ($1, $2, $3, $4)
            RETURNING user_id, name, email, hashed_password, roles, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .bind(roles)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, hashed_password, roles, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, hashed_password, roles, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            "SELECT user_id, name, email, hashed_password, roles, created_at FROM users ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
    }

    /// Conditional profile update returning the affected id, or None when
    /// the row is absent. Callers must reject empty change-sets first.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        changes: &UserChanges,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        let sql = build_profile_update_sql(changes);

        let mut query = sqlx::query_scalar::<_, Uuid>(&sql).bind(user_id);
        if let Some(name) = &changes.name {
            query = query.bind(name);
        }
        if let Some(email) = &changes.email {
            query = query.bind(email);
        }
        query.fetch_optional(&self.pool).await
    }

    /// Replace the whole role array in one conditional update. The new set
    /// is the full replacement value, not a delta.
    pub async fn replace_roles(
        &self,
        user_id: Uuid,
        roles: &[String],
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "UPDATE users SET roles = $2 WHERE user_id = $1 RETURNING user_id",
        )
        .bind(user_id)
        .bind(roles)
        .fetch_optional(&self.pool)
        .await
    }

    pub async fn delete(&self, user_id: Uuid) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("DELETE FROM users WHERE user_id = $1 RETURNING user_id")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
    }
}

fn build_profile_update_sql(changes: &UserChanges) -> String {
    let mut sets = Vec::new();
    let mut position = 2;
    if changes.name.is_some() {
        sets.push(format!("name = ${position}"));
        position += 1;
    }
    if changes.email.is_some() {
        sets.push(format!("email = ${position}"));
    }
    format!(
        "UPDATE users SET {} WHERE user_id = $1 RETURNING user_id",
        sets.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_sql_binds_only_present_fields() {
        let both = UserChanges {
            name: Some("a".into()),
            email: Some("b".into()),
        };
        assert_eq!(
            build_profile_update_sql(&both),
            "UPDATE users SET name = $2, email = $3 WHERE user_id = $1 RETURNING user_id"
        );

        let email_only = UserChanges {
            name: None,
            email: Some("b".into()),
        };
        assert_eq!(
            build_profile_update_sql(&email_only),
            "UPDATE users SET email = $2 WHERE user_id = $1 RETURNING user_id"
        );
    }

    #[test]
    fn empty_changes_detected() {
        assert!(UserChanges::default().is_empty());
        assert!(!UserChanges {
            name: Some("a".into()),
            email: None
        }
        .is_empty());
    }
}

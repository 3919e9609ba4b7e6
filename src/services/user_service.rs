use sqlx::PgPool;
use uuid::Uuid;

use crate::auth;
use crate::database::models::User;
use crate::database::{UserChanges, UserRepository};
use crate::roles;
use crate::services::dto::UserDto;
use crate::services::ServiceError;

/// Account mutations: registration, profile edits, deletion and the admin
/// grant/revoke transitions.
///
/// Every mutation re-fetches the target by id before authorization, so
/// decisions are made against current state rather than whatever the
/// client last saw. All checks happen before the persistence write.
#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserDto, ServiceError> {
        validate_name(name)?;
        validate_email(email)?;

        let hashed = auth::hash_password(password)
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        let user = self
            .users
            .create(name, email, &hashed, &roles::default_roles())
            .await?;
        Ok(user.into())
    }

    /// Credential check for login. `None` covers both unknown email and
    /// wrong password so the caller leaks nothing about which failed.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, ServiceError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            return Ok(None);
        };
        if !auth::verify_password(password, &user.hashed_password) {
            return Ok(None);
        }
        Ok(Some(user))
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserDto, ServiceError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserDto::from)
            .ok_or_else(|| ServiceError::NotFound(format!("user {user_id}")))
    }

    pub async fn list_users(&self, actor: &User) -> Result<Vec<UserDto>, ServiceError> {
        if !roles::is_privileged(&actor.roles) {
            return Err(ServiceError::Forbidden);
        }
        let users = self.users.list().await?;
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    pub async fn update_user(
        &self,
        actor: &User,
        target_id: Uuid,
        changes: &UserChanges,
    ) -> Result<Uuid, ServiceError> {
        if changes.is_empty() {
            return Err(ServiceError::EmptyUpdate);
        }
        // Same field rules as registration.
        if let Some(name) = &changes.name {
            validate_name(name)?;
        }
        if let Some(email) = &changes.email {
            validate_email(email)?;
        }

        let target = self.fetch_target(target_id).await?;
        if !roles::can_modify(actor, &target) {
            return Err(ServiceError::Forbidden);
        }

        self.users
            .update_profile(target_id, changes)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {target_id}")))
    }

    pub async fn delete_user(&self, actor: &User, target_id: Uuid) -> Result<Uuid, ServiceError> {
        let target = self.fetch_target(target_id).await?;
        if !roles::can_modify(actor, &target) {
            return Err(ServiceError::Forbidden);
        }

        self.users
            .delete(target_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {target_id}")))
    }

    /// Grant the admin tag. The role machine owns the guards; the result
    /// is persisted as a full replacement of the role array.
    pub async fn grant_admin(&self, actor: &User, target_id: Uuid) -> Result<Uuid, ServiceError> {
        let target = self.fetch_target(target_id).await?;
        let new_roles = roles::grant_admin(actor, &target)?;

        self.users
            .replace_roles(target_id, &new_roles)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {target_id}")))
    }

    /// Revoke the admin tag. Superadmin membership is never touched.
    pub async fn revoke_admin(&self, actor: &User, target_id: Uuid) -> Result<Uuid, ServiceError> {
        let target = self.fetch_target(target_id).await?;
        let new_roles = roles::revoke_admin(actor, &target)?;

        self.users
            .replace_roles(target_id, &new_roles)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {target_id}")))
    }

    async fn fetch_target(&self, target_id: Uuid) -> Result<User, ServiceError> {
        self.users
            .find_by_id(target_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {target_id}")))
    }
}

fn validate_name(name: &str) -> Result<(), ServiceError> {
    if name.is_empty() || !name.chars().all(char::is_alphanumeric) {
        return Err(ServiceError::Validation(
            "name should contain only letters and digits".to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), ServiceError> {
    if !email.contains('@') {
        return Err(ServiceError::Validation("invalid email".to_string()));
    }
    Ok(())
}

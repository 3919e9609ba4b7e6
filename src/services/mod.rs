pub mod dto;
pub mod event_service;
pub mod user_service;

use thiserror::Error;

use crate::roles::RoleError;

pub use event_service::{EventService, NewEvent};
pub use user_service::UserService;

/// Domain-level failure taxonomy shared by the mutation services. The HTTP
/// mapping lives in [`crate::error::ApiError`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("forbidden")]
    Forbidden,

    #[error("{0}")]
    Conflict(String),

    #[error("at least one field must be provided")]
    EmptyUpdate,

    #[error("cannot manage privileges of itself")]
    SelfPrivilege,

    #[error("page number must be >= 1")]
    InvalidPage,

    #[error("{0}")]
    Validation(String),

    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
}

impl From<RoleError> for ServiceError {
    fn from(err: RoleError) -> Self {
        match err {
            RoleError::NotSuperadmin => ServiceError::Forbidden,
            RoleError::SelfPrivilege => ServiceError::SelfPrivilege,
            RoleError::AlreadyPrivileged | RoleError::NotPrivileged => {
                ServiceError::Conflict(err.to_string())
            }
        }
    }
}

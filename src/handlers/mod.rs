pub mod chat;
pub mod events;
pub mod login;
pub mod users;

use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// Re-fetch the acting account for an authenticated request. Tokens only
/// carry the account id; roles come from the current row so a demotion
/// takes effect on the next request.
pub(crate) async fn current_user(state: &AppState, auth: &AuthUser) -> Result<User, ApiError> {
    state
        .users()
        .find_by_id(auth.user_id)
        .await
        .map_err(|err| {
            tracing::error!("failed to load current user: {}", err);
            ApiError::service_unavailable("Database temporarily unavailable")
        })?
        .ok_or_else(|| ApiError::unauthorized("Could not validate credentials"))
}

use axum::{extract::State, response::Json, Extension};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::config;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::dto::UserDto;
use crate::state::AppState;

use super::current_user;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /login/token - Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .user_service()
        .authenticate(&payload.email, &payload.password)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("incorrect email or password"))?;

    let security = &config::config().security;
    let claims = Claims::new(user.user_id, security.jwt_expiry_minutes);
    let token = auth::generate_jwt(&claims, &security.jwt_secret)?;

    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

/// GET /login/whoami - Authenticated probe returning the acting account.
pub async fn whoami(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = current_user(&state, &auth).await?;
    Ok(Json(json!({ "success": true, "data": UserDto::from(user) })))
}

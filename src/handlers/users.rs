use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::UserChanges;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

use super::current_user;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// POST /user - Register a new account with the base user role.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<Value>, ApiError> {
    let user = state
        .user_service()
        .register(&payload.name, &payload.email, &payload.password)
        .await?;

    Ok(Json(json!({ "success": true, "data": user })))
}

/// GET /user/:id
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    current_user(&state, &auth).await?;
    let user = state.user_service().get_user(user_id).await?;
    Ok(Json(json!({ "success": true, "data": user })))
}

/// GET /users - Admin-gated account listing.
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let actor = current_user(&state, &auth).await?;
    let users = state.user_service().list_users(&actor).await?;
    Ok(Json(json!({ "success": true, "data": users })))
}

/// PATCH /user/:id - Profile update, permission-gated against the target.
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = current_user(&state, &auth).await?;
    let changes = UserChanges {
        name: payload.name,
        email: payload.email,
    };

    let updated = state
        .user_service()
        .update_user(&actor, user_id, &changes)
        .await?;
    Ok(Json(json!({ "success": true, "data": { "updated_user_id": updated } })))
}

/// DELETE /user/:id
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let actor = current_user(&state, &auth).await?;
    let deleted = state.user_service().delete_user(&actor, user_id).await?;
    Ok(Json(json!({ "success": true, "data": { "deleted_user_id": deleted } })))
}

/// PATCH /user/:id/admin - Grant the admin role (superadmin only).
pub async fn grant_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let actor = current_user(&state, &auth).await?;
    let updated = state.user_service().grant_admin(&actor, user_id).await?;
    Ok(Json(json!({ "success": true, "data": { "updated_user_id": updated } })))
}

/// DELETE /user/:id/admin - Revoke the admin role (superadmin only).
pub async fn revoke_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let actor = current_user(&state, &auth).await?;
    let updated = state.user_service().revoke_admin(&actor, user_id).await?;
    Ok(Json(json!({ "success": true, "data": { "updated_user_id": updated } })))
}

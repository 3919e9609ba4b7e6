use axum::{
    extract::{Path, Query, State},
    response::Json,
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::NewEvent;
use crate::state::AppState;

use super::current_user;

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub text: String,
    /// Object-store key of the uploaded raw photo, if any. The stored
    /// event converges to the optimized URL asynchronously.
    pub photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// POST /event - Create a feed event authored by the acting account.
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Json<Value>, ApiError> {
    let actor = current_user(&state, &auth).await?;
    let event = state
        .event_service()
        .create_event(
            &actor,
            NewEvent {
                title: payload.title,
                text: payload.text,
                photo: payload.photo,
            },
        )
        .await?;

    Ok(Json(json!({ "success": true, "data": event })))
}

/// DELETE /event/:id
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let actor = current_user(&state, &auth).await?;
    let deleted = state.event_service().delete_event(&actor, event_id).await?;
    Ok(Json(json!({ "success": true, "data": { "deleted_event_id": deleted } })))
}

/// GET /events?page=N - Cached feed page, newest first, 10 per page.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = query.page.unwrap_or(1);
    let events = state.event_service().list_events(page).await?;
    Ok(Json(json!({ "success": true, "data": events })))
}

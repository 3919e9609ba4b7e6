use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Json},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::services::dto::MessageDto;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;
const ANONYMOUS_NAME: &str = "Anonist";

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// Client-to-server chat frame. The sender's display name is denormalized
/// into the stored row as-is and never re-resolved.
#[derive(Debug, Deserialize)]
struct IncomingMessage {
    sender_id: Uuid,
    sender_name: Option<String>,
    text: String,
}

/// GET /chat/history?limit=N - Most recent messages, oldest first.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Value>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let messages = state.messages().recent(limit).await.map_err(|err| {
        tracing::error!("failed to load chat history: {}", err);
        ApiError::service_unavailable("Database temporarily unavailable")
    })?;

    let dtos: Vec<MessageDto> = messages.into_iter().map(MessageDto::from).collect();
    Ok(Json(json!({ "success": true, "data": dtos })))
}

/// GET /chat/ws - Join the common room.
pub async fn ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut room_rx = state.chat.subscribe();

    // Room -> client. Stops when the client goes away.
    let mut send_task = tokio::spawn(async move {
        while let Ok(message) = room_rx.recv().await {
            let Ok(raw) = serde_json::to_string(&message) else {
                continue;
            };
            if sink.send(WsMessage::Text(raw)).await.is_err() {
                break;
            }
        }
    });

    // Client -> store -> room. The message is durable once the row is
    // written; broadcast after that is fire-and-forget.
    let messages = state.messages();
    let room = state.chat.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = stream.next().await {
            let WsMessage::Text(raw) = frame else {
                continue;
            };
            let Ok(incoming) = serde_json::from_str::<IncomingMessage>(&raw) else {
                continue;
            };
            let text = incoming.text.trim();
            if text.is_empty() {
                continue;
            }
            let sender_name = incoming
                .sender_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_NAME.to_string());

            match messages.append(incoming.sender_id, &sender_name, text).await {
                Ok(stored) => room.publish(stored.into()),
                Err(err) => tracing::error!("failed to persist chat message: {}", err),
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }
}

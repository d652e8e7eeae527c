//! Room management endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use wild_eights::game::GameError;
use wild_eights::{GameKind, Nickname, PlayerId, RoomSnapshot};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub nickname: Nickname,
    #[serde(default)]
    pub kind: GameKind,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub code: String,
    pub player: PlayerId,
    pub room: RoomSnapshot,
}

/// Create a room and admit its host.
///
/// The host receives their player id here and binds a WebSocket with it
/// afterwards (`/ws?code=..&player=..`).
pub async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> impl IntoResponse {
    match state
        .registry
        .create_room(request.kind, request.nickname)
        .await
    {
        Ok((handle, reply)) => {
            crate::metrics::rooms_created_total();
            crate::metrics::rooms_active(state.registry.room_count().await);
            let body = CreateRoomResponse {
                code: handle.code().to_string(),
                player: reply.player,
                room: reply.snapshot,
            };
            (StatusCode::CREATED, Json(json!(body)))
        }
        Err(err) => error_response(err),
    }
}

/// List live rooms.
pub async fn list_rooms(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.registry.list_rooms().await;
    (StatusCode::OK, Json(json!({ "rooms": rooms })))
}

/// Redacted snapshot of a single room (hands as card-back counts).
pub async fn get_room(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> impl IntoResponse {
    let Some(handle) = state.registry.get(&code).await else {
        return error_response(GameError::RoomNotFound);
    };
    match handle.snapshot(None).await {
        Ok(snapshot) => (StatusCode::OK, Json(json!({ "room": snapshot }))),
        Err(err) => error_response(err),
    }
}

/// Map a rejected command onto an HTTP status.
pub fn error_response(err: GameError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        GameError::RoomNotFound => StatusCode::NOT_FOUND,
        GameError::RoomFull
        | GameError::RoomNotJoinable
        | GameError::SeatOccupied
        | GameError::AwaitingColorChoice => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({ "error": err, "message": err.to_string() })))
}

//! HTTP/WebSocket API for the room server.
//!
//! The surface is intentionally small: rooms are created and inspected
//! over HTTP, and everything in-game flows over the WebSocket, which
//! binds a connection to a player inside a room actor.
//!
//! # Endpoints
//!
//! - `GET  /health` - Server health status
//! - `POST /api/rooms` - Create a room (body: host nickname, game kind)
//! - `GET  /api/rooms` - List live rooms
//! - `GET  /api/rooms/{code}` - Redacted snapshot of one room
//! - `GET  /ws?code=..&nickname=..` - Join a room over WebSocket
//! - `GET  /ws?code=..&player=..` - Reconnect an existing player

pub mod rate_limiter;
pub mod rooms;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use wild_eights::RoomRegistry;

/// Application state shared across all HTTP handlers and WebSocket
/// connections. Cloned per request; the registry is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/rooms", post(rooms::create_room).get(rooms::list_rooms))
        .route("/api/rooms/{code}", get(rooms::get_room))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Server health status.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let rooms = state.registry.room_count().await;
    crate::metrics::rooms_active(rooms);
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "rooms": rooms,
        })),
    )
}

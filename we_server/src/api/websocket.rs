//! WebSocket handler binding client connections to room actors.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws?code=<room>&nickname=<name>` (fresh
//!    join) or `GET /ws?code=<room>&player=<id>` (reconnect).
//! 2. The room admits/rebinds the player and the server spawns two
//!    halves: a send task draining room events to the socket, and the
//!    receive loop translating client JSON into room commands.
//! 3. On disconnect the player is detached, which starts their grace
//!    window inside the room; the seat survives the socket.
//!
//! Command rejections are echoed only to the issuing socket as an
//! `error` event; committed mutations reach everyone as fresh snapshots.

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use tokio::sync::mpsc;

use wild_eights::game::GameError;
use wild_eights::{CardColor, Nickname, PlayerCommand, PlayerId, RoomHandle, ServerEvent};

use super::{AppState, rate_limiter::RateLimiter};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    code: String,
    nickname: Option<String>,
    player: Option<PlayerId>,
}

/// Client messages received via WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    AssignSeat { target: PlayerId, position: usize },
    StartGame,
    PlayCard { index: usize },
    DrawCard,
    ChooseColor { color: CardColor },
    CallUno,
    PauseGame,
    ResumeGame,
    LeaveRoom,
    KickPlayer { target: PlayerId },
}

impl ClientMessage {
    fn into_command(self) -> PlayerCommand {
        match self {
            Self::AssignSeat { target, position } => PlayerCommand::AssignSeat { target, position },
            Self::StartGame => PlayerCommand::StartGame,
            Self::PlayCard { index } => PlayerCommand::PlayCard { index },
            Self::DrawCard => PlayerCommand::DrawCard,
            Self::ChooseColor { color } => PlayerCommand::ChooseColor { color },
            Self::CallUno => PlayerCommand::CallUno,
            Self::PauseGame => PlayerCommand::PauseGame,
            Self::ResumeGame => PlayerCommand::ResumeGame,
            Self::LeaveRoom => PlayerCommand::LeaveRoom,
            Self::KickPlayer { target } => PlayerCommand::KickPlayer { target },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::AssignSeat { .. } => "assign_seat",
            Self::StartGame => "start_game",
            Self::PlayCard { .. } => "play_card",
            Self::DrawCard => "draw_card",
            Self::ChooseColor { .. } => "choose_color",
            Self::CallUno => "call_uno",
            Self::PauseGame => "pause_game",
            Self::ResumeGame => "resume_game",
            Self::LeaveRoom => "leave_room",
            Self::KickPlayer { .. } => "kick_player",
        }
    }
}

/// Upgrade an HTTP connection to a WebSocket bound to one room.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let Some(handle) = state.registry.get(&query.code).await else {
        return (StatusCode::NOT_FOUND, "room not found").into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, handle, query))
}

/// Drive one established WebSocket connection.
async fn handle_socket(socket: WebSocket, room: RoomHandle, query: WsQuery) {
    let (mut sink, mut stream) = socket.split();

    // Resolve the player: reconnect by id, or join by nickname.
    let (player, joined) = match (query.player, query.nickname) {
        (Some(player), _) => (player, None),
        (None, Some(nickname)) => match room.join(Nickname::new(&nickname)).await {
            Ok(reply) => (reply.player, Some(reply)),
            Err(err) => {
                let _ = send_event(&mut sink, &ServerEvent::Error { error: err }).await;
                return;
            }
        },
        (None, None) => {
            let event = ServerEvent::Error {
                error: GameError::validation("provide a nickname or player id"),
            };
            let _ = send_event(&mut sink, &event).await;
            return;
        }
    };

    if let Some(reply) = joined {
        let event = ServerEvent::Joined {
            player: reply.player,
            room: reply.snapshot,
        };
        if send_event(&mut sink, &event).await.is_err() {
            return;
        }
    }

    // Outbound channel: the room actor pushes events here, and command
    // rejections are fed back through the same channel so everything
    // reaches the client in order.
    let (events_tx, mut events_rx) = mpsc::channel::<ServerEvent>(32);
    if let Err(err) = room.attach(player, events_tx.clone()).await {
        let _ = send_event(&mut sink, &ServerEvent::Error { error: err }).await;
        return;
    }

    info!("ws connected: room={}, player={}", room.code(), player);
    crate::metrics::websocket_connections_total();

    let send_task = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if send_event(&mut sink, &event).await.is_err() {
                break;
            }
        }
    });

    // Rate limiting per connection.
    let mut burst_limiter = RateLimiter::burst();
    let mut sustained_limiter = RateLimiter::sustained();
    let mut left_room = false;

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if !burst_limiter.check() || !sustained_limiter.check() {
                    warn!(
                        "rate limit exceeded: room={}, player={}",
                        room.code(),
                        player
                    );
                    let event = ServerEvent::Error {
                        error: GameError::validation("slow down"),
                    };
                    if events_tx.send(event).await.is_err() {
                        break;
                    }
                    continue;
                }

                let client_message = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => message,
                    Err(err) => {
                        debug!("unparseable client message: {err}");
                        let event = ServerEvent::Error {
                            error: GameError::validation("invalid message format"),
                        };
                        if events_tx.send(event).await.is_err() {
                            break;
                        }
                        continue;
                    }
                };

                let name = client_message.name();
                let is_leave = matches!(client_message, ClientMessage::LeaveRoom);
                let result = room.command(player, client_message.into_command()).await;
                crate::metrics::room_commands_total(name, result.is_ok());
                match result {
                    Ok(()) => {
                        if is_leave {
                            left_room = true;
                            break;
                        }
                    }
                    Err(error) => {
                        if events_tx.send(ServerEvent::Error { error }).await.is_err() {
                            break;
                        }
                    }
                }
            }
            Ok(Message::Close(_)) => break,
            Err(err) => {
                debug!("ws error: room={}, player={player}: {err}", room.code());
                break;
            }
            _ => {}
        }
    }

    send_task.abort();
    if !left_room {
        // The seat outlives the socket; the room starts the grace timer.
        let _ = room.detach(player).await;
    }
    info!("ws disconnected: room={}, player={}", room.code(), player);
}

async fn send_event(
    sink: &mut (impl SinkExt<Message> + Unpin),
    event: &ServerEvent,
) -> Result<(), ()> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(err) => {
            warn!("failed to serialize event: {err}");
            return Ok(());
        }
    };
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}

//! Per-command error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported back to the connection that issued a command.
///
/// Every variant is recoverable: the command is rejected, room state is
/// untouched, and nothing is broadcast. Timer-driven transitions are not
/// errors and never surface here.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum GameError {
    #[error("malformed command: {reason}")]
    Validation { reason: String },
    #[error("that card can't be played on the current discard")]
    IllegalPlay,
    #[error("waiting on a color choice")]
    AwaitingColorChoice,
    #[error("no color choice is pending")]
    NoColorChoicePending,
    #[error("seat already taken")]
    SeatOccupied,
    #[error("seat position must be 0-3")]
    InvalidSeat,
    #[error("all seats are taken")]
    RoomFull,
    #[error("not enough cards left to draw")]
    DeckExhausted,
    #[error("not your turn")]
    NotYourTurn,
    #[error("room not found")]
    RoomNotFound,
    #[error("room can't accept that right now")]
    RoomNotJoinable,
    #[error("only the host can do that")]
    NotHost,
    #[error("you need a seat to do that")]
    NotSeated,
    #[error("need 2+ seated players")]
    NotEnoughPlayers,
    #[error("game hasn't started")]
    GameNotStarted,
    #[error("game is paused")]
    GamePaused,
    #[error("no such player in this room")]
    UnknownPlayer,
    #[error("this engine doesn't host that game")]
    UnsupportedGame,
}

impl GameError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }
}

//! Room actor message types.

use tokio::sync::{mpsc, oneshot};

use crate::game::entities::{CardColor, Nickname, PlayerId, SeatIndex};
use crate::game::errors::GameError;
use crate::net::events::{RoomSnapshot, ServerEvent};

/// A player-issued command, translated from the transport verbatim.
#[derive(Clone, Debug)]
pub enum PlayerCommand {
    AssignSeat {
        target: PlayerId,
        position: SeatIndex,
    },
    StartGame,
    PlayCard {
        index: usize,
    },
    DrawCard,
    ChooseColor {
        color: CardColor,
    },
    CallUno,
    PauseGame,
    ResumeGame,
    LeaveRoom,
    KickPlayer {
        target: PlayerId,
    },
}

/// Timer firings delivered back into the room's inbox. Every timer
/// carries the generation it was scheduled under; a firing whose
/// generation no longer matches is stale and ignored, which is what makes
/// cancellation idempotent.
#[derive(Clone, Copy, Debug)]
pub enum TimerEvent {
    GraceExpired { player: PlayerId, generation: u64 },
    ColorChoiceTimeout { generation: u64 },
    RoomIdle { generation: u64 },
}

/// Messages that can be sent to a room actor.
#[derive(Debug)]
pub enum RoomMessage {
    /// Admit a player by nickname.
    Join {
        nickname: Nickname,
        response: oneshot::Sender<Result<JoinReply, GameError>>,
    },

    /// Bind (or rebind) a live transport to a player. A rebind cancels
    /// the player's grace timer and resynchronizes them with a full
    /// snapshot.
    Attach {
        player: PlayerId,
        sender: mpsc::Sender<ServerEvent>,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// The player's transport dropped; start their grace window.
    Detach { player: PlayerId },

    /// A game command from a player.
    Command {
        player: PlayerId,
        command: PlayerCommand,
        response: oneshot::Sender<Result<(), GameError>>,
    },

    /// Fetch a personalized snapshot (`None` for the redacted view).
    Snapshot {
        player: Option<PlayerId>,
        response: oneshot::Sender<RoomSnapshot>,
    },

    /// Internal: a scheduled timer fired.
    Timer(TimerEvent),

    /// Shut the room down, notifying connected clients.
    Close { response: oneshot::Sender<()> },
}

/// Reply to a successful join.
#[derive(Clone, Debug)]
pub struct JoinReply {
    pub player: PlayerId,
    pub snapshot: RoomSnapshot,
}

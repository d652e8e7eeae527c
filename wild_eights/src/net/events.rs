//! Events pushed to clients after committed mutations.
//!
//! Snapshots are personalized: a seat's cards are visible only in the
//! snapshot sent to that seat's own connection; everyone else sees
//! card-back counts.

use serde::{Deserialize, Serialize};

use crate::game::constants::SEAT_COUNT;
use crate::game::entities::{
    Card, CardColor, ConnectionState, Direction, Nickname, PlayerId, RoomStatus, SeatIndex,
};
use crate::game::errors::GameError;

/// One line of the final (or in-progress) standings.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RankEntry {
    pub player: PlayerId,
    pub nickname: Nickname,
    pub rank: u8,
}

/// A hand as seen by a particular viewer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "visibility", rename_all = "snake_case")]
pub enum HandView {
    Cards { cards: Vec<Card> },
    Hidden { count: usize },
}

impl HandView {
    pub fn len(&self) -> usize {
        match self {
            Self::Cards { cards } => cards.len(),
            Self::Hidden { count } => *count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One occupied seat in a snapshot.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatView {
    pub player: PlayerId,
    pub nickname: Nickname,
    pub connection: ConnectionState,
    pub finish_rank: Option<u8>,
    pub called_uno: bool,
    pub hand: HandView,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SpectatorView {
    pub player: PlayerId,
    pub nickname: Nickname,
}

/// Full room state as pushed to one client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoomSnapshot {
    pub code: String,
    pub status: RoomStatus,
    pub seats: [Option<SeatView>; SEAT_COUNT],
    pub spectators: Vec<SpectatorView>,
    pub discard_top: Option<Card>,
    pub current_color: Option<CardColor>,
    pub direction: Direction,
    /// Seat holding the turn; absent before the game starts and after it
    /// ends.
    pub turn_seat: Option<SeatIndex>,
    pub pending_draw: u8,
    /// Player the color-choice gate is waiting on, if open.
    pub awaiting_color_from: Option<PlayerId>,
    pub host: Option<PlayerId>,
    pub draw_pile_size: usize,
    pub discard_pile_size: usize,
    pub rankings: Vec<RankEntry>,
}

/// Everything the engine pushes down a client connection.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First event on a fresh join: your identity plus the room.
    Joined {
        player: PlayerId,
        room: RoomSnapshot,
    },
    /// Personalized room state after every committed mutation.
    Snapshot { room: RoomSnapshot },
    ColorChoiceRequested { player: PlayerId },
    UnoCalled { player: PlayerId },
    PenaltyApplied { player: PlayerId, amount: u8 },
    GameEnded {
        winner: Nickname,
        rankings: Vec<RankEntry>,
    },
    HostMigrated { new_host: PlayerId },
    /// The room is going away; return to the lobby.
    RoomClosed,
    /// A rejected command, echoed only to its sender.
    Error { error: GameError },
}

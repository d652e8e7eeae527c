use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use super::constants;

/// The four printable card colors.
///
/// Wild cards carry no printed color; the color they act as lives on the
/// room as the "current color" once chosen.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardColor {
    Red,
    Blue,
    Green,
    Yellow,
}

impl CardColor {
    /// All colors, in tie-break order.
    pub const ALL: [CardColor; 4] = [
        CardColor::Red,
        CardColor::Blue,
        CardColor::Green,
        CardColor::Yellow,
    ];
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Yellow => "yellow",
        };
        write!(f, "{repr}")
    }
}

/// Type alias for number-card ranks (0-9).
pub type Rank = u8;

/// A single card.
///
/// Every shape of card is its own variant so effect resolution can match
/// exhaustively; an unrepresentable card (a number card without a rank, a
/// colored wild) cannot be constructed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Card {
    Number { color: CardColor, rank: Rank },
    Skip { color: CardColor },
    Reverse { color: CardColor },
    DrawTwo { color: CardColor },
    Wild,
    WildFour,
}

impl Card {
    /// The printed color, if any. Wild cards have none until a color is
    /// chosen for them, and that choice is room state, not card state.
    pub fn color(&self) -> Option<CardColor> {
        match self {
            Self::Number { color, .. }
            | Self::Skip { color }
            | Self::Reverse { color }
            | Self::DrawTwo { color } => Some(*color),
            Self::Wild | Self::WildFour => None,
        }
    }

    pub fn is_wild(&self) -> bool {
        matches!(self, Self::Wild | Self::WildFour)
    }

    /// Whether two cards are the same kind of card, ignoring color and rank.
    pub fn same_kind(&self, other: &Card) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Number { color, rank } => write!(f, "{color} {rank}"),
            Self::Skip { color } => write!(f, "{color} skip"),
            Self::Reverse { color } => write!(f, "{color} reverse"),
            Self::DrawTwo { color } => write!(f, "{color} draw-two"),
            Self::Wild => write!(f, "wild"),
            Self::WildFour => write!(f, "wild draw-four"),
        }
    }
}

/// Unique player identity within a room.
pub type PlayerId = Uuid;

/// Type alias for seat positions around the table.
pub type SeatIndex = usize;

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Nickname(String);

impl Nickname {
    pub fn new(s: &str) -> Self {
        let mut nickname: String = s
            .chars()
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        nickname.truncate(constants::MAX_USER_INPUT_LENGTH / 2);
        Self(nickname)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Nickname {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Nickname {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Turn rotation direction around the table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn flipped(self) -> Self {
        match self {
            Self::Clockwise => Self::CounterClockwise,
            Self::CounterClockwise => Self::Clockwise,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Clockwise => "clockwise",
            Self::CounterClockwise => "counter-clockwise",
        };
        write!(f, "{repr}")
    }
}

/// Room lifecycle status.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Paused,
    Finished,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Finished => "finished",
        };
        write!(f, "{repr}")
    }
}

/// Connectivity of a player's transport link.
///
/// `Grace` is the window after a disconnect during which the seat is held
/// open for reconnection.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Online,
    Grace,
    Offline,
}

/// Which engine a room runs. The grid game is a sibling service; this
/// engine only hosts the card game.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    #[default]
    WildEights,
    TicTacToe,
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::WildEights => "wild_eights",
            Self::TicTacToe => "tic_tac_toe",
        };
        write!(f, "{repr}")
    }
}

/// A participant in a room, seated or spectating.
///
/// Players are created on join and removed only by a confirmed leave (or
/// kick), never merely because a socket dropped.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub nickname: Nickname,
    pub seat: Option<SeatIndex>,
    pub hand: Vec<Card>,
    pub finish_rank: Option<u8>,
    pub connection: ConnectionState,
}

impl Player {
    pub fn new(nickname: Nickname) -> Self {
        Self {
            id: Uuid::new_v4(),
            nickname,
            seat: None,
            hand: Vec::new(),
            finish_rank: None,
            connection: ConnectionState::Online,
        }
    }

    pub fn is_spectator(&self) -> bool {
        self.seat.is_none()
    }
}

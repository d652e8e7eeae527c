//! # Wild Eights
//!
//! A room-based multiplayer card game engine. Each room is a
//! single-writer actor owning one [`game::GameSession`]: commands arrive
//! over an inbox, mutate the session one at a time, and every committed
//! mutation fans a personalized snapshot out to the room's live
//! connections.
//!
//! ## Architecture
//!
//! - **Session**: deck, seats, turn cursor, card effects, the wild-color
//!   gate, the uno-call ledger, and finish rankings behind one command
//!   surface.
//! - **Room actor**: wraps a session in an mpsc inbox, schedules the
//!   disconnect-grace / color-choice / idle timers as cancellable
//!   generation-tagged messages, and broadcasts state after each commit.
//! - **Registry**: the process-wide `code -> room` table with creation,
//!   lookup, and eviction.
//! - **Store**: a thin load/save collaborator used at creation and on
//!   start/finish milestones.
//!
//! ## Example
//!
//! ```
//! use wild_eights::game::{GameSession, GameSettings};
//! use wild_eights::entities::{GameKind, Nickname};
//!
//! let mut room = GameSession::new(
//!     "DEMO42".to_string(),
//!     GameKind::WildEights,
//!     GameSettings::default(),
//! )
//! .unwrap();
//! let host = room.join(Nickname::new("ada")).unwrap();
//! let guest = room.join(Nickname::new("lin")).unwrap();
//! room.start_game(host).unwrap();
//! assert_eq!(room.hand(host).unwrap().len(), 7);
//! assert_eq!(room.hand(guest).unwrap().len(), 7);
//! ```

/// Core game logic, entities, and the session aggregate.
pub mod game;
pub use game::{
    GameError, GameSession, GameSettings, constants,
    entities::{self, Card, CardColor, GameKind, Nickname, PlayerId},
};

/// Outbound event vocabulary shared with transports.
pub mod net;
pub use net::{RoomSnapshot, ServerEvent};

/// Room actors, timers, and the registry.
pub mod room;
pub use room::{PlayerCommand, RoomConfig, RoomHandle, RoomRegistry};

/// Persistence collaborator.
pub mod store;

//! Outbound event vocabulary shared with transports.

pub mod events;

pub use events::{HandView, RankEntry, RoomSnapshot, SeatView, ServerEvent, SpectatorView};

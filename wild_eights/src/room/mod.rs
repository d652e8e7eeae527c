//! Room layer: the single-writer actor wrapping each session, the
//! connection supervisor, and the process-wide registry.

pub mod actor;
pub mod config;
pub mod connections;
pub mod messages;
pub mod registry;

pub use actor::{RoomActor, RoomHandle};
pub use config::RoomConfig;
pub use connections::ConnectionSupervisor;
pub use messages::{JoinReply, PlayerCommand, RoomMessage, TimerEvent};
pub use registry::{RoomRegistry, RoomSummary};

//! Room configuration models.

use serde::{Deserialize, Serialize};

use crate::game::constants::{
    DEFAULT_COLOR_CHOICE_TIMEOUT_SECS, DEFAULT_FINISHED_ROOM_TTL_SECS, DEFAULT_GRACE_PERIOD_SECS,
};
use crate::game::session::GameSettings;

/// Configuration for a room: rule knobs plus the timer windows the actor
/// schedules.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoomConfig {
    /// Rule settings handed to the session.
    pub settings: GameSettings,

    /// Seconds a disconnected player's seat is held before grace expires.
    pub grace_period_secs: u64,

    /// Seconds a wild player gets before the engine picks a color.
    pub color_choice_timeout_secs: u64,

    /// Seconds a finished or emptied room lingers before eviction.
    pub finished_room_ttl_secs: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            settings: GameSettings::default(),
            grace_period_secs: DEFAULT_GRACE_PERIOD_SECS,
            color_choice_timeout_secs: DEFAULT_COLOR_CHOICE_TIMEOUT_SECS,
            finished_room_ttl_secs: DEFAULT_FINISHED_ROOM_TTL_SECS,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.settings.starting_hand_size == 0 {
            return Err("Starting hand size must be at least 1".to_string());
        }
        // Four full hands plus the first discard must be dealable.
        if self.settings.starting_hand_size > 25 {
            return Err("Starting hand size must be at most 25".to_string());
        }
        if self.settings.uno_penalty == 0 {
            return Err("Uno penalty must be at least 1".to_string());
        }
        if self.grace_period_secs == 0 {
            return Err("Grace period must be at least 1 second".to_string());
        }
        if self.color_choice_timeout_secs == 0 {
            return Err("Color choice timeout must be at least 1 second".to_string());
        }
        Ok(())
    }
}

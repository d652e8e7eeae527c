//! The call-before-play ledger for one-card hands.

use std::collections::HashSet;

use super::entities::PlayerId;

/// Tracks who has announced a one-card hand and who is exposed to the
/// penalty for not doing so.
///
/// Calls are accepted at any time -- calling early or speculatively just
/// records the flag; it has no effect until a play actually leaves the
/// caller with one card. The flag resets whenever the hand size moves
/// away from one.
#[derive(Clone, Debug, Default)]
pub struct UnoCallLedger {
    called: HashSet<PlayerId>,
    vulnerable: HashSet<PlayerId>,
}

impl UnoCallLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an announcement. A late call made while exposed clears the
    /// exposure -- the player beat the check.
    pub fn call(&mut self, player: PlayerId) {
        self.called.insert(player);
        self.vulnerable.remove(&player);
    }

    pub fn has_called(&self, player: PlayerId) -> bool {
        self.called.contains(&player)
    }

    /// Observe a hand-size change. The one-card transition is the only
    /// moment the flag is consulted: silent arrival at one card exposes
    /// the player; any other size clears both flag and exposure.
    pub fn note_hand_size(&mut self, player: PlayerId, hand_size: usize) {
        if hand_size == 1 {
            if !self.called.contains(&player) {
                self.vulnerable.insert(player);
            }
        } else {
            self.called.remove(&player);
            self.vulnerable.remove(&player);
        }
    }

    pub fn is_vulnerable(&self, player: PlayerId) -> bool {
        self.vulnerable.contains(&player)
    }

    /// Drop all record of a player who left the room.
    pub fn forget(&mut self, player: PlayerId) {
        self.called.remove(&player);
        self.vulnerable.remove(&player);
    }
}

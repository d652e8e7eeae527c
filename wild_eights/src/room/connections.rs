//! Binding between logical players and live transport links.

use std::collections::HashMap;

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::game::entities::PlayerId;
use crate::net::events::ServerEvent;

/// Tracks which players have a live outbound channel and the generation
/// counters behind their grace timers.
///
/// Generations make timer cancellation idempotent: reconnecting bumps the
/// counter, so an already-scheduled expiry arrives stale and is dropped.
/// Ties between a reconnect and a racing expiry therefore always favor
/// the reconnect.
#[derive(Debug, Default)]
pub struct ConnectionSupervisor {
    links: HashMap<PlayerId, mpsc::Sender<ServerEvent>>,
    grace_generations: HashMap<PlayerId, u64>,
}

impl ConnectionSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a transport to a player, replacing any previous link.
    pub fn attach(&mut self, player: PlayerId, sender: mpsc::Sender<ServerEvent>) {
        self.links.insert(player, sender);
        self.bump_grace(player);
    }

    /// Drop a player's link (transport went away).
    pub fn detach(&mut self, player: PlayerId) {
        self.links.remove(&player);
    }

    /// Remove every trace of a player who left the room.
    pub fn forget(&mut self, player: PlayerId) {
        self.links.remove(&player);
        self.grace_generations.remove(&player);
    }

    pub fn is_attached(&self, player: PlayerId) -> bool {
        self.links.contains_key(&player)
    }

    pub fn attached_count(&self) -> usize {
        self.links.len()
    }

    /// Invalidate any outstanding grace timer for the player and return
    /// the generation a new timer must carry.
    pub fn bump_grace(&mut self, player: PlayerId) -> u64 {
        let generation = self.grace_generations.entry(player).or_insert(0);
        *generation += 1;
        *generation
    }

    /// Whether a fired grace timer is still the live one.
    pub fn grace_is_current(&self, player: PlayerId, generation: u64) -> bool {
        self.grace_generations.get(&player) == Some(&generation)
    }

    /// Send one event to one player, if linked.
    pub fn send_to(&mut self, player: PlayerId, event: ServerEvent) {
        let Some(sender) = self.links.get(&player) else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("player {player} outbound channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("player {player} link closed, unbinding");
                self.links.remove(&player);
            }
        }
    }

    /// Fan an event out to every linked player, pruning dead links.
    pub fn broadcast(&mut self, event: &ServerEvent) {
        self.links.retain(|player, sender| {
            match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("player {player} outbound channel full, dropping event");
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("player {player} link closed, unbinding");
                    false
                }
            }
        });
    }

    /// Players with a live link right now.
    pub fn linked_players(&self) -> Vec<PlayerId> {
        self.links.keys().copied().collect()
    }
}

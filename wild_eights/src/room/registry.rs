//! Process-wide table of room code to live room handle.

use std::collections::HashMap;
use std::sync::Arc;

use log::{info, warn};
use rand::Rng;
use serde::Serialize;
use tokio::sync::{RwLock, mpsc};

use super::actor::{RoomActor, RoomHandle};
use super::config::RoomConfig;
use super::messages::JoinReply;
use crate::game::entities::{GameKind, Nickname, RoomStatus};
use crate::game::errors::GameError;
use crate::game::session::GameSession;
use crate::store::repository::{RoomRecord, RoomStore};

/// Characters used in room codes: no 0/O or 1/I lookalikes, so codes
/// survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;

/// Lightweight room listing entry.
#[derive(Clone, Debug, Serialize)]
pub struct RoomSummary {
    pub code: String,
    pub status: RoomStatus,
    pub seated: usize,
    pub spectators: usize,
}

/// Registry of live rooms: creation, lookup, eviction.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<String, RoomHandle>>,
    store: Arc<dyn RoomStore>,
    config: RoomConfig,
    evict_tx: mpsc::Sender<String>,
}

impl RoomRegistry {
    /// Build the registry and start its reaper task, which removes
    /// handles for actors that shut down (idle eviction, explicit close).
    pub fn new(store: Arc<dyn RoomStore>, config: RoomConfig) -> Arc<Self> {
        let (evict_tx, mut evict_rx) = mpsc::channel::<String>(32);
        let registry = Arc::new(Self {
            rooms: RwLock::new(HashMap::new()),
            store,
            config,
            evict_tx,
        });

        let reaper = Arc::downgrade(&registry);
        tokio::spawn(async move {
            while let Some(code) = evict_rx.recv().await {
                let Some(registry) = reaper.upgrade() else {
                    break;
                };
                registry.rooms.write().await.remove(&code);
                info!("room {code} evicted from registry");
            }
        });

        registry
    }

    /// Create a room of the requested kind and admit its host.
    pub async fn create_room(
        &self,
        kind: GameKind,
        host_nickname: Nickname,
    ) -> Result<(RoomHandle, JoinReply), GameError> {
        let code = self.unused_code().await;
        let session = GameSession::new(code.clone(), kind, self.config.settings.clone())?;
        let (actor, handle) = RoomActor::new(
            self.config.clone(),
            session,
            self.store.clone(),
            self.evict_tx.clone(),
        );

        self.rooms.write().await.insert(code.clone(), handle.clone());
        tokio::spawn(actor.run());

        if let Err(err) = self.store.save_room(&RoomRecord::created(&code, kind)).await {
            warn!("failed to persist new room {code}: {err}");
        }
        info!("room {code} created");

        let reply = handle.join(host_nickname).await?;
        Ok((handle, reply))
    }

    /// Look up a live room.
    pub async fn get(&self, code: &str) -> Option<RoomHandle> {
        self.rooms.read().await.get(code).cloned()
    }

    /// Admit a player into an existing room.
    pub async fn join_room(
        &self,
        code: &str,
        nickname: Nickname,
    ) -> Result<(RoomHandle, JoinReply), GameError> {
        let handle = self.get(code).await.ok_or(GameError::RoomNotFound)?;
        let reply = handle.join(nickname).await?;
        Ok((handle, reply))
    }

    /// Summaries of every live room.
    pub async fn list_rooms(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.read().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            // A room that closed mid-listing just drops out.
            if let Ok(snapshot) = handle.snapshot(None).await {
                summaries.push(RoomSummary {
                    code: snapshot.code,
                    status: snapshot.status,
                    seated: snapshot.seats.iter().filter(|s| s.is_some()).count(),
                    spectators: snapshot.spectators.len(),
                });
            }
        }
        summaries.sort_by(|a, b| a.code.cmp(&b.code));
        summaries
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Close a room and drop it from the table.
    pub async fn close_room(&self, code: &str) -> Result<(), GameError> {
        let handle = self.get(code).await.ok_or(GameError::RoomNotFound)?;
        handle.close().await?;
        self.rooms.write().await.remove(code);
        Ok(())
    }

    /// Generate a code colliding with neither a live room nor a stored
    /// one. The store check is best-effort: a dead store should not block
    /// room creation.
    async fn unused_code(&self) -> String {
        loop {
            let code = new_room_code();
            if self.rooms.read().await.contains_key(&code) {
                continue;
            }
            match self.store.load_room(&code).await {
                Ok(Some(_)) => continue,
                Ok(None) => return code,
                Err(err) => {
                    warn!("room code collision check failed: {err}");
                    return code;
                }
            }
        }
    }
}

/// Generate a short shareable room code.
fn new_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn room_codes_use_the_unambiguous_alphabet() {
        for _ in 0..100 {
            let code = new_room_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(code.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        }
    }
}

//! Room persistence contract and its implementations.
//!
//! Trait-based so the engine can run against Postgres in production and
//! an in-memory map in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Row};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::game::entities::{GameKind, RoomStatus};
use crate::net::events::RankEntry;

/// Errors from the storage collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The durable shape of a room: enough to list past games and block code
/// reuse, not a turn-by-turn journal.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RoomRecord {
    pub code: String,
    pub kind: GameKind,
    pub status: RoomStatus,
    pub player_count: usize,
    pub rankings: Vec<RankEntry>,
    pub updated_at: DateTime<Utc>,
}

impl RoomRecord {
    /// Record for a freshly created room.
    pub fn created(code: &str, kind: GameKind) -> Self {
        Self {
            code: code.to_string(),
            kind,
            status: RoomStatus::Waiting,
            player_count: 0,
            rankings: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Load/save contract consumed by the room layer.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Fetch a room record by code.
    async fn load_room(&self, code: &str) -> StoreResult<Option<RoomRecord>>;

    /// Insert or update a room record.
    async fn save_room(&self, record: &RoomRecord) -> StoreResult<()>;

    /// Drop a room record.
    async fn delete_room(&self, code: &str) -> StoreResult<()>;
}

/// Default PostgreSQL implementation of `RoomStore`.
///
/// Records live in a single `rooms` table with the serialized record in a
/// text column; the engine never queries inside it.
pub struct PgRoomStore {
    pool: PgPool,
}

impl PgRoomStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the backing table if missing.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS rooms (
                code TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                state TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl RoomStore for PgRoomStore {
    async fn load_room(&self, code: &str) -> StoreResult<Option<RoomRecord>> {
        let row = sqlx::query("SELECT state FROM rooms WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let state: String = row.get("state");
                Ok(Some(serde_json::from_str(&state)?))
            }
            None => Ok(None),
        }
    }

    async fn save_room(&self, record: &RoomRecord) -> StoreResult<()> {
        let state = serde_json::to_string(record)?;
        sqlx::query(
            r#"
            INSERT INTO rooms (code, status, state, updated_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO UPDATE
            SET status = EXCLUDED.status,
                state = EXCLUDED.state,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&record.code)
        .bind(record.status.to_string())
        .bind(state)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_room(&self, code: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM rooms WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// In-memory implementation of `RoomStore` for tests and storeless runs.
#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<String, RoomRecord>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn load_room(&self, code: &str) -> StoreResult<Option<RoomRecord>> {
        Ok(self.rooms.read().await.get(code).cloned())
    }

    async fn save_room(&self, record: &RoomRecord) -> StoreResult<()> {
        self.rooms
            .write()
            .await
            .insert(record.code.clone(), record.clone());
        Ok(())
    }

    async fn delete_room(&self, code: &str) -> StoreResult<()> {
        self.rooms.write().await.remove(code);
        Ok(())
    }
}

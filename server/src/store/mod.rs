//! Room persistence: the durable half of a room.
//!
//! DESIGN
//! ======
//! The room log is an ordered list of committed strokes per room. Engines
//! implement [`RoomStore`] and guarantee each call is atomic with respect to
//! other calls for the same room. Ephemeral state (live strokes, cursors)
//! never reaches this layer; see `state::LiveState`.
//!
//! ERROR HANDLING
//! ==============
//! Engines surface raw failures as [`StoreError`]. Retry policy lives with the
//! caller (`services::persistence::with_retry`), not in the engines.

mod memory;
mod postgres;

pub use memory::MemoryRoomStore;
pub use postgres::PgRoomStore;

use async_trait::async_trait;
use frames::model::{Room, Stroke};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result of appending a stroke to a room log.
#[derive(Debug, Clone, PartialEq)]
pub enum AppendOutcome {
    /// The stroke is now the tail of the log.
    Appended(Stroke),
    /// A stroke with the same id was already committed; the stored copy is returned.
    Duplicate(Stroke),
}

impl AppendOutcome {
    #[must_use]
    pub fn stroke(&self) -> &Stroke {
        match self {
            Self::Appended(s) | Self::Duplicate(s) => s,
        }
    }
}

/// Logical contract of the persistence collaborator.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Load a room's committed log, creating an empty room if absent.
    async fn find_or_create_room(&self, room_id: &str) -> Result<Room, StoreError>;

    /// Append a stroke at the tail. Idempotent on `stroke.id`.
    async fn append_stroke(&self, room_id: &str, stroke: &Stroke) -> Result<AppendOutcome, StoreError>;

    /// Remove and return the newest stroke owned by `owner`, if any.
    async fn remove_latest_stroke_by_owner(&self, room_id: &str, owner: &str) -> Result<Option<Stroke>, StoreError>;

    /// Empty a room's log.
    async fn reset_strokes(&self, room_id: &str) -> Result<(), StoreError>;
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod memory_test;

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "postgres_test.rs"]
mod postgres_test;

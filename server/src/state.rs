//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the room store and a registry of live rooms. Each room sits
//! behind its own mutex so rooms never contend with each other; the registry
//! lock is held only to look up or insert a room handle.
//!
//! Durable strokes live in the store (`frames::model::Room`). Everything in
//! [`LiveState`] is ephemeral and is dropped with the room.

use std::collections::HashMap;
use std::sync::Arc;

use frames::Frame;
use frames::model::{Cursor, Stroke};
use tokio::sync::{Mutex, RwLock, mpsc};
use uuid::Uuid;

use crate::config::{DEFAULT_CLIENT_CHANNEL_CAPACITY, PersistConfig};
use crate::store::RoomStore;

// =============================================================================
// LIVE STATE
// =============================================================================

/// In-flight stroke being broadcast before commit.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveStroke {
    pub owner: Uuid,
    pub stroke: Stroke,
}

/// Ephemeral per-room state. Never persisted.
#[derive(Debug, Default)]
pub struct LiveState {
    /// Strokes currently being drawn, keyed by stroke id.
    pub strokes: HashMap<String, LiveStroke>,
    /// Last cursor per connection. `None` means hidden.
    pub cursors: HashMap<Uuid, Option<Cursor>>,
}

impl LiveState {
    /// Drop a connection's cursor and live strokes. Returns the dropped stroke ids.
    pub fn remove_client(&mut self, client_id: Uuid) -> Vec<String> {
        self.cursors.remove(&client_id);
        let mut ids: Vec<String> = self
            .strokes
            .iter()
            .filter(|(_, live)| live.owner == client_id)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        for id in &ids {
            self.strokes.remove(id);
        }
        ids
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
        self.cursors.clear();
    }
}

// =============================================================================
// ROOM STATE
// =============================================================================

/// Per-room membership and live state.
#[derive(Debug, Default)]
pub struct RoomState {
    /// Connected clients: `client_id` -> sender for outgoing frames.
    pub clients: HashMap<Uuid, mpsc::Sender<Frame>>,
    pub live: LiveState,
    /// Set when the last member left. A closed handle is never reused.
    pub closed: bool,
    /// The room emptied but resetting its log failed; the next join retries it.
    pub reset_pending: bool,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

pub type RoomHandle = Arc<Mutex<RoomState>>;

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RoomStore>,
    pub rooms: Arc<RwLock<HashMap<String, RoomHandle>>>,
    pub persist: PersistConfig,
    pub client_channel_capacity: usize,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn RoomStore>, persist: PersistConfig) -> Self {
        Self {
            store,
            rooms: Arc::new(RwLock::new(HashMap::new())),
            persist,
            client_channel_capacity: DEFAULT_CLIENT_CHANNEL_CAPACITY,
        }
    }

    #[must_use]
    pub fn with_client_channel_capacity(mut self, capacity: usize) -> Self {
        self.client_channel_capacity = capacity.max(1);
        self
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

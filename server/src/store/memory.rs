//! In-process room store. Used when no database is configured and by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use frames::model::{Room, Stroke};
use tokio::sync::Mutex;

use super::{AppendOutcome, RoomStore, StoreError};

#[derive(Debug, Default)]
pub struct MemoryRoomStore {
    rooms: Mutex<HashMap<String, Vec<Stroke>>>,
}

impl MemoryRoomStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn find_or_create_room(&self, room_id: &str) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.lock().await;
        let strokes = rooms.entry(room_id.to_owned()).or_default().clone();
        Ok(Room { room_id: room_id.to_owned(), strokes })
    }

    async fn append_stroke(&self, room_id: &str, stroke: &Stroke) -> Result<AppendOutcome, StoreError> {
        let mut rooms = self.rooms.lock().await;
        let strokes = rooms.entry(room_id.to_owned()).or_default();
        if let Some(existing) = strokes.iter().find(|s| s.id == stroke.id) {
            return Ok(AppendOutcome::Duplicate(existing.clone()));
        }
        strokes.push(stroke.clone());
        Ok(AppendOutcome::Appended(stroke.clone()))
    }

    async fn remove_latest_stroke_by_owner(&self, room_id: &str, owner: &str) -> Result<Option<Stroke>, StoreError> {
        let mut rooms = self.rooms.lock().await;
        let Some(strokes) = rooms.get_mut(room_id) else {
            return Ok(None);
        };
        let Some(idx) = strokes.iter().rposition(|s| s.owner == owner) else {
            return Ok(None);
        };
        Ok(Some(strokes.remove(idx)))
    }

    async fn reset_strokes(&self, room_id: &str) -> Result<(), StoreError> {
        let mut rooms = self.rooms.lock().await;
        if let Some(strokes) = rooms.get_mut(room_id) {
            strokes.clear();
        }
        Ok(())
    }
}

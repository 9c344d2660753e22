//! Room service: membership lifecycle, the authoritative stroke log, and
//! live broadcast.
//!
//! DESIGN
//! ======
//! A room is created lazily on first join and reset when its membership drops
//! to zero. Every mutation (join, part, commit, undo, clear) runs to
//! completion under that room's mutex, store call included, so the log order
//! and the broadcast order are the same for every member.
//!
//! Live strokes and cursors are relayed best-effort and never persisted.
//!
//! ERROR HANDLING
//! ==============
//! Validation failures never mutate state. Store failures are retried by
//! `persistence::with_retry`; the final failure surfaces as a retryable
//! [`RoomError::Persistence`]. If resetting an emptied room fails, the room
//! stays registered with `reset_pending` so the next join retries the reset
//! before serving a snapshot.

use std::sync::Arc;

use frames::model::{Cursor, Point, Room, Stroke, StrokeError};
use frames::syscall::{
    CURSOR_REMOVE, CURSOR_UPDATE, KEY_CLIENT_ID, KEY_CURSOR, KEY_ID, KEY_IDS, KEY_POINT, KEY_STROKE, KEY_STROKES,
    ROOM_CLEAR, STROKE_ABANDON, STROKE_CONTINUE, STROKE_DRAW, STROKE_REMOVE, STROKE_START,
};
use frames::{Data, ErrorCode, FieldError, Frame};
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::persistence::with_retry;
use crate::state::{AppState, LiveStroke, RoomHandle, RoomState};
use crate::store::{AppendOutcome, StoreError};

/// Longest accepted room name.
pub const MAX_ROOM_ID_LEN: usize = 128;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Invalid room")]
    InvalidRoom,
    #[error("must join a room first")]
    NotJoined,
    #[error("Invalid draw: {0}")]
    InvalidStroke(#[from] StrokeError),
    #[error("stroke id already used by another member")]
    StrokeIdTaken,
    #[error(transparent)]
    Payload(#[from] FieldError),
    #[error("Nothing to undo")]
    NothingToUndo,
    #[error("{op} failed: {source}")]
    Persistence {
        op: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ErrorCode for RoomError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRoom | Self::InvalidStroke(_) | Self::StrokeIdTaken | Self::Payload(_) => "E_INVALID",
            Self::NotJoined => "E_NOT_JOINED",
            Self::NothingToUndo => "E_NOTHING_TO_UNDO",
            Self::Persistence { .. } => "E_PERSISTENCE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}

fn persistence(op: &'static str) -> impl FnOnce(StoreError) -> RoomError {
    move |source| RoomError::Persistence { op, source }
}

/// What happened to the room when a member left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartOutcome {
    /// The connection was not a member; nothing changed.
    NotMember,
    /// Others remain. Lists the departed member's abandoned live strokes.
    Departed { abandoned: Vec<String> },
    /// The last member left and the room log was reset.
    Reset,
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// `{stroke}` payload.
#[must_use]
pub fn stroke_data(stroke: &Stroke) -> Data {
    let mut data = Data::new();
    data.insert(KEY_STROKE.into(), serde_json::to_value(stroke).unwrap_or_default());
    data
}

/// `{strokes}` payload for a room snapshot.
#[must_use]
pub fn strokes_data(strokes: &[Stroke]) -> Data {
    let mut data = Data::new();
    data.insert(KEY_STROKES.into(), serde_json::to_value(strokes).unwrap_or_default());
    data
}

/// Trim and bound a client-supplied room name.
///
/// # Errors
///
/// Returns [`RoomError::InvalidRoom`] for empty or oversized names.
pub fn validate_room_id(raw: &str) -> Result<String, RoomError> {
    let room_id = raw.trim();
    if room_id.is_empty() || room_id.len() > MAX_ROOM_ID_LEN {
        return Err(RoomError::InvalidRoom);
    }
    Ok(room_id.to_owned())
}

// =============================================================================
// REGISTRY
// =============================================================================

async fn room_handle(state: &AppState, room_id: &str) -> Option<RoomHandle> {
    state.rooms.read().await.get(room_id).cloned()
}

async fn room_handle_or_insert(state: &AppState, room_id: &str) -> RoomHandle {
    if let Some(handle) = room_handle(state, room_id).await {
        return handle;
    }
    let mut rooms = state.rooms.write().await;
    rooms
        .entry(room_id.to_owned())
        .or_insert_with(|| Arc::new(Mutex::new(RoomState::new())))
        .clone()
}

/// Remove `handle` from the registry if it is still the current entry.
async fn evict(state: &AppState, room_id: &str, handle: &RoomHandle) {
    let mut rooms = state.rooms.write().await;
    if rooms.get(room_id).is_some_and(|current| Arc::ptr_eq(current, handle)) {
        rooms.remove(room_id);
        info!(%room_id, "evicted room from memory");
    }
}

/// Lock a room the client is a member of.
async fn lock_member(state: &AppState, room_id: &str, client_id: Uuid) -> Result<OwnedMutexGuard<RoomState>, RoomError> {
    let handle = room_handle(state, room_id).await.ok_or(RoomError::NotJoined)?;
    let room = handle.lock_owned().await;
    if room.closed || !room.clients.contains_key(&client_id) {
        return Err(RoomError::NotJoined);
    }
    Ok(room)
}

/// Best-effort fan-out. Full or closed client channels drop the frame.
fn broadcast(room: &RoomState, frame: &Frame, exclude: Option<Uuid>) {
    for (client_id, tx) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        if let Err(e) = tx.try_send(frame.clone()) {
            debug!(%client_id, syscall = %frame.syscall, error = %e, "broadcast dropped");
        }
    }
}

fn notice(syscall: &str, room_id: &str, data: Data) -> Frame {
    Frame::request(syscall, data).with_room_id(room_id)
}

// =============================================================================
// JOIN / PART
// =============================================================================

/// Join a room, creating it if needed. Returns the committed log.
///
/// Joining a room the client is already in refreshes its sender and
/// returns a fresh snapshot.
///
/// # Errors
///
/// Returns [`RoomError::Persistence`] if the log cannot be loaded.
pub async fn join_room(
    state: &AppState,
    room_id: &str,
    client_id: Uuid,
    tx: mpsc::Sender<Frame>,
) -> Result<Room, RoomError> {
    loop {
        let handle = room_handle_or_insert(state, room_id).await;
        let mut room = handle.lock().await;
        if room.closed {
            // Lost a race with the last member leaving; the registry now
            // holds a fresh entry (or none).
            continue;
        }

        if room.reset_pending {
            with_retry(state.persist, "reset_strokes", || state.store.reset_strokes(room_id))
                .await
                .map_err(persistence("Join"))?;
            room.reset_pending = false;
        }

        let snapshot = match with_retry(state.persist, "find_or_create_room", || {
            state.store.find_or_create_room(room_id)
        })
        .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => {
                if room.clients.is_empty() {
                    room.closed = true;
                    evict(state, room_id, &handle).await;
                }
                return Err(persistence("Join")(e));
            }
        };

        room.clients.insert(client_id, tx);
        info!(%room_id, %client_id, clients = room.clients.len(), strokes = snapshot.strokes.len(), "client joined room");
        return Ok(snapshot);
    }
}

/// Leave a room. The last member out resets the room log and evicts the
/// room; otherwise peers are told to drop the member's cursor and live
/// strokes.
///
/// # Errors
///
/// Returns [`RoomError::Persistence`] if the reset failed. The member has
/// still left; the reset is retried by the next join.
pub async fn part_room(state: &AppState, room_id: &str, client_id: Uuid) -> Result<PartOutcome, RoomError> {
    let Some(handle) = room_handle(state, room_id).await else {
        return Ok(PartOutcome::NotMember);
    };
    let mut room = handle.lock().await;
    if room.closed || room.clients.remove(&client_id).is_none() {
        return Ok(PartOutcome::NotMember);
    }

    let abandoned = room.live.remove_client(client_id);
    info!(%room_id, %client_id, remaining = room.clients.len(), "client left room");

    if room.clients.is_empty() {
        room.live.clear();
        if let Err(e) = with_retry(state.persist, "reset_strokes", || state.store.reset_strokes(room_id)).await {
            room.reset_pending = true;
            warn!(%room_id, "room emptied but reset failed; retrying on next join");
            return Err(persistence("Reset")(e));
        }
        room.closed = true;
        evict(state, room_id, &handle).await;
        info!(%room_id, "last member left; room reset");
        return Ok(PartOutcome::Reset);
    }

    let mut data = Data::new();
    data.insert(KEY_CLIENT_ID.into(), Value::String(client_id.to_string()));
    broadcast(&room, &notice(CURSOR_REMOVE, room_id, data.clone()), None);

    if !abandoned.is_empty() {
        data.insert(KEY_IDS.into(), serde_json::to_value(&abandoned).unwrap_or_default());
        broadcast(&room, &notice(STROKE_ABANDON, room_id, data), None);
    }

    Ok(PartOutcome::Departed { abandoned })
}

// =============================================================================
// LOG MUTATIONS
// =============================================================================

/// Commit a finished stroke to the room log.
///
/// The owner is overwritten with `client_id`. A new stroke is broadcast to
/// every other member as a `stroke:draw` done frame; a resent stroke id
/// (same owner) is re-acknowledged without a second append or broadcast.
///
/// # Errors
///
/// Validation, membership, id-collision, or persistence failures. None of
/// them mutate the log.
pub async fn commit_stroke(
    state: &AppState,
    room_id: &str,
    client_id: Uuid,
    req: &Frame,
    mut stroke: Stroke,
) -> Result<AppendOutcome, RoomError> {
    let owner = client_id.to_string();
    stroke.owner.clone_from(&owner);
    stroke.validate()?;

    let mut room = lock_member(state, room_id, client_id).await?;
    let outcome = with_retry(state.persist, "append_stroke", || state.store.append_stroke(room_id, &stroke))
        .await
        .map_err(persistence("Draw"))?;

    if room
        .live
        .strokes
        .get(&stroke.id)
        .is_some_and(|live| live.owner == client_id)
    {
        room.live.strokes.remove(&stroke.id);
    }

    match &outcome {
        AppendOutcome::Appended(committed) => {
            let mut peer = req.done_with(stroke_data(committed)).for_peers();
            peer.syscall = STROKE_DRAW.into();
            peer.room_id = Some(room_id.to_owned());
            broadcast(&room, &peer, Some(client_id));
            info!(%room_id, %client_id, stroke_id = %committed.id, points = committed.points.len(), "stroke committed");
        }
        AppendOutcome::Duplicate(existing) => {
            if existing.owner != owner {
                return Err(RoomError::StrokeIdTaken);
            }
            info!(%room_id, %client_id, stroke_id = %existing.id, "duplicate commit re-acknowledged");
        }
    }

    Ok(outcome)
}

/// Remove the requester's most recent stroke and tell every member.
///
/// # Errors
///
/// [`RoomError::NothingToUndo`] when the requester owns no stroke.
pub async fn undo_stroke(state: &AppState, room_id: &str, client_id: Uuid) -> Result<Stroke, RoomError> {
    let owner = client_id.to_string();
    let room = lock_member(state, room_id, client_id).await?;
    let removed = with_retry(state.persist, "remove_latest_stroke_by_owner", || {
        state.store.remove_latest_stroke_by_owner(room_id, &owner)
    })
    .await
    .map_err(persistence("Undo"))?;

    let Some(stroke) = removed else {
        return Err(RoomError::NothingToUndo);
    };

    let mut data = Data::new();
    data.insert(KEY_ID.into(), Value::String(stroke.id.clone()));
    broadcast(&room, &notice(STROKE_REMOVE, room_id, data), None);
    info!(%room_id, %client_id, stroke_id = %stroke.id, "stroke undone");
    Ok(stroke)
}

/// Empty the room log and all live state, then tell the other members.
///
/// # Errors
///
/// Membership or persistence failures.
pub async fn clear_room(state: &AppState, room_id: &str, client_id: Uuid) -> Result<(), RoomError> {
    let mut room = lock_member(state, room_id, client_id).await?;
    with_retry(state.persist, "reset_strokes", || state.store.reset_strokes(room_id))
        .await
        .map_err(persistence("Clear"))?;
    room.live.clear();
    broadcast(&room, &notice(ROOM_CLEAR, room_id, Data::new()), Some(client_id));
    info!(%room_id, %client_id, "room cleared");
    Ok(())
}

// =============================================================================
// LIVE RELAY
// =============================================================================

/// Start relaying an in-progress stroke to peers.
///
/// # Errors
///
/// Validation or membership failures, or a live id held by another member.
pub async fn start_live(state: &AppState, room_id: &str, client_id: Uuid, mut stroke: Stroke) -> Result<(), RoomError> {
    stroke.owner = client_id.to_string();
    stroke.validate()?;

    let mut room = lock_member(state, room_id, client_id).await?;
    if room
        .live
        .strokes
        .get(&stroke.id)
        .is_some_and(|live| live.owner != client_id)
    {
        return Err(RoomError::StrokeIdTaken);
    }

    broadcast(&room, &notice(STROKE_START, room_id, stroke_data(&stroke)), Some(client_id));
    room.live
        .strokes
        .insert(stroke.id.clone(), LiveStroke { owner: client_id, stroke });
    Ok(())
}

/// Append one point to the sender's live stroke and relay it.
///
/// Unknown ids are ignored: the stroke may have been cleared or committed.
///
/// # Errors
///
/// Non-finite or out-of-range points, or membership failures.
pub async fn continue_live(state: &AppState, room_id: &str, client_id: Uuid, id: &str, point: Point) -> Result<(), RoomError> {
    let mut room = lock_member(state, room_id, client_id).await?;
    let Some(live) = room.live.strokes.get_mut(id) else {
        return Ok(());
    };
    if live.owner != client_id {
        return Ok(());
    }
    if !point.is_finite() {
        return Err(StrokeError::NonFinitePoint(live.stroke.points.len()).into());
    }
    if !point.in_bounds() {
        return Err(StrokeError::PointOutOfRange(live.stroke.points.len()).into());
    }
    live.stroke.points.push(point);

    let mut data = Data::new();
    data.insert(KEY_ID.into(), Value::String(id.to_owned()));
    data.insert(KEY_POINT.into(), serde_json::to_value(point).unwrap_or_default());
    broadcast(&room, &notice(STROKE_CONTINUE, room_id, data), Some(client_id));
    Ok(())
}

/// Record and relay the sender's cursor. `None` hides it.
///
/// # Errors
///
/// Membership failures.
pub async fn move_cursor(state: &AppState, room_id: &str, client_id: Uuid, cursor: Option<Cursor>) -> Result<(), RoomError> {
    let mut room = lock_member(state, room_id, client_id).await?;

    let mut data = Data::new();
    data.insert(KEY_CLIENT_ID.into(), Value::String(client_id.to_string()));
    data.insert(KEY_CURSOR.into(), serde_json::to_value(&cursor).unwrap_or_default());
    broadcast(&room, &notice(CURSOR_UPDATE, room_id, data), Some(client_id));

    room.live.cursors.insert(client_id, cursor);
    Ok(())
}

#[cfg(test)]
#[path = "room_test.rs"]
mod tests;

//! Client session: room membership, local drawing, and the commit protocol.
//!
//! DESIGN
//! ======
//! The session is pure state plus a [`Transport`]. Inputs are pointer events,
//! toolbar actions, decoded server frames, and clock ticks; every input
//! returns the list of [`Change`]s the renderer must apply. Nothing here
//! touches a surface.
//!
//! STROKE LIFECYCLE
//! ================
//! `LocalDraft → LiveBroadcast → CommitPending → Committed`, or `Abandoned`.
//!
//! - pointer down creates the draft and sends `stroke:start`. Once that send
//!   succeeds the stroke is `LiveBroadcast`.
//! - pointer moves append stabilized points and send `stroke:continue`.
//! - pointer up sends `stroke:draw` with the whole stroke: `CommitPending`.
//! - the ack moves it into the committed list in one step.
//!
//! Pending commits carry a deadline. [`Session::tick`] resends an expired
//! commit under the same stroke id (the server acks duplicates without
//! re-appending) until [`COMMIT_MAX_ATTEMPTS`] sends have been made, then the
//! stroke is abandoned with an error notice. A retryable error reply resends
//! immediately under the same budget.

use std::collections::{HashMap, HashSet};

use frames::model::{Brush, Cursor, Point, Rgb, Stroke, Tool, MAX_STABILITY};
use frames::syscall::{
    CURSOR_MOVE, CURSOR_REMOVE, CURSOR_UPDATE, KEY_CLIENT_ID, KEY_CURSOR, KEY_ID, KEY_IDS, KEY_POINT, KEY_STROKE,
    KEY_STROKES, ROOM_CLEAR, ROOM_JOIN, ROOM_LEAVE, SESSION_CONNECTED, STROKE_ABANDON, STROKE_CONTINUE, STROKE_DRAW,
    STROKE_REDO, STROKE_REMOVE, STROKE_START, STROKE_UNDO,
};
use frames::{Data, FieldError, Frame, Status};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::consts::{
    COMMIT_MAX_ATTEMPTS, COMMIT_TIMEOUT_MS, DEFAULT_SIZE, DEFAULT_STABILITY, MAX_OPACITY, MAX_SIZE, MIN_OPACITY,
    MIN_SIZE,
};
use crate::stabilizer::Stabilizer;

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

// =============================================================================
// TRANSPORT
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound half of the connection.
pub trait Transport {
    /// Queue one frame for delivery.
    ///
    /// # Errors
    ///
    /// The frame could not be handed to the connection.
    fn send(&mut self, frame: Frame) -> Result<(), TransportError>;
}

/// Transport that buffers frames for the host to flush.
#[derive(Debug, Default)]
pub struct Outbox {
    frames: Vec<Frame>,
    closed: bool,
}

impl Outbox {
    #[must_use]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn drain(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }

    /// Refuse further sends until [`Outbox::reopen`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn reopen(&mut self) {
        self.closed = false;
    }
}

impl Transport for Outbox {
    fn send(&mut self, frame: Frame) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.frames.push(frame);
        Ok(())
    }
}

// =============================================================================
// TYPES
// =============================================================================

/// Toolbar state applied to new strokes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub tool: Tool,
    pub brush: Brush,
    pub color: Rgb,
    pub size: f64,
    pub opacity: f64,
    pub stability: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tool: Tool::Brush,
            brush: Brush::Pen,
            color: Rgb::BLACK,
            size: DEFAULT_SIZE,
            opacity: MAX_OPACITY,
            stability: DEFAULT_STABILITY,
        }
    }
}

impl Settings {
    /// Pull every slider back into its range. Non-finite values fall back to
    /// the defaults.
    #[must_use]
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let size = if self.size.is_finite() { self.size.clamp(MIN_SIZE, MAX_SIZE) } else { defaults.size };
        let opacity = if self.opacity.is_finite() {
            self.opacity.clamp(MIN_OPACITY, MAX_OPACITY)
        } else {
            defaults.opacity
        };
        Self { size, opacity, stability: self.stability.min(MAX_STABILITY), ..self }
    }
}

/// Name and color shown on this session's cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub color: Rgb,
}

impl Identity {
    /// `User<n>` with `n < 1000` and a random color.
    #[must_use]
    pub fn random() -> Self {
        let bytes = Uuid::new_v4().into_bytes();
        let n = u16::from_be_bytes([bytes[0], bytes[1]]) % 1000;
        Self { name: format!("User{n}"), color: Rgb::new(bytes[2], bytes[3], bytes[4]) }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokePhase {
    LocalDraft,
    LiveBroadcast,
    CommitPending,
    Committed,
    Abandoned,
}

/// User-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Info(String),
    Error(String),
}

/// What the renderer must do after an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// The committed list was replaced wholesale. Overlay state is gone.
    Snapshot,
    /// A stroke was appended to the committed list.
    Committed(Stroke),
    /// A stroke left the committed list.
    Removed(String),
    /// The room was wiped. Pending and local strokes survive.
    Cleared,
    LocalStarted(Stroke),
    LocalPoint(Point),
    /// The local stroke was sent for commit.
    LocalEnded,
    LocalAbandoned,
    /// A redone stroke was sent for commit.
    Pending(Stroke),
    PendingAbandoned(String),
    RemoteStarted(Stroke),
    RemotePoint { id: String, point: Point },
    RemoteAbandoned(Vec<String>),
    /// Every remote live stroke is gone.
    RemoteCleared,
    CursorsChanged,
}

struct Draft {
    stroke: Stroke,
    phase: StrokePhase,
    stabilizer: Stabilizer,
}

struct PendingCommit {
    stroke: Stroke,
    /// Ids of every request sent for this stroke, so late errors still match.
    request_ids: Vec<String>,
    attempts: u32,
    deadline: i64,
    redo: bool,
}

impl PendingCommit {
    fn syscall(&self) -> &'static str {
        if self.redo { STROKE_REDO } else { STROKE_DRAW }
    }
}

fn stroke_data(stroke: &Stroke) -> Data {
    let mut data = Data::new();
    data.insert(KEY_STROKE.into(), serde_json::to_value(stroke).unwrap_or_default());
    data
}

// =============================================================================
// SESSION
// =============================================================================

pub struct Session<T: Transport> {
    transport: T,
    client_id: Option<String>,
    room_id: Option<String>,
    identity: Identity,
    settings: Settings,
    strokes: Vec<Stroke>,
    redo: Vec<Stroke>,
    cursors: HashMap<String, Cursor>,
    draft: Option<Draft>,
    pending: Vec<PendingCommit>,
    abandoned: HashSet<String>,
    notices: Vec<Notice>,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self::with_identity(transport, Identity::random())
    }

    pub fn with_identity(transport: T, identity: Identity) -> Self {
        Self {
            transport,
            client_id: None,
            room_id: None,
            identity,
            settings: Settings::default(),
            strokes: Vec::new(),
            redo: Vec::new(),
            cursors: HashMap::new(),
            draft: None,
            pending: Vec::new(),
            abandoned: HashSet::new(),
            notices: Vec::new(),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Replace the toolbar state. Applies to the next stroke.
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.clamped();
    }

    /// Committed strokes in log order.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    #[must_use]
    pub fn cursors(&self) -> &HashMap<String, Cursor> {
        &self.cursors
    }

    /// The stroke under the pointer, if any.
    #[must_use]
    pub fn draft(&self) -> Option<&Stroke> {
        self.draft.as_ref().map(|d| &d.stroke)
    }

    pub fn pending(&self) -> impl Iterator<Item = &Stroke> {
        self.pending.iter().map(|p| &p.stroke)
    }

    #[must_use]
    pub fn phase(&self, id: &str) -> Option<StrokePhase> {
        if let Some(draft) = self.draft.as_ref().filter(|d| d.stroke.id == id) {
            return Some(draft.phase);
        }
        if self.pending.iter().any(|p| p.stroke.id == id) {
            return Some(StrokePhase::CommitPending);
        }
        if self.strokes.iter().any(|s| s.id == id) {
            return Some(StrokePhase::Committed);
        }
        self.abandoned.contains(id).then_some(StrokePhase::Abandoned)
    }

    /// True when this connection owns at least one committed stroke.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.client_id
            .as_deref()
            .is_some_and(|me| self.strokes.iter().any(|s| s.owner == me))
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // =========================================================================
    // ROOM
    // =========================================================================

    /// Join `room_id`, leaving local state for the previous room behind. The
    /// snapshot arrives as the `room:join` reply.
    pub fn join(&mut self, room_id: &str) -> Vec<Change> {
        let room_id = room_id.trim();
        let mut changes = self.drop_room_state();
        self.room_id = Some(room_id.to_owned());
        self.send(Frame::request(ROOM_JOIN, Data::new()).with_room_id(room_id));
        changes.push(Change::Snapshot);
        changes
    }

    pub fn leave(&mut self) -> Vec<Change> {
        let Some(room_id) = self.room_id.take() else {
            return Vec::new();
        };
        let mut changes = self.drop_room_state();
        self.send(Frame::request(ROOM_LEAVE, Data::new()).with_room_id(room_id));
        changes.push(Change::Snapshot);
        changes
    }

    pub fn undo(&mut self) {
        self.send_in_room(STROKE_UNDO, Data::new());
    }

    /// Resubmit the most recently undone stroke under a fresh id.
    pub fn redo(&mut self, now: i64) -> Vec<Change> {
        if self.room_id.is_none() {
            return Vec::new();
        }
        let Some(mut stroke) = self.redo.pop() else {
            self.notices.push(Notice::Info("Nothing to redo".into()));
            return Vec::new();
        };
        stroke.id = Uuid::new_v4().to_string();
        self.submit(stroke.clone(), true, now);
        vec![Change::Pending(stroke)]
    }

    pub fn clear(&mut self) {
        self.send_in_room(ROOM_CLEAR, Data::new());
    }

    // =========================================================================
    // POINTER
    // =========================================================================

    /// Start a stroke at `at`. Ignored outside a room or mid-stroke.
    pub fn pointer_down(&mut self, at: Point) -> Vec<Change> {
        if self.room_id.is_none() || self.draft.is_some() || !at.is_finite() {
            return Vec::new();
        }
        let s = self.settings;
        let stroke = Stroke {
            id: Uuid::new_v4().to_string(),
            owner: self.client_id.clone().unwrap_or_default(),
            points: vec![at],
            tool: s.tool,
            brush: s.brush,
            color: match s.tool {
                Tool::Brush => s.color,
                Tool::Eraser => Rgb::WHITE,
            },
            size: s.size,
            opacity: s.opacity,
            stability: s.stability,
        };

        let phase = if self.send_in_room(STROKE_START, stroke_data(&stroke)) {
            StrokePhase::LiveBroadcast
        } else {
            StrokePhase::LocalDraft
        };
        self.send_cursor(Some(at));
        self.draft = Some(Draft { stroke: stroke.clone(), phase, stabilizer: Stabilizer::new(s.stability, at) });
        vec![Change::LocalStarted(stroke)]
    }

    /// Move the cursor and, while drawing, append one stabilized point.
    pub fn pointer_move(&mut self, raw: Point) -> Vec<Change> {
        if !raw.is_finite() {
            return Vec::new();
        }
        self.send_cursor(Some(raw));
        let Some(draft) = self.draft.as_mut() else {
            return Vec::new();
        };
        let point = draft.stabilizer.push(raw);
        draft.stroke.points.push(point);
        let live = draft.phase == StrokePhase::LiveBroadcast;
        let id = draft.stroke.id.clone();

        if live {
            let mut data = Data::new();
            data.insert(KEY_ID.into(), Value::String(id));
            data.insert(KEY_POINT.into(), serde_json::to_value(point).unwrap_or_default());
            self.send_in_room(STROKE_CONTINUE, data);
        }
        vec![Change::LocalPoint(point)]
    }

    /// Finish the stroke and send it for commit.
    pub fn pointer_up(&mut self, now: i64) -> Vec<Change> {
        let Some(draft) = self.draft.take() else {
            return Vec::new();
        };
        if draft.stroke.points.is_empty() {
            return vec![Change::LocalAbandoned];
        }
        self.submit(draft.stroke, false, now);
        vec![Change::LocalEnded]
    }

    /// The pointer left the canvas: hide the cursor from peers.
    pub fn pointer_leave(&mut self) {
        self.send_cursor(None);
    }

    // =========================================================================
    // COMMIT TIMERS
    // =========================================================================

    /// Resend or abandon commits whose deadline has passed.
    pub fn tick(&mut self, now: i64) -> Vec<Change> {
        let expired: Vec<String> = self
            .pending
            .iter()
            .filter(|p| p.deadline <= now)
            .map(|p| p.stroke.id.clone())
            .collect();

        let mut changes = Vec::new();
        for id in expired {
            if !self.resend(&id, now) {
                changes.extend(self.abandon_pending(&id, "Stroke could not be saved"));
            }
        }
        changes
    }

    /// The connection dropped: every unacked stroke is abandoned and peer
    /// state is forgotten. The room is rejoined on the next welcome.
    pub fn on_disconnect(&mut self) -> Vec<Change> {
        self.client_id = None;
        let mut changes = Vec::new();
        if let Some(draft) = self.draft.take() {
            self.abandoned.insert(draft.stroke.id);
            changes.push(Change::LocalAbandoned);
        }
        for pending in std::mem::take(&mut self.pending) {
            changes.push(Change::PendingAbandoned(pending.stroke.id.clone()));
            self.abandoned.insert(pending.stroke.id);
        }
        self.cursors.clear();
        changes.push(Change::RemoteCleared);
        changes.push(Change::CursorsChanged);
        changes
    }

    // =========================================================================
    // INBOUND
    // =========================================================================

    /// Apply one server frame.
    pub fn on_frame(&mut self, frame: &Frame, now: i64) -> Vec<Change> {
        if frame.status == Status::Error {
            return self.on_error(frame, now);
        }

        match frame.syscall.as_str() {
            SESSION_CONNECTED => self.on_connected(frame),
            ROOM_JOIN if frame.status == Status::Done => self.on_snapshot(frame),
            ROOM_CLEAR => self.on_clear(),
            STROKE_START => self.on_remote_start(frame),
            STROKE_CONTINUE => match (frame.str_field(KEY_ID), frame.field::<Point>(KEY_POINT)) {
                (Some(id), Ok(point)) => vec![Change::RemotePoint { id: id.to_owned(), point }],
                _ => Vec::new(),
            },
            STROKE_ABANDON => match frame.field::<Vec<String>>(KEY_IDS) {
                Ok(ids) => vec![Change::RemoteAbandoned(ids)],
                Err(_) => Vec::new(),
            },
            STROKE_DRAW | STROKE_REDO if frame.status == Status::Done => self.on_committed(frame),
            STROKE_UNDO if frame.status == Status::Done => {
                if let Ok(stroke) = frame.field::<Stroke>(KEY_STROKE) {
                    self.redo.push(stroke);
                    self.notices.push(Notice::Info("Undo successful".into()));
                }
                Vec::new()
            }
            STROKE_REMOVE => self.on_removed(frame),
            CURSOR_UPDATE => self.on_cursor(frame),
            CURSOR_REMOVE => {
                let Some(id) = frame.str_field(KEY_CLIENT_ID) else {
                    return Vec::new();
                };
                if self.cursors.remove(id).is_some() { vec![Change::CursorsChanged] } else { Vec::new() }
            }
            _ => Vec::new(),
        }
    }

    fn on_connected(&mut self, frame: &Frame) -> Vec<Change> {
        self.client_id = frame.str_field(KEY_CLIENT_ID).map(str::to_owned);
        // Reconnect: rejoin the room we were in.
        match self.room_id.clone() {
            Some(room_id) => self.join(&room_id),
            None => Vec::new(),
        }
    }

    fn on_snapshot(&mut self, frame: &Frame) -> Vec<Change> {
        let Ok(strokes) = frame.field::<Vec<Stroke>>(KEY_STROKES) else {
            return Vec::new();
        };
        if let Some(room_id) = frame.room_id.as_deref() {
            if self.room_id.as_deref() != Some(room_id) {
                return Vec::new();
            }
        }
        let mut changes = self.drop_room_state();
        self.strokes = strokes;
        changes.push(Change::Snapshot);
        changes
    }

    fn on_clear(&mut self) -> Vec<Change> {
        self.strokes.clear();
        self.redo.clear();
        self.cursors.clear();
        self.notices.push(Notice::Info("Canvas cleared".into()));
        vec![Change::Cleared, Change::CursorsChanged]
    }

    fn on_remote_start(&mut self, frame: &Frame) -> Vec<Change> {
        let Ok(stroke) = frame.field::<Stroke>(KEY_STROKE) else {
            return Vec::new();
        };
        if self.client_id.as_deref() == Some(stroke.owner.as_str()) {
            return Vec::new();
        }
        vec![Change::RemoteStarted(stroke)]
    }

    fn on_committed(&mut self, frame: &Frame) -> Vec<Change> {
        let Ok(stroke) = frame.field::<Stroke>(KEY_STROKE) else {
            return Vec::new();
        };

        if frame.parent_id.is_some() {
            let acked = self.pending.iter().position(|p| p.stroke.id == stroke.id);
            if let Some(i) = acked {
                let pending = self.pending.remove(i);
                if !pending.redo {
                    self.redo.clear();
                }
            }
        }
        self.abandoned.remove(&stroke.id);

        // Duplicate acks and broadcasts for a stroke we already hold.
        if self.strokes.iter().any(|s| s.id == stroke.id) {
            return Vec::new();
        }
        self.strokes.push(stroke.clone());
        vec![Change::Committed(stroke)]
    }

    fn on_removed(&mut self, frame: &Frame) -> Vec<Change> {
        let Some(id) = frame.str_field(KEY_ID) else {
            return Vec::new();
        };
        let before = self.strokes.len();
        self.strokes.retain(|s| s.id != id);
        if self.strokes.len() == before {
            return Vec::new();
        }
        vec![Change::Removed(id.to_owned())]
    }

    fn on_cursor(&mut self, frame: &Frame) -> Vec<Change> {
        let Some(id) = frame.str_field(KEY_CLIENT_ID) else {
            return Vec::new();
        };
        match frame.field::<Cursor>(KEY_CURSOR) {
            Ok(cursor) => {
                self.cursors.insert(id.to_owned(), cursor);
            }
            Err(FieldError::Missing(_)) => {
                self.cursors.remove(id);
            }
            Err(FieldError::Invalid { .. }) => return Vec::new(),
        }
        vec![Change::CursorsChanged]
    }

    fn on_error(&mut self, frame: &Frame, now: i64) -> Vec<Change> {
        let message = frame.error_message().unwrap_or("Request failed").to_owned();
        let pending_id = frame.parent_id.as_deref().and_then(|parent| {
            self.pending
                .iter()
                .find(|p| p.request_ids.iter().any(|r| r == parent))
                .map(|p| p.stroke.id.clone())
        });

        let Some(id) = pending_id else {
            self.notices.push(Notice::Error(message));
            return Vec::new();
        };
        if frame.is_retryable() && self.resend(&id, now) {
            return Vec::new();
        }
        self.abandon_pending(&id, &message)
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    /// Hand a frame to the transport. Returns whether it was accepted.
    fn send(&mut self, frame: Frame) -> bool {
        self.transport.send(frame).is_ok()
    }

    fn send_in_room(&mut self, syscall: &str, data: Data) -> bool {
        let Some(room_id) = self.room_id.clone() else {
            return false;
        };
        self.send(Frame::request(syscall, data).with_room_id(room_id))
    }

    fn send_cursor(&mut self, at: Option<Point>) {
        let cursor = at.map(|p| Cursor {
            x: p.x,
            y: p.y,
            color: self.identity.color,
            name: self.identity.name.clone(),
            tool: self.settings.tool,
        });
        let mut data = Data::new();
        data.insert(KEY_CURSOR.into(), serde_json::to_value(cursor).unwrap_or_default());
        self.send_in_room(CURSOR_MOVE, data);
    }

    fn submit(&mut self, stroke: Stroke, redo: bool, now: i64) {
        let mut pending = PendingCommit { stroke, request_ids: Vec::new(), attempts: 0, deadline: now, redo };
        self.send_commit(&mut pending, now);
        self.pending.push(pending);
    }

    /// One more send for `pending`. A failed hand-off still uses up an attempt
    /// so a dead transport cannot keep a stroke pending forever.
    fn send_commit(&mut self, pending: &mut PendingCommit, now: i64) {
        let frame = Frame::request(pending.syscall(), stroke_data(&pending.stroke));
        let frame = match self.room_id.as_deref() {
            Some(room_id) => frame.with_room_id(room_id),
            None => frame,
        };
        pending.request_ids.push(frame.id.clone());
        pending.attempts += 1;
        pending.deadline = now + COMMIT_TIMEOUT_MS;
        self.send(frame);
    }

    /// Resend pending commit `id` if its attempt budget allows.
    fn resend(&mut self, id: &str, now: i64) -> bool {
        let Some(i) = self.pending.iter().position(|p| p.stroke.id == id) else {
            return false;
        };
        if self.pending[i].attempts >= COMMIT_MAX_ATTEMPTS {
            return false;
        }
        let mut pending = self.pending.remove(i);
        self.send_commit(&mut pending, now);
        self.pending.insert(i, pending);
        true
    }

    fn abandon_pending(&mut self, id: &str, message: &str) -> Vec<Change> {
        let before = self.pending.len();
        self.pending.retain(|p| p.stroke.id != id);
        if self.pending.len() == before {
            return Vec::new();
        }
        self.abandoned.insert(id.to_owned());
        self.notices.push(Notice::Error(message.to_owned()));
        vec![Change::PendingAbandoned(id.to_owned())]
    }

    /// Forget everything tied to the current room.
    fn drop_room_state(&mut self) -> Vec<Change> {
        let mut changes = Vec::new();
        if let Some(draft) = self.draft.take() {
            self.abandoned.insert(draft.stroke.id);
            changes.push(Change::LocalAbandoned);
        }
        for pending in std::mem::take(&mut self.pending) {
            self.abandoned.insert(pending.stroke.id);
        }
        self.strokes.clear();
        self.redo.clear();
        if !self.cursors.is_empty() {
            self.cursors.clear();
            changes.push(Change::CursorsChanged);
        }
        changes
    }
}

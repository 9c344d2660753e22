//! Syscall names and payload keys shared by server, canvas, and cli.

// ── Session ─────────────────────────────────────────────────────

/// Server → client welcome carrying the connection id.
pub const SESSION_CONNECTED: &str = "session:connected";
/// Server → client error for frames that could not be routed.
pub const GATEWAY_ERROR: &str = "gateway:error";

// ── Room ────────────────────────────────────────────────────────

/// Join (or create) a room. Done reply carries the stroke snapshot.
pub const ROOM_JOIN: &str = "room:join";
/// Explicit departure from the current room.
pub const ROOM_LEAVE: &str = "room:leave";
/// Wipe the room log and all live state.
pub const ROOM_CLEAR: &str = "room:clear";

// ── Stroke ──────────────────────────────────────────────────────

/// Begin live broadcast of a stroke (not persisted).
pub const STROKE_START: &str = "stroke:start";
/// Append one point to a live stroke (not persisted).
pub const STROKE_CONTINUE: &str = "stroke:continue";
/// Commit a finished stroke.
pub const STROKE_DRAW: &str = "stroke:draw";
/// Resubmit a previously undone stroke under a new id.
pub const STROKE_REDO: &str = "stroke:redo";
/// Remove the requester's most recent stroke.
pub const STROKE_UNDO: &str = "stroke:undo";
/// Server → room: a stroke left the log.
pub const STROKE_REMOVE: &str = "stroke:remove";
/// Server → peers: drop a departed connection's live strokes.
pub const STROKE_ABANDON: &str = "stroke:abandon";

// ── Cursor ──────────────────────────────────────────────────────

/// Client → server cursor position (or null to hide).
pub const CURSOR_MOVE: &str = "cursor:move";
/// Server → peers cursor change.
pub const CURSOR_UPDATE: &str = "cursor:update";
/// Server → peers: forget a departed connection's cursor.
pub const CURSOR_REMOVE: &str = "cursor:remove";

// ── Payload keys ────────────────────────────────────────────────

pub const KEY_CLIENT_ID: &str = "client_id";
pub const KEY_CURSOR: &str = "cursor";
pub const KEY_ID: &str = "id";
pub const KEY_IDS: &str = "ids";
pub const KEY_POINT: &str = "point";
pub const KEY_STROKE: &str = "stroke";
pub const KEY_STROKES: &str = "strokes";

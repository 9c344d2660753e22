//! WebSocket handler: bidirectional frame relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming binary frames → decode + dispatch by syscall prefix
//! - Broadcast frames from room peers → forward to client
//!
//! Handlers translate frames into `services::room` calls and return an
//! `Outcome`. The room service owns fan-out to peers; the dispatch layer owns
//! the reply to the sender.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. Dispatch turns the Outcome into a reply (or nothing)
//! 4. Close → part the current room (abandon notice or room reset)

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use frames::model::{Cursor, Point, Stroke};
use frames::syscall::{GATEWAY_ERROR, KEY_CLIENT_ID, KEY_CURSOR, KEY_ID, KEY_POINT, KEY_STROKE, SESSION_CONNECTED, STROKE_CONTINUE};
use frames::{CodecError, Data, ErrorCode, FRAME_CODE, FRAME_MESSAGE, FieldError, Frame, Status, decode_frame, encode_frame};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::room::{self, RoomError};
use crate::state::AppState;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions.
enum Outcome {
    /// Send done+data to sender.
    Reply(Data),
    /// Send empty done to sender.
    Done,
    /// Fire-and-forget request; nothing goes back to the sender.
    Silent,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum GatewayError {
    #[error("invalid frame: {0}")]
    Decode(#[from] CodecError),
    #[error("binary frames required")]
    TextFrame,
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
}

impl ErrorCode for GatewayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) | Self::TextFrame => "E_DECODE",
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
        }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast frames from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.client_channel_capacity);

    let welcome = Frame::request(SESSION_CONNECTED, Data::new()).with_data(KEY_CLIENT_ID, client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, "ws: client connected");

    // Track which room this client has joined.
    let mut current_room: Option<String> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                let replies = match msg {
                    Message::Binary(bytes) => {
                        process_inbound_bytes(&state, &mut current_room, client_id, &client_tx, &bytes).await
                    }
                    Message::Text(_) => vec![gateway_error(&GatewayError::TextFrame)],
                    Message::Close(_) => break,
                    _ => continue,
                };
                let mut sent = true;
                for frame in replies {
                    if send_frame(&mut socket, &frame).await.is_err() {
                        sent = false;
                        break;
                    }
                }
                if !sent {
                    break;
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(room_id) = current_room.take() {
        match room::part_room(&state, &room_id, client_id).await {
            Ok(outcome) => info!(%client_id, %room_id, ?outcome, "ws: parted room on disconnect"),
            Err(e) => warn!(%client_id, %room_id, error = %e, "ws: part on disconnect failed"),
        }
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode and process one inbound binary frame and return frames for the
/// sender.
///
/// Keeps websocket transport concerns out of frame handling so tests can
/// drive dispatch directly.
pub(crate) async fn process_inbound_bytes(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    bytes: &[u8],
) -> Vec<Frame> {
    let mut req = match decode_frame(bytes) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            return vec![gateway_error(&GatewayError::from(e))];
        }
    };

    if req.status != Status::Request {
        debug!(%client_id, syscall = %req.syscall, status = ?req.status, "ws: ignoring non-request frame");
        return vec![];
    }

    // Connection id is the only identity; clients cannot spoof it.
    req.from = Some(client_id.to_string());

    if !is_ephemeral(&req.syscall) {
        info!(%client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");
    }

    let result = match req.prefix() {
        "room" => handle_room(state, current_room, client_id, client_tx, &req).await,
        "stroke" => handle_stroke(state, current_room.as_deref(), client_id, &req).await,
        "cursor" => handle_cursor(state, current_room.as_deref(), client_id, &req).await,
        _ => Err(unknown_syscall(&req)),
    };

    match result {
        Ok(Outcome::Reply(data)) => vec![reply_in_room(req.done_with(data), current_room.as_deref())],
        Ok(Outcome::Done) => vec![reply_in_room(req.done(), current_room.as_deref())],
        Ok(Outcome::Silent) => vec![],
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// ROOM HANDLERS
// =============================================================================

async fn handle_room(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, Frame> {
    match req.op() {
        "join" => {
            let raw = req
                .room_id
                .as_deref()
                .or_else(|| req.str_field("room_id"))
                .unwrap_or_default();
            let room_id = room::validate_room_id(raw).map_err(|e| req.error_from(&e))?;

            // Part current room if switching.
            if let Some(old_room) = current_room.take_if(|old| *old != room_id) {
                if let Err(e) = room::part_room(state, &old_room, client_id).await {
                    warn!(%client_id, room_id = %old_room, error = %e, "ws: part before join failed");
                }
            }

            let snapshot = room::join_room(state, &room_id, client_id, client_tx.clone())
                .await
                .map_err(|e| req.error_from(&e))?;
            *current_room = Some(room_id);
            Ok(Outcome::Reply(room::strokes_data(&snapshot.strokes)))
        }
        "leave" => {
            if let Some(room_id) = current_room.take() {
                room::part_room(state, &room_id, client_id)
                    .await
                    .map_err(|e| req.error_from(&e))?;
            }
            Ok(Outcome::Done)
        }
        "clear" => {
            let room_id = joined(current_room.as_deref(), req)?;
            room::clear_room(state, room_id, client_id)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Done)
        }
        _ => Err(unknown_syscall(req)),
    }
}

// =============================================================================
// STROKE HANDLERS
// =============================================================================

async fn handle_stroke(
    state: &AppState,
    current_room: Option<&str>,
    client_id: Uuid,
    req: &Frame,
) -> Result<Outcome, Frame> {
    let room_id = joined(current_room, req)?;
    let fail = |e: RoomError| req.error_from(&e);

    match req.op() {
        "start" => {
            let stroke: Stroke = req.field(KEY_STROKE).map_err(|e| fail(e.into()))?;
            room::start_live(state, room_id, client_id, stroke).await.map_err(fail)?;
            Ok(Outcome::Silent)
        }
        "continue" => {
            let id: String = req.field(KEY_ID).map_err(|e| fail(e.into()))?;
            let point: Point = req.field(KEY_POINT).map_err(|e| fail(e.into()))?;
            room::continue_live(state, room_id, client_id, &id, point)
                .await
                .map_err(fail)?;
            Ok(Outcome::Silent)
        }
        // Redo is a fresh commit under a new id; peers see a plain draw.
        "draw" | "redo" => {
            let stroke: Stroke = req.field(KEY_STROKE).map_err(|e| fail(e.into()))?;
            let outcome = room::commit_stroke(state, room_id, client_id, req, stroke)
                .await
                .map_err(fail)?;
            Ok(Outcome::Reply(room::stroke_data(outcome.stroke())))
        }
        "undo" => {
            let removed = room::undo_stroke(state, room_id, client_id).await.map_err(fail)?;
            Ok(Outcome::Reply(room::stroke_data(&removed)))
        }
        _ => Err(unknown_syscall(req)),
    }
}

// =============================================================================
// CURSOR HANDLER
// =============================================================================

async fn handle_cursor(
    state: &AppState,
    current_room: Option<&str>,
    client_id: Uuid,
    req: &Frame,
) -> Result<Outcome, Frame> {
    // Silently ignore cursor moves before joining.
    let Some(room_id) = current_room else {
        return Ok(Outcome::Silent);
    };

    match req.op() {
        "move" => {
            let cursor = match req.field::<Cursor>(KEY_CURSOR) {
                Ok(cursor) => Some(cursor),
                Err(FieldError::Missing(_)) => None,
                Err(e) => return Err(req.error_from(&RoomError::from(e))),
            };
            room::move_cursor(state, room_id, client_id, cursor)
                .await
                .map_err(|e| req.error_from(&e))?;
            Ok(Outcome::Silent)
        }
        _ => Err(unknown_syscall(req)),
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn joined<'a>(current_room: Option<&'a str>, req: &Frame) -> Result<&'a str, Frame> {
    current_room.ok_or_else(|| req.error_from(&RoomError::NotJoined))
}

fn unknown_syscall(req: &Frame) -> Frame {
    req.error_from(&GatewayError::UnknownSyscall(req.syscall.clone()))
}

fn gateway_error(err: &GatewayError) -> Frame {
    let mut frame = Frame::request(GATEWAY_ERROR, Data::new()).error_from(err);
    frame.parent_id = None;
    frame
}

fn reply_in_room(mut frame: Frame, current_room: Option<&str>) -> Frame {
    if frame.room_id.is_none() {
        frame.room_id = current_room.map(str::to_owned);
    }
    frame
}

/// Cursor and point traffic is too chatty to log per frame.
fn is_ephemeral(syscall: &str) -> bool {
    syscall.starts_with("cursor:") || syscall == STROKE_CONTINUE
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    if !is_ephemeral(&frame.syscall) {
        if frame.status == Status::Error {
            let code = frame.str_field(FRAME_CODE).unwrap_or("-");
            let message = frame.str_field(FRAME_MESSAGE).unwrap_or("-");
            warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
        } else {
            info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
        }
    }
    socket.send(Message::Binary(encode_frame(frame).into())).await
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use frames::model::{Brush, MAX_STABILITY, Point, Rgb, Stroke, StrokeError, Tool};
use frames::syscall::{
    KEY_ID, KEY_POINT, KEY_STROKE, KEY_STROKES, ROOM_CLEAR, ROOM_JOIN, SESSION_CONNECTED, STROKE_CONTINUE,
    STROKE_DRAW, STROKE_START, STROKE_UNDO,
};
use frames::{Data, Frame, Status};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use uuid::Uuid;

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket connect failed: {0}")]
    WsConnect(Box<tokio_tungstenite::tungstenite::Error>),
    #[error("websocket closed")]
    WsClosed,
    #[error("frame decode failed: {0}")]
    Decode(#[from] frames::CodecError),
    #[error("timed out waiting for websocket frame")]
    Timeout,
    #[error("server returned error for {syscall}: {message}")]
    ServerError { syscall: String, message: String },
    #[error("invalid point {0:?}: expected x,y")]
    InvalidPoint(String),
    #[error("invalid stroke: {0}")]
    InvalidStroke(#[from] StrokeError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for CliError {
    fn from(error: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WsConnect(Box::new(error))
    }
}

#[derive(Parser, Debug)]
#[command(name = "shared-ink", about = "Shared Ink room and websocket CLI")]
struct Cli {
    #[arg(long, env = "SHARED_INK_BASE_URL", default_value = "http://127.0.0.1:3000")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server is up.
    Ping,
    /// Print the committed strokes of a room.
    Snapshot(RoomArgs),
    /// Stream a stroke into a room and wait for it to commit.
    Draw(DrawArgs),
    /// Remove the newest stroke this connection may undo.
    Undo(RoomArgs),
    /// Wipe a room's history.
    Clear(RoomArgs),
    /// Print every frame the room sends as JSON lines.
    Watch(RoomArgs),
}

#[derive(Args, Debug)]
struct RoomArgs {
    #[arg(long)]
    room: String,
}

#[derive(Args, Debug)]
struct DrawArgs {
    #[arg(long)]
    room: String,
    /// Space-separated `x,y` pairs.
    #[arg(long)]
    points: String,
    #[arg(long, value_enum, default_value_t = BrushArg::Pen)]
    brush: BrushArg,
    #[arg(long, value_enum, default_value_t = ToolArg::Brush)]
    tool: ToolArg,
    #[arg(long, default_value = "#000000")]
    color: Rgb,
    #[arg(long, default_value_t = 12.0)]
    size: f64,
    #[arg(long, default_value_t = 1.0)]
    opacity: f64,
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(0..=i64::from(MAX_STABILITY)))]
    stability: u8,
    /// Pause between streamed points.
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum BrushArg {
    Pen,
    Highlighter,
    Airbrush,
}

impl From<BrushArg> for Brush {
    fn from(value: BrushArg) -> Self {
        match value {
            BrushArg::Pen => Self::Pen,
            BrushArg::Highlighter => Self::Highlighter,
            BrushArg::Airbrush => Self::Airbrush,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ToolArg {
    Brush,
    Eraser,
}

impl From<ToolArg> for Tool {
    fn from(value: ToolArg) -> Self {
        match value {
            ToolArg::Brush => Self::Brush,
            ToolArg::Eraser => Self::Eraser,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli).await {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let base_url = cli.base_url;
    match cli.command {
        Command::Ping => run_ping(&base_url).await,
        Command::Snapshot(args) => run_snapshot(&base_url, &args.room).await,
        Command::Draw(args) => run_draw(&base_url, args).await,
        Command::Undo(args) => run_undo(&base_url, &args.room).await,
        Command::Clear(args) => run_clear(&base_url, &args.room).await,
        Command::Watch(args) => run_watch(&base_url, &args.room).await,
    }
}

async fn run_ping(base_url: &str) -> Result<(), CliError> {
    let url = format!("{}/healthz", base_url.trim_end_matches('/'));
    let response = reqwest::get(&url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError {
            syscall: format!("HTTP {}", status.as_u16()),
            message: format!("GET {url}"),
        });
    }
    println!("ok");
    Ok(())
}

async fn run_snapshot(base_url: &str, room: &str) -> Result<(), CliError> {
    let (_stream, snapshot) = join_room(base_url, room).await?;
    let strokes = snapshot
        .data
        .get(KEY_STROKES)
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()));
    print_json(&strokes)
}

async fn run_draw(base_url: &str, args: DrawArgs) -> Result<(), CliError> {
    let points = parse_points(&args.points)?;
    let stroke = Stroke {
        id: Uuid::new_v4().to_string(),
        owner: String::new(),
        points,
        tool: args.tool.into(),
        brush: args.brush.into(),
        color: if args.tool == ToolArg::Eraser { Rgb::WHITE } else { args.color },
        size: args.size,
        opacity: args.opacity,
        stability: args.stability,
    };
    stroke.validate()?;

    let (mut stream, _) = join_room(base_url, &args.room).await?;

    let first = Stroke { points: stroke.points[..1].to_vec(), ..stroke.clone() };
    send_frame(&mut stream, &room_frame(STROKE_START, &args.room, stroke_data(&first)?)).await?;
    for point in &stroke.points[1..] {
        if args.interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(args.interval_ms)).await;
        }
        let mut data = Data::new();
        data.insert(KEY_ID.to_owned(), Value::String(stroke.id.clone()));
        data.insert(KEY_POINT.to_owned(), serde_json::to_value(point)?);
        send_frame(&mut stream, &room_frame(STROKE_CONTINUE, &args.room, data)).await?;
    }

    let commit = room_frame(STROKE_DRAW, &args.room, stroke_data(&stroke)?);
    send_frame(&mut stream, &commit).await?;
    let ack = wait_for_terminal_response(&mut stream, &commit.id, STROKE_DRAW).await?;

    eprintln!(
        "committed stroke: room={} id={} points={}",
        args.room,
        stroke.id,
        stroke.points.len()
    );
    print_json(&Value::Object(ack.data))
}

async fn run_undo(base_url: &str, room: &str) -> Result<(), CliError> {
    let (mut stream, _) = join_room(base_url, room).await?;
    let undo = room_frame(STROKE_UNDO, room, Data::new());
    send_frame(&mut stream, &undo).await?;
    let removed = wait_for_terminal_response(&mut stream, &undo.id, STROKE_UNDO).await?;
    print_json(&Value::Object(removed.data))
}

async fn run_clear(base_url: &str, room: &str) -> Result<(), CliError> {
    let (mut stream, _) = join_room(base_url, room).await?;
    let clear = room_frame(ROOM_CLEAR, room, Data::new());
    send_frame(&mut stream, &clear).await?;
    wait_for_terminal_response(&mut stream, &clear.id, ROOM_CLEAR).await?;
    eprintln!("cleared room: {room}");
    Ok(())
}

async fn run_watch(base_url: &str, room: &str) -> Result<(), CliError> {
    let (mut stream, snapshot) = join_room(base_url, room).await?;
    print_line(&snapshot)?;
    loop {
        match next_frame(&mut stream).await {
            Ok(frame) => print_line(&frame)?,
            Err(CliError::WsClosed) => {
                eprintln!("connection closed");
                return Ok(());
            }
            Err(error) => return Err(error),
        }
    }
}

// =============================================================================
// WEBSOCKET
// =============================================================================

/// Connect, wait for the welcome frame, and join `room`.
///
/// Returns the open stream and the join reply carrying the snapshot.
async fn join_room(base_url: &str, room: &str) -> Result<(WsStream, Frame), CliError> {
    let (mut stream, _) = connect_async(ws_url(base_url)?).await?;
    wait_for_session_connected(&mut stream).await?;

    let join = room_frame(ROOM_JOIN, room, Data::new());
    send_frame(&mut stream, &join).await?;
    let snapshot = wait_for_terminal_response(&mut stream, &join.id, ROOM_JOIN).await?;
    Ok((stream, snapshot))
}

fn ws_url(base_url: &str) -> Result<String, CliError> {
    let base = base_url.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("http://") {
        return Ok(format!("ws://{rest}/api/ws"));
    }
    if let Some(rest) = base.strip_prefix("https://") {
        return Ok(format!("wss://{rest}/api/ws"));
    }

    Err(CliError::InvalidBaseUrl(base_url.to_owned()))
}

async fn send_frame(stream: &mut WsStream, frame: &Frame) -> Result<(), CliError> {
    stream
        .send(Message::Binary(frames::encode_frame(frame).into()))
        .await?;
    Ok(())
}

async fn wait_for_session_connected(stream: &mut WsStream) -> Result<(), CliError> {
    loop {
        let frame = recv_next(stream, Duration::from_secs(5)).await?;
        if frame.syscall == SESSION_CONNECTED {
            return Ok(());
        }
    }
}

async fn wait_for_terminal_response(
    stream: &mut WsStream,
    request_id: &str,
    syscall: &str,
) -> Result<Frame, CliError> {
    loop {
        let frame = recv_next(stream, Duration::from_secs(15)).await?;
        if frame.parent_id.as_deref() != Some(request_id) {
            continue;
        }
        if frame.syscall != syscall {
            continue;
        }
        if !frame.status.is_terminal() {
            continue;
        }
        if frame.status == Status::Error {
            return Err(CliError::ServerError {
                message: frame
                    .error_message()
                    .unwrap_or("unknown websocket error")
                    .to_owned(),
                syscall: frame.syscall,
            });
        }
        return Ok(frame);
    }
}

async fn recv_next(stream: &mut WsStream, timeout: Duration) -> Result<Frame, CliError> {
    tokio::time::timeout(timeout, next_frame(stream))
        .await
        .map_err(|_| CliError::Timeout)?
}

async fn next_frame(stream: &mut WsStream) -> Result<Frame, CliError> {
    loop {
        let Some(message) = stream.next().await else {
            return Err(CliError::WsClosed);
        };
        match message? {
            Message::Binary(bytes) => return frames::decode_frame(&bytes).map_err(CliError::from),
            Message::Close(_) => return Err(CliError::WsClosed),
            _ => {}
        }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn room_frame(syscall: &str, room: &str, data: Data) -> Frame {
    Frame::request(syscall, data).with_room_id(room)
}

fn stroke_data(stroke: &Stroke) -> Result<Data, CliError> {
    let mut data = Data::new();
    data.insert(KEY_STROKE.to_owned(), serde_json::to_value(stroke)?);
    Ok(data)
}

/// Parse `"x,y x,y ..."` into points.
fn parse_points(raw: &str) -> Result<Vec<Point>, CliError> {
    raw.split_whitespace()
        .map(|pair| {
            let invalid = || CliError::InvalidPoint(pair.to_owned());
            let (x, y) = pair.split_once(',').ok_or_else(invalid)?;
            let x = x.trim().parse::<f64>().map_err(|_| invalid())?;
            let y = y.trim().parse::<f64>().map_err(|_| invalid())?;
            let point = Point::new(x, y);
            if point.is_finite() { Ok(point) } else { Err(invalid()) }
        })
        .collect()
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

fn print_line(frame: &Frame) -> Result<(), CliError> {
    let rendered = serde_json::to_string(frame)?;
    println!("{rendered}");
    Ok(())
}

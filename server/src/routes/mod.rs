//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! The server exposes exactly two endpoints: the websocket that carries the
//! whole drawing protocol and a liveness probe. Static hosting of the drawing
//! client is left to whatever sits in front of this process.

pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

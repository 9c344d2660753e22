//! Domain services used by the websocket route.
//!
//! ARCHITECTURE
//! ============
//! Service modules own room semantics and persistence concerns so the route
//! handler can stay focused on frame translation.

pub mod persistence;
pub mod room;

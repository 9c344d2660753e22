//! Drawing client engine for Shared Ink.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! client side of a room: turning pointer input into stabilized strokes,
//! speaking the frame protocol to the server, and rendering committed and
//! live strokes onto layered canvases. The host JavaScript layer only wires
//! DOM events and the websocket to [`engine::Engine`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`session`] | Room membership, stroke lifecycle, and commit retries |
//! | [`overlay`] | Live and pending stroke layers and presentation order |
//! | [`render`] | Brush dispatch and the airbrush tip cache |
//! | [`curve`] | Catmull-Rom segments, incremental emission, airbrush stamps |
//! | [`stabilizer`] | Pointer smoothing |
//! | [`surface`] | Raster surface trait |
//! | [`raster`] | `tiny-skia` surface for tests and headless hosts |
//! | [`web`] | Browser `<canvas>` surface |
//! | [`consts`] | Brush defaults, slider ranges, and commit timing |

pub mod consts;
pub mod curve;
pub mod engine;
pub mod overlay;
pub mod raster;
pub mod render;
pub mod session;
pub mod stabilizer;
pub mod surface;
pub mod web;

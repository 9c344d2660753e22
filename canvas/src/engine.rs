use frames::model::Point;
use frames::{CodecError, Frame, decode_frame, encode_frame, now_ms};
use web_sys::HtmlCanvasElement;

use crate::overlay::Overlay;
use crate::render::{Layer, StrokeRenderer};
use crate::session::{Change, Notice, Outbox, Session, Settings, Transport};
use crate::surface::{RenderError, Surface};
use crate::web::WebSurface;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Decode(#[from] CodecError),
}

/// Core engine state: the session wired to the committed raster and the
/// overlay.
///
/// Generic over transport and surface so it can be tested without a browser.
pub struct EngineCore<T: Transport, S: Surface> {
    pub session: Session<T>,
    overlay: Overlay<S>,
    committed: S,
    renderer: StrokeRenderer<S>,
    dirty: bool,
}

impl<T: Transport, S: Surface> EngineCore<T, S> {
    /// All five surfaces must be the same size and empty.
    pub fn new(session: Session<T>, committed: S, ink: S, tint: S, mask: S, local: S) -> Self {
        Self {
            session,
            overlay: Overlay::new(ink, tint, mask, local),
            committed,
            renderer: StrokeRenderer::new(),
            dirty: true,
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn committed(&self) -> &S {
        &self.committed
    }

    #[must_use]
    pub fn overlay(&self) -> &Overlay<S> {
        &self.overlay
    }

    /// True when something changed since the last [`EngineCore::present`].
    #[must_use]
    pub fn needs_render(&self) -> bool {
        self.dirty
    }

    // --- Inputs ---

    /// # Errors
    ///
    /// Surface failure while applying the frame.
    pub fn on_frame(&mut self, frame: &Frame, now: i64) -> Result<(), RenderError> {
        let changes = self.session.on_frame(frame, now);
        self.apply(changes)
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn pointer_down(&mut self, at: Point) -> Result<(), RenderError> {
        let changes = self.session.pointer_down(at);
        self.apply(changes)
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn pointer_move(&mut self, at: Point) -> Result<(), RenderError> {
        let changes = self.session.pointer_move(at);
        self.apply(changes)
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn pointer_up(&mut self, now: i64) -> Result<(), RenderError> {
        let changes = self.session.pointer_up(now);
        self.apply(changes)
    }

    pub fn pointer_leave(&mut self) {
        self.session.pointer_leave();
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn join(&mut self, room_id: &str) -> Result<(), RenderError> {
        let changes = self.session.join(room_id);
        self.apply(changes)
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn leave(&mut self) -> Result<(), RenderError> {
        let changes = self.session.leave();
        self.apply(changes)
    }

    pub fn undo(&mut self) {
        self.session.undo();
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn redo(&mut self, now: i64) -> Result<(), RenderError> {
        let changes = self.session.redo(now);
        self.apply(changes)
    }

    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn tick(&mut self, now: i64) -> Result<(), RenderError> {
        let changes = self.session.tick(now);
        self.apply(changes)
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn on_disconnect(&mut self) -> Result<(), RenderError> {
        let changes = self.session.on_disconnect();
        self.apply(changes)
    }

    // --- Rendering ---

    /// Resize every layer with `resize`, then repaint them all.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn resize_layers(&mut self, mut resize: impl FnMut(&mut S) -> Result<(), RenderError>) -> Result<(), RenderError> {
        resize(&mut self.committed)?;
        for layer in self.overlay.layers_mut() {
            resize(layer)?;
        }
        let committed = self.redraw_committed();
        let overlay = self.overlay.redraw();
        self.dirty = true;
        committed.and(overlay)
    }

    /// Composite the current picture onto `target`.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn present(&mut self, target: &mut S) -> Result<(), RenderError> {
        self.overlay.present(&self.committed, target)?;
        self.dirty = false;
        Ok(())
    }

    /// Apply every change even when one fails to render; the session state
    /// has already moved on. Returns the first failure.
    fn apply(&mut self, changes: Vec<Change>) -> Result<(), RenderError> {
        let mut first_err = None;
        for change in changes {
            if let Err(err) = self.apply_one(change) {
                first_err.get_or_insert(err);
            }
            self.dirty = true;
        }
        first_err.map_or(Ok(()), Err)
    }

    fn apply_one(&mut self, change: Change) -> Result<(), RenderError> {
        match change {
            Change::Snapshot => {
                let overlay = self.overlay.reset();
                self.redraw_committed().and(overlay)
            }
            Change::Committed(stroke) => {
                let overlay = self.overlay.remove(&stroke.id);
                self.renderer
                    .draw(&mut self.committed, &stroke, Layer::Committed)
                    .and(overlay)
            }
            Change::Removed(_) => self.redraw_committed(),
            Change::Cleared => {
                self.overlay.clear_remote()?;
                self.committed.clear()
            }
            Change::LocalStarted(stroke) => self.overlay.begin_local(stroke),
            Change::LocalPoint(point) => self.overlay.extend_local(point),
            Change::LocalEnded => self.overlay.end_local().map(|_| ()),
            Change::LocalAbandoned => self.overlay.discard_local(),
            Change::Pending(stroke) => self.overlay.add_pending(stroke),
            Change::PendingAbandoned(id) => self.overlay.remove(&id),
            Change::RemoteStarted(stroke) => self.overlay.remote_start(stroke),
            Change::RemotePoint { id, point } => self.overlay.remote_point(&id, point),
            Change::RemoteAbandoned(ids) => self.overlay.remote_abandon(&ids),
            Change::RemoteCleared => self.overlay.clear_remote(),
            Change::CursorsChanged => Ok(()),
        }
    }

    /// Repaint the committed raster from the session's log. A stroke that
    /// fails to draw is skipped; the first failure is returned.
    fn redraw_committed(&mut self) -> Result<(), RenderError> {
        self.committed.clear()?;
        let mut first_err = None;
        for stroke in self.session.strokes() {
            if let Err(err) = self.renderer.draw(&mut self.committed, stroke, Layer::Committed) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// The browser engine. Wraps `EngineCore` and owns the on-page canvas.
///
/// The host feeds it websocket bytes and pointer events, flushes
/// [`Engine::take_outgoing`] to the socket, and calls [`Engine::render`]
/// once per animation frame.
pub struct Engine {
    view: WebSurface,
    pub core: EngineCore<Outbox, WebSurface>,
}

impl Engine {
    /// Bind to `canvas`, allocating the off-screen layers at its size.
    ///
    /// # Errors
    ///
    /// The canvas has no 2D context, or layer allocation failed.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
        let view = WebSurface::from_canvas(canvas)?;
        let core = EngineCore::new(
            Session::new(Outbox::default()),
            view.offscreen_like()?,
            view.offscreen_like()?,
            view.offscreen_like()?,
            view.offscreen_like()?,
            view.offscreen_like()?,
        );
        Ok(Self { view, core })
    }

    /// Resize the view and every layer to `css_w × css_h` at `dpr`.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn resize(&mut self, css_w: f64, css_h: f64, dpr: f64) -> Result<(), RenderError> {
        self.view.resize(css_w, css_h, dpr)?;
        self.core.resize_layers(|layer| layer.resize(css_w, css_h, dpr))
    }

    /// Apply one binary websocket message.
    ///
    /// # Errors
    ///
    /// Undecodable bytes or surface failure.
    pub fn on_bytes(&mut self, bytes: &[u8]) -> Result<(), EngineError> {
        let frame = decode_frame(bytes)?;
        self.core.on_frame(&frame, now_ms())?;
        Ok(())
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn on_close(&mut self) -> Result<(), RenderError> {
        self.core.on_disconnect()
    }

    /// Encoded frames waiting to be written to the socket.
    pub fn take_outgoing(&mut self) -> Vec<Vec<u8>> {
        self.core
            .session
            .transport_mut()
            .drain()
            .iter()
            .map(encode_frame)
            .collect()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.core.session.take_notices()
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.core.session.set_settings(settings);
    }

    // --- Delegated inputs ---

    /// # Errors
    ///
    /// Surface failure.
    pub fn join(&mut self, room_id: &str) -> Result<(), RenderError> {
        self.core.join(room_id)
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn leave(&mut self) -> Result<(), RenderError> {
        self.core.leave()
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn on_pointer_down(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        self.core.pointer_down(Point::new(x, y))
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> Result<(), RenderError> {
        self.core.pointer_move(Point::new(x, y))
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn on_pointer_up(&mut self) -> Result<(), RenderError> {
        self.core.pointer_up(now_ms())
    }

    pub fn on_pointer_leave(&mut self) {
        self.core.pointer_leave();
    }

    pub fn undo(&mut self) {
        self.core.undo();
    }

    /// # Errors
    ///
    /// Surface failure.
    pub fn redo(&mut self) -> Result<(), RenderError> {
        self.core.redo(now_ms())
    }

    pub fn clear(&mut self) {
        self.core.clear();
    }

    /// Drive commit timeouts. Call on an interval.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn tick(&mut self) -> Result<(), RenderError> {
        self.core.tick(now_ms())
    }

    // --- Render ---

    /// Draw the current picture to the on-page canvas if anything changed.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn render(&mut self) -> Result<(), RenderError> {
        if !self.core.needs_render() {
            return Ok(());
        }
        self.core.present(&mut self.view)
    }
}

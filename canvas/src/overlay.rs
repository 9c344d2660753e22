//! Live overlay compositor.
//!
//! Four layers sit above the committed raster:
//!
//! - **ink**: remote live strokes and local strokes awaiting their commit ack.
//! - **tint**: the highlighters among those, multiplied onto what is below.
//! - **mask**: the eraser strokes among those, painted white.
//! - **local**: the stroke under the pointer right now.
//!
//! Ink, tint and mask are cleared and fully repainted whenever the set of
//! strokes on them changes or a remote stroke grows. The local layer grows
//! only when a segment settles (or new airbrush stamps arrive). Path brushes
//! re-stroke the whole settled prefix as one path so joins match the finished
//! stroke; airbrush stamps are only ever added.
//!
//! [`Overlay::present`] stacks everything onto a target surface:
//! committed → mask (destination-out) → local eraser (destination-out) →
//! ink → tint (multiply) → local brush at its alpha and blend.

use frames::model::{Brush, Point, Stroke};

use crate::curve::{Bezier, IncrementalPath, airbrush_stamps, stamps_between};
use crate::render::{Layer, StrokeRenderer, local_composite};
use crate::surface::{Blend, RenderError, Surface};

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

struct LocalStroke {
    stroke: Stroke,
    path: IncrementalPath,
    /// Path-brush segments settled so far.
    settled: Vec<Bezier>,
}

impl LocalStroke {
    fn new(stroke: Stroke) -> Self {
        let mut path = IncrementalPath::new(stroke.stability);
        let settled = path.settled(&stroke.points);
        Self { stroke, path, settled }
    }
}

pub struct Overlay<S: Surface> {
    /// Remote live strokes in the order they started.
    remote: Vec<Stroke>,
    /// Local strokes sent for commit, oldest first.
    pending: Vec<Stroke>,
    local: Option<LocalStroke>,
    ink: S,
    tint: S,
    mask: S,
    local_layer: S,
    renderer: StrokeRenderer<S>,
}

impl<S: Surface> Overlay<S> {
    /// Build an overlay over four equally sized, empty layers.
    pub fn new(ink: S, tint: S, mask: S, local_layer: S) -> Self {
        Self {
            remote: Vec::new(),
            pending: Vec::new(),
            local: None,
            ink,
            tint,
            mask,
            local_layer,
            renderer: StrokeRenderer::new(),
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    pub fn remote_ids(&self) -> impl Iterator<Item = &str> {
        self.remote.iter().map(|s| s.id.as_str())
    }

    pub fn pending_ids(&self) -> impl Iterator<Item = &str> {
        self.pending.iter().map(|s| s.id.as_str())
    }

    #[must_use]
    pub fn remote(&self, id: &str) -> Option<&Stroke> {
        self.remote.iter().find(|s| s.id == id)
    }

    #[must_use]
    pub fn local(&self) -> Option<&Stroke> {
        self.local.as_ref().map(|l| &l.stroke)
    }

    #[must_use]
    pub fn ink(&self) -> &S {
        &self.ink
    }

    #[must_use]
    pub fn tint(&self) -> &S {
        &self.tint
    }

    #[must_use]
    pub fn mask(&self) -> &S {
        &self.mask
    }

    #[must_use]
    pub fn local_layer(&self) -> &S {
        &self.local_layer
    }

    /// Mutable access to all four layers, for resizing. Call
    /// [`Overlay::redraw`] afterwards.
    pub fn layers_mut(&mut self) -> [&mut S; 4] {
        [&mut self.ink, &mut self.tint, &mut self.mask, &mut self.local_layer]
    }

    // =========================================================================
    // REMOTE
    // =========================================================================

    /// A peer started a stroke. A restart under the same id replaces it.
    ///
    /// # Errors
    ///
    /// Surface failure while repainting.
    pub fn remote_start(&mut self, stroke: Stroke) -> Result<(), RenderError> {
        self.remote.retain(|s| s.id != stroke.id);
        self.remote.push(stroke);
        self.repaint()
    }

    /// A peer's live stroke grew by one point. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Surface failure while repainting.
    pub fn remote_point(&mut self, id: &str, point: Point) -> Result<(), RenderError> {
        let Some(stroke) = self.remote.iter_mut().find(|s| s.id == id) else {
            return Ok(());
        };
        stroke.points.push(point);
        self.repaint()
    }

    /// Drop remote live strokes, e.g. after their author disconnected.
    ///
    /// # Errors
    ///
    /// Surface failure while repainting.
    pub fn remote_abandon(&mut self, ids: &[String]) -> Result<(), RenderError> {
        let before = self.remote.len();
        self.remote.retain(|s| !ids.contains(&s.id));
        if self.remote.len() == before {
            return Ok(());
        }
        self.repaint()
    }

    /// Forget every remote live stroke.
    ///
    /// # Errors
    ///
    /// Surface failure while repainting.
    pub fn clear_remote(&mut self) -> Result<(), RenderError> {
        if self.remote.is_empty() {
            return Ok(());
        }
        self.remote.clear();
        self.repaint()
    }

    /// A stroke reached the committed raster: drop its remote or pending copy.
    ///
    /// # Errors
    ///
    /// Surface failure while repainting.
    pub fn remove(&mut self, id: &str) -> Result<(), RenderError> {
        let before = self.remote.len() + self.pending.len();
        self.remote.retain(|s| s.id != id);
        self.pending.retain(|s| s.id != id);
        if self.remote.len() + self.pending.len() == before {
            return Ok(());
        }
        self.repaint()
    }

    // =========================================================================
    // LOCAL
    // =========================================================================

    /// Start the local stroke and draw its first point.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn begin_local(&mut self, stroke: Stroke) -> Result<(), RenderError> {
        let local = self.local.insert(LocalStroke::new(stroke));
        paint_local(&mut self.renderer, &mut self.local_layer, local)
    }

    /// Append one point to the local stroke and draw whatever settled.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn extend_local(&mut self, point: Point) -> Result<(), RenderError> {
        let Some(local) = self.local.as_mut() else {
            return Ok(());
        };
        let previous = local.stroke.points.last().copied();
        local.stroke.points.push(point);

        match local.stroke.brush {
            Brush::Pen | Brush::Highlighter => {
                let segments = local.path.settled(&local.stroke.points);
                if segments.is_empty() {
                    return Ok(());
                }
                local.settled.extend(segments);
                paint_local(&mut self.renderer, &mut self.local_layer, local)
            }
            Brush::Airbrush => {
                let Some(previous) = previous else {
                    return Ok(());
                };
                let stamps = stamps_between(previous, point);
                self.renderer
                    .draw_stamps(&mut self.local_layer, &local.stroke, &stamps, Layer::Local)
            }
        }
    }

    /// The pointer went up: the local stroke becomes pending and is repainted
    /// in full onto the ink, tint or mask layer. Returns its id.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn end_local(&mut self) -> Result<Option<String>, RenderError> {
        let Some(local) = self.local.take() else {
            return Ok(None);
        };
        self.local_layer.clear()?;
        let id = local.stroke.id.clone();
        self.pending.push(local.stroke);
        self.repaint()?;
        Ok(Some(id))
    }

    /// Throw the local stroke away without committing it.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn discard_local(&mut self) -> Result<(), RenderError> {
        self.local = None;
        self.local_layer.clear()
    }

    /// Show a stroke that was sent for commit without being drawn locally.
    ///
    /// # Errors
    ///
    /// Surface failure while repainting.
    pub fn add_pending(&mut self, stroke: Stroke) -> Result<(), RenderError> {
        self.pending.retain(|s| s.id != stroke.id);
        self.pending.push(stroke);
        self.repaint()
    }

    // =========================================================================
    // PAINTING
    // =========================================================================

    /// Drop everything and blank every layer.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn reset(&mut self) -> Result<(), RenderError> {
        self.remote.clear();
        self.pending.clear();
        self.local = None;
        self.ink.clear()?;
        self.tint.clear()?;
        self.mask.clear()?;
        self.local_layer.clear()
    }

    /// Clear ink, tint and mask, then paint remote strokes followed by
    /// pending ones. Every stroke is attempted; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn repaint(&mut self) -> Result<(), RenderError> {
        self.ink.clear()?;
        self.tint.clear()?;
        self.mask.clear()?;
        let mut first_err = None;
        for stroke in self.remote.iter().chain(&self.pending) {
            let layer = match (stroke.is_eraser(), stroke.brush) {
                (true, _) => &mut self.mask,
                (false, Brush::Highlighter) => &mut self.tint,
                (false, Brush::Pen | Brush::Airbrush) => &mut self.ink,
            };
            if let Err(err) = self.renderer.draw(layer, stroke, Layer::Overlay) {
                first_err.get_or_insert(err);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Repaint all layers from scratch, including the local stroke.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn redraw(&mut self) -> Result<(), RenderError> {
        let overlay = self.repaint();
        if let Some(local) = self.local.as_mut() {
            *local = LocalStroke::new(local.stroke.clone());
            paint_local(&mut self.renderer, &mut self.local_layer, local)?;
        } else {
            self.local_layer.clear()?;
        }
        overlay
    }

    /// Composite `committed` and the overlay layers onto `target`.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn present(&self, committed: &S, target: &mut S) -> Result<(), RenderError> {
        target.clear()?;
        target.composite(committed, 1.0, Blend::SourceOver)?;
        target.composite(&self.mask, 1.0, Blend::DestinationOut)?;

        let local = self.local.as_ref().map(|l| (&l.stroke, local_composite(&l.stroke)));
        if let Some((stroke, (alpha, blend))) = local {
            if stroke.is_eraser() {
                target.composite(&self.local_layer, alpha, blend)?;
            }
        }

        target.composite(&self.ink, 1.0, Blend::SourceOver)?;
        // Highlighters on the tint layer were drawn with multiply onto
        // transparency, so they hold their own colour and alpha.
        target.composite(&self.tint, 1.0, Blend::Multiply)?;

        if let Some((stroke, (alpha, blend))) = local {
            if !stroke.is_eraser() {
                target.composite(&self.local_layer, alpha, blend)?;
            }
        }
        Ok(())
    }
}

/// Paint the local stroke from scratch. Path brushes show their first point
/// until a segment settles, then the settled prefix as a single path.
fn paint_local<S: Surface>(renderer: &mut StrokeRenderer<S>, surface: &mut S, local: &LocalStroke) -> Result<(), RenderError> {
    surface.clear()?;
    let stroke = &local.stroke;
    match (stroke.brush, stroke.points.first()) {
        (_, None) => Ok(()),
        (Brush::Airbrush, Some(_)) => renderer.draw_stamps(surface, stroke, &airbrush_stamps(&stroke.points), Layer::Local),
        (Brush::Pen | Brush::Highlighter, Some(&first)) if local.settled.is_empty() => {
            renderer.draw_dot(surface, stroke, first, Layer::Local)
        }
        (Brush::Pen | Brush::Highlighter, Some(_)) => renderer.draw_segments(surface, stroke, &local.settled, Layer::Local),
    }
}

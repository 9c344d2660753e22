//! Brush rendering: turns a [`Stroke`] into surface primitives.
//!
//! Dispatch is an exhaustive match on `Brush` × `Tool`:
//!
//! | Brush | Shape | Cap / join | Blend | Alpha |
//! |-------|-------|------------|-------|-------|
//! | pen | Catmull-Rom path | round / round | source-over | `opacity` |
//! | highlighter | Catmull-Rom path | butt / miter | multiply | `opacity × 0.5` |
//! | airbrush | gradient stamps | none | source-over | `opacity × 0.1` per stamp |
//!
//! Erasers draw the same shape in white. On the committed layer that shape
//! is drawn with destination-out so the pixels underneath are removed.
//!
//! A single-point stroke is a disc (pen), a square (highlighter), or one
//! stamp (airbrush), each `size` across.

use frames::model::{Brush, Point, Rgb, Stroke, Tool};

use crate::consts::{AIRBRUSH_ALPHA, HIGHLIGHTER_ALPHA, MAX_SPRITE_SIZE};
use crate::curve::{Bezier, airbrush_stamps, full_path, tension};
use crate::surface::{Blend, Cap, Join, Pen, RenderError, Surface};

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

/// Which raster a stroke is being drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    /// The room image. Erasers remove pixels here.
    Committed,
    /// Ink or mask overlay, fully repainted on every remote change.
    Overlay,
    /// The local in-progress stroke. Paths are drawn opaque and the layer is
    /// composited once at the stroke's alpha, see [`local_composite`].
    Local,
}

/// Paint settings for `stroke` on `layer`.
#[must_use]
pub fn pen_for(stroke: &Stroke, layer: Layer) -> Pen {
    let (alpha, blend, cap, join) = match stroke.brush {
        Brush::Pen => (stroke.opacity, Blend::SourceOver, Cap::Round, Join::Round),
        Brush::Highlighter => (stroke.opacity * HIGHLIGHTER_ALPHA, Blend::Multiply, Cap::Butt, Join::Miter),
        Brush::Airbrush => (stroke.opacity * AIRBRUSH_ALPHA, Blend::SourceOver, Cap::Round, Join::Round),
    };

    let (alpha, blend) = match (layer, stroke.tool, stroke.brush) {
        (Layer::Committed, Tool::Eraser, _) => (alpha, Blend::DestinationOut),
        (Layer::Committed, Tool::Brush, _) | (Layer::Overlay, _, _) => (alpha, blend),
        (Layer::Local, _, Brush::Airbrush) => (alpha, Blend::SourceOver),
        (Layer::Local, _, Brush::Pen | Brush::Highlighter) => (1.0, Blend::SourceOver),
    };

    Pen { color: stroke.ink(), alpha, blend, width: stroke.size, cap, join }
}

/// Alpha and blend for compositing the local layer at presentation.
#[must_use]
pub fn local_composite(stroke: &Stroke) -> (f64, Blend) {
    let (alpha, blend) = match stroke.brush {
        Brush::Pen => (stroke.opacity, Blend::SourceOver),
        Brush::Highlighter => (stroke.opacity * HIGHLIGHTER_ALPHA, Blend::Multiply),
        // Stamps already carry their own alpha.
        Brush::Airbrush => (1.0, Blend::SourceOver),
    };
    match stroke.tool {
        Tool::Brush => (alpha, blend),
        Tool::Eraser => (alpha, Blend::DestinationOut),
    }
}

// =============================================================
// Renderer
// =============================================================

struct CachedSprite<T> {
    size_bits: u64,
    color: Rgb,
    sprite: T,
}

/// Draws strokes and owns the airbrush tip cache.
///
/// The tip is rebuilt only when `(size, color)` changes.
pub struct StrokeRenderer<S: Surface> {
    sprite: Option<CachedSprite<S::Sprite>>,
}

impl<S: Surface> Default for StrokeRenderer<S> {
    fn default() -> Self {
        Self { sprite: None }
    }
}

impl<S: Surface> StrokeRenderer<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw a whole stroke.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn draw(&mut self, surface: &mut S, stroke: &Stroke, layer: Layer) -> Result<(), RenderError> {
        match (stroke.brush, stroke.points.as_slice()) {
            (_, []) => Ok(()),
            (_, [only]) => self.draw_dot(surface, stroke, *only, layer),
            (Brush::Pen | Brush::Highlighter, points) => {
                let segments = full_path(points, tension(stroke.stability));
                surface.stroke_path(&segments, &pen_for(stroke, layer))
            }
            (Brush::Airbrush, points) => self.draw_stamps(surface, stroke, &airbrush_stamps(points), layer),
        }
    }

    /// Draw the single-point shape of `stroke` at `at`.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn draw_dot(&mut self, surface: &mut S, stroke: &Stroke, at: Point, layer: Layer) -> Result<(), RenderError> {
        let pen = pen_for(stroke, layer);
        match stroke.brush {
            Brush::Pen => surface.fill_disc(at, &pen),
            Brush::Highlighter => surface.fill_square(at, &pen),
            Brush::Airbrush => self.draw_stamps(surface, stroke, &[at], layer),
        }
    }

    /// Stroke `segments` of a path brush as one path. No-op for the airbrush.
    ///
    /// # Errors
    ///
    /// Surface failure.
    pub fn draw_segments(&mut self, surface: &mut S, stroke: &Stroke, segments: &[Bezier], layer: Layer) -> Result<(), RenderError> {
        match stroke.brush {
            Brush::Pen | Brush::Highlighter => surface.stroke_path(segments, &pen_for(stroke, layer)),
            Brush::Airbrush => Ok(()),
        }
    }

    /// Stamp the airbrush tip at each of `stamps`.
    ///
    /// # Errors
    ///
    /// Sprite allocation or surface failure.
    pub fn draw_stamps(&mut self, surface: &mut S, stroke: &Stroke, stamps: &[Point], layer: Layer) -> Result<(), RenderError> {
        if stamps.is_empty() {
            return Ok(());
        }
        let pen = pen_for(stroke, layer);
        self.ensure_sprite(surface, stroke.size, pen.color)?;
        let Some(cached) = &self.sprite else {
            return Ok(());
        };
        for &center in stamps {
            surface.stamp(&cached.sprite, center, pen.alpha, pen.blend)?;
        }
        Ok(())
    }

    fn ensure_sprite(&mut self, surface: &mut S, size: f64, color: Rgb) -> Result<(), RenderError> {
        let size_bits = size.to_bits();
        if self
            .sprite
            .as_ref()
            .is_some_and(|c| c.size_bits == size_bits && c.color == color)
        {
            return Ok(());
        }
        if !(size.is_finite() && size <= MAX_SPRITE_SIZE) {
            return Err(RenderError::SpriteTooLarge(size));
        }
        let sprite = surface.make_sprite(size, color)?;
        self.sprite = Some(CachedSprite { size_bits, color, sprite });
        Ok(())
    }
}

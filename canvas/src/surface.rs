//! Raster surface abstraction.
//!
//! Brush rendering only needs a handful of primitives: stroke a run of cubic
//! segments, fill a dot, stamp a sprite, and composite one layer onto another.
//! [`crate::web::WebSurface`] implements them on a browser 2D context and
//! [`crate::raster::RasterSurface`] on a `tiny-skia` pixmap, which is what
//! the tests draw into.

use frames::model::{Point, Rgb};

use crate::consts::MAX_SPRITE_SIZE;
use crate::curve::Bezier;

/// Pixel compositing operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    SourceOver,
    Multiply,
    /// Removes destination pixels where the source is opaque.
    DestinationOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cap {
    Round,
    Butt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    Round,
    Miter,
}

/// Everything a surface needs to paint one primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pen {
    pub color: Rgb,
    pub alpha: f64,
    pub blend: Blend,
    pub width: f64,
    pub cap: Cap,
    pub join: Join,
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} surface")]
    Size { width: u32, height: u32 },
    #[error("cannot build airbrush gradient for size {0}")]
    Gradient(f64),
    #[error("airbrush tip of size {0} exceeds {MAX_SPRITE_SIZE}")]
    SpriteTooLarge(f64),
    #[error("canvas call failed: {0}")]
    Canvas(String),
}

pub trait Surface {
    /// Pre-rendered airbrush tip.
    type Sprite;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Make every pixel transparent.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn clear(&mut self) -> Result<(), RenderError>;

    /// Stroke consecutive segments as one path.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn stroke_path(&mut self, segments: &[Bezier], pen: &Pen) -> Result<(), RenderError>;

    /// Fill a disc of diameter `pen.width` centred on `center`.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn fill_disc(&mut self, center: Point, pen: &Pen) -> Result<(), RenderError>;

    /// Fill an axis-aligned square of side `pen.width` centred on `center`.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn fill_square(&mut self, center: Point, pen: &Pen) -> Result<(), RenderError>;

    /// Render a radial gradient tip: `color` at the centre fading to
    /// transparent at radius `size / 2`.
    ///
    /// # Errors
    ///
    /// Allocation or backend failure.
    fn make_sprite(&mut self, size: f64, color: Rgb) -> Result<Self::Sprite, RenderError>;

    /// Draw `sprite` centred on `center`.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn stamp(&mut self, sprite: &Self::Sprite, center: Point, alpha: f64, blend: Blend) -> Result<(), RenderError>;

    /// Draw all of `layer` over this surface.
    ///
    /// # Errors
    ///
    /// Backend failure.
    fn composite(&mut self, layer: &Self, alpha: f64, blend: Blend) -> Result<(), RenderError>;
}

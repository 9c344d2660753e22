//! CPU raster surface backed by a `tiny-skia` pixmap.
//!
//! Used off-browser: by the tests, and by any host that wants the room image
//! without a DOM (thumbnails, exports). Coordinates are canvas pixels; no
//! device-pixel-ratio scaling happens here.

use frames::model::{Point, Rgb};
use tiny_skia::{
    BlendMode, Color, FillRule, FilterQuality, GradientStop, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, RadialGradient, Rect, SpreadMode, Stroke, Transform,
};

use crate::consts::MAX_SPRITE_SIZE;
use crate::curve::Bezier;
use crate::surface::{Blend, Cap, Join, Pen, RenderError, Surface};

#[cfg(test)]
#[path = "raster_test.rs"]
mod raster_test;

pub struct RasterSurface {
    pixmap: Pixmap,
}

impl RasterSurface {
    /// Allocate a transparent surface.
    ///
    /// # Errors
    ///
    /// [`RenderError::Size`] for a zero or oversized dimension.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::Size { width, height })?;
        Ok(Self { pixmap })
    }

    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Alpha of the pixel at `(x, y)`, or 0 outside the surface.
    #[must_use]
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.pixmap.pixel(x, y).map_or(0, |p| p.alpha())
    }

    /// Unpremultiplied color of the pixel at `(x, y)`, if any ink is there.
    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Option<Rgb> {
        let pixel = self.pixmap.pixel(x, y)?;
        if pixel.alpha() == 0 {
            return None;
        }
        let c = pixel.demultiply();
        Some(Rgb::new(c.red(), c.green(), c.blue()))
    }

    /// Number of pixels with any coverage.
    #[must_use]
    pub fn painted_pixels(&self) -> usize {
        self.pixmap.pixels().iter().filter(|p| p.alpha() > 0).count()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn f32_of(v: f64) -> f32 {
    v as f32
}

fn blend_mode(blend: Blend) -> BlendMode {
    match blend {
        Blend::SourceOver => BlendMode::SourceOver,
        Blend::Multiply => BlendMode::Multiply,
        Blend::DestinationOut => BlendMode::DestinationOut,
    }
}

fn color(rgb: Rgb, alpha: f64) -> Color {
    let mut c = Color::from_rgba8(rgb.r, rgb.g, rgb.b, 255);
    c.apply_opacity(f32_of(alpha.clamp(0.0, 1.0)));
    c
}

fn paint(pen: &Pen) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color(pen.color, pen.alpha));
    paint.blend_mode = blend_mode(pen.blend);
    paint.anti_alias = true;
    paint
}

impl Surface for RasterSurface {
    type Sprite = Pixmap;

    fn width(&self) -> u32 {
        self.pixmap.width()
    }

    fn height(&self) -> u32 {
        self.pixmap.height()
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        self.pixmap.fill(Color::TRANSPARENT);
        Ok(())
    }

    fn stroke_path(&mut self, segments: &[Bezier], pen: &Pen) -> Result<(), RenderError> {
        let mut pb = PathBuilder::new();
        let mut cursor: Option<Point> = None;
        for seg in segments {
            if cursor != Some(seg.from) {
                pb.move_to(f32_of(seg.from.x), f32_of(seg.from.y));
            }
            pb.cubic_to(
                f32_of(seg.cp1.x),
                f32_of(seg.cp1.y),
                f32_of(seg.cp2.x),
                f32_of(seg.cp2.y),
                f32_of(seg.to.x),
                f32_of(seg.to.y),
            );
            cursor = Some(seg.to);
        }
        // Degenerate paths (no segments, zero length) draw nothing.
        let Some(path) = pb.finish() else {
            return Ok(());
        };

        let stroke = Stroke {
            width: f32_of(pen.width),
            line_cap: match pen.cap {
                Cap::Round => LineCap::Round,
                Cap::Butt => LineCap::Butt,
            },
            line_join: match pen.join {
                Join::Round => LineJoin::Round,
                Join::Miter => LineJoin::Miter,
            },
            ..Stroke::default()
        };
        self.pixmap.stroke_path(&path, &paint(pen), &stroke, Transform::identity(), None);
        Ok(())
    }

    fn fill_disc(&mut self, center: Point, pen: &Pen) -> Result<(), RenderError> {
        if let Some(path) = PathBuilder::from_circle(f32_of(center.x), f32_of(center.y), f32_of(pen.width / 2.0)) {
            self.pixmap
                .fill_path(&path, &paint(pen), FillRule::Winding, Transform::identity(), None);
        }
        Ok(())
    }

    fn fill_square(&mut self, center: Point, pen: &Pen) -> Result<(), RenderError> {
        let half = pen.width / 2.0;
        if let Some(rect) = Rect::from_xywh(
            f32_of(center.x - half),
            f32_of(center.y - half),
            f32_of(pen.width),
            f32_of(pen.width),
        ) {
            self.pixmap.fill_rect(rect, &paint(pen), Transform::identity(), None);
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn make_sprite(&mut self, size: f64, rgb: Rgb) -> Result<Pixmap, RenderError> {
        if !(size.is_finite() && size <= MAX_SPRITE_SIZE) {
            return Err(RenderError::SpriteTooLarge(size));
        }
        let side = size.ceil().max(1.0) as u32;
        let mut sprite = Pixmap::new(side, side).ok_or(RenderError::Size { width: side, height: side })?;
        let half = f32_of(size / 2.0);
        let center = tiny_skia::Point::from_xy(half, half);
        let shader = RadialGradient::new(
            center,
            center,
            half.max(0.5),
            vec![GradientStop::new(0.0, color(rgb, 1.0)), GradientStop::new(1.0, color(rgb, 0.0))],
            SpreadMode::Pad,
            Transform::identity(),
        )
        .ok_or(RenderError::Gradient(size))?;

        let paint = Paint { shader, anti_alias: true, ..Paint::default() };
        let rect = Rect::from_xywh(0.0, 0.0, f32_of(f64::from(side)), f32_of(f64::from(side)))
            .ok_or(RenderError::Gradient(size))?;
        sprite.fill_rect(rect, &paint, Transform::identity(), None);
        Ok(sprite)
    }

    fn stamp(&mut self, sprite: &Pixmap, center: Point, alpha: f64, blend: Blend) -> Result<(), RenderError> {
        let dx = f32_of(center.x - f64::from(sprite.width()) / 2.0);
        let dy = f32_of(center.y - f64::from(sprite.height()) / 2.0);
        let paint = PixmapPaint {
            opacity: f32_of(alpha.clamp(0.0, 1.0)),
            blend_mode: blend_mode(blend),
            quality: FilterQuality::Bilinear,
        };
        self.pixmap
            .draw_pixmap(0, 0, sprite.as_ref(), &paint, Transform::from_translate(dx, dy), None);
        Ok(())
    }

    fn composite(&mut self, layer: &Self, alpha: f64, blend: Blend) -> Result<(), RenderError> {
        let paint = PixmapPaint {
            opacity: f32_of(alpha.clamp(0.0, 1.0)),
            blend_mode: blend_mode(blend),
            quality: FilterQuality::Nearest,
        };
        self.pixmap
            .draw_pixmap(0, 0, layer.pixmap.as_ref(), &paint, Transform::identity(), None);
        Ok(())
    }
}

//! Browser surface: a `<canvas>` element and its 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! Surfaces are sized in device pixels and drawn in CSS pixels through a
//! device-pixel-ratio transform, so strokes stay sharp on high-DPI screens.
//!
//! All fallible `Canvas2D` calls propagate errors as [`RenderError::Canvas`].

use frames::model::{Point, Rgb};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement};

use crate::curve::Bezier;
use crate::surface::{Blend, Cap, Join, Pen, RenderError, Surface};

pub struct WebSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    dpr: f64,
}

fn js_err(e: JsValue) -> RenderError {
    RenderError::Canvas(e.as_string().unwrap_or_else(|| format!("{e:?}")))
}

fn composite_op(blend: Blend) -> &'static str {
    match blend {
        Blend::SourceOver => "source-over",
        Blend::Multiply => "multiply",
        Blend::DestinationOut => "destination-out",
    }
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, RenderError> {
    canvas
        .get_context("2d")
        .map_err(js_err)?
        .ok_or_else(|| RenderError::Canvas("2d context unavailable".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| RenderError::Canvas("not a 2d context".into()))
}

fn create_canvas(document: &Document) -> Result<HtmlCanvasElement, RenderError> {
    document
        .create_element("canvas")
        .map_err(js_err)?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| RenderError::Canvas("created element is not a canvas".into()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn device_px(css: f64, dpr: f64) -> u32 {
    (css * dpr).floor().max(1.0) as u32
}

impl WebSurface {
    /// Wrap an on-page canvas element.
    ///
    /// # Errors
    ///
    /// The element has no 2D context.
    pub fn from_canvas(canvas: HtmlCanvasElement) -> Result<Self, RenderError> {
        let ctx = context_2d(&canvas)?;
        Ok(Self { canvas, ctx, dpr: 1.0 })
    }

    /// Create a detached canvas of the same size as `self`, for layering.
    ///
    /// # Errors
    ///
    /// DOM failure.
    pub fn offscreen_like(&self) -> Result<Self, RenderError> {
        let document = self
            .canvas
            .owner_document()
            .ok_or_else(|| RenderError::Canvas("canvas has no document".into()))?;
        let canvas = create_canvas(&document)?;
        canvas.set_width(self.canvas.width());
        canvas.set_height(self.canvas.height());
        let mut surface = Self::from_canvas(canvas)?;
        surface.dpr = self.dpr;
        surface.apply_transform()?;
        Ok(surface)
    }

    /// Resize the backing store to `css_w × css_h` CSS pixels at `dpr`.
    /// Resizing clears the canvas.
    ///
    /// # Errors
    ///
    /// Context failure.
    pub fn resize(&mut self, css_w: f64, css_h: f64, dpr: f64) -> Result<(), RenderError> {
        self.dpr = if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 };
        self.canvas.set_width(device_px(css_w, self.dpr));
        self.canvas.set_height(device_px(css_h, self.dpr));
        self.apply_transform()
    }

    fn apply_transform(&self) -> Result<(), RenderError> {
        self.ctx
            .set_transform(self.dpr, 0.0, 0.0, self.dpr, 0.0, 0.0)
            .map_err(js_err)
    }

    fn apply_pen(&self, pen: &Pen) -> Result<(), RenderError> {
        let color = pen.color.to_string();
        self.ctx.set_global_alpha(pen.alpha);
        self.ctx
            .set_global_composite_operation(composite_op(pen.blend))
            .map_err(js_err)?;
        self.ctx.set_line_width(pen.width);
        self.ctx.set_line_cap(match pen.cap {
            Cap::Round => "round",
            Cap::Butt => "butt",
        });
        self.ctx.set_line_join(match pen.join {
            Join::Round => "round",
            Join::Miter => "miter",
        });
        self.ctx.set_stroke_style_str(&color);
        self.ctx.set_fill_style_str(&color);
        Ok(())
    }

    /// Run `draw` between `save` and `restore`.
    fn scoped(&self, draw: impl FnOnce(&CanvasRenderingContext2d) -> Result<(), RenderError>) -> Result<(), RenderError> {
        self.ctx.save();
        let result = draw(&self.ctx);
        self.ctx.restore();
        result
    }
}

impl Surface for WebSurface {
    type Sprite = HtmlCanvasElement;

    fn width(&self) -> u32 {
        self.canvas.width()
    }

    fn height(&self) -> u32 {
        self.canvas.height()
    }

    fn clear(&mut self) -> Result<(), RenderError> {
        self.scoped(|ctx| {
            ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).map_err(js_err)?;
            ctx.clear_rect(0.0, 0.0, f64::from(self.canvas.width()), f64::from(self.canvas.height()));
            Ok(())
        })
    }

    fn stroke_path(&mut self, segments: &[Bezier], pen: &Pen) -> Result<(), RenderError> {
        if segments.is_empty() {
            return Ok(());
        }
        self.scoped(|ctx| {
            self.apply_pen(pen)?;
            ctx.begin_path();
            let mut cursor: Option<Point> = None;
            for seg in segments {
                if cursor != Some(seg.from) {
                    ctx.move_to(seg.from.x, seg.from.y);
                }
                ctx.bezier_curve_to(seg.cp1.x, seg.cp1.y, seg.cp2.x, seg.cp2.y, seg.to.x, seg.to.y);
                cursor = Some(seg.to);
            }
            ctx.stroke();
            Ok(())
        })
    }

    fn fill_disc(&mut self, center: Point, pen: &Pen) -> Result<(), RenderError> {
        self.scoped(|ctx| {
            self.apply_pen(pen)?;
            ctx.begin_path();
            ctx.arc(center.x, center.y, pen.width / 2.0, 0.0, std::f64::consts::TAU)
                .map_err(js_err)?;
            ctx.fill();
            Ok(())
        })
    }

    fn fill_square(&mut self, center: Point, pen: &Pen) -> Result<(), RenderError> {
        self.scoped(|ctx| {
            self.apply_pen(pen)?;
            let half = pen.width / 2.0;
            ctx.fill_rect(center.x - half, center.y - half, pen.width, pen.width);
            Ok(())
        })
    }

    fn make_sprite(&mut self, size: f64, color: Rgb) -> Result<HtmlCanvasElement, RenderError> {
        let document = self
            .canvas
            .owner_document()
            .ok_or_else(|| RenderError::Canvas("canvas has no document".into()))?;
        let tip = create_canvas(&document)?;
        // Sprite pixels are device pixels so stamps stay sharp after the DPR transform.
        let side = device_px(size, self.dpr);
        tip.set_width(side);
        tip.set_height(side);
        let ctx = context_2d(&tip)?;

        let half = f64::from(side) / 2.0;
        let gradient = ctx
            .create_radial_gradient(half, half, 0.0, half, half, half)
            .map_err(js_err)?;
        gradient.add_color_stop(0.0, &color.to_string()).map_err(js_err)?;
        gradient
            .add_color_stop(1.0, &format!("{color}00"))
            .map_err(js_err)?;
        ctx.set_fill_style_canvas_gradient(&gradient);
        ctx.fill_rect(0.0, 0.0, f64::from(side), f64::from(side));
        Ok(tip)
    }

    fn stamp(&mut self, sprite: &HtmlCanvasElement, center: Point, alpha: f64, blend: Blend) -> Result<(), RenderError> {
        let w = f64::from(sprite.width()) / self.dpr;
        let h = f64::from(sprite.height()) / self.dpr;
        self.scoped(|ctx| {
            ctx.set_global_alpha(alpha);
            ctx.set_global_composite_operation(composite_op(blend)).map_err(js_err)?;
            ctx.draw_image_with_html_canvas_element_and_dw_and_dh(sprite, center.x - w / 2.0, center.y - h / 2.0, w, h)
                .map_err(js_err)
        })
    }

    fn composite(&mut self, layer: &Self, alpha: f64, blend: Blend) -> Result<(), RenderError> {
        self.scoped(|ctx| {
            ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0).map_err(js_err)?;
            ctx.set_global_alpha(alpha);
            ctx.set_global_composite_operation(composite_op(blend)).map_err(js_err)?;
            ctx.draw_image_with_html_canvas_element(&layer.canvas, 0.0, 0.0)
                .map_err(js_err)
        })
    }
}

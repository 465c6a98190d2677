//! Canvas 2D surface and text metrics for the browser build.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::surface::{DrawOp, Layer, Surface, TextAlign};
use super::text::{caret_in_lines, font_px, greedy_wrap, hard_lines, CaretOptions, TextLayout, TextSegment};
use crate::error::{GridError, Result};

const TEXT_MEASURE_CACHE_CAP: usize = 4096;

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")
        .map_err(|_| GridError::RenderContextUnavailable("Failed to get 2d context".into()))?
        .ok_or_else(|| GridError::RenderContextUnavailable("No 2d context available".into()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| {
            GridError::RenderContextUnavailable("Failed to cast to CanvasRenderingContext2d".into())
        })
}

struct Target {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Target {
    fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        let ctx = context_2d(&canvas)?;
        Ok(Self { canvas, ctx })
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn resize(&self, width: f64, height: f64, dpr: f64) {
        self.canvas.set_width((width * dpr).round().max(0.0) as u32);
        self.canvas.set_height((height * dpr).round().max(0.0) as u32);
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    }

    fn clear(&self, dpr: f64) {
        let _ = self.ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
        self.ctx.clear_rect(
            0.0,
            0.0,
            f64::from(self.canvas.width()),
            f64::from(self.canvas.height()),
        );
        let _ = self.ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    }

    fn draw(&self, op: DrawOp) {
        let ctx = &self.ctx;
        match op {
            DrawOp::FillRect { rect, color } => {
                ctx.set_fill_style_str(&color);
                ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
            }
            DrawOp::StrokeRect { rect, color, width } => {
                ctx.set_stroke_style_str(&color);
                ctx.set_line_width(width);
                ctx.stroke_rect(rect.x, rect.y, rect.width, rect.height);
            }
            DrawOp::Line {
                from,
                to,
                color,
                width,
            } => {
                ctx.set_stroke_style_str(&color);
                ctx.set_line_width(width);
                ctx.begin_path();
                ctx.move_to(from.0, from.1);
                ctx.line_to(to.0, to.1);
                ctx.stroke();
            }
            DrawOp::Text {
                text,
                x,
                y,
                font,
                color,
                align,
            } => {
                ctx.set_font(&font);
                ctx.set_fill_style_str(&color);
                ctx.set_text_align(match align {
                    TextAlign::Left => "left",
                    TextAlign::Center => "center",
                    TextAlign::Right => "right",
                });
                ctx.set_text_baseline("middle");
                let _ = ctx.fill_text(&text, x, y);
            }
            DrawOp::PushClip { rect } => {
                ctx.save();
                ctx.begin_path();
                ctx.rect(rect.x, rect.y, rect.width, rect.height);
                ctx.clip();
            }
            DrawOp::PopClip => ctx.restore(),
        }
    }
}

/// Canvas-backed surface. With a second canvas stacked above the first, the
/// overlay layer can be repainted without touching the cells.
pub struct CanvasSurface {
    base: Target,
    overlay: Option<Target>,
    dpr: f64,
}

impl CanvasSurface {
    /// # Errors
    /// [`GridError::RenderContextUnavailable`] if a 2d context cannot be obtained.
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self> {
        Ok(Self {
            base: Target::new(canvas)?,
            overlay: None,
            dpr: 1.0,
        })
    }

    /// # Errors
    /// [`GridError::RenderContextUnavailable`] if either 2d context cannot be obtained.
    pub fn with_overlay(base: HtmlCanvasElement, overlay: HtmlCanvasElement) -> Result<Self> {
        Ok(Self {
            base: Target::new(base)?,
            overlay: Some(Target::new(overlay)?),
            dpr: 1.0,
        })
    }

    fn target(&self, layer: Layer) -> &Target {
        match (layer, &self.overlay) {
            (Layer::Overlay, Some(overlay)) => overlay,
            _ => &self.base,
        }
    }
}

impl Surface for CanvasSurface {
    fn resize(&mut self, width: f64, height: f64, dpr: f64) {
        self.dpr = dpr;
        self.base.resize(width, height, dpr);
        if let Some(overlay) = &self.overlay {
            overlay.resize(width, height, dpr);
        }
    }

    fn clear(&mut self, layer: Layer) {
        // Single canvas: the base clear wipes everything and the overlay
        // paints over it.
        if layer == Layer::Overlay && self.overlay.is_none() {
            return;
        }
        self.target(layer).clear(self.dpr);
    }

    fn draw(&mut self, layer: Layer, op: DrawOp) {
        self.target(layer).draw(op);
    }

    fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }
}

/// Text metrics from a detached canvas, created on first use.
#[derive(Default)]
pub struct CanvasTextLayout {
    ctx: OnceCell<Option<CanvasRenderingContext2d>>,
    widths: RefCell<HashMap<(String, String), f64>>,
}

impl CanvasTextLayout {
    fn context(&self) -> Option<&CanvasRenderingContext2d> {
        self.ctx
            .get_or_init(|| {
                let canvas = web_sys::window()?
                    .document()?
                    .create_element("canvas")
                    .ok()?
                    .dyn_into::<HtmlCanvasElement>()
                    .ok()?;
                context_2d(&canvas).ok()
            })
            .as_ref()
    }

    fn width(&self, text: &str, font: &str, default_size: f64) -> f64 {
        let key = (font.to_string(), text.to_string());
        if let Some(width) = self.widths.borrow().get(&key) {
            return *width;
        }
        let width = match self.context() {
            Some(ctx) => {
                ctx.set_font(font);
                ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
            }
            // No DOM: fall back to a fixed advance.
            None => 0.6 * font_px(font, default_size) * text.chars().count() as f64,
        };
        let mut widths = self.widths.borrow_mut();
        if widths.len() >= TEXT_MEASURE_CACHE_CAP {
            widths.clear();
        }
        widths.insert(key, width);
        width
    }
}

impl TextLayout for CanvasTextLayout {
    fn measure_text(&self, text: &str, font: &str, default_size: f64) -> f64 {
        self.width(text, font, default_size)
    }

    fn wrap_text_indices(
        &self,
        text: &str,
        max_width: f64,
        font: &str,
        default_size: f64,
    ) -> Vec<TextSegment> {
        greedy_wrap(text, max_width, |g| self.width(g, font, default_size))
    }

    fn caret_index_from_point(
        &self,
        text: &str,
        rel_x: f64,
        rel_y: f64,
        opts: &CaretOptions,
    ) -> usize {
        let lines = match opts.max_width {
            Some(width) => self.wrap_text_indices(text, width, &opts.font, opts.default_size),
            None => hard_lines(text),
        };
        let line_height = if opts.line_height > 0.0 {
            opts.line_height
        } else {
            font_px(&opts.font, opts.default_size) * 1.2
        };
        caret_in_lines(text, &lines, rel_x, rel_y, line_height, |g| {
            self.width(g, &opts.font, opts.default_size)
        })
    }
}

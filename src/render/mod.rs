//! Render context: drawing surfaces, frame painting and transports.
//!
//! This module provides:
//! - The [`Surface`] trait with a recording [`DisplayList`] and, on wasm32,
//!   a Canvas 2D surface
//! - [`RenderEngine`], the command-driven state machine that owns the grid
//!   mirror and paints base and overlay layers
//! - [`RenderThread`] and [`InlineRenderer`] transports
//! - Text layout and color utilities

mod chrome;
pub mod colors;
mod content;
mod engine;
mod frame;
mod headers;
mod overflow;
pub mod selection;
mod surface;
mod text;
mod worker;

#[cfg(target_arch = "wasm32")]
mod canvas;

pub use colors::{palette, Rgb};
pub use content::{font_family, resolve_font, CELL_PADDING, LINE_HEIGHT_FACTOR};
pub use engine::RenderEngine;
pub use frame::FrameContext;
pub use headers::col_to_letter;
pub use overflow::{EdgeSuppression, OverflowSpans};
pub use surface::{DisplayList, DrawOp, Layer, Surface, TextAlign};
pub use text::{
    caret_in_lines, font_px, greedy_wrap, hard_lines, CaretOptions, MeasureContext,
    MonospaceLayout, TextLayout, TextSegment,
};
pub use worker::{InlineRenderer, RenderThread};

#[cfg(target_arch = "wasm32")]
pub use canvas::{CanvasSurface, CanvasTextLayout};

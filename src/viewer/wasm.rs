//! `GridViewer` - the wasm-exported wrapper around [`GridView`].
//!
//! Rendering runs on the page's thread through [`InlineRenderer`] over a
//! Canvas 2D surface. The host wires DOM events to the `on_*` methods and
//! drives frames: whenever a call leaves work pending the render callback
//! fires, and the host answers with `requestAnimationFrame(t => v.on_frame(t))`.

use js_sys::Function;
use serde::Serialize;
use tracing::debug;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use super::{GridView, Key, Modifiers};
use crate::config::{GridConfig, HeaderStyle};
use crate::model::GridData;
use crate::protocol::HeaderLabels;
use crate::render::{CanvasSurface, CanvasTextLayout, InlineRenderer, RenderEngine};
use crate::types::{CellStyle, MergeRange, StyleId};

type CanvasView = GridView<InlineRenderer<CanvasSurface, CanvasTextLayout>>;

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_config(config: JsValue) -> Result<GridConfig, JsValue> {
    if config.is_undefined() || config.is_null() {
        return Ok(GridConfig::default());
    }
    let config: GridConfig =
        serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
    config.validate()?;
    Ok(config)
}

#[wasm_bindgen]
pub struct GridViewer {
    view: CanvasView,
    render_callback: Option<Function>,
}

impl GridViewer {
    fn build(
        surface: CanvasSurface,
        canvas: &HtmlCanvasElement,
        rows: u32,
        cols: u32,
        config: GridConfig,
    ) -> Self {
        let grid = GridData::new(rows, cols, config.default_row_height, config.default_col_width);
        let engine = RenderEngine::new(
            surface,
            CanvasTextLayout::default(),
            config.clone(),
            grid.empty_like(),
        );
        let rect = canvas.get_bounding_client_rect();
        let mut view = GridView::new(grid, config, InlineRenderer::new(engine), rect.width(), rect.height());
        view.set_origin(rect.left(), rect.top());
        if let Some(window) = web_sys::window() {
            view.set_dpr(window.device_pixel_ratio());
        }
        debug!(rows, cols, "grid viewer created");
        Self {
            view,
            render_callback: None,
        }
    }

    /// Ask the host for a frame if the view has pending work.
    fn notify(&self) {
        if !self.view.needs_frame() {
            return;
        }
        if let Some(callback) = &self.render_callback {
            let _ = callback.call0(&JsValue::NULL);
        }
    }
}

#[wasm_bindgen]
impl GridViewer {
    /// Create a viewer drawing everything onto one canvas.
    #[wasm_bindgen(constructor)]
    pub fn new(
        canvas: HtmlCanvasElement,
        rows: u32,
        cols: u32,
        config: JsValue,
    ) -> Result<GridViewer, JsValue> {
        console_error_panic_hook::set_once();
        let config = parse_config(config)?;
        let surface = CanvasSurface::new(canvas.clone())?;
        Ok(Self::build(surface, &canvas, rows, cols, config))
    }

    /// Create a viewer with a stacked overlay canvas, so selection and
    /// scrollbar changes repaint without touching cell content.
    #[wasm_bindgen(js_name = "newWithOverlay")]
    pub fn new_with_overlay(
        base: HtmlCanvasElement,
        overlay: HtmlCanvasElement,
        rows: u32,
        cols: u32,
        config: JsValue,
    ) -> Result<GridViewer, JsValue> {
        console_error_panic_hook::set_once();
        let config = parse_config(config)?;
        let surface = CanvasSurface::with_overlay(base.clone(), overlay)?;
        Ok(Self::build(surface, &base, rows, cols, config))
    }

    /// Callback invoked when the viewer wants a frame.
    #[wasm_bindgen]
    pub fn set_render_callback(&mut self, callback: Option<Function>) {
        self.render_callback = callback;
        self.notify();
    }

    #[wasm_bindgen]
    pub fn needs_frame(&self) -> bool {
        self.view.needs_frame()
    }

    #[wasm_bindgen]
    pub fn on_frame(&mut self, now_ms: f64) {
        self.view.on_frame(now_ms);
        self.notify();
    }

    /// Render now, outside the frame loop.
    #[wasm_bindgen]
    pub fn render(&mut self) {
        self.view.flush();
    }

    /// Canvas resized (CSS pixels) or moved to a display with another DPR.
    #[wasm_bindgen]
    pub fn resize(&mut self, width: f64, height: f64, dpr: f64) {
        self.view.set_dpr(dpr);
        self.view.resize(width, height);
        self.notify();
    }

    /// Canvas top-left in client coordinates (after page scroll or layout).
    #[wasm_bindgen]
    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.view.set_origin(x, y);
    }

    #[wasm_bindgen]
    pub fn on_mouse_down(&mut self, x: f64, y: f64, shift: bool) {
        self.view.pointer_down(x, y, shift);
        self.notify();
    }

    #[wasm_bindgen]
    pub fn on_mouse_move(&mut self, x: f64, y: f64) {
        self.view.pointer_move(x, y);
        self.notify();
    }

    #[wasm_bindgen]
    pub fn on_mouse_up(&mut self) {
        self.view.pointer_up();
        self.notify();
    }

    #[wasm_bindgen]
    pub fn on_wheel(&mut self, delta_x: f64, delta_y: f64) -> bool {
        let scrolled = self.view.wheel(delta_x, delta_y);
        self.notify();
        scrolled
    }

    /// Returns true when the key was consumed and the default action should
    /// be prevented.
    #[wasm_bindgen]
    pub fn on_key_down(&mut self, key: &str, shift: bool, command: bool) -> bool {
        let Some(key) = Key::from_dom(key) else {
            return false;
        };
        let handled = self.view.key_down(key, Modifiers { shift, command });
        self.notify();
        handled
    }

    /// CSS cursor for the last hovered point.
    #[wasm_bindgen]
    pub fn cursor(&self) -> String {
        self.view.cursor().css().to_string()
    }

    #[wasm_bindgen]
    pub fn get_selection(&self) -> Result<JsValue, JsValue> {
        to_js(&self.view.selection())
    }

    #[wasm_bindgen]
    pub fn get_scroll(&self) -> Result<JsValue, JsValue> {
        to_js(&self.view.scroll())
    }

    #[wasm_bindgen]
    pub fn set_scroll(&mut self, x: f64, y: f64) {
        self.view.scroll_to(x, y);
        self.notify();
    }

    #[wasm_bindgen]
    pub fn hit_test(&self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        to_js(&self.view.hit_test(x, y))
    }

    #[wasm_bindgen]
    pub fn get_first_selected_cell(&self) -> Result<JsValue, JsValue> {
        to_js(&self.view.first_selected_cell())
    }

    #[wasm_bindgen]
    pub fn get_metrics(&self) -> Result<JsValue, JsValue> {
        to_js(&self.view.metrics())
    }

    #[wasm_bindgen]
    pub fn set_value(&mut self, row: u32, col: u32, value: Option<String>) -> bool {
        let changed = self.view.set_value(row, col, value);
        self.notify();
        changed
    }

    #[wasm_bindgen]
    pub fn set_cell_style(&mut self, row: u32, col: u32, style: Option<u32>) -> bool {
        let changed = self.view.set_cell_style(row, col, style.map(StyleId));
        self.notify();
        changed
    }

    #[wasm_bindgen]
    pub fn define_style(&mut self, id: u32, style: JsValue) -> Result<bool, JsValue> {
        let style: CellStyle =
            serde_wasm_bindgen::from_value(style).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let changed = self.view.define_style(StyleId(id), style);
        self.notify();
        Ok(changed)
    }

    #[wasm_bindgen]
    pub fn set_row_height(&mut self, row: u32, height: f64) -> bool {
        let changed = self.view.set_row_height(row, height);
        self.notify();
        changed
    }

    #[wasm_bindgen]
    pub fn set_col_width(&mut self, col: u32, width: f64) -> bool {
        let changed = self.view.set_col_width(col, width);
        self.notify();
        changed
    }

    /// Returns false (and changes nothing) when the range overlaps a merge.
    #[wasm_bindgen]
    pub fn add_merge(&mut self, row: u32, col: u32, rows: u32, cols: u32) -> bool {
        let added = self.view.add_merge(MergeRange::new(row, col, rows, cols));
        self.notify();
        added
    }

    #[wasm_bindgen]
    pub fn merge_selection(&mut self) -> bool {
        let merged = self.view.merge_selection();
        self.notify();
        merged
    }

    #[wasm_bindgen]
    pub fn unmerge_at(&mut self, row: u32, col: u32) -> bool {
        let removed = self.view.unmerge_at(row, col);
        self.notify();
        removed
    }

    #[wasm_bindgen]
    pub fn begin_edit(&mut self) -> bool {
        let started = self.view.begin_edit();
        self.notify();
        started
    }

    #[wasm_bindgen]
    pub fn set_editor_text(&mut self, text: &str, caret: usize) -> bool {
        let open = self.view.set_editor_text(text, caret);
        self.notify();
        open
    }

    #[wasm_bindgen]
    pub fn commit_edit(&mut self) -> bool {
        let committed = self.view.commit_edit();
        self.notify();
        committed
    }

    #[wasm_bindgen]
    pub fn cancel_edit(&mut self) -> bool {
        let cancelled = self.view.cancel_edit();
        self.notify();
        cancelled
    }

    /// Text and caret of the open editor, or `undefined`.
    #[wasm_bindgen]
    pub fn get_editor(&self) -> Result<JsValue, JsValue> {
        to_js(&self.view.editor())
    }

    #[wasm_bindgen]
    pub fn set_header_labels(&mut self, labels: JsValue) -> Result<(), JsValue> {
        let labels: HeaderLabels =
            serde_wasm_bindgen::from_value(labels).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.view.set_header_labels(labels);
        self.notify();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_header_style(&mut self, style: JsValue) -> Result<(), JsValue> {
        let style: HeaderStyle =
            serde_wasm_bindgen::from_value(style).map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.view.set_header_style(style);
        self.notify();
        Ok(())
    }
}

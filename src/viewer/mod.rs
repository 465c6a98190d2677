//! `GridView` - the control-context entry point.
//!
//! This module provides the [`GridView`] struct that handles:
//! - Owning the authoritative grid (through the recording facade), the
//!   selection, the scroll offset and every piece of drag state
//! - Turning pointer, wheel and keyboard input into selection changes,
//!   scrolls, resize guides and grid mutations
//! - Driving the render context: buffered ops are flushed ahead of each
//!   render, overlay state is pushed as it changes, and the metrics snapshot
//!   that comes back feeds hit testing
//! - The in-cell editor, with caret placement guarded by a staleness token
//!
//! The host calls [`GridView::on_frame`] whenever [`GridView::needs_frame`]
//! reports pending work (once per `requestAnimationFrame` in a browser).

mod keys;
#[cfg(target_arch = "wasm32")]
mod wasm;

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use unicode_segmentation::UnicodeSegmentation;

pub use keys::{Key, Modifiers};
#[cfg(target_arch = "wasm32")]
pub use wasm::GridViewer;

use crate::config::{GridConfig, HeaderStyle};
use crate::error::Result;
use crate::interaction::{
    AutoScroller, DragMode, DragState, FrameKind, FrameScheduler, InteractionContext, Outcome,
    SelectionController,
};
use crate::layout::{
    HitTarget, HitTester, Orientation, ResizeKind, ScrollOffset, Scrollbars, ViewFrame,
    ViewportCalculator, ViewportMetrics,
};
use crate::model::{GridData, GridOp, GridSource, RecordingGrid};
use crate::protocol::{
    Command, EditorOverlay, Guides, HeaderLabels, RenderClient, RenderTransport, ScrollbarState,
    StalenessToken,
};
use crate::render::{resolve_font, CaretOptions, CELL_PADDING, LINE_HEIGHT_FACTOR};
use crate::types::{CellPos, CellStyle, MergeRange, Rect, Selection, SelectionKind, Size, StyleId};

/// Pointer cursor the host should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorKind {
    #[default]
    Default,
    ColResize,
    RowResize,
}

impl CursorKind {
    /// CSS `cursor` value.
    pub fn css(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::ColResize => "col-resize",
            Self::RowResize => "row-resize",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CaretReply {
    caret: usize,
    extend: bool,
}

pub struct GridView<T> {
    grid: RecordingGrid,
    client: RenderClient<T>,
    config: GridConfig,
    canvas: Size,
    /// Canvas top-left in client coordinates
    origin: (f64, f64),
    scroll: ScrollOffset,
    controller: SelectionController,
    autoscroll: AutoScroller,
    frames: FrameScheduler,
    /// The next render must repaint the base layer
    base_dirty: bool,
    scrollbar_state: ScrollbarState,
    cursor: CursorKind,
    editor: Option<EditorOverlay>,
    caret_token: StalenessToken,
    caret_reply: Rc<Cell<Option<CaretReply>>>,
}

impl<T: RenderTransport> GridView<T> {
    /// Attach to a render context whose mirror starts as `grid.empty_like()`;
    /// the grid's current contents are replayed into it before the first frame.
    pub fn new(grid: GridData, config: GridConfig, transport: T, width: f64, height: f64) -> Self {
        let mut client = RenderClient::new(transport);
        let canvas = Size::new(width.max(0.0), height.max(0.0));
        client.send(Command::Resize {
            width: canvas.width,
            height: canvas.height,
        });
        client.send(Command::SetHeaderStyle {
            style: config.header_style.clone(),
        });
        let snapshot = grid.snapshot_ops();
        if !snapshot.is_empty() {
            debug!(ops = snapshot.len(), "replaying grid into render mirror");
            client.send(Command::ApplyOps { ops: snapshot });
        }
        let mut view = Self {
            grid: RecordingGrid::new(grid),
            client,
            config,
            canvas,
            origin: (0.0, 0.0),
            scroll: ScrollOffset::default(),
            controller: SelectionController::new(),
            autoscroll: AutoScroller::new(),
            frames: FrameScheduler::new(),
            base_dirty: true,
            scrollbar_state: ScrollbarState::default(),
            cursor: CursorKind::Default,
            editor: None,
            caret_token: StalenessToken::new(),
            caret_reply: Rc::new(Cell::new(None)),
        };
        view.request_render(true);
        view
    }

    // ----- queries -----

    pub fn grid(&self) -> &GridData {
        self.grid.grid()
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn client(&self) -> &RenderClient<T> {
        &self.client
    }

    pub fn transport(&self) -> &T {
        self.client.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.client.transport_mut()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.controller.selection().copied()
    }

    pub fn scroll(&self) -> ScrollOffset {
        self.scroll
    }

    pub fn first_selected_cell(&self) -> Option<CellPos> {
        self.controller.first_selected_cell()
    }

    pub fn drag_mode(&self) -> DragMode {
        self.controller.mode()
    }

    pub fn guides(&self) -> Option<Guides> {
        self.controller.guides()
    }

    pub fn cursor(&self) -> CursorKind {
        self.cursor
    }

    pub fn scrollbar_state(&self) -> ScrollbarState {
        self.scrollbar_state
    }

    pub fn editor(&self) -> Option<&EditorOverlay> {
        self.editor.as_ref()
    }

    pub fn is_auto_scrolling(&self) -> bool {
        self.autoscroll.is_running()
    }

    /// Metrics from the last render, or a local estimate while none is valid.
    pub fn metrics(&self) -> ViewportMetrics {
        match self.client.metrics() {
            Some(snapshot) => snapshot.viewport_metrics,
            None => self.estimate_metrics(),
        }
    }

    fn estimate_metrics(&self) -> ViewportMetrics {
        let grid = self.grid.grid();
        let content = Size::new(grid.col_widths().total(), grid.row_heights().total());
        ViewportCalculator::compute(
            self.canvas,
            self.config.header_size(),
            self.config.scrollbar_thickness,
            content,
        )
    }

    /// Everything hit testing needs about the current frame.
    pub fn view_frame(&self) -> ViewFrame {
        let metrics = self.metrics();
        let header = self.config.header_size();
        let scroll = self.scroll.clamped(&metrics);
        ViewFrame {
            origin: self.origin,
            header,
            metrics,
            scroll,
            scrollbars: Scrollbars::compute(
                &metrics,
                header,
                self.config.scrollbar_thickness,
                self.config.min_thumb_length,
                scroll,
            ),
            resize_margin: self.config.resize_margin,
        }
    }

    pub fn hit_test(&self, client_x: f64, client_y: f64) -> HitTarget {
        let frame = self.view_frame();
        self.hit_tester(&frame).hit_test(client_x, client_y)
    }

    pub fn pixel_to_cell(&self, client_x: f64, client_y: f64) -> Option<CellPos> {
        let frame = self.view_frame();
        self.hit_tester(&frame).pixel_to_cell(client_x, client_y)
    }

    /// Client rectangle of a cell, spanning its merge.
    pub fn cell_to_pixel_rect(&self, row: u32, col: u32) -> Rect {
        let frame = self.view_frame();
        self.hit_tester(&frame).cell_to_pixel_rect(row, col)
    }

    fn hit_tester<'a>(&'a self, frame: &'a ViewFrame) -> HitTester<'a> {
        let grid = self.grid.grid();
        HitTester::new(grid.row_heights(), grid.col_widths(), grid.merges(), frame)
    }

    // ----- host contract -----

    /// Whether the host should schedule a call to [`GridView::on_frame`].
    pub fn needs_frame(&self) -> bool {
        self.frames.has_pending()
    }

    /// Run one frame: collect render-context events, tick auto-scroll, render.
    pub fn on_frame(&mut self, now_ms: f64) {
        self.pump();
        let due = self.frames.take_due();
        if due.contains(&FrameKind::AutoScroll) {
            self.tick_autoscroll(now_ms);
        }
        // A render requested by this frame's auto-scroll tick runs now.
        let requested = self.frames.cancel_kind(FrameKind::Render);
        if requested || due.contains(&FrameKind::Render) {
            self.flush_render();
        }
        self.pump();
    }

    /// Render immediately, outside the frame loop.
    pub fn flush(&mut self) {
        self.frames.cancel_kind(FrameKind::Render);
        self.flush_render();
        self.pump();
    }

    fn flush_render(&mut self) {
        let ui_only = !self.base_dirty;
        self.base_dirty = false;
        let ops = self.grid.take_ops();
        trace!(ui_only, ops = ops.len(), "render");
        self.client.render(ops, self.scroll, ui_only);
    }

    fn request_render(&mut self, base: bool) {
        self.base_dirty |= base;
        self.frames.request(FrameKind::Render);
    }

    fn pump(&mut self) {
        if self.client.pump() {
            let metrics = self.metrics();
            if self.scroll.clamp_to(&metrics) {
                self.request_render(true);
            }
        }
        self.apply_caret_reply();
    }

    fn tick_autoscroll(&mut self, now_ms: f64) {
        if !self.controller.drag().autoscrolls() {
            self.autoscroll.stop();
            return;
        }
        let metrics = self.metrics();
        let mut scroll = self.scroll;
        let tick = self
            .autoscroll
            .tick(now_ms, &mut scroll, &metrics, &self.config.auto_scroll);
        if tick.scrolled {
            self.set_scroll_offset(scroll);
        }
        if tick.running {
            self.frames.request(FrameKind::AutoScroll);
        }
    }

    fn stop_autoscroll(&mut self) {
        self.autoscroll.stop();
        self.frames.cancel_kind(FrameKind::AutoScroll);
    }

    /// Stop the render context.
    ///
    /// # Errors
    /// [`crate::GridError::Disconnected`] if it was already gone.
    pub fn shutdown(&mut self) -> Result<()> {
        self.frames.cancel_kind(FrameKind::Render);
        self.stop_autoscroll();
        self.client.shutdown()
    }

    // ----- canvas -----

    pub fn resize(&mut self, width: f64, height: f64) {
        let canvas = Size::new(width.max(0.0), height.max(0.0));
        if canvas == self.canvas {
            return;
        }
        debug!(width = canvas.width, height = canvas.height, "canvas resized");
        self.canvas = canvas;
        self.client.send(Command::Resize {
            width: canvas.width,
            height: canvas.height,
        });
        self.client.invalidate_metrics();
        let metrics = self.metrics();
        self.scroll.clamp_to(&metrics);
        self.request_render(true);
    }

    pub fn set_dpr(&mut self, dpr: f64) {
        if !(dpr.is_finite() && dpr > 0.0) {
            return;
        }
        self.client.send(Command::SetDpr { dpr });
        self.request_render(true);
    }

    /// Canvas top-left in client coordinates.
    pub fn set_origin(&mut self, x: f64, y: f64) {
        self.origin = (x, y);
    }

    pub fn set_header_labels(&mut self, labels: HeaderLabels) {
        self.client.send(Command::SetHeaderLabels { labels });
        self.request_render(true);
    }

    pub fn set_header_style(&mut self, style: HeaderStyle) {
        self.config.header_style = style.clone();
        self.client.send(Command::SetHeaderStyle { style });
        self.request_render(true);
    }

    // ----- scrolling -----

    /// Scroll by a wheel delta. Returns whether the offset changed.
    pub fn wheel(&mut self, dx: f64, dy: f64) -> bool {
        let metrics = self.metrics();
        let mut scroll = self.scroll;
        if !scroll.scroll_by(dx, dy, &metrics) {
            return false;
        }
        self.set_scroll_offset(scroll)
    }

    pub fn scroll_to(&mut self, x: f64, y: f64) -> bool {
        self.set_scroll_offset(ScrollOffset::new(x, y))
    }

    /// Clamp and adopt `scroll`; an active drag re-derives its target under
    /// the stationary pointer.
    fn set_scroll_offset(&mut self, scroll: ScrollOffset) -> bool {
        let clamped = scroll.clamped(&self.metrics());
        if clamped == self.scroll {
            return false;
        }
        self.scroll = clamped;
        self.request_render(true);
        let frame = self.view_frame();
        let ctx = InteractionContext::new(self.grid.grid(), &frame, self.config.min_track_size);
        let outcome = self.controller.reproject(&ctx);
        self.apply(outcome);
        true
    }

    /// Scroll the least distance that shows `pos` (its whole merge when it
    /// fits; the leading edge otherwise).
    pub fn scroll_into_view(&mut self, pos: CellPos) -> bool {
        let grid = self.grid.grid();
        if pos.row >= grid.rows() || pos.col >= grid.cols() {
            return false;
        }
        let (r0, c0, r1, c1) = match grid.merge_at(pos.row, pos.col) {
            Some(m) => (m.row, m.col, m.end_row(), m.end_col()),
            None => (pos.row, pos.col, pos.row.saturating_add(1), pos.col.saturating_add(1)),
        };
        let metrics = self.metrics();
        let (cols, rows) = (grid.col_widths(), grid.row_heights());
        let x = reveal(self.scroll.x, cols.offset_of(c0), cols.offset_of(c1), metrics.width_avail);
        let y = reveal(self.scroll.y, rows.offset_of(r0), rows.offset_of(r1), metrics.height_avail);
        self.set_scroll_offset(ScrollOffset::new(x, y))
    }

    // ----- pointer -----

    pub fn pointer_down(&mut self, client_x: f64, client_y: f64, extend: bool) {
        self.stop_autoscroll();
        let frame = self.view_frame();
        if let Some(editor) = &self.editor {
            let target = self.hit_tester(&frame).hit_test(client_x, client_y);
            let inside = matches!(target, HitTarget::Cell(pos) if self.merge_anchor(pos) == editor.cell);
            if inside {
                let anchor = if extend {
                    editor.selection_anchor.unwrap_or(editor.caret)
                } else {
                    editor.caret
                };
                self.controller.begin_text_select(anchor, client_x, client_y);
                self.place_caret(client_x - self.origin.0, client_y - self.origin.1, extend);
                return;
            }
            self.commit_edit();
        }
        let ctx = InteractionContext::new(self.grid.grid(), &frame, self.config.min_track_size);
        let outcome = self.controller.pointer_down(&ctx, client_x, client_y, extend);
        self.update_scrollbar_state(None);
        self.apply(outcome);
    }

    pub fn pointer_move(&mut self, client_x: f64, client_y: f64) {
        let frame = self.view_frame();
        if self.controller.drag().is_idle() {
            let target = self.hit_tester(&frame).hit_test(client_x, client_y);
            self.cursor = match target {
                HitTarget::Resize(handle) => match handle.kind {
                    ResizeKind::Col => CursorKind::ColResize,
                    ResizeKind::Row => CursorKind::RowResize,
                },
                _ => CursorKind::Default,
            };
            self.update_scrollbar_state(Some(target));
            return;
        }
        let ctx = InteractionContext::new(self.grid.grid(), &frame, self.config.min_track_size);
        let outcome = self.controller.pointer_move(&ctx, client_x, client_y);
        if self.controller.drag().autoscrolls() {
            let (x, y) = (client_x - self.origin.0, client_y - self.origin.1);
            self.autoscroll
                .update_target(x, y, frame.cell_area(), &self.config.auto_scroll);
            if self.autoscroll.start() {
                self.frames.request(FrameKind::AutoScroll);
            }
        }
        self.apply(outcome);
    }

    pub fn pointer_up(&mut self) {
        let outcome = self.controller.pointer_up();
        self.stop_autoscroll();
        self.update_scrollbar_state(None);
        self.apply(outcome);
    }

    /// Abandon the active drag. Returns false when there was none.
    pub fn cancel_drag(&mut self) -> bool {
        if self.controller.drag().is_idle() {
            return false;
        }
        let outcome = self.controller.cancel();
        self.stop_autoscroll();
        self.update_scrollbar_state(None);
        self.apply(outcome);
        true
    }

    /// Recompute scrollbar flags; `hover` is the idle pointer's target.
    fn update_scrollbar_state(&mut self, hover: Option<HitTarget>) {
        let mode = self.controller.mode();
        let mut next = self.scrollbar_state;
        next.v_active = mode == DragMode::VScroll;
        next.h_active = mode == DragMode::HScroll;
        if let Some(target) = hover {
            next.v_hover = matches!(target, HitTarget::Scrollbar(Orientation::Vertical, _));
            next.h_hover = matches!(target, HitTarget::Scrollbar(Orientation::Horizontal, _));
        }
        if let Some(patch) = self.scrollbar_state.diff(&next) {
            trace!(?patch, "scrollbar state");
            self.scrollbar_state = next;
            self.client.send(Command::SetScrollbarState { state: patch });
            self.request_render(false);
        }
    }

    fn apply(&mut self, outcome: Outcome) {
        if outcome.is_empty() {
            return;
        }
        if outcome.selection_changed {
            self.send_selection();
        }
        if let Some(op) = outcome.commit {
            self.record(op);
        }
        if let Some(scroll) = outcome.scroll {
            self.set_scroll_offset(scroll);
        }
        if let Some(pos) = outcome.reveal {
            self.scroll_into_view(pos);
        }
        if outcome.guides_changed {
            self.client.send(Command::SetGuides {
                guides: self.controller.guides(),
            });
            self.request_render(false);
        }
        if let Some((x, y)) = outcome.text_point {
            self.place_caret(x, y, true);
        }
    }

    fn send_selection(&mut self) {
        let selection = self.controller.selection().copied();
        self.client.send(Command::SetSelection {
            sel: selection.map(|s| s.range),
            anchor: selection.map(|s| s.anchor),
        });
        self.request_render(false);
    }

    /// Re-expand the selection after merges changed under it.
    fn refresh_selection(&mut self) {
        let Some(sel) = self.controller.selection().copied() else {
            return;
        };
        if self
            .controller
            .select(self.grid.grid(), sel.kind, sel.anchor, sel.focus)
        {
            self.send_selection();
        }
    }

    fn merge_anchor(&self, pos: CellPos) -> CellPos {
        self.grid
            .grid()
            .merge_at(pos.row, pos.col)
            .map_or(pos, MergeRange::anchor)
    }

    // ----- keyboard -----

    /// Handle a key press. Returns true when the grid consumed it.
    pub fn key_down(&mut self, key: Key, mods: Modifiers) -> bool {
        if self.editor.is_some() {
            return match key {
                Key::Escape => self.cancel_edit(),
                Key::Enter => {
                    self.commit_edit();
                    let outcome = self.controller.move_active(self.grid.grid(), 1, 0);
                    self.apply(outcome);
                    true
                }
                _ => false,
            };
        }
        match key {
            Key::Escape => self.cancel_drag(),
            Key::Char('a') if mods.command => {
                let outcome = self.controller.select_all(self.grid.grid());
                self.apply(outcome);
                true
            }
            Key::Enter | Key::F2 => self.begin_edit(),
            _ => {
                let Some((d_row, d_col)) = key.arrow_delta() else {
                    return false;
                };
                let grid = self.grid.grid();
                let outcome = if mods.shift {
                    self.controller.extend(grid, d_row, d_col)
                } else {
                    self.controller.move_active(grid, d_row, d_col)
                };
                self.apply(outcome);
                true
            }
        }
    }

    // ----- selection and mutations -----

    /// Select the merge-expanded rectangle from `anchor` to `focus`.
    pub fn select_range(&mut self, anchor: CellPos, focus: CellPos) -> bool {
        let changed =
            self.controller
                .select(self.grid.grid(), SelectionKind::CellRange, anchor, focus);
        if changed {
            self.send_selection();
        }
        changed
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.controller.clear_selection();
        if changed {
            self.send_selection();
        }
        changed
    }

    /// Record a mutation; rejected ops change nothing.
    pub fn apply_op(&mut self, op: GridOp) -> bool {
        self.record(op)
    }

    fn record(&mut self, op: GridOp) -> bool {
        let geometry = op.affects_geometry();
        if !self.grid.record(op) {
            return false;
        }
        if geometry {
            self.client.invalidate_metrics();
            let metrics = self.metrics();
            self.scroll.clamp_to(&metrics);
            self.refresh_selection();
        }
        self.request_render(true);
        true
    }

    pub fn set_value(&mut self, row: u32, col: u32, value: Option<String>) -> bool {
        self.record(GridOp::SetValue { row, col, value })
    }

    pub fn set_cell_style(&mut self, row: u32, col: u32, style: Option<StyleId>) -> bool {
        self.record(GridOp::SetCellStyle { row, col, style })
    }

    pub fn define_style(&mut self, id: StyleId, style: CellStyle) -> bool {
        self.record(GridOp::DefineStyle { id, style })
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) -> bool {
        self.record(GridOp::SetRowHeight { row, height })
    }

    pub fn set_col_width(&mut self, col: u32, width: f64) -> bool {
        self.record(GridOp::SetColWidth { col, width })
    }

    /// Add a merge; `false` if it overlaps an existing one.
    pub fn add_merge(&mut self, merge: MergeRange) -> bool {
        self.record(GridOp::AddMerge { merge })
    }

    /// Merge the selected rectangle, absorbing merges inside it. A single
    /// cell selection is left alone.
    pub fn merge_selection(&mut self) -> bool {
        let Some(sel) = self.controller.selection().copied() else {
            return false;
        };
        let range = sel.range.normalized();
        let merge = MergeRange::new(range.r0, range.c0, range.row_count(), range.col_count());
        if merge.is_single_cell() {
            return false;
        }
        self.commit_edit();
        let inner: Vec<MergeRange> = self
            .grid
            .grid()
            .merges()
            .iter()
            .filter(|m| m.intersects(&range))
            .copied()
            .collect();
        for m in inner {
            self.record(GridOp::RemoveMergeAt {
                row: m.row,
                col: m.col,
            });
        }
        if !self.record(GridOp::AddMerge { merge }) {
            return false;
        }
        debug!(?merge, "merged selection");
        let anchor = merge.anchor();
        self.select_range(anchor, anchor);
        true
    }

    /// Remove the merge covering `(row, col)`.
    pub fn unmerge_at(&mut self, row: u32, col: u32) -> bool {
        self.record(GridOp::RemoveMergeAt { row, col })
    }

    // ----- editor -----

    /// Open the editor on the first selected cell with its current value.
    pub fn begin_edit(&mut self) -> bool {
        if self.editor.is_some() {
            return false;
        }
        let Some(pos) = self.controller.first_selected_cell() else {
            return false;
        };
        let cell = self.merge_anchor(pos);
        let text = self
            .grid
            .grid()
            .value_at(cell.row, cell.col)
            .unwrap_or_default()
            .to_string();
        debug!(row = cell.row, col = cell.col, "edit started");
        self.editor = Some(EditorOverlay {
            cell,
            caret: text.len(),
            text,
            selection_anchor: None,
        });
        self.send_editor();
        self.scroll_into_view(cell);
        true
    }

    /// Replace the editor text (host text input), placing the caret at the
    /// grapheme boundary at or before `caret`.
    pub fn set_editor_text(&mut self, text: &str, caret: usize) -> bool {
        let Some(editor) = self.editor.as_mut() else {
            return false;
        };
        // Caret replies computed against the old text no longer apply.
        self.caret_token.advance();
        editor.text = text.to_string();
        editor.caret = grapheme_floor(text, caret);
        editor.selection_anchor = None;
        self.send_editor();
        true
    }

    /// Close the editor and write its text to the cell (empty clears it).
    pub fn commit_edit(&mut self) -> bool {
        let Some(editor) = self.close_editor() else {
            return false;
        };
        let EditorOverlay { cell, text, .. } = editor;
        let value = (!text.is_empty()).then_some(text);
        if self.grid.grid().value_at(cell.row, cell.col) == value.as_deref() {
            self.request_render(false);
            return true;
        }
        debug!(row = cell.row, col = cell.col, "edit committed");
        self.record(GridOp::SetValue {
            row: cell.row,
            col: cell.col,
            value,
        });
        true
    }

    pub fn cancel_edit(&mut self) -> bool {
        let closed = self.close_editor().is_some();
        if closed {
            self.request_render(false);
        }
        closed
    }

    fn close_editor(&mut self) -> Option<EditorOverlay> {
        let editor = self.editor.take()?;
        self.caret_token.advance();
        self.caret_reply.set(None);
        if self.controller.mode() == DragMode::TextSelect {
            self.controller.cancel();
        }
        self.client.send(Command::SetEditor { editor: None });
        Some(editor)
    }

    fn send_editor(&mut self) {
        self.client.send(Command::SetEditor {
            editor: self.editor.clone(),
        });
        self.request_render(false);
    }

    /// Map a canvas-local point to a caret in the editor. The reply may come
    /// back later; only the latest request is applied.
    fn place_caret(&mut self, x: f64, y: f64, extend: bool) {
        let Some(editor) = &self.editor else {
            return;
        };
        let (cell, text) = (editor.cell, editor.text.clone());
        let frame = self.view_frame();
        let rect = self.hit_tester(&frame).cell_rect_local(cell.row, cell.col);
        let style = self.grid.grid().style_at(cell.row, cell.col);
        let (font, px) = resolve_font(&self.config, style);
        let opts = CaretOptions {
            font,
            default_size: self.config.default_font_size,
            max_width: style
                .is_some_and(CellStyle::wraps)
                .then(|| (rect.width - 2.0 * CELL_PADDING).max(0.0)),
            line_height: px * LINE_HEIGHT_FACTOR,
        };
        let token = self.caret_token.advance();
        let guard = self.caret_token.clone();
        let reply = Rc::clone(&self.caret_reply);
        self.client.caret_from_point(
            &text,
            x - rect.x - CELL_PADDING,
            y - rect.y - CELL_PADDING,
            opts,
            move |caret| {
                if guard.is_current(token) {
                    reply.set(Some(CaretReply { caret, extend }));
                } else {
                    trace!(token, "stale caret reply discarded");
                }
            },
        );
        self.apply_caret_reply();
    }

    fn apply_caret_reply(&mut self) {
        let Some(CaretReply { caret, extend }) = self.caret_reply.take() else {
            return;
        };
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let caret = grapheme_floor(&editor.text, caret);
        let drag = self.controller.drag();
        if extend {
            let anchor = match drag {
                DragState::TextSelect { anchor } => anchor,
                _ => editor.selection_anchor.unwrap_or(editor.caret),
            };
            editor.selection_anchor = (anchor != caret).then_some(anchor);
        } else {
            editor.selection_anchor = None;
            if let (DragState::TextSelect { .. }, Some((px, py))) =
                (drag, self.controller.last_pointer())
            {
                self.controller.begin_text_select(caret, px, py);
            }
        }
        editor.caret = caret;
        self.send_editor();
    }
}

/// Scroll position along one axis that shows `[start, end)` in `avail` pixels.
fn reveal(scroll: f64, start: f64, end: f64, avail: f64) -> f64 {
    if start < scroll || end - start > avail {
        start
    } else if end > scroll + avail {
        end - avail
    } else {
        scroll
    }
}

/// Largest grapheme boundary of `text` not after `index`.
fn grapheme_floor(text: &str, index: usize) -> usize {
    text.grapheme_indices(true)
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .take_while(|&i| i <= index)
        .last()
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::protocol::{RenderCapabilities, RenderEvent};
    use crate::render::{DisplayList, InlineRenderer, MonospaceLayout, RenderEngine};
    use crate::types::CellRange;

    type Inline = InlineRenderer<DisplayList, MonospaceLayout>;

    /// Answers text RPCs like a worker would: later, and only when released.
    struct Deferred {
        inner: Inline,
        held: bool,
    }

    impl RenderTransport for Deferred {
        fn capabilities(&self) -> RenderCapabilities {
            RenderCapabilities {
                async_text_ops: true,
            }
        }

        fn send(&mut self, command: Command) -> Result<()> {
            self.inner.send(command)
        }

        fn poll_events(&mut self) -> Vec<RenderEvent> {
            if self.held {
                Vec::new()
            } else {
                self.inner.poll_events()
            }
        }
    }

    fn config() -> GridConfig {
        GridConfig {
            row_header_width: 40.0,
            col_header_height: 40.0,
            ..GridConfig::default()
        }
    }

    fn grid() -> GridData {
        let mut grid = GridData::new(100, 100, 20.0, 50.0);
        assert!(grid.add_merge(MergeRange::new(1, 1, 2, 2)));
        grid
    }

    fn engine(grid: &GridData) -> RenderEngine<DisplayList, MonospaceLayout> {
        RenderEngine::new(
            DisplayList::new(),
            MonospaceLayout::default(),
            config(),
            grid.empty_like(),
        )
    }

    fn view() -> GridView<Inline> {
        let grid = grid();
        let transport = InlineRenderer::new(engine(&grid));
        let mut view = GridView::new(grid, config(), transport, 300.0, 200.0);
        view.on_frame(0.0);
        view
    }

    fn deferred_view() -> GridView<Deferred> {
        let grid = grid();
        let transport = Deferred {
            inner: InlineRenderer::new(engine(&grid)),
            held: false,
        };
        let mut view = GridView::new(grid, config(), transport, 300.0, 200.0);
        view.on_frame(0.0);
        view
    }

    /// Client center of cell `(row, col)` with no scroll.
    fn center(row: u32, col: u32) -> (f64, f64) {
        (
            40.0 + f64::from(col) * 50.0 + 25.0,
            40.0 + f64::from(row) * 20.0 + 10.0,
        )
    }

    fn click<T: RenderTransport>(view: &mut GridView<T>, row: u32, col: u32, extend: bool) {
        let (x, y) = center(row, col);
        view.pointer_down(x, y, extend);
        view.pointer_up();
    }

    fn range<T: RenderTransport>(view: &GridView<T>) -> CellRange {
        view.selection().unwrap().range.normalized()
    }

    #[test]
    fn test_first_frame_replays_grid_and_caches_metrics() {
        let view = view();
        let metrics = view.client().metrics().unwrap().viewport_metrics;
        assert_eq!(metrics.width_avail, 248.0);
        assert_eq!(metrics.height_avail, 148.0);
        assert!(metrics.v_scroll_visible && metrics.h_scroll_visible);
        assert_eq!(view.transport().engine().mirror().merges().len(), 1);
        assert!(!view.needs_frame());
    }

    #[test]
    fn test_click_inside_merge_selects_whole_merge() {
        let mut view = view();
        click(&mut view, 2, 2, false);
        assert_eq!(range(&view), CellRange::new(1, 1, 2, 2));
        assert_eq!(view.selection().unwrap().anchor, CellPos::new(2, 2));
        assert!(view.needs_frame());
        view.on_frame(16.0);
        assert_eq!(
            view.transport().engine().selection(),
            Some(CellRange::new(1, 1, 2, 2))
        );
    }

    #[test]
    fn test_mutations_reach_mirror_in_order() {
        let mut view = view();
        assert!(view.set_value(0, 0, Some("a".into())));
        assert!(view.set_value(0, 0, Some("b".into())));
        view.on_frame(16.0);
        let mirror = view.transport().engine().mirror();
        assert_eq!(mirror.value_at(0, 0), Some("b"));
        assert_eq!(mirror, view.grid());
    }

    #[test]
    fn test_rejected_merge_is_not_sent() {
        let mut view = view();
        assert!(!view.add_merge(MergeRange::new(2, 2, 2, 2)));
        view.on_frame(16.0);
        assert_eq!(view.grid().merges().len(), 1);
        assert_eq!(view.transport().engine().mirror().merges().len(), 1);
    }

    #[test]
    fn test_column_resize_drag() {
        let mut view = view();
        view.pointer_move(90.0, 20.0);
        assert_eq!(view.cursor(), CursorKind::ColResize);

        view.pointer_down(90.0, 20.0, false);
        assert_eq!(view.drag_mode(), DragMode::ColResize);
        assert_eq!(view.guides().unwrap().x, Some(90.0));
        view.pointer_move(120.0, 20.0);
        assert_eq!(view.guides().unwrap().x, Some(120.0));
        view.pointer_up();

        assert_eq!(view.guides(), None);
        assert_eq!(view.grid().col_widths().size_of(0), 80.0);
        view.on_frame(16.0);
        assert_eq!(
            view.transport().engine().mirror().col_widths().size_of(0),
            80.0
        );
    }

    #[test]
    fn test_wheel_clamps_both_ways() {
        let mut view = view();
        assert!(view.wheel(0.0, 1e9));
        assert_eq!(view.scroll().y, view.metrics().max_scroll_y);
        assert!(view.wheel(-1e9, -1e9));
        assert_eq!(view.scroll(), ScrollOffset::default());
        assert!(!view.wheel(-1.0, 0.0));
    }

    #[test]
    fn test_shrinking_content_clamps_scroll() {
        let mut view = view();
        view.wheel(0.0, 1e9);
        assert_eq!(view.scroll().y, 1852.0);
        assert!(view.set_row_height(0, 10.0));
        assert_eq!(view.scroll().y, 1842.0);
        view.on_frame(16.0);
        assert_eq!(view.metrics().max_scroll_y, 1842.0);
    }

    #[test]
    fn test_arrow_keys_move_and_reveal() {
        let mut view = view();
        click(&mut view, 0, 0, false);
        for _ in 0..20 {
            assert!(view.key_down(Key::ArrowDown, Modifiers::NONE));
        }
        assert_eq!(range(&view), CellRange::new(20, 0, 20, 0));
        // Row 20 spans 400..420 in a 148px tall cell area.
        assert_eq!(view.scroll().y, 272.0);
    }

    #[test]
    fn test_shift_arrows_extend_through_merge() {
        let mut view = view();
        click(&mut view, 0, 0, false);
        view.key_down(Key::ArrowRight, Modifiers::SHIFT);
        assert_eq!(range(&view), CellRange::new(0, 0, 0, 1));
        view.key_down(Key::ArrowDown, Modifiers::SHIFT);
        assert_eq!(range(&view), CellRange::new(0, 0, 2, 2));
        assert_eq!(view.selection().unwrap().anchor, CellPos::new(0, 0));
    }

    #[test]
    fn test_command_a_selects_all() {
        let mut view = view();
        assert!(view.key_down(Key::Char('a'), Modifiers::COMMAND));
        let sel = view.selection().unwrap();
        assert_eq!(sel.kind, SelectionKind::All);
        assert_eq!(sel.range, CellRange::new(0, 0, 99, 99));
        assert!(!view.key_down(Key::Char('a'), Modifiers::NONE));
    }

    #[test]
    fn test_merge_selection_then_unmerge() {
        let mut view = view();
        click(&mut view, 3, 2, false);
        click(&mut view, 4, 3, true);
        assert_eq!(range(&view), CellRange::new(3, 2, 4, 3));
        assert!(view.merge_selection());
        assert_eq!(view.grid().merge_at(4, 3).unwrap().anchor(), CellPos::new(3, 2));
        assert_eq!(view.selection().unwrap().anchor, CellPos::new(3, 2));
        assert_eq!(range(&view), CellRange::new(3, 2, 4, 3));

        assert!(view.unmerge_at(4, 3));
        assert!(view.grid().merge_at(3, 2).is_none());
        assert!(!view.unmerge_at(4, 3));
    }

    #[test]
    fn test_merge_selection_absorbs_inner_merge() {
        let mut view = view();
        click(&mut view, 0, 0, false);
        click(&mut view, 3, 3, true);
        assert!(view.merge_selection());
        let merges: Vec<MergeRange> = view.grid().merges().iter().copied().collect();
        assert_eq!(merges, vec![MergeRange::new(0, 0, 4, 4)]);
        view.on_frame(16.0);
        assert_eq!(view.transport().engine().mirror(), view.grid());
    }

    #[test]
    fn test_single_cell_merge_is_ignored() {
        let mut view = view();
        click(&mut view, 5, 5, false);
        assert!(!view.merge_selection());
        assert_eq!(view.grid().merges().len(), 1);

        click(&mut view, 5, 7, true);
        assert!(view.merge_selection());
        assert_eq!(view.grid().merge_at(5, 7).unwrap().to_range(), CellRange::new(5, 5, 5, 7));
    }

    #[test]
    fn test_edit_commit_writes_value_and_moves_down() {
        let mut view = view();
        click(&mut view, 0, 0, false);
        assert!(view.key_down(Key::F2, Modifiers::NONE));
        assert_eq!(view.editor().unwrap().text, "");
        assert!(view.set_editor_text("abc", 3));
        assert!(view.key_down(Key::Enter, Modifiers::NONE));
        assert!(view.editor().is_none());
        assert_eq!(view.grid().value_at(0, 0), Some("abc"));
        assert_eq!(range(&view), CellRange::new(1, 0, 1, 0));
    }

    #[test]
    fn test_edit_cancel_keeps_value() {
        let mut view = view();
        view.set_value(0, 0, Some("keep".into()));
        click(&mut view, 0, 0, false);
        view.begin_edit();
        assert_eq!(view.editor().unwrap().caret, 4);
        view.set_editor_text("other", 5);
        assert!(view.key_down(Key::Escape, Modifiers::NONE));
        assert_eq!(view.grid().value_at(0, 0), Some("keep"));
    }

    #[test]
    fn test_editor_caret_snaps_to_grapheme() {
        let mut view = view();
        click(&mut view, 0, 0, false);
        view.begin_edit();
        // "é" as e + combining acute is one grapheme of three bytes.
        view.set_editor_text("e\u{301}x", 2);
        assert_eq!(view.editor().unwrap().caret, 0);
    }

    #[test]
    fn test_text_drag_places_caret_and_selection() {
        let mut view = view();
        view.set_value(0, 0, Some("hello".into()));
        click(&mut view, 0, 0, false);
        view.begin_edit();
        // 13px default font advances 7.8px per grapheme; text starts 3px in.
        view.pointer_down(40.0 + 3.0 + 16.6, 50.0, false);
        assert_eq!(view.drag_mode(), DragMode::TextSelect);
        assert_eq!(view.editor().unwrap().caret, 2);
        view.pointer_move(40.0 + 3.0 + 32.2, 50.0);
        let editor = view.editor().unwrap();
        assert_eq!(editor.caret, 4);
        assert_eq!(editor.selection_anchor, Some(2));
        view.pointer_up();
        assert_eq!(view.drag_mode(), DragMode::None);
    }

    #[test]
    fn test_click_outside_editor_commits() {
        let mut view = view();
        click(&mut view, 0, 0, false);
        view.begin_edit();
        view.set_editor_text("x", 1);
        click(&mut view, 5, 0, false);
        assert!(view.editor().is_none());
        assert_eq!(view.grid().value_at(0, 0), Some("x"));
        assert_eq!(range(&view), CellRange::new(5, 0, 5, 0));
    }

    #[test]
    fn test_async_caret_reply_applies_on_next_frame() {
        let mut view = deferred_view();
        view.set_value(0, 0, Some("hello".into()));
        click(&mut view, 0, 0, false);
        view.begin_edit();
        view.pointer_down(40.0 + 3.0 + 16.6, 50.0, false);
        assert_eq!(view.editor().unwrap().caret, 5, "reply not in yet");
        view.pointer_up();
        view.on_frame(16.0);
        assert_eq!(view.editor().unwrap().caret, 2);
    }

    #[test]
    fn test_stale_caret_reply_is_discarded() {
        let mut view = deferred_view();
        view.set_value(0, 0, Some("hello".into()));
        click(&mut view, 0, 0, false);
        view.begin_edit();
        view.transport_mut().held = true;
        view.pointer_down(40.0 + 3.0 + 16.6, 50.0, false);
        view.pointer_up();
        // Typing supersedes the in-flight request.
        view.set_editor_text("world!", 6);
        view.transport_mut().held = false;
        view.on_frame(16.0);
        assert_eq!(view.editor().unwrap().caret, 6);
        assert_eq!(view.client().pending_calls(), 0);
    }

    #[test]
    fn test_drag_past_edge_autoscrolls_and_extends() {
        let mut view = view();
        let (x, y) = center(0, 0);
        view.pointer_down(x, y, false);
        view.pointer_move(100.0, 300.0);
        assert!(view.is_auto_scrolling());
        assert!(view.needs_frame());
        let before = view.selection().unwrap().focus.row;

        let mut now = 16.0;
        for _ in 0..30 {
            now += 1000.0 / 60.0;
            view.on_frame(now);
        }
        assert!(view.scroll().y > 0.0);
        assert!(view.selection().unwrap().focus.row > before);
        assert_eq!(view.selection().unwrap().anchor, CellPos::new(0, 0));

        view.pointer_up();
        assert!(!view.is_auto_scrolling());
        let settled = view.scroll();
        view.on_frame(now + 16.0);
        assert_eq!(view.scroll(), settled);
        assert!(!view.needs_frame());
    }

    #[test]
    fn test_press_after_lost_release_starts_fresh() {
        let mut view = view();
        view.pointer_down(90.0, 20.0, false);
        view.on_frame(16.0);
        assert!(view.guides().is_some());

        // No pointer_up: the release happened outside the window.
        let (x, y) = center(5, 5);
        view.pointer_down(x, y, false);
        assert_eq!(view.guides(), None);
        assert_eq!(view.drag_mode(), DragMode::Select);
        assert_eq!(range(&view), CellRange::new(5, 5, 5, 5));
        assert_eq!(view.grid().col_widths().size_of(0), 50.0);

        view.pointer_move(100.0, 300.0);
        assert!(view.is_auto_scrolling());
        view.pointer_down(x, y, false);
        assert!(!view.is_auto_scrolling());
    }

    #[test]
    fn test_hover_flags_sent_on_change_only() {
        let mut view = view();
        view.pointer_move(294.0, 100.0);
        assert!(view.scrollbar_state().v_hover);
        assert!(view.needs_frame());
        view.on_frame(16.0);
        view.pointer_move(294.0, 101.0);
        assert!(!view.needs_frame());
        view.pointer_move(100.0, 100.0);
        assert!(!view.scrollbar_state().v_hover);
        assert_eq!(view.cursor(), CursorKind::Default);
    }

    #[test]
    fn test_escape_cancels_drag() {
        let mut view = view();
        view.pointer_down(90.0, 20.0, false);
        assert!(view.key_down(Key::Escape, Modifiers::NONE));
        assert_eq!(view.drag_mode(), DragMode::None);
        assert_eq!(view.guides(), None);
        assert!(!view.key_down(Key::Escape, Modifiers::NONE));
        assert_eq!(view.grid().col_widths().size_of(0), 50.0);
    }

    #[test]
    fn test_resize_invalidates_metrics() {
        let mut view = view();
        view.resize(600.0, 400.0);
        assert!(view.client().metrics().is_none());
        assert_eq!(view.metrics().width_avail, 548.0);
        view.on_frame(16.0);
        assert_eq!(view.client().metrics().unwrap().viewport_metrics.width_avail, 548.0);
    }

    #[test]
    fn test_reveal_axis() {
        assert_eq!(reveal(100.0, 50.0, 70.0, 100.0), 50.0);
        assert_eq!(reveal(0.0, 150.0, 170.0, 100.0), 70.0);
        assert_eq!(reveal(0.0, 20.0, 40.0, 100.0), 0.0);
        assert_eq!(reveal(0.0, 150.0, 400.0, 100.0), 150.0);
    }
}

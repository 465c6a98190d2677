//! Selection controller: the drag state machine over pointer and keyboard input.
//!
//! The controller owns the selection and the active drag. It never touches
//! the grid or the scroll offset itself; each input returns an [`Outcome`]
//! describing what the caller should apply.

use tracing::{debug, trace};

use super::drag::{DragMode, DragState};
use crate::layout::{
    HitTarget, HitTester, Orientation, ResizeHandle, ResizeKind, ScrollOffset, ScrollbarPart,
    ViewFrame,
};
use crate::model::{GridData, GridOp, GridSource};
use crate::protocol::Guides;
use crate::types::{CellPos, CellRange, Selection, SelectionKind};

/// Sizes closer than this to the starting size are not committed.
const RESIZE_EPSILON: f64 = 0.5;

/// Inputs shared by every controller call: the grid and the current frame.
#[derive(Clone, Copy)]
pub struct InteractionContext<'a> {
    pub grid: &'a GridData,
    pub frame: &'a ViewFrame,
    /// Smallest size a resize drag may produce
    pub min_track_size: f64,
}

impl<'a> InteractionContext<'a> {
    pub fn new(grid: &'a GridData, frame: &'a ViewFrame, min_track_size: f64) -> Self {
        Self {
            grid,
            frame,
            min_track_size,
        }
    }

    pub fn hit_tester(&self) -> HitTester<'a> {
        HitTester::new(
            self.grid.row_heights(),
            self.grid.col_widths(),
            self.grid.merges(),
            self.frame,
        )
    }
}

/// What an input changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Outcome {
    /// Selection or its anchor changed
    pub selection_changed: bool,
    /// Scroll offset the drag asks for
    pub scroll: Option<ScrollOffset>,
    /// Resize guides changed; read them from [`SelectionController::guides`]
    pub guides_changed: bool,
    /// Size change to record on the grid
    pub commit: Option<GridOp>,
    /// Cell to bring into view
    pub reveal: Option<CellPos>,
    /// Canvas-local pointer position for a text-select drag
    pub text_point: Option<(f64, f64)>,
}

impl Outcome {
    fn selection() -> Self {
        Self {
            selection_changed: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Default)]
pub struct SelectionController {
    selection: Option<Selection>,
    drag: DragState,
    /// Last client pointer position of the active drag
    pointer: Option<(f64, f64)>,
    guides: Option<Guides>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn drag(&self) -> DragState {
        self.drag
    }

    pub fn mode(&self) -> DragMode {
        self.drag.mode()
    }

    pub fn guides(&self) -> Option<Guides> {
        self.guides
    }

    pub fn last_pointer(&self) -> Option<(f64, f64)> {
        self.pointer
    }

    /// Top-left cell of the selection.
    pub fn first_selected_cell(&self) -> Option<CellPos> {
        self.selection.map(|s| s.range.top_left())
    }

    /// Replace the selection with the merge-expanded rectangle spanning
    /// `anchor` and `focus`. Returns whether anything changed.
    pub fn select(
        &mut self,
        grid: &GridData,
        kind: SelectionKind,
        anchor: CellPos,
        focus: CellPos,
    ) -> bool {
        let next = resolve(grid, kind, anchor, focus);
        if next == self.selection {
            return false;
        }
        trace!(?next, "selection changed");
        self.selection = next;
        true
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selection.take().is_some()
    }

    pub fn select_all(&mut self, grid: &GridData) -> Outcome {
        let last = CellPos::new(grid.rows().saturating_sub(1), grid.cols().saturating_sub(1));
        let changed = self.select(grid, SelectionKind::All, CellPos::new(0, 0), last);
        Outcome {
            selection_changed: changed,
            ..Outcome::default()
        }
    }

    fn set_drag(&mut self, drag: DragState) {
        if self.drag.mode() != drag.mode() {
            debug!(from = ?self.drag.mode(), to = ?drag.mode(), "drag mode");
        }
        self.drag = drag;
    }

    /// Enter text-select mode from a caret already placed by the caller.
    pub fn begin_text_select(&mut self, anchor: usize, client_x: f64, client_y: f64) {
        self.set_drag(DragState::TextSelect { anchor });
        self.pointer = Some((client_x, client_y));
    }

    /// Classify the pointer and start the matching drag.
    pub fn pointer_down(
        &mut self,
        ctx: &InteractionContext<'_>,
        client_x: f64,
        client_y: f64,
        extend: bool,
    ) -> Outcome {
        let hit = ctx.hit_tester();
        let target = hit.hit_test(client_x, client_y);
        trace!(?target, "pointer down");
        let (x, y) = hit.to_local(client_x, client_y);
        let grid = ctx.grid;
        let mut outcome = Outcome::default();
        if target == HitTarget::None {
            return outcome;
        }
        // A press always starts from idle, even if the last release was lost.
        outcome.guides_changed |= self.end_drag();
        let extendable = extend.then_some(self.selection).flatten();

        match target {
            HitTarget::None => return outcome,
            HitTarget::Scrollbar(orientation, part) => {
                let Some(bar) = ctx.frame.scrollbars.get(orientation) else {
                    return outcome;
                };
                let pos = bar.axis(x, y);
                let grab = if part == ScrollbarPart::Thumb {
                    pos - bar.thumb_start()
                } else {
                    // Track click: center the thumb under the pointer, then drag it.
                    let grab = bar.thumb_len() / 2.0;
                    outcome.scroll = Some(thumb_scroll(ctx, orientation, pos - grab));
                    grab
                };
                self.set_drag(DragState::Scroll { orientation, grab });
            }
            HitTarget::Corner => {
                let mut all = self.select_all(grid);
                all.guides_changed |= outcome.guides_changed;
                return all;
            }
            HitTarget::Resize(handle) => {
                self.begin_resize(ctx, handle, x, y);
                outcome.guides_changed = true;
            }
            HitTarget::ColumnHeader(col) => {
                let anchor = match extendable {
                    Some(s) if s.kind == SelectionKind::ColumnRange => s.anchor.col,
                    _ => col,
                };
                outcome.selection_changed = self.select(
                    grid,
                    SelectionKind::ColumnRange,
                    CellPos::new(0, anchor),
                    CellPos::new(0, col),
                );
                self.set_drag(DragState::ColHeader);
            }
            HitTarget::RowHeader(row) => {
                let anchor = match extendable {
                    Some(s) if s.kind == SelectionKind::RowRange => s.anchor.row,
                    _ => row,
                };
                outcome.selection_changed = self.select(
                    grid,
                    SelectionKind::RowRange,
                    CellPos::new(anchor, 0),
                    CellPos::new(row, 0),
                );
                self.set_drag(DragState::RowHeader);
            }
            HitTarget::Cell(pos) => {
                let anchor = match extendable {
                    Some(s) if s.kind == SelectionKind::CellRange => s.anchor,
                    _ => pos,
                };
                outcome.selection_changed = self.select(grid, SelectionKind::CellRange, anchor, pos);
                self.set_drag(DragState::Select);
            }
        }
        self.pointer = Some((client_x, client_y));
        outcome
    }

    fn begin_resize(
        &mut self,
        ctx: &InteractionContext<'_>,
        handle: ResizeHandle,
        x: f64,
        y: f64,
    ) {
        let (origin, sizes) = match handle.kind {
            ResizeKind::Col => (x, ctx.grid.col_widths()),
            ResizeKind::Row => (y, ctx.grid.row_heights()),
        };
        let start_size = sizes.size_of(handle.index);
        self.set_drag(DragState::Resize {
            kind: handle.kind,
            index: handle.index,
            origin,
            start_size,
            size: start_size,
        });
        self.guides = Some(resize_guide(ctx, handle.kind, handle.index, start_size));
    }

    /// Advance the active drag to a new pointer position.
    pub fn pointer_move(
        &mut self,
        ctx: &InteractionContext<'_>,
        client_x: f64,
        client_y: f64,
    ) -> Outcome {
        if self.drag.is_idle() {
            return Outcome::default();
        }
        self.pointer = Some((client_x, client_y));
        self.track_pointer(ctx, client_x, client_y)
    }

    /// Re-derive the drag target from the last pointer position, e.g. after
    /// auto-scroll moved the content under a stationary pointer.
    pub fn reproject(&mut self, ctx: &InteractionContext<'_>) -> Outcome {
        match self.pointer {
            Some((x, y)) if self.drag.autoscrolls() => self.track_pointer(ctx, x, y),
            _ => Outcome::default(),
        }
    }

    fn track_pointer(&mut self, ctx: &InteractionContext<'_>, client_x: f64, client_y: f64) -> Outcome {
        let hit = ctx.hit_tester();
        let (x, y) = hit.to_local(client_x, client_y);
        let grid = ctx.grid;
        let anchor = self.selection.map(|s| s.anchor);
        match self.drag {
            DragState::Idle => Outcome::default(),
            DragState::Select => {
                let (Some(anchor), Some(focus)) = (anchor, hit.cell_at_clamped(client_x, client_y))
                else {
                    return Outcome::default();
                };
                let changed = self.select(grid, SelectionKind::CellRange, anchor, focus);
                changed.then(Outcome::selection).unwrap_or_default()
            }
            DragState::ColHeader => {
                let Some(anchor) = anchor.filter(|_| grid.cols() > 0) else {
                    return Outcome::default();
                };
                let col = hit.col_at_x_clamped(client_x);
                let changed =
                    self.select(grid, SelectionKind::ColumnRange, anchor, CellPos::new(0, col));
                changed.then(Outcome::selection).unwrap_or_default()
            }
            DragState::RowHeader => {
                let Some(anchor) = anchor.filter(|_| grid.rows() > 0) else {
                    return Outcome::default();
                };
                let row = hit.row_at_y_clamped(client_y);
                let changed = self.select(grid, SelectionKind::RowRange, anchor, CellPos::new(row, 0));
                changed.then(Outcome::selection).unwrap_or_default()
            }
            DragState::Scroll { orientation, grab } => {
                let Some(bar) = ctx.frame.scrollbars.get(orientation) else {
                    return Outcome::default();
                };
                let thumb_start = bar.axis(x, y) - grab;
                Outcome {
                    scroll: Some(thumb_scroll(ctx, orientation, thumb_start)),
                    ..Outcome::default()
                }
            }
            DragState::Resize {
                kind,
                index,
                origin,
                start_size,
                size,
            } => {
                let pos = match kind {
                    ResizeKind::Col => x,
                    ResizeKind::Row => y,
                };
                let next = (start_size + pos - origin).max(ctx.min_track_size);
                if (next - size).abs() < f64::EPSILON {
                    return Outcome::default();
                }
                self.drag = DragState::Resize {
                    kind,
                    index,
                    origin,
                    start_size,
                    size: next,
                };
                self.guides = Some(resize_guide(ctx, kind, index, next));
                Outcome {
                    guides_changed: true,
                    ..Outcome::default()
                }
            }
            DragState::TextSelect { .. } => Outcome {
                text_point: Some((x, y)),
                ..Outcome::default()
            },
        }
    }

    /// Finish the active drag. A resize commits its size here.
    pub fn pointer_up(&mut self) -> Outcome {
        let mut outcome = Outcome::default();
        if let DragState::Resize {
            kind,
            index,
            start_size,
            size,
            ..
        } = self.drag
        {
            if (size - start_size).abs() >= RESIZE_EPSILON {
                outcome.commit = Some(match kind {
                    ResizeKind::Col => GridOp::SetColWidth { col: index, width: size },
                    ResizeKind::Row => GridOp::SetRowHeight { row: index, height: size },
                });
            }
        }
        outcome.guides_changed = self.end_drag();
        outcome
    }

    /// Abandon the active drag without committing anything.
    pub fn cancel(&mut self) -> Outcome {
        Outcome {
            guides_changed: self.end_drag(),
            ..Outcome::default()
        }
    }

    /// Reset to idle and drop all drag scratch. Returns whether guides were cleared.
    fn end_drag(&mut self) -> bool {
        self.set_drag(DragState::Idle);
        self.pointer = None;
        self.guides.take().is_some()
    }

    /// Arrow key: collapse the selection onto the neighbouring cell, stepping
    /// over merges.
    pub fn move_active(&mut self, grid: &GridData, d_row: i32, d_col: i32) -> Outcome {
        if grid.rows() == 0 || grid.cols() == 0 {
            return Outcome::default();
        }
        let target = match self.selection {
            Some(sel) => step_over_merges(grid, sel.anchor, d_row, d_col),
            None => CellPos::new(0, 0),
        };
        let changed = self.select(grid, SelectionKind::CellRange, target, target);
        Outcome {
            selection_changed: changed,
            reveal: Some(target),
            ..Outcome::default()
        }
    }

    /// Shift+arrow: move the focus corner, keeping the anchor. Steps until
    /// the merge-expanded rectangle actually changes or the grid edge is hit.
    pub fn extend(&mut self, grid: &GridData, d_row: i32, d_col: i32) -> Outcome {
        let Some(sel) = self.selection else {
            return self.move_active(grid, d_row, d_col);
        };
        let kind = match sel.kind {
            SelectionKind::All => SelectionKind::CellRange,
            kind => kind,
        };
        let mut focus = sel.focus;
        loop {
            let next = offset(grid, focus, d_row, d_col);
            if next == focus {
                break;
            }
            focus = next;
            let grown = resolve(grid, kind, sel.anchor, focus);
            if grown.map(|s| s.range) != Some(sel.range) {
                break;
            }
        }
        let changed = self.select(grid, kind, sel.anchor, focus);
        Outcome {
            selection_changed: changed,
            reveal: Some(focus),
            ..Outcome::default()
        }
    }
}

/// Merge-expanded selection of `kind` from `anchor` to `focus`; `None` on an empty grid.
fn resolve(
    grid: &GridData,
    kind: SelectionKind,
    anchor: CellPos,
    focus: CellPos,
) -> Option<Selection> {
    let (rows, cols) = (grid.rows(), grid.cols());
    if rows == 0 || cols == 0 {
        return None;
    }
    let clamp = |p: CellPos| CellPos::new(p.row.min(rows - 1), p.col.min(cols - 1));
    let (anchor, focus) = (clamp(anchor), clamp(focus));
    let base = match kind {
        SelectionKind::CellRange => Selection {
            kind,
            range: CellRange::from_corners(anchor, focus),
            anchor,
            focus,
        },
        SelectionKind::RowRange => Selection::rows(anchor.row, focus.row, cols),
        SelectionKind::ColumnRange => Selection::columns(anchor.col, focus.col, rows),
        SelectionKind::All => Selection::all(rows, cols),
    };
    Some(Selection {
        range: grid.merges().expand(base.range),
        ..base
    })
}

/// Scroll offset for a thumb whose leading edge sits at `thumb_start`.
fn thumb_scroll(ctx: &InteractionContext<'_>, orientation: Orientation, thumb_start: f64) -> ScrollOffset {
    let frame = ctx.frame;
    let mut scroll = frame.scroll.clamped(&frame.metrics);
    let Some(bar) = frame.scrollbars.get(orientation) else {
        return scroll;
    };
    match orientation {
        Orientation::Vertical => scroll.y = bar.scroll_for_thumb(thumb_start, frame.metrics.max_scroll_y),
        Orientation::Horizontal => {
            scroll.x = bar.scroll_for_thumb(thumb_start, frame.metrics.max_scroll_x);
        }
    }
    scroll
}

/// Guide line at the trailing edge of a track being resized to `size`.
fn resize_guide(ctx: &InteractionContext<'_>, kind: ResizeKind, index: u32, size: f64) -> Guides {
    let frame = ctx.frame;
    let scroll = frame.scroll.clamped(&frame.metrics);
    match kind {
        ResizeKind::Col => Guides {
            x: Some(frame.header.width + ctx.grid.col_widths().offset_of(index) - scroll.x + size),
            y: None,
        },
        ResizeKind::Row => Guides {
            x: None,
            y: Some(frame.header.height + ctx.grid.row_heights().offset_of(index) - scroll.y + size),
        },
    }
}

/// `pos` moved by one step per axis, clamped into the grid.
fn offset(grid: &GridData, pos: CellPos, d_row: i32, d_col: i32) -> CellPos {
    let shift = |v: u32, d: i32, count: u32| -> u32 {
        let moved = v.saturating_add_signed(d.signum());
        moved.min(count.saturating_sub(1))
    };
    CellPos::new(shift(pos.row, d_row, grid.rows()), shift(pos.col, d_col, grid.cols()))
}

/// Neighbour of `pos` leaving its merge (if any) through the far edge; a
/// target inside another merge snaps to that merge's anchor.
fn step_over_merges(grid: &GridData, pos: CellPos, d_row: i32, d_col: i32) -> CellPos {
    let (r0, c0, r1, c1) = match grid.merge_at(pos.row, pos.col) {
        Some(m) => (m.row, m.col, m.end_row() - 1, m.end_col() - 1),
        None => (pos.row, pos.col, pos.row, pos.col),
    };
    let step = |v: u32, lo: u32, hi: u32, d: i32, count: u32| -> u32 {
        match d.signum() {
            1 if hi.saturating_add(1) < count => hi + 1,
            -1 if lo > 0 => lo - 1,
            _ => v,
        }
    };
    let target = CellPos::new(
        step(pos.row, r0, r1, d_row, grid.rows()),
        step(pos.col, c0, c1, d_col, grid.cols()),
    );
    grid.merge_at(target.row, target.col)
        .map_or(target, |m| m.anchor())
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
    use crate::layout::{Scrollbars, ViewportCalculator};
    use crate::types::{MergeRange, Size};
    use test_case::test_case;

    fn grid() -> GridData {
        let mut grid = GridData::new(100, 100, 20.0, 50.0);
        assert!(grid.add_merge(MergeRange::new(1, 1, 2, 2)));
        grid
    }

    fn frame(grid: &GridData, scroll: ScrollOffset) -> ViewFrame {
        let header = Size::new(40.0, 40.0);
        let content = Size::new(grid.col_widths().total(), grid.row_heights().total());
        let metrics = ViewportCalculator::compute(Size::new(300.0, 200.0), header, 12.0, content);
        ViewFrame {
            origin: (0.0, 0.0),
            header,
            metrics,
            scroll,
            scrollbars: Scrollbars::compute(&metrics, header, 12.0, 16.0, scroll),
            resize_margin: 4.0,
        }
    }

    fn center(frame: &ViewFrame, grid: &GridData, row: u32, col: u32) -> (f64, f64) {
        HitTester::new(grid.row_heights(), grid.col_widths(), grid.merges(), frame)
            .cell_to_pixel_rect(row, col)
            .center()
    }

    #[test]
    fn test_click_inside_merge_expands_selection() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        // Cell (2, 2) is covered by the merge anchored at (1, 1).
        let (x, y) = (40.0 + 2.0 * 50.0 + 10.0, 40.0 + 2.0 * 20.0 + 5.0);
        let outcome = ctl.pointer_down(&ctx, x, y, false);
        assert!(outcome.selection_changed);
        let sel = ctl.selection().unwrap();
        assert_eq!(sel.range, CellRange::new(1, 1, 2, 2));
        assert_eq!(ctl.mode(), DragMode::Select);
    }

    #[test]
    fn test_drag_keeps_anchor_through_expansion() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        let (x, y) = center(&frame, &grid, 3, 0);
        ctl.pointer_down(&ctx, x, y, false);
        // Over cell (2, 1), which the merge covers.
        ctl.pointer_move(&ctx, 115.0, 95.0);
        let sel = ctl.selection().unwrap();
        assert_eq!(sel.anchor, CellPos::new(3, 0));
        assert_eq!(sel.range, CellRange::new(1, 0, 3, 2));
    }

    #[test]
    fn test_pointer_up_resets_scratch() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        let (x, y) = center(&frame, &grid, 5, 0);
        ctl.pointer_down(&ctx, x, y, false);
        assert!(ctl.last_pointer().is_some());
        ctl.pointer_up();
        assert_eq!(ctl.drag(), DragState::Idle);
        assert!(ctl.last_pointer().is_none());
        assert!(ctl.pointer_move(&ctx, 200.0, 150.0).is_empty());
    }

    #[test]
    fn test_corner_selects_all() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        ctl.pointer_down(&ctx, 10.0, 10.0, false);
        let sel = ctl.selection().unwrap();
        assert_eq!(sel.kind, SelectionKind::All);
        assert_eq!(sel.anchor, CellPos::new(0, 0));
        assert_eq!(sel.range, CellRange::new(0, 0, 99, 99));
        assert_eq!(ctl.mode(), DragMode::None);
    }

    #[test]
    fn test_column_header_drag_ignores_rows() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        // Middle of column 0's header, clear of the resize zones.
        ctl.pointer_down(&ctx, 65.0, 20.0, false);
        assert_eq!(ctl.mode(), DragMode::ColHeader);
        // Pointer wanders deep into the cells; only x matters.
        ctl.pointer_move(&ctx, 165.0, 150.0);
        let sel = ctl.selection().unwrap();
        assert_eq!(sel.kind, SelectionKind::ColumnRange);
        assert_eq!(sel.range, CellRange::new(0, 0, 99, 2));
    }

    #[test]
    fn test_row_header_drag() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        ctl.pointer_down(&ctx, 20.0, 110.0, false);
        ctl.pointer_move(&ctx, 250.0, 150.0);
        let sel = ctl.selection().unwrap();
        assert_eq!(sel.kind, SelectionKind::RowRange);
        assert_eq!(sel.range, CellRange::new(3, 0, 5, 99));
    }

    #[test]
    fn test_thumb_drag_maps_to_scroll() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let bar = frame.scrollbars.vertical.unwrap();
        let mut ctl = SelectionController::new();
        let grab_y = bar.thumb_start() + 2.0;
        ctl.pointer_down(&ctx, bar.track.x + 6.0, grab_y, false);
        assert_eq!(ctl.mode(), DragMode::VScroll);
        // Move the thumb's leading edge to the middle of its travel.
        let target = bar.track_start() + bar.span() / 2.0 + 2.0;
        let outcome = ctl.pointer_move(&ctx, bar.track.x + 6.0, target);
        let scroll = outcome.scroll.unwrap();
        assert_eq!(scroll.y, (frame.metrics.max_scroll_y / 2.0).floor());
        assert_eq!(scroll.x, 0.0);
    }

    #[test]
    fn test_track_click_centers_thumb_then_drags() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let bar = frame.scrollbars.horizontal.unwrap();
        let mut ctl = SelectionController::new();
        let x = bar.track.right() - 1.0;
        let outcome = ctl.pointer_down(&ctx, x, bar.track.y + 6.0, false);
        assert_eq!(ctl.mode(), DragMode::HScroll);
        // Near the end of the track the centered thumb is pinned to the end.
        assert_eq!(outcome.scroll.unwrap().x, frame.metrics.max_scroll_x);
    }

    #[test]
    fn test_col_resize_commits_on_up() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        // Boundary between columns 0 and 1 sits at x = 90.
        let down = ctl.pointer_down(&ctx, 91.0, 20.0, false);
        assert!(down.guides_changed);
        assert_eq!(ctl.mode(), DragMode::ColResize);
        assert_eq!(ctl.guides().unwrap().x, Some(90.0));

        let moved = ctl.pointer_move(&ctx, 121.0, 20.0);
        assert!(moved.guides_changed);
        assert_eq!(ctl.guides().unwrap().x, Some(120.0));

        let up = ctl.pointer_up();
        assert_eq!(up.commit, Some(GridOp::SetColWidth { col: 0, width: 80.0 }));
        assert!(up.guides_changed);
        assert!(ctl.guides().is_none());
    }

    #[test]
    fn test_press_on_cell_clears_unreleased_resize() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        ctl.pointer_down(&ctx, 91.0, 20.0, false);
        assert_eq!(ctl.mode(), DragMode::ColResize);

        let (x, y) = center(&frame, &grid, 5, 5);
        let outcome = ctl.pointer_down(&ctx, x, y, false);
        assert!(outcome.guides_changed);
        assert!(outcome.commit.is_none());
        assert!(ctl.guides().is_none());
        assert_eq!(ctl.mode(), DragMode::Select);
        assert_eq!(ctl.selection().unwrap().range, CellRange::new(5, 5, 5, 5));
    }

    #[test]
    fn test_press_on_corner_clears_unreleased_resize() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        ctl.pointer_down(&ctx, 91.0, 20.0, false);
        assert!(ctl.guides().is_some());

        let outcome = ctl.pointer_down(&ctx, 10.0, 10.0, false);
        assert!(outcome.guides_changed);
        assert!(outcome.selection_changed);
        assert!(ctl.guides().is_none());
        assert!(ctl.last_pointer().is_none());
        assert_eq!(ctl.mode(), DragMode::None);
    }

    #[test]
    fn test_resize_clamps_to_min_track() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        ctl.pointer_down(&ctx, 20.0, 60.0, false);
        assert_eq!(ctl.mode(), DragMode::RowResize);
        ctl.pointer_move(&ctx, 20.0, -300.0);
        let up = ctl.pointer_up();
        assert_eq!(up.commit, Some(GridOp::SetRowHeight { row: 0, height: 4.0 }));
    }

    #[test]
    fn test_cancel_commits_nothing() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        ctl.pointer_down(&ctx, 91.0, 20.0, false);
        ctl.pointer_move(&ctx, 150.0, 20.0);
        let outcome = ctl.cancel();
        assert!(outcome.commit.is_none());
        assert!(outcome.guides_changed);
        assert_eq!(ctl.mode(), DragMode::None);
    }

    #[test]
    fn test_shift_click_extends_from_anchor() {
        let grid = grid();
        let frame = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &frame, 4.0);
        let mut ctl = SelectionController::new();
        let (x, y) = center(&frame, &grid, 4, 0);
        ctl.pointer_down(&ctx, x, y, false);
        ctl.pointer_up();
        let (x, y) = center(&frame, &grid, 5, 3);
        ctl.pointer_down(&ctx, x, y, true);
        let sel = ctl.selection().unwrap();
        assert_eq!(sel.anchor, CellPos::new(4, 0));
        assert_eq!(sel.range, CellRange::new(4, 0, 5, 3));
    }

    #[test]
    fn test_reproject_follows_scroll() {
        let grid = grid();
        let mut ctl = SelectionController::new();
        let start = frame(&grid, ScrollOffset::default());
        let ctx = InteractionContext::new(&grid, &start, 4.0);
        let (x, y) = center(&start, &grid, 0, 0);
        ctl.pointer_down(&ctx, x, y, false);
        ctl.pointer_move(&ctx, 100.0, 180.0);
        let before = ctl.selection().unwrap().range;

        let scrolled = frame(&grid, ScrollOffset::new(0.0, 100.0));
        let ctx = InteractionContext::new(&grid, &scrolled, 4.0);
        assert!(ctl.reproject(&ctx).selection_changed);
        let after = ctl.selection().unwrap().range;
        assert_eq!(after.r1, before.r1 + 5);
    }

    #[test_case(0, 0, 0, 1 => CellPos::new(0, 1); "right")]
    #[test_case(1, 1, 0, 1 => CellPos::new(1, 3); "right out of merge")]
    #[test_case(1, 1, 1, 0 => CellPos::new(3, 1); "down out of merge")]
    #[test_case(1, 0, 0, 1 => CellPos::new(1, 1); "into merge snaps to anchor")]
    #[test_case(2, 3, 0, -1 => CellPos::new(1, 1); "left into covered cell")]
    #[test_case(0, 0, -1, -1 => CellPos::new(0, 0); "clamped at origin")]
    fn test_arrow_steps(row: u32, col: u32, d_row: i32, d_col: i32) -> CellPos {
        let grid = grid();
        let mut ctl = SelectionController::new();
        let start = CellPos::new(row, col);
        ctl.select(&grid, SelectionKind::CellRange, start, start);
        let outcome = ctl.move_active(&grid, d_row, d_col);
        let sel = ctl.selection().unwrap();
        assert_eq!(outcome.reveal, Some(sel.anchor));
        sel.anchor
    }

    #[test]
    fn test_shift_arrow_extends_past_merge() {
        let grid = grid();
        let mut ctl = SelectionController::new();
        let start = CellPos::new(1, 0);
        ctl.select(&grid, SelectionKind::CellRange, start, start);
        // First step pulls the merge in.
        ctl.extend(&grid, 0, 1);
        assert_eq!(ctl.selection().unwrap().range, CellRange::new(1, 0, 2, 2));
        // Next step must leave the merge rather than stall inside it.
        ctl.extend(&grid, 0, 1);
        let sel = ctl.selection().unwrap();
        assert_eq!(sel.range, CellRange::new(1, 0, 2, 3));
        assert_eq!(sel.anchor, start);
    }

    #[test]
    fn test_first_selected_cell() {
        let grid = grid();
        let mut ctl = SelectionController::new();
        assert!(ctl.first_selected_cell().is_none());
        ctl.select(&grid, SelectionKind::CellRange, CellPos::new(5, 5), CellPos::new(3, 4));
        assert_eq!(ctl.first_selected_cell(), Some(CellPos::new(3, 4)));
    }
}

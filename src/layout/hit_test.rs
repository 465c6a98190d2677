//! Pixel <-> cell mapping for pointer input.
//!
//! Client coordinates are page-relative (what a pointer event carries);
//! subtracting the canvas origin gives canvas-local coordinates, and
//! subtracting the header bands and adding the scroll offset gives content
//! coordinates, which [`SizeIndex`] resolves to indices.

use serde::{Deserialize, Serialize};

use super::{
    MergeIndex, Orientation, ScrollOffset, ScrollbarPart, Scrollbars, SizeIndex, ViewportMetrics,
};
use crate::types::{CellPos, Rect, Size};

/// Everything about the current frame a hit test needs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViewFrame {
    /// Canvas top-left in client coordinates
    pub origin: (f64, f64),
    /// Row header width (`width`) and column header height (`height`)
    pub header: Size,
    pub metrics: ViewportMetrics,
    pub scroll: ScrollOffset,
    pub scrollbars: Scrollbars,
    /// Half-width of the resize zone straddling each header boundary
    pub resize_margin: f64,
}

impl ViewFrame {
    /// Cell area in canvas-local coordinates.
    pub fn cell_area(&self) -> Rect {
        Rect::new(
            self.header.width,
            self.header.height,
            self.metrics.width_avail,
            self.metrics.height_avail,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeKind {
    Col,
    Row,
}

/// A draggable boundary: the trailing edge of column/row `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeHandle {
    pub kind: ResizeKind,
    pub index: u32,
}

/// What a client point lands on, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HitTarget {
    Scrollbar(Orientation, ScrollbarPart),
    /// Top-left corner where the header bands meet (select all)
    Corner,
    Resize(ResizeHandle),
    ColumnHeader(u32),
    RowHeader(u32),
    Cell(CellPos),
    /// Outside any interactive region
    None,
}

/// Hit testing over one grid and one frame.
pub struct HitTester<'a> {
    rows: &'a SizeIndex,
    cols: &'a SizeIndex,
    merges: &'a MergeIndex,
    frame: &'a ViewFrame,
}

impl<'a> HitTester<'a> {
    pub fn new(
        rows: &'a SizeIndex,
        cols: &'a SizeIndex,
        merges: &'a MergeIndex,
        frame: &'a ViewFrame,
    ) -> Self {
        Self {
            rows,
            cols,
            merges,
            frame,
        }
    }

    fn scroll(&self) -> ScrollOffset {
        self.frame.scroll.clamped(&self.frame.metrics)
    }

    /// Client -> canvas-local.
    pub fn to_local(&self, client_x: f64, client_y: f64) -> (f64, f64) {
        (client_x - self.frame.origin.0, client_y - self.frame.origin.1)
    }

    /// Canvas-local x -> content x.
    pub fn content_x(&self, local_x: f64) -> f64 {
        local_x - self.frame.header.width + self.scroll().x
    }

    /// Canvas-local y -> content y.
    pub fn content_y(&self, local_y: f64) -> f64 {
        local_y - self.frame.header.height + self.scroll().y
    }

    /// Cell under a client point; `None` over headers, scrollbars or past the last row/column.
    pub fn pixel_to_cell(&self, client_x: f64, client_y: f64) -> Option<CellPos> {
        let (x, y) = self.to_local(client_x, client_y);
        if !self.frame.cell_area().contains(x, y) {
            return None;
        }
        let row = self.rows.index_at_checked(self.content_y(y))?;
        let col = self.cols.index_at_checked(self.content_x(x))?;
        Some(CellPos::new(row, col))
    }

    /// Cell nearest a client point, clamped into the grid. Used while dragging
    /// so the selection keeps following a pointer that has left the cell area.
    pub fn cell_at_clamped(&self, client_x: f64, client_y: f64) -> Option<CellPos> {
        if self.rows.count() == 0 || self.cols.count() == 0 {
            return None;
        }
        let (x, y) = self.to_local(client_x, client_y);
        Some(CellPos::new(
            self.rows.index_at(self.content_y(y)),
            self.cols.index_at(self.content_x(x)),
        ))
    }

    /// Column under a client x, ignoring y.
    pub fn col_at_x(&self, client_x: f64) -> Option<u32> {
        let (x, _) = self.to_local(client_x, 0.0);
        if x < self.frame.header.width {
            return None;
        }
        self.cols.index_at_checked(self.content_x(x))
    }

    /// Row under a client y, ignoring x.
    pub fn row_at_y(&self, client_y: f64) -> Option<u32> {
        let (_, y) = self.to_local(0.0, client_y);
        if y < self.frame.header.height {
            return None;
        }
        self.rows.index_at_checked(self.content_y(y))
    }

    /// Column under a client x, clamped into `[0, cols - 1]`.
    pub fn col_at_x_clamped(&self, client_x: f64) -> u32 {
        let (x, _) = self.to_local(client_x, 0.0);
        self.cols.index_at(self.content_x(x))
    }

    /// Row under a client y, clamped into `[0, rows - 1]`.
    pub fn row_at_y_clamped(&self, client_y: f64) -> u32 {
        let (_, y) = self.to_local(0.0, client_y);
        self.rows.index_at(self.content_y(y))
    }

    /// Canvas-local rectangle of a cell. Merge anchors span the whole merge;
    /// covered cells report their anchor's rectangle.
    pub fn cell_rect_local(&self, row: u32, col: u32) -> Rect {
        let (r0, c0, r1, c1) = match self.merges.merge_at(row, col) {
            Some(m) => (m.row, m.col, m.end_row(), m.end_col()),
            None => (row, col, row.saturating_add(1), col.saturating_add(1)),
        };
        let scroll = self.scroll();
        Rect::new(
            self.frame.header.width + self.cols.offset_of(c0) - scroll.x,
            self.frame.header.height + self.rows.offset_of(r0) - scroll.y,
            self.cols.span(c0, c1),
            self.rows.span(r0, r1),
        )
    }

    /// Client rectangle of a cell (see [`HitTester::cell_rect_local`]).
    pub fn cell_to_pixel_rect(&self, row: u32, col: u32) -> Rect {
        let local = self.cell_rect_local(row, col);
        Rect::new(
            local.x + self.frame.origin.0,
            local.y + self.frame.origin.1,
            local.width,
            local.height,
        )
    }

    /// Boundary handle under a client point, searched in the header bands only.
    ///
    /// The zone straddles each boundary by `resize_margin` on both sides. When
    /// two boundaries are in reach the nearer one wins; the line between
    /// column `i - 1` and `i` resizes column `i - 1`.
    pub fn resize_handle_at(&self, client_x: f64, client_y: f64) -> Option<ResizeHandle> {
        let (x, y) = self.to_local(client_x, client_y);
        let area = self.frame.cell_area();
        let header = self.frame.header;
        if y >= 0.0 && y < header.height && x >= header.width && x < area.right() {
            return nearest_boundary(self.cols, self.content_x(x), self.frame.resize_margin)
                .map(|index| ResizeHandle {
                    kind: ResizeKind::Col,
                    index,
                });
        }
        if x >= 0.0 && x < header.width && y >= header.height && y < area.bottom() {
            return nearest_boundary(self.rows, self.content_y(y), self.frame.resize_margin)
                .map(|index| ResizeHandle {
                    kind: ResizeKind::Row,
                    index,
                });
        }
        None
    }

    /// Classify a client point.
    pub fn hit_test(&self, client_x: f64, client_y: f64) -> HitTarget {
        let (x, y) = self.to_local(client_x, client_y);
        let bars = &self.frame.scrollbars;
        for bar in [bars.vertical.as_ref(), bars.horizontal.as_ref()].into_iter().flatten() {
            if let Some(part) = bar.part_at(x, y) {
                return HitTarget::Scrollbar(bar.orientation, part);
            }
        }

        let header = self.frame.header;
        let area = self.frame.cell_area();
        if x < 0.0 || y < 0.0 || x >= area.right() || y >= area.bottom() {
            return HitTarget::None;
        }
        if x < header.width && y < header.height {
            return HitTarget::Corner;
        }
        if let Some(handle) = self.resize_handle_at(client_x, client_y) {
            return HitTarget::Resize(handle);
        }
        if y < header.height {
            return self
                .col_at_x(client_x)
                .map_or(HitTarget::None, HitTarget::ColumnHeader);
        }
        if x < header.width {
            return self
                .row_at_y(client_y)
                .map_or(HitTarget::None, HitTarget::RowHeader);
        }
        self.pixel_to_cell(client_x, client_y)
            .map_or(HitTarget::None, HitTarget::Cell)
    }
}

fn nearest_boundary(index: &SizeIndex, pos: f64, margin: f64) -> Option<u32> {
    if index.count() == 0 || pos < 0.0 {
        return None;
    }
    let i = index.index_at(pos);
    let leading = index.offset_of(i);
    let trailing = index.offset_of(i.saturating_add(1));
    let d_trailing = (pos - trailing).abs();
    let d_leading = (pos - leading).abs();

    let trailing_hit = (d_trailing <= margin).then_some((d_trailing, i));
    let leading_hit = (i > 0 && d_leading <= margin).then(|| (d_leading, i - 1));
    match (trailing_hit, leading_hit) {
        (Some(t), Some(l)) => Some(if l.0 < t.0 { l.1 } else { t.1 }),
        (Some(t), None) => Some(t.1),
        (None, Some(l)) => Some(l.1),
        (None, None) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::layout::ViewportCalculator;

    struct Fixture {
        rows: SizeIndex,
        cols: SizeIndex,
        merges: MergeIndex,
        frame: ViewFrame,
    }

    impl Fixture {
        fn new(scroll: ScrollOffset) -> Self {
            let rows = SizeIndex::new(100, 20.0);
            let cols = SizeIndex::new(100, 50.0);
            let header = Size::new(40.0, 40.0);
            let metrics = ViewportCalculator::compute(
                Size::new(300.0, 200.0),
                header,
                12.0,
                Size::new(cols.total(), rows.total()),
            );
            let scroll = scroll.clamped(&metrics);
            let frame = ViewFrame {
                origin: (10.0, 5.0),
                header,
                metrics,
                scroll,
                scrollbars: Scrollbars::compute(&metrics, header, 12.0, 16.0, scroll),
                resize_margin: 4.0,
            };
            Self {
                rows,
                cols,
                merges: MergeIndex::new(),
                frame,
            }
        }

        fn tester(&self) -> HitTester<'_> {
            HitTester::new(&self.rows, &self.cols, &self.merges, &self.frame)
        }
    }

    #[test]
    fn test_pixel_to_cell_accounts_for_origin_headers_scroll() {
        let fx = Fixture::new(ScrollOffset::new(25.0, 10.0));
        // local (40+30, 40+15) -> content (55, 25) -> col 1, row 1
        assert_eq!(
            fx.tester().pixel_to_cell(10.0 + 70.0, 5.0 + 55.0),
            Some(CellPos::new(1, 1))
        );
    }

    #[test]
    fn test_headers_and_scrollbars_are_not_cells() {
        let fx = Fixture::new(ScrollOffset::default());
        let t = fx.tester();
        assert_eq!(t.pixel_to_cell(10.0 + 20.0, 5.0 + 100.0), None);
        assert_eq!(t.pixel_to_cell(10.0 + 100.0, 5.0 + 20.0), None);
        assert_eq!(t.pixel_to_cell(10.0 + 295.0, 5.0 + 100.0), None);
        assert_eq!(t.pixel_to_cell(10.0 + 100.0, 5.0 + 195.0), None);
    }

    #[test]
    fn test_hit_test_zones() {
        let fx = Fixture::new(ScrollOffset::default());
        let t = fx.tester();
        assert_eq!(t.hit_test(10.0 + 5.0, 5.0 + 5.0), HitTarget::Corner);
        assert_eq!(t.hit_test(10.0 + 65.0, 5.0 + 5.0), HitTarget::ColumnHeader(0));
        assert_eq!(t.hit_test(10.0 + 5.0, 5.0 + 65.0), HitTarget::RowHeader(1));
        assert_eq!(
            t.hit_test(10.0 + 65.0, 5.0 + 65.0),
            HitTarget::Cell(CellPos::new(1, 0))
        );
        assert_eq!(
            t.hit_test(10.0 + 294.0, 5.0 + 45.0),
            HitTarget::Scrollbar(Orientation::Vertical, ScrollbarPart::Thumb)
        );
        assert_eq!(t.hit_test(0.0, 0.0), HitTarget::None);
    }

    #[test]
    fn test_resize_handle_prefers_nearer_boundary() {
        let fx = Fixture::new(ScrollOffset::default());
        let t = fx.tester();
        // Boundary between col 0 and col 1 at content x = 50 (local 90).
        assert_eq!(
            t.resize_handle_at(10.0 + 88.0, 5.0 + 10.0),
            Some(ResizeHandle {
                kind: ResizeKind::Col,
                index: 0
            })
        );
        assert_eq!(
            t.resize_handle_at(10.0 + 92.0, 5.0 + 10.0),
            Some(ResizeHandle {
                kind: ResizeKind::Col,
                index: 0
            })
        );
        assert_eq!(t.resize_handle_at(10.0 + 110.0, 5.0 + 10.0), None);
        // Boundary between row 2 and row 3 at content y = 60 (local 100).
        assert_eq!(
            t.resize_handle_at(10.0 + 20.0, 5.0 + 101.0),
            Some(ResizeHandle {
                kind: ResizeKind::Row,
                index: 2
            })
        );
    }

    #[test]
    fn test_no_resize_handle_at_grid_origin() {
        let fx = Fixture::new(ScrollOffset::default());
        assert_eq!(fx.tester().resize_handle_at(10.0 + 41.0, 5.0 + 10.0), None);
    }

    #[test]
    fn test_merged_cell_rect() {
        let mut fx = Fixture::new(ScrollOffset::default());
        fx.merges.add(1, 1, 2, 3);
        let t = fx.tester();
        let anchor = t.cell_rect_local(1, 1);
        assert_eq!(anchor, Rect::new(90.0, 60.0, 150.0, 40.0));
        assert_eq!(t.cell_rect_local(2, 3), anchor);
    }

    #[test]
    fn test_cell_center_round_trip() {
        let fx = Fixture::new(ScrollOffset::new(120.0, 33.0));
        let t = fx.tester();
        for row in 2..8 {
            for col in 3..6 {
                let (cx, cy) = t.cell_to_pixel_rect(row, col).center();
                assert_eq!(t.pixel_to_cell(cx, cy), Some(CellPos::new(row, col)));
            }
        }
    }
}

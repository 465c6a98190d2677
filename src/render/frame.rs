//! Per-frame layout shared by every layer.

use crate::config::GridConfig;
use crate::layout::{ScrollOffset, Scrollbars, ViewportCalculator, ViewportMetrics, VisibleRange};
use crate::model::{GridData, GridSource};
use crate::protocol::MetricsSnapshot;
use crate::types::{CellRange, Rect, Size};

/// Geometry of one frame: metrics, clamped scroll, visible range, scrollbars.
pub struct FrameContext<'a> {
    pub grid: &'a GridData,
    pub config: &'a GridConfig,
    pub header: Size,
    pub metrics: ViewportMetrics,
    pub scroll: ScrollOffset,
    pub visible: Option<VisibleRange>,
    pub scrollbars: Scrollbars,
}

impl<'a> FrameContext<'a> {
    pub fn new(grid: &'a GridData, config: &'a GridConfig, canvas: Size, scroll: ScrollOffset) -> Self {
        let header = config.header_size();
        let content = Size::new(grid.col_widths().total(), grid.row_heights().total());
        let metrics =
            ViewportCalculator::compute(canvas, header, config.scrollbar_thickness, content);
        let scroll = scroll.clamped(&metrics);
        let visible = VisibleRange::compute(grid.row_heights(), grid.col_widths(), &metrics, scroll);
        let scrollbars = Scrollbars::compute(
            &metrics,
            header,
            config.scrollbar_thickness,
            config.min_thumb_length,
            scroll,
        );
        Self {
            grid,
            config,
            header,
            metrics,
            scroll,
            visible,
            scrollbars,
        }
    }

    /// Cells live here, between the header bands and the scrollbars.
    pub fn cell_area(&self) -> Rect {
        Rect::new(
            self.header.width,
            self.header.height,
            self.metrics.width_avail,
            self.metrics.height_avail,
        )
    }

    /// Canvas x of the left edge of `col`.
    pub fn col_x(&self, col: u32) -> f64 {
        self.header.width + self.grid.col_widths().offset_of(col) - self.scroll.x
    }

    /// Canvas y of the top edge of `row`.
    pub fn row_y(&self, row: u32) -> f64 {
        self.header.height + self.grid.row_heights().offset_of(row) - self.scroll.y
    }

    /// Canvas rectangle of an inclusive range.
    pub fn range_rect(&self, range: &CellRange) -> Rect {
        let n = range.normalized();
        let x = self.col_x(n.c0);
        let y = self.row_y(n.r0);
        Rect::new(
            x,
            y,
            self.col_x(n.c1.saturating_add(1)) - x,
            self.row_y(n.r1.saturating_add(1)) - y,
        )
    }

    /// Canvas rectangle of a cell; a merged cell reports its whole merge.
    pub fn cell_rect(&self, row: u32, col: u32) -> Rect {
        match self.grid.merge_at(row, col) {
            Some(merge) => self.range_rect(&merge.to_range()),
            None => self.range_rect(&CellRange::new(row, col, row, col)),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            viewport_metrics: self.metrics,
            scrollbars: self.scrollbars,
            visible: self.visible,
        }
    }
}

/// `rect` clipped to `bounds`, or None if nothing remains.
pub fn intersect(rect: Rect, bounds: Rect) -> Option<Rect> {
    let x0 = rect.x.max(bounds.x);
    let y0 = rect.y.max(bounds.y);
    let x1 = rect.right().min(bounds.right());
    let y1 = rect.bottom().min(bounds.bottom());
    (x1 > x0 && y1 > y0).then(|| Rect::new(x0, y0, x1 - x0, y1 - y0))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::MergeRange;

    fn config() -> GridConfig {
        GridConfig {
            row_header_width: 40.0,
            col_header_height: 40.0,
            ..GridConfig::default()
        }
    }

    #[test]
    fn test_cell_rect_follows_scroll_and_merges() {
        let mut grid = GridData::new(100, 100, 20.0, 50.0);
        grid.add_merge(MergeRange::new(1, 1, 2, 2));
        let config = config();
        let frame = FrameContext::new(
            &grid,
            &config,
            Size::new(300.0, 200.0),
            ScrollOffset::new(25.0, 10.0),
        );
        assert_eq!(frame.cell_rect(0, 0), Rect::new(15.0, 30.0, 50.0, 20.0));
        assert_eq!(frame.cell_rect(2, 2), Rect::new(65.0, 50.0, 100.0, 40.0));
        assert_eq!(frame.cell_area(), Rect::new(40.0, 40.0, 248.0, 148.0));
    }

    #[test]
    fn test_scroll_is_clamped() {
        let grid = GridData::new(2, 2, 20.0, 50.0);
        let config = config();
        let frame = FrameContext::new(
            &grid,
            &config,
            Size::new(300.0, 200.0),
            ScrollOffset::new(500.0, -5.0),
        );
        assert_eq!(frame.scroll, ScrollOffset::new(0.0, 0.0));
    }

    #[test]
    fn test_intersect() {
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            intersect(Rect::new(5.0, -5.0, 10.0, 10.0), bounds),
            Some(Rect::new(5.0, 0.0, 5.0, 5.0))
        );
        assert_eq!(intersect(Rect::new(20.0, 0.0, 5.0, 5.0), bounds), None);
    }
}

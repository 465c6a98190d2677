//! Selection overlay helpers.
//!
//! These helpers keep selection math testable without depending on a surface.

use super::colors::selection_fill;
use super::frame::{intersect, FrameContext};
use super::overflow::EdgeSuppression;
use super::surface::{Layer, Surface};
use crate::types::{CellPos, CellRange, Rect};

/// Outline width in pixels.
const OUTLINE_WIDTH: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub draw_top: bool,
    pub draw_bottom: bool,
    pub draw_left: bool,
    pub draw_right: bool,
}

/// Visible part of `range`, with an edge flag cleared wherever that edge is
/// scrolled out of the cell area. A single selected cell whose text
/// overflows to the right also loses its right edge.
pub fn selection_rect(
    range: &CellRange,
    frame: &FrameContext<'_>,
    suppression: &dyn EdgeSuppression,
) -> Option<SelectionRect> {
    let area = frame.cell_area();
    let raw = frame.range_rect(range);
    let clipped = intersect(raw, area)?;
    let n = range.normalized();
    let single = n.r0 == n.r1 && n.c0 == n.c1;
    Some(SelectionRect {
        x: clipped.x,
        y: clipped.y,
        w: clipped.width,
        h: clipped.height,
        draw_top: raw.y >= area.y,
        draw_bottom: raw.bottom() <= area.bottom(),
        draw_left: raw.x >= area.x,
        draw_right: raw.right() <= area.right()
            && !(single && suppression.suppresses_right_edge(n.r0, n.c0)),
    })
}

/// Fill and outline the selection; a multi-cell range also frames its anchor.
pub fn paint_selection<S: Surface>(
    surface: &mut S,
    frame: &FrameContext<'_>,
    range: &CellRange,
    anchor: Option<CellPos>,
    color: &str,
    suppression: &dyn EdgeSuppression,
) {
    let Some(rect) = selection_rect(range, frame, suppression) else {
        return;
    };
    let n = range.normalized();
    let multi = n.r0 != n.r1 || n.c0 != n.c1;
    let area = frame.cell_area();
    surface.push_clip(Layer::Overlay, area);

    let bounds = Rect::new(rect.x, rect.y, rect.w, rect.h);
    if multi {
        surface.fill_rect(Layer::Overlay, bounds, &selection_fill(color));
        if let Some(anchor) = anchor.filter(|a| range.contains(a.row, a.col)) {
            let cell = frame.cell_rect(anchor.row, anchor.col);
            surface.stroke_rect(Layer::Overlay, cell, color, 1.0);
        }
    }

    let (x0, y0) = (rect.x, rect.y);
    let (x1, y1) = (rect.x + rect.w, rect.y + rect.h);
    if rect.draw_top {
        surface.line(Layer::Overlay, (x0, y0), (x1, y0), color, OUTLINE_WIDTH);
    }
    if rect.draw_bottom {
        surface.line(Layer::Overlay, (x0, y1), (x1, y1), color, OUTLINE_WIDTH);
    }
    if rect.draw_left {
        surface.line(Layer::Overlay, (x0, y0), (x0, y1), color, OUTLINE_WIDTH);
    }
    if rect.draw_right {
        surface.line(Layer::Overlay, (x1, y0), (x1, y1), color, OUTLINE_WIDTH);
    }
    surface.pop_clip(Layer::Overlay);
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
    use crate::config::GridConfig;
    use crate::layout::ScrollOffset;
    use crate::model::GridData;
    use crate::render::OverflowSpans;
    use crate::types::Size;

    fn config() -> GridConfig {
        GridConfig {
            row_header_width: 40.0,
            col_header_height: 40.0,
            ..GridConfig::default()
        }
    }

    #[test]
    fn selection_rect_inside_viewport() {
        let grid = GridData::new(100, 100, 20.0, 50.0);
        let config = config();
        let frame = FrameContext::new(&grid, &config, Size::new(300.0, 200.0), ScrollOffset::default());
        let rect = selection_rect(&CellRange::new(2, 1, 1, 2), &frame, &OverflowSpans::new()).unwrap();
        assert_eq!((rect.x, rect.y, rect.w, rect.h), (90.0, 60.0, 100.0, 40.0));
        assert!(rect.draw_top && rect.draw_bottom && rect.draw_left && rect.draw_right);
    }

    #[test]
    fn selection_rect_scrolled_partly_off() {
        let grid = GridData::new(100, 100, 20.0, 50.0);
        let config = config();
        let frame = FrameContext::new(
            &grid,
            &config,
            Size::new(300.0, 200.0),
            ScrollOffset::new(0.0, 30.0),
        );
        let rect = selection_rect(&CellRange::new(0, 0, 2, 0), &frame, &OverflowSpans::new()).unwrap();
        assert!(!rect.draw_top);
        assert!(rect.draw_bottom);
        assert_eq!(rect.y, 40.0);
        assert_eq!(rect.h, 30.0);
    }

    #[test]
    fn selection_rect_off_screen() {
        let grid = GridData::new(100, 100, 20.0, 50.0);
        let config = config();
        let frame = FrameContext::new(&grid, &config, Size::new(300.0, 200.0), ScrollOffset::default());
        assert!(selection_rect(&CellRange::new(50, 50, 50, 50), &frame, &OverflowSpans::new()).is_none());
    }

    #[test]
    fn overflow_suppresses_single_cell_right_edge() {
        let grid = GridData::new(100, 100, 20.0, 50.0);
        let config = config();
        let frame = FrameContext::new(&grid, &config, Size::new(300.0, 200.0), ScrollOffset::default());
        let mut spans = OverflowSpans::new();
        spans.insert(1, 1, 3);
        let single = selection_rect(&CellRange::new(1, 1, 1, 1), &frame, &spans).unwrap();
        assert!(!single.draw_right);
        let wide = selection_rect(&CellRange::new(1, 1, 1, 2), &frame, &spans).unwrap();
        assert!(wide.draw_right);
    }
}

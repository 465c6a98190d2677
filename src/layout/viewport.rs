//! Viewport metrics: available space, scrollbar visibility and scroll limits.

use serde::{Deserialize, Serialize};

use super::SizeIndex;
use crate::types::Size;

/// Upper bound on scrollbar-visibility passes.
///
/// Each flag can only flip from hidden to visible (showing one bar shrinks the
/// space available to the other axis, never grows it), so two flags settle
/// after at most two flips; the third pass only confirms.
const MAX_VISIBILITY_PASSES: usize = 3;

/// Derived layout of the viewport for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportMetrics {
    /// Width of the cell area (canvas minus row header minus vertical scrollbar)
    pub width_avail: f64,
    /// Height of the cell area (canvas minus column header minus horizontal scrollbar)
    pub height_avail: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub max_scroll_x: f64,
    pub max_scroll_y: f64,
    /// Full canvas width
    pub viewport_width: f64,
    /// Full canvas height
    pub viewport_height: f64,
    pub v_scroll_visible: bool,
    pub h_scroll_visible: bool,
}

/// Resolves the scrollbar-visibility fixed point.
pub struct ViewportCalculator;

impl ViewportCalculator {
    /// Compute metrics for a canvas of `canvas` size with header bands of
    /// `header.width` (row header) and `header.height` (column header).
    pub fn compute(canvas: Size, header: Size, thickness: f64, content: Size) -> ViewportMetrics {
        let raw_w = (canvas.width - header.width).max(0.0);
        let raw_h = (canvas.height - header.height).max(0.0);
        let thickness = thickness.max(0.0);

        let mut v_visible = content.height > raw_h;
        let mut h_visible = content.width > raw_w;
        for _ in 0..MAX_VISIBILITY_PASSES {
            let avail_w = (raw_w - if v_visible { thickness } else { 0.0 }).max(0.0);
            let avail_h = (raw_h - if h_visible { thickness } else { 0.0 }).max(0.0);
            let next_v = content.height > avail_h;
            let next_h = content.width > avail_w;
            if next_v == v_visible && next_h == h_visible {
                break;
            }
            v_visible = next_v;
            h_visible = next_h;
        }

        let width_avail = (raw_w - if v_visible { thickness } else { 0.0 }).max(0.0);
        let height_avail = (raw_h - if h_visible { thickness } else { 0.0 }).max(0.0);

        ViewportMetrics {
            width_avail,
            height_avail,
            content_width: content.width,
            content_height: content.height,
            max_scroll_x: (content.width - width_avail).max(0.0),
            max_scroll_y: (content.height - height_avail).max(0.0),
            viewport_width: canvas.width.max(0.0),
            viewport_height: canvas.height.max(0.0),
            v_scroll_visible: v_visible,
            h_scroll_visible: h_visible,
        }
    }
}

/// Scroll position in content pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

impl ScrollOffset {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same offset clamped to `[0, max_scroll]` on both axes.
    #[must_use]
    pub fn clamped(self, metrics: &ViewportMetrics) -> Self {
        Self {
            x: clamp_axis(self.x, metrics.max_scroll_x),
            y: clamp_axis(self.y, metrics.max_scroll_y),
        }
    }

    /// Clamp in place; returns true if the offset changed.
    pub fn clamp_to(&mut self, metrics: &ViewportMetrics) -> bool {
        let clamped = self.clamped(metrics);
        let changed = clamped != *self;
        *self = clamped;
        changed
    }

    /// Scroll by a delta and clamp; returns true if the offset changed.
    pub fn scroll_by(&mut self, dx: f64, dy: f64, metrics: &ViewportMetrics) -> bool {
        let before = *self;
        self.x += dx;
        self.y += dy;
        self.clamp_to(metrics);
        before != *self
    }
}

fn clamp_axis(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max.max(0.0))
}

/// Inclusive row/column range intersecting the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibleRange {
    pub row_start: u32,
    pub row_end: u32,
    pub col_start: u32,
    pub col_end: u32,
}

impl VisibleRange {
    /// Rows/columns overlapping `[scroll, scroll + avail)`; `None` for an empty grid.
    pub fn compute(
        rows: &SizeIndex,
        cols: &SizeIndex,
        metrics: &ViewportMetrics,
        scroll: ScrollOffset,
    ) -> Option<Self> {
        if rows.count() == 0 || cols.count() == 0 {
            return None;
        }
        let row_start = rows.index_at(scroll.y);
        let col_start = cols.index_at(scroll.x);
        let row_end = rows.index_at(scroll.y + metrics.height_avail);
        let col_end = cols.index_at(scroll.x + metrics.width_avail);
        Some(Self {
            row_start,
            row_end: row_end.max(row_start),
            col_start,
            col_end: col_end.max(col_start),
        })
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.row_start && row <= self.row_end && col >= self.col_start && col <= self.col_end
    }
}

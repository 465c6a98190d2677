//! Text overflow into empty neighbors.
//!
//! Single-line, left-flowing text wider than its cell may spill into empty
//! cells on its right. Those boundaries must not draw a grid line, and a
//! single-cell selection there must not draw its right edge. The content
//! layer records the spans; other layers ask [`EdgeSuppression`].

use std::collections::BTreeMap;

/// Answers whether a cell's right edge is hidden by content.
pub trait EdgeSuppression {
    fn suppresses_right_edge(&self, row: u32, col: u32) -> bool;
}

/// Column spans `[start, end]` (inclusive) that one cell's text covers, by row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverflowSpans {
    rows: BTreeMap<u32, Vec<(u32, u32)>>,
}

impl OverflowSpans {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that the text of `(row, start)` runs through column `end`.
    pub fn insert(&mut self, row: u32, start: u32, end: u32) {
        if end > start {
            self.rows.entry(row).or_default().push((start, end));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Span owning column `col` on `row`, if any.
    pub fn span_at(&self, row: u32, col: u32) -> Option<(u32, u32)> {
        self.rows
            .get(&row)?
            .iter()
            .copied()
            .find(|&(start, end)| col >= start && col <= end)
    }
}

impl EdgeSuppression for OverflowSpans {
    fn suppresses_right_edge(&self, row: u32, col: u32) -> bool {
        self.span_at(row, col).is_some_and(|(_, end)| col < end)
    }
}

use serde::{Deserialize, Serialize};

use super::{CellPos, CellRange};

/// A merged rectangle. The anchor `(row, col)` is its top-left cell and the
/// only cell of the range that carries content and style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MergeRange {
    #[serde(rename = "r")]
    pub row: u32,
    #[serde(rename = "c")]
    pub col: u32,
    /// Row span, at least 1
    pub rows: u32,
    /// Column span, at least 1
    pub cols: u32,
}

impl MergeRange {
    pub const fn new(row: u32, col: u32, rows: u32, cols: u32) -> Self {
        Self {
            row,
            col,
            rows,
            cols,
        }
    }

    pub fn anchor(&self) -> CellPos {
        CellPos::new(self.row, self.col)
    }

    /// One past the last row (half-open end).
    pub fn end_row(&self) -> u32 {
        self.row.saturating_add(self.rows)
    }

    /// One past the last column (half-open end).
    pub fn end_col(&self) -> u32 {
        self.col.saturating_add(self.cols)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.row && row < self.end_row() && col >= self.col && col < self.end_col()
    }

    /// Half-open overlap test against another merge.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.row < other.end_row()
            && other.row < self.end_row()
            && self.col < other.end_col()
            && other.col < self.end_col()
    }

    /// Half-open overlap test against an inclusive cell range.
    pub fn intersects(&self, range: &CellRange) -> bool {
        let n = range.normalized();
        self.row < n.r1.saturating_add(1)
            && n.r0 < self.end_row()
            && self.col < n.c1.saturating_add(1)
            && n.c0 < self.end_col()
    }

    /// The inclusive cell range this merge covers.
    pub fn to_range(&self) -> CellRange {
        CellRange::new(
            self.row,
            self.col,
            self.end_row().saturating_sub(1),
            self.end_col().saturating_sub(1),
        )
    }

    pub fn is_single_cell(&self) -> bool {
        self.rows <= 1 && self.cols <= 1
    }
}

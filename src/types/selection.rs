use serde::{Deserialize, Serialize};

use super::{CellPos, CellRange};

/// How a selection was made. Header selections span the full orthogonal axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionKind {
    /// Standard cell selection (default)
    #[default]
    CellRange,
    /// Entire row(s) selected
    RowRange,
    /// Entire column(s) selected
    ColumnRange,
    /// All cells selected (corner click)
    All,
}

/// The current selection: a merge-expanded rectangle plus the drag anchor.
///
/// `range` is what the renderer outlines. `anchor` is where the drag (or
/// keyboard extension) started and is never moved by merge expansion.
/// `focus` is the live corner opposite the anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: SelectionKind,
    #[serde(rename = "sel")]
    pub range: CellRange,
    pub anchor: CellPos,
    pub focus: CellPos,
}

impl Selection {
    /// Single cell selection (before merge expansion).
    pub fn cell(pos: CellPos) -> Self {
        Self {
            kind: SelectionKind::CellRange,
            range: CellRange::cell(pos),
            anchor: pos,
            focus: pos,
        }
    }

    /// Rows `anchor_row..=focus_row` across all `cols` columns.
    pub fn rows(anchor_row: u32, focus_row: u32, cols: u32) -> Self {
        let last_col = cols.saturating_sub(1);
        Self {
            kind: SelectionKind::RowRange,
            range: CellRange::new(anchor_row, 0, focus_row, last_col),
            anchor: CellPos::new(anchor_row, 0),
            focus: CellPos::new(focus_row, last_col),
        }
    }

    /// Columns `anchor_col..=focus_col` across all `rows` rows.
    pub fn columns(anchor_col: u32, focus_col: u32, rows: u32) -> Self {
        let last_row = rows.saturating_sub(1);
        Self {
            kind: SelectionKind::ColumnRange,
            range: CellRange::new(0, anchor_col, last_row, focus_col),
            anchor: CellPos::new(0, anchor_col),
            focus: CellPos::new(last_row, focus_col),
        }
    }

    /// The whole grid, anchored at `(0, 0)`.
    pub fn all(rows: u32, cols: u32) -> Self {
        let last = CellPos::new(rows.saturating_sub(1), cols.saturating_sub(1));
        Self {
            kind: SelectionKind::All,
            range: CellRange::from_corners(CellPos::new(0, 0), last),
            anchor: CellPos::new(0, 0),
            focus: last,
        }
    }

    /// Normalized bounds `(r0, c0, r1, c1)`.
    pub fn bounds(&self) -> (u32, u32, u32, u32) {
        let n = self.range.normalized();
        (n.r0, n.c0, n.r1, n.c1)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        self.range.contains(row, col)
    }

    pub fn is_full_row(&self, row: u32) -> bool {
        matches!(self.kind, SelectionKind::RowRange | SelectionKind::All) && {
            let (r0, _, r1, _) = self.bounds();
            row >= r0 && row <= r1
        }
    }

    pub fn is_full_col(&self, col: u32) -> bool {
        matches!(self.kind, SelectionKind::ColumnRange | SelectionKind::All) && {
            let (_, c0, _, c1) = self.bounds();
            col >= c0 && col <= c1
        }
    }
}

use serde::{Deserialize, Serialize};

/// A cell address (0-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CellPos {
    #[serde(rename = "r")]
    pub row: u32,
    #[serde(rename = "c")]
    pub col: u32,
}

impl CellPos {
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }
}

impl From<(u32, u32)> for CellPos {
    fn from((row, col): (u32, u32)) -> Self {
        Self { row, col }
    }
}

/// A rectangular range given by two corners in any order.
///
/// `r0/c0` is not necessarily the top-left; call [`CellRange::normalized`]
/// before doing interval math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellRange {
    pub r0: u32,
    pub c0: u32,
    pub r1: u32,
    pub c1: u32,
}

impl CellRange {
    pub const fn new(r0: u32, c0: u32, r1: u32, c1: u32) -> Self {
        Self { r0, c0, r1, c1 }
    }

    /// Range spanning two corner cells.
    pub fn from_corners(a: CellPos, b: CellPos) -> Self {
        Self::new(a.row, a.col, b.row, b.col)
    }

    /// Single-cell range.
    pub fn cell(pos: CellPos) -> Self {
        Self::from_corners(pos, pos)
    }

    /// Same range with `r0 <= r1` and `c0 <= c1`.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            r0: self.r0.min(self.r1),
            c0: self.c0.min(self.c1),
            r1: self.r0.max(self.r1),
            c1: self.c0.max(self.c1),
        }
    }

    /// Inclusive containment test (normalizes first).
    pub fn contains(&self, row: u32, col: u32) -> bool {
        let n = self.normalized();
        row >= n.r0 && row <= n.r1 && col >= n.c0 && col <= n.c1
    }

    /// Smallest normalized range covering both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let a = self.normalized();
        let b = other.normalized();
        Self {
            r0: a.r0.min(b.r0),
            c0: a.c0.min(b.c0),
            r1: a.r1.max(b.r1),
            c1: a.c1.max(b.c1),
        }
    }

    /// Top-left cell of the normalized range.
    pub fn top_left(&self) -> CellPos {
        let n = self.normalized();
        CellPos::new(n.r0, n.c0)
    }

    /// Number of rows covered.
    pub fn row_count(&self) -> u32 {
        let n = self.normalized();
        n.r1 - n.r0 + 1
    }

    /// Number of columns covered.
    pub fn col_count(&self) -> u32 {
        let n = self.normalized();
        n.c1 - n.c0 + 1
    }
}

//! Registry of non-overlapping merge rectangles.

use tracing::debug;

use crate::error::{GridError, Result};
use crate::types::{CellRange, MergeRange};

/// Pairwise non-overlapping merges, sorted by anchor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeIndex {
    merges: Vec<MergeRange>,
}

impl MergeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.merges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergeRange> {
        self.merges.iter()
    }

    /// The merge covering `(row, col)`, whether or not it is the anchor.
    pub fn merge_at(&self, row: u32, col: u32) -> Option<&MergeRange> {
        // Merges are sorted by anchor row, so anything starting below `row` is out.
        let end = self.merges.partition_point(|m| m.row <= row);
        self.merges
            .get(..end)
            .and_then(|candidates| candidates.iter().find(|m| m.contains(row, col)))
    }

    /// Insert a merge, rejecting empty spans and overlaps.
    ///
    /// # Errors
    /// Returns [`GridError::InvalidMergeRange`]; the index is left untouched.
    pub fn try_add(&mut self, merge: MergeRange) -> Result<()> {
        let invalid = GridError::InvalidMergeRange {
            row: merge.row,
            col: merge.col,
            rows: merge.rows,
            cols: merge.cols,
        };
        if merge.rows == 0 || merge.cols == 0 {
            return Err(invalid);
        }
        if self.merges.iter().any(|m| m.overlaps(&merge)) {
            return Err(invalid);
        }
        let at = self
            .merges
            .partition_point(|m| (m.row, m.col) < (merge.row, merge.col));
        self.merges.insert(at, merge);
        Ok(())
    }

    /// Insert a merge; `false` (and no mutation) if it would overlap.
    pub fn add(&mut self, row: u32, col: u32, rows: u32, cols: u32) -> bool {
        match self.try_add(MergeRange::new(row, col, rows, cols)) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "merge rejected");
                false
            }
        }
    }

    /// Remove the merge anchored at or covering `(row, col)`.
    pub fn remove_at(&mut self, row: u32, col: u32) -> Option<MergeRange> {
        let pos = self.merges.iter().position(|m| m.contains(row, col))?;
        Some(self.merges.remove(pos))
    }

    /// Grow `range` until no merge straddles its border.
    ///
    /// Each pass unions in every merge that intersects the current rectangle.
    /// The rectangle only grows, and every pass that changes it absorbs at
    /// least one merge that was not already contained, so the loop runs at
    /// most `len() + 1` passes. The result is the smallest merge-closed
    /// rectangle containing `range`, hence idempotent and independent of the
    /// order merges are visited.
    pub fn expand(&self, range: CellRange) -> CellRange {
        let mut current = range.normalized();
        loop {
            let mut changed = false;
            for merge in &self.merges {
                if merge.intersects(&current) {
                    let grown = current.union(&merge.to_range());
                    if grown != current {
                        current = grown;
                        changed = true;
                    }
                }
            }
            if !changed {
                return current;
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_at_covers_all_cells() {
        let mut index = MergeIndex::new();
        assert!(index.add(1, 1, 2, 3));
        for r in 1..3 {
            for c in 1..4 {
                assert_eq!(index.merge_at(r, c).unwrap().anchor().row, 1);
            }
        }
        assert!(index.merge_at(0, 1).is_none());
        assert!(index.merge_at(3, 1).is_none());
        assert!(index.merge_at(1, 4).is_none());
    }

    #[test]
    fn test_overlap_rejected_without_mutation() {
        let mut index = MergeIndex::new();
        assert!(index.add(0, 0, 2, 2));
        let before = index.clone();
        assert!(!index.add(1, 1, 2, 2));
        assert_eq!(index, before);
    }

    #[test]
    fn test_adjacent_merges_allowed() {
        let mut index = MergeIndex::new();
        assert!(index.add(0, 0, 2, 2));
        assert!(index.add(0, 2, 2, 2));
        assert!(index.add(2, 0, 1, 4));
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_empty_span_rejected() {
        let mut index = MergeIndex::new();
        assert!(matches!(
            index.try_add(MergeRange::new(0, 0, 0, 2)),
            Err(GridError::InvalidMergeRange { .. })
        ));
    }

    #[test]
    fn test_remove_by_covered_cell() {
        let mut index = MergeIndex::new();
        index.add(3, 3, 2, 2);
        assert_eq!(index.remove_at(4, 4), Some(MergeRange::new(3, 3, 2, 2)));
        assert!(index.remove_at(4, 4).is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_expand_from_covered_cell() {
        let mut index = MergeIndex::new();
        index.add(1, 1, 2, 2);
        assert_eq!(
            index.expand(CellRange::new(2, 2, 2, 2)),
            CellRange::new(1, 1, 2, 2)
        );
    }

    #[test]
    fn test_expand_chains_through_merges() {
        let mut index = MergeIndex::new();
        // Selecting (0,0)..(0,1) touches A, which reaches into row 1 where B starts.
        index.add(0, 1, 2, 1); // A: rows 0-1, col 1
        index.add(1, 2, 3, 2); // B: rows 1-3, cols 2-3
        let expanded = index.expand(CellRange::new(0, 0, 0, 2));
        assert_eq!(expanded, CellRange::new(0, 0, 3, 3));
        assert_eq!(index.expand(expanded), expanded);
    }

    #[test]
    fn test_expand_normalizes_reversed_corners() {
        let index = MergeIndex::new();
        assert_eq!(
            index.expand(CellRange::new(5, 4, 1, 2)),
            CellRange::new(1, 2, 5, 4)
        );
    }
}

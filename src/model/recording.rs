//! Recording facade over the authoritative grid.

use tracing::trace;

use super::{GridData, GridOp};

/// Wraps a [`GridData`] so each accepted mutation is also logged as a
/// [`GridOp`]. Rejected mutations change nothing and log nothing.
#[derive(Debug, Clone)]
pub struct RecordingGrid {
    grid: GridData,
    log: Vec<GridOp>,
}

impl RecordingGrid {
    pub fn new(grid: GridData) -> Self {
        Self {
            grid,
            log: Vec::new(),
        }
    }

    pub fn grid(&self) -> &GridData {
        &self.grid
    }

    /// Apply `op` to the grid and log it if accepted.
    pub fn record(&mut self, op: GridOp) -> bool {
        if !self.grid.apply(&op) {
            trace!(?op, "op rejected");
            return false;
        }
        self.log.push(op);
        true
    }

    /// Drain the log in issue order.
    pub fn take_ops(&mut self) -> Vec<GridOp> {
        std::mem::take(&mut self.log)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::GridSource;
    use crate::types::MergeRange;

    fn merge(row: u32, col: u32, rows: u32, cols: u32) -> GridOp {
        GridOp::AddMerge {
            merge: MergeRange::new(row, col, rows, cols),
        }
    }

    #[test]
    fn test_rejected_merge_is_not_logged() {
        let mut rec = RecordingGrid::new(GridData::new(10, 10, 20.0, 50.0));
        assert!(rec.record(merge(0, 0, 2, 2)));
        assert!(!rec.record(merge(1, 1, 2, 2)));
        assert!(!rec.record(merge(9, 9, 2, 2)));
        assert_eq!(rec.take_ops().len(), 1);
        assert_eq!(rec.grid().merges().len(), 1);
    }

    #[test]
    fn test_replay_in_order_matches_authoritative_grid() {
        let mut rec = RecordingGrid::new(GridData::new(10, 10, 20.0, 50.0));
        let mut mirror = rec.grid().empty_like();
        rec.record(GridOp::SetValue {
            row: 2,
            col: 2,
            value: Some("x".into()),
        });
        rec.record(merge(2, 2, 1, 3));
        rec.record(GridOp::RemoveMergeAt { row: 2, col: 4 });
        rec.record(merge(2, 3, 2, 2));
        rec.record(GridOp::SetColWidth {
            col: 3,
            width: 120.0,
        });
        let ops = rec.take_ops();
        assert_eq!(ops.len(), 5);
        for op in &ops {
            assert!(mirror.apply(op));
        }
        assert_eq!(&mirror, rec.grid());
        assert!(rec.take_ops().is_empty());
    }
}

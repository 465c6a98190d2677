//! The grid: values, styles, size overrides and merges.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::GridOp;
use crate::layout::{MergeIndex, SizeIndex};
use crate::error::{GridError, Result};
use crate::types::{CellPos, CellStyle, MergeRange, StyleId};

/// Read access to a grid, as consumed by the renderer.
pub trait GridSource {
    fn rows(&self) -> u32;
    fn cols(&self) -> u32;
    fn value_at(&self, row: u32, col: u32) -> Option<&str>;
    fn style_at(&self, row: u32, col: u32) -> Option<&CellStyle>;
    fn merge_at(&self, row: u32, col: u32) -> Option<&MergeRange>;
    fn row_heights(&self) -> &SizeIndex;
    fn col_widths(&self) -> &SizeIndex;
    fn merges(&self) -> &MergeIndex;
}

/// A sparse grid with fixed dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct GridData {
    rows: u32,
    cols: u32,
    values: HashMap<CellPos, String>,
    cell_styles: HashMap<CellPos, StyleId>,
    styles: BTreeMap<StyleId, CellStyle>,
    row_heights: SizeIndex,
    col_widths: SizeIndex,
    merges: MergeIndex,
}

impl GridData {
    pub fn new(rows: u32, cols: u32, default_row_height: f64, default_col_width: f64) -> Self {
        Self {
            rows,
            cols,
            values: HashMap::new(),
            cell_styles: HashMap::new(),
            styles: BTreeMap::new(),
            row_heights: SizeIndex::new(rows, default_row_height),
            col_widths: SizeIndex::new(cols, default_col_width),
            merges: MergeIndex::new(),
        }
    }

    /// Empty grid with the same dimensions and default sizes.
    pub fn empty_like(&self) -> Self {
        Self::new(
            self.rows,
            self.cols,
            self.row_heights.default_size(),
            self.col_widths.default_size(),
        )
    }

    fn in_bounds(&self, row: u32, col: u32) -> bool {
        row < self.rows && col < self.cols
    }

    /// Set or clear a value. Empty strings clear. `false` outside the grid.
    pub fn set_value(&mut self, row: u32, col: u32, value: Option<String>) -> bool {
        if !self.in_bounds(row, col) {
            return false;
        }
        let pos = CellPos::new(row, col);
        match value {
            Some(v) if !v.is_empty() => {
                self.values.insert(pos, v);
            }
            _ => {
                self.values.remove(&pos);
            }
        }
        true
    }

    /// Assign or clear a style. Unregistered style ids are rejected.
    pub fn set_cell_style(&mut self, row: u32, col: u32, style: Option<StyleId>) -> bool {
        if !self.in_bounds(row, col) {
            return false;
        }
        let pos = CellPos::new(row, col);
        match style {
            Some(id) if self.styles.contains_key(&id) => {
                self.cell_styles.insert(pos, id);
            }
            Some(id) => {
                debug!(style = id.0, "unknown style id");
                return false;
            }
            None => {
                self.cell_styles.remove(&pos);
            }
        }
        true
    }

    pub fn define_style(&mut self, id: StyleId, style: CellStyle) {
        self.styles.insert(id, style);
    }

    pub fn style(&self, id: StyleId) -> Option<&CellStyle> {
        self.styles.get(&id)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) -> bool {
        self.row_heights.set_size(row, height)
    }

    pub fn set_col_width(&mut self, col: u32, width: f64) -> bool {
        self.col_widths.set_size(col, width)
    }

    /// Add a merge.
    ///
    /// # Errors
    /// [`GridError::OutOfBounds`] if the merge leaves the grid,
    /// [`GridError::InvalidMergeRange`] if it is empty or overlaps another merge.
    pub fn try_add_merge(&mut self, merge: MergeRange) -> Result<()> {
        if merge.end_row() > self.rows || merge.end_col() > self.cols {
            return Err(GridError::OutOfBounds(format!(
                "merge at ({}, {}) spanning {}x{} leaves the {}x{} grid",
                merge.row, merge.col, merge.rows, merge.cols, self.rows, self.cols
            )));
        }
        self.merges.try_add(merge)
    }

    /// Add a merge; `false` if it leaves the grid or overlaps another merge.
    pub fn add_merge(&mut self, merge: MergeRange) -> bool {
        match self.try_add_merge(merge) {
            Ok(()) => true,
            Err(e) => {
                debug!(error = %e, "merge rejected");
                false
            }
        }
    }

    pub fn remove_merge_at(&mut self, row: u32, col: u32) -> Option<MergeRange> {
        self.merges.remove_at(row, col)
    }

    /// Apply one op. Returns whether the grid accepted it.
    pub fn apply(&mut self, op: &GridOp) -> bool {
        match op {
            GridOp::SetValue { row, col, value } => self.set_value(*row, *col, value.clone()),
            GridOp::SetCellStyle { row, col, style } => self.set_cell_style(*row, *col, *style),
            GridOp::SetRowHeight { row, height } => self.set_row_height(*row, *height),
            GridOp::SetColWidth { col, width } => self.set_col_width(*col, *width),
            GridOp::AddMerge { merge } => self.add_merge(*merge),
            GridOp::RemoveMergeAt { row, col } => self.remove_merge_at(*row, *col).is_some(),
            GridOp::DefineStyle { id, style } => {
                self.define_style(*id, style.clone());
                true
            }
        }
    }

    /// Ops that rebuild this grid from [`GridData::empty_like`]. Styles come
    /// first so cell style assignments resolve on replay.
    pub fn snapshot_ops(&self) -> Vec<GridOp> {
        let mut ops = Vec::new();
        for (id, style) in &self.styles {
            ops.push(GridOp::DefineStyle {
                id: *id,
                style: style.clone(),
            });
        }
        for (&row, &height) in self.row_heights.overrides() {
            ops.push(GridOp::SetRowHeight { row, height });
        }
        for (&col, &width) in self.col_widths.overrides() {
            ops.push(GridOp::SetColWidth { col, width });
        }
        for merge in self.merges.iter() {
            ops.push(GridOp::AddMerge { merge: *merge });
        }
        let mut values: Vec<_> = self.values.iter().collect();
        values.sort_by_key(|(pos, _)| **pos);
        for (pos, value) in values {
            ops.push(GridOp::SetValue {
                row: pos.row,
                col: pos.col,
                value: Some(value.clone()),
            });
        }
        let mut styled: Vec<_> = self.cell_styles.iter().collect();
        styled.sort_by_key(|(pos, _)| **pos);
        for (pos, id) in styled {
            ops.push(GridOp::SetCellStyle {
                row: pos.row,
                col: pos.col,
                style: Some(*id),
            });
        }
        ops
    }
}

impl GridSource for GridData {
    fn rows(&self) -> u32 {
        self.rows
    }

    fn cols(&self) -> u32 {
        self.cols
    }

    fn value_at(&self, row: u32, col: u32) -> Option<&str> {
        self.values.get(&CellPos::new(row, col)).map(String::as_str)
    }

    fn style_at(&self, row: u32, col: u32) -> Option<&CellStyle> {
        self.cell_styles
            .get(&CellPos::new(row, col))
            .and_then(|id| self.styles.get(id))
    }

    fn merge_at(&self, row: u32, col: u32) -> Option<&MergeRange> {
        self.merges.merge_at(row, col)
    }

    fn row_heights(&self) -> &SizeIndex {
        &self.row_heights
    }

    fn col_widths(&self) -> &SizeIndex {
        &self.col_widths
    }

    fn merges(&self) -> &MergeIndex {
        &self.merges
    }
}

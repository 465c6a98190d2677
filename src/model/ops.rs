use serde::{Deserialize, Serialize};

use crate::types::{CellStyle, MergeRange, StyleId};

/// One grid mutation, replayed in issue order on the render-side mirror.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum GridOp {
    /// Set or clear (`None`) a cell value
    SetValue {
        row: u32,
        col: u32,
        value: Option<String>,
    },
    /// Assign or clear a registered style on a cell
    SetCellStyle {
        row: u32,
        col: u32,
        style: Option<StyleId>,
    },
    SetRowHeight { row: u32, height: f64 },
    SetColWidth { col: u32, width: f64 },
    AddMerge { merge: MergeRange },
    RemoveMergeAt { row: u32, col: u32 },
    /// Register (or replace) a style in the registry
    DefineStyle { id: StyleId, style: CellStyle },
}

impl GridOp {
    /// Whether this op changes row/column sizes or merges (and thus content size or hit geometry).
    pub fn affects_geometry(&self) -> bool {
        matches!(
            self,
            Self::SetRowHeight { .. }
                | Self::SetColWidth { .. }
                | Self::AddMerge { .. }
                | Self::RemoveMergeAt { .. }
        )
    }
}

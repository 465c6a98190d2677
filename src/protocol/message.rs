use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::RequestId;
use crate::config::HeaderStyle;
use crate::layout::{Scrollbars, ViewportMetrics, VisibleRange};
use crate::model::GridOp;
use crate::render::{CaretOptions, TextSegment};
use crate::types::{CellPos, CellRange};

/// Resize guide lines, in canvas-local pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Guides {
    /// Vertical guide at this x (column resize)
    pub x: Option<f64>,
    /// Horizontal guide at this y (row resize)
    pub y: Option<f64>,
}

/// Scrollbar interaction flags held by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollbarState {
    pub v_hover: bool,
    pub h_hover: bool,
    pub v_active: bool,
    pub h_active: bool,
}

/// Partial update of [`ScrollbarState`]; absent fields keep their value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollbarStatePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v_hover: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_hover: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub v_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h_active: Option<bool>,
}

impl ScrollbarState {
    pub fn apply(&mut self, patch: &ScrollbarStatePatch) {
        if let Some(v) = patch.v_hover {
            self.v_hover = v;
        }
        if let Some(v) = patch.h_hover {
            self.h_hover = v;
        }
        if let Some(v) = patch.v_active {
            self.v_active = v;
        }
        if let Some(v) = patch.h_active {
            self.h_active = v;
        }
    }

    /// Patch carrying only the fields where `next` differs from `self`.
    pub fn diff(&self, next: &Self) -> Option<ScrollbarStatePatch> {
        let pick = |a: bool, b: bool| (a != b).then_some(b);
        let patch = ScrollbarStatePatch {
            v_hover: pick(self.v_hover, next.v_hover),
            h_hover: pick(self.h_hover, next.h_hover),
            v_active: pick(self.v_active, next.v_active),
            h_active: pick(self.h_active, next.h_active),
        };
        (patch != ScrollbarStatePatch::default()).then_some(patch)
    }
}

/// Header label overrides; unlisted indices use `A, B, ..` and `1, 2, ..`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderLabels {
    pub columns: BTreeMap<u32, String>,
    pub rows: BTreeMap<u32, String>,
}

/// In-cell editor state as drawn by the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOverlay {
    pub cell: CellPos,
    pub text: String,
    /// Caret byte offset into `text`
    pub caret: usize,
    /// Other end of the text selection, if any
    pub selection_anchor: Option<usize>,
}

/// Control -> render messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Command {
    Resize {
        width: f64,
        height: f64,
    },
    SetDpr {
        dpr: f64,
    },
    /// Full repaint at the given scroll offset
    Render {
        scroll_x: f64,
        scroll_y: f64,
    },
    /// Repaint only overlay layers (selection, headers, guides, scrollbars, editor)
    RenderUiOnly {
        scroll_x: f64,
        scroll_y: f64,
    },
    SetSelection {
        sel: Option<CellRange>,
        anchor: Option<CellPos>,
    },
    SetGuides {
        guides: Option<Guides>,
    },
    SetScrollbarState {
        state: ScrollbarStatePatch,
    },
    SetHeaderStyle {
        style: HeaderStyle,
    },
    SetHeaderLabels {
        labels: HeaderLabels,
    },
    SetEditor {
        editor: Option<EditorOverlay>,
    },
    ApplyOps {
        ops: Vec<GridOp>,
    },
    MeasureText {
        id: RequestId,
        text: String,
        font: String,
        default_size: f64,
    },
    WrapText {
        id: RequestId,
        text: String,
        max_width: f64,
        font: String,
        default_size: f64,
    },
    CaretFromPoint {
        id: RequestId,
        text: String,
        rel_x: f64,
        rel_y: f64,
        opts: CaretOptions,
    },
    /// Stop the render worker
    Shutdown,
}

impl Command {
    /// Whether this command paints.
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render { .. } | Self::RenderUiOnly { .. })
    }
}

/// What the renderer reports after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub viewport_metrics: ViewportMetrics,
    pub scrollbars: Scrollbars,
    pub visible: Option<VisibleRange>,
}

/// Render -> control messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum RenderEvent {
    Metrics(MetricsSnapshot),
    MeasureTextResult { id: RequestId, width: f64 },
    WrapTextResult { id: RequestId, lines: Vec<TextSegment> },
    CaretFromPointResult { id: RequestId, caret: usize },
}

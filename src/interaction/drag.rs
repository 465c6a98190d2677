//! Pointer drag modes and the scratch state each one carries.

use serde::{Deserialize, Serialize};

use crate::layout::{Orientation, ResizeKind};

/// Which drag is in progress. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragMode {
    #[default]
    None,
    Select,
    ColHeader,
    RowHeader,
    VScroll,
    HScroll,
    ColResize,
    RowResize,
    TextSelect,
}

/// The active drag together with its per-mode scratch values.
///
/// Scratch lives inside the variant, so switching modes (including back to
/// [`DragState::Idle`]) drops it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Select,
    ColHeader,
    RowHeader,
    Scroll {
        orientation: Orientation,
        /// Pointer offset from the thumb's leading edge when grabbed
        grab: f64,
    },
    Resize {
        kind: ResizeKind,
        index: u32,
        /// Canvas-local pointer coordinate along the resized axis at grab time
        origin: f64,
        start_size: f64,
        size: f64,
    },
    TextSelect {
        /// Byte offset where the text drag started
        anchor: usize,
    },
}

impl DragState {
    pub fn mode(&self) -> DragMode {
        match self {
            Self::Idle => DragMode::None,
            Self::Select => DragMode::Select,
            Self::ColHeader => DragMode::ColHeader,
            Self::RowHeader => DragMode::RowHeader,
            Self::Scroll {
                orientation: Orientation::Vertical,
                ..
            } => DragMode::VScroll,
            Self::Scroll {
                orientation: Orientation::Horizontal,
                ..
            } => DragMode::HScroll,
            Self::Resize {
                kind: ResizeKind::Col,
                ..
            } => DragMode::ColResize,
            Self::Resize {
                kind: ResizeKind::Row,
                ..
            } => DragMode::RowResize,
            Self::TextSelect { .. } => DragMode::TextSelect,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Modes whose target follows the pointer past the cell area edge.
    pub fn autoscrolls(&self) -> bool {
        matches!(self, Self::Select | Self::ColHeader | Self::RowHeader)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_of_each_state() {
        assert_eq!(DragState::Idle.mode(), DragMode::None);
        assert_eq!(
            DragState::Scroll {
                orientation: Orientation::Horizontal,
                grab: 3.0
            }
            .mode(),
            DragMode::HScroll
        );
        assert_eq!(
            DragState::Resize {
                kind: ResizeKind::Row,
                index: 2,
                origin: 0.0,
                start_size: 20.0,
                size: 20.0
            }
            .mode(),
            DragMode::RowResize
        );
        assert_eq!(DragState::TextSelect { anchor: 0 }.mode(), DragMode::TextSelect);
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&DragMode::ColResize).unwrap(), "\"colresize\"");
    }

    #[test]
    fn test_autoscroll_modes() {
        assert!(DragState::Select.autoscrolls());
        assert!(DragState::RowHeader.autoscrolls());
        assert!(!DragState::Idle.autoscrolls());
        assert!(!DragState::TextSelect { anchor: 1 }.autoscrolls());
    }
}

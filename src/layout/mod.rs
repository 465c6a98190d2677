//! Layout engine: coordinate mapping, merges, viewport metrics and hit testing.
//!
//! This module handles:
//! - Prefix-sum offsets over default + overridden row heights / column widths
//! - Binary search for the row/column at a content coordinate
//! - Merge registry and merge-aware rectangle expansion
//! - Scrollbar visibility fixed point and scroll limits
//! - Pointer hit testing against headers, scrollbars, resize handles and cells

mod hit_test;
mod merge_index;
mod scrollbar;
mod size_index;
mod viewport;

pub use hit_test::{HitTarget, HitTester, ResizeHandle, ResizeKind, ViewFrame};
pub use merge_index::MergeIndex;
pub use scrollbar::{fraction, Orientation, ScrollbarGeometry, ScrollbarPart, Scrollbars};
pub use size_index::{SizeIndex, MIN_TRACK_PX};
pub use viewport::{ScrollOffset, ViewportCalculator, ViewportMetrics, VisibleRange};

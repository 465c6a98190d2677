//! Control-context input handling.
//!
//! - [`SelectionController`]: the drag state machine (select, header drags,
//!   scrollbar thumbs, resize handles, text selection) and keyboard moves
//! - [`AutoScroller`]: eased edge-driven scrolling during drags
//! - [`FrameScheduler`]: explicit, cancellable frame requests for the
//!   render and auto-scroll loops

mod autoscroll;
mod drag;
mod frame;
mod selection;

pub use autoscroll::{AutoScroller, Tick};
pub use drag::{DragMode, DragState};
pub use frame::{FrameHandle, FrameKind, FrameScheduler};
pub use selection::{InteractionContext, Outcome, SelectionController};

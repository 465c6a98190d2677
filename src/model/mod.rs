//! Grid data model and the mutation op log.
//!
//! - [`GridData`] is the authoritative grid (control context) and also the
//!   render context's mirror.
//! - [`GridOp`] is one replayable mutation; [`GridData::apply`] is the only
//!   way a mirror changes.
//! - [`RecordingGrid`] wraps the authoritative grid so every accepted
//!   mutation is also appended to an ordered op log.

mod grid;
mod ops;
mod recording;

pub use grid::{GridData, GridSource};
pub use ops::GridOp;
pub use recording::RecordingGrid;

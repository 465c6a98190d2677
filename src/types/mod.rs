//! Data types shared by the layout, interaction and render modules.

mod cell;
mod geometry;
mod merge;
mod selection;
mod style;

pub use cell::*;
pub use geometry::*;
pub use merge::*;
pub use selection::*;
pub use style::*;

//! vgrid - virtualized grid engine
//!
//! Coordinate mapping, hit testing, selection and layered rendering for very
//! large sparse grids:
//! - Prefix-sum row/column sizing with sparse overrides
//! - Merged cells with closed-rectangle selection expansion
//! - Scrollbar-aware viewport metrics, thumb dragging and edge auto-scroll
//! - An ordered command protocol to a render context on a worker thread or
//!   the caller's thread, with id-correlated text metric RPCs
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { GridViewer } from 'vgrid';
//! await init();
//! const viewer = GridViewer.newWithOverlay(canvas, overlay, 100000, 200, {});
//! viewer.set_render_callback(() => requestAnimationFrame(t => viewer.on_frame(t)));
//! viewer.set_value(0, 0, "hello");
//! ```
//!
//! # Usage (Rust)
//!
//! ```
//! use vgrid::config::GridConfig;
//! use vgrid::model::GridData;
//! use vgrid::render::{DisplayList, InlineRenderer, MonospaceLayout, RenderEngine};
//! use vgrid::viewer::GridView;
//!
//! let config = GridConfig::default();
//! let grid = GridData::new(1000, 50, config.default_row_height, config.default_col_width);
//! let engine = RenderEngine::new(
//!     DisplayList::new(),
//!     MonospaceLayout::default(),
//!     config.clone(),
//!     grid.empty_like(),
//! );
//! let mut view = GridView::new(grid, config, InlineRenderer::new(engine), 800.0, 600.0);
//! view.on_frame(0.0);
//! assert!(view.metrics().v_scroll_visible);
//! ```

pub mod config;
pub mod error;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod protocol;
pub mod render;
pub mod types;
pub mod viewer;

use wasm_bindgen::prelude::*;

pub use config::GridConfig;
pub use error::{GridError, Result};
pub use viewer::GridView;
#[cfg(target_arch = "wasm32")]
pub use viewer::GridViewer;

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

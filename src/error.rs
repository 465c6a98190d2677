//! Structured error types for vgrid.
//!
//! Almost every failure in the grid engine is recovered locally (clamped
//! coordinates, rejected merges, discarded stale replies). The variants here
//! cover the few paths that report to the caller.

/// All errors that can surface from the grid engine.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The render context could not be created (no drawing surface, no thread).
    /// Raised only at construction so the caller can fall back to same-thread rendering.
    #[error("Render context unavailable: {0}")]
    RenderContextUnavailable(String),

    /// The render context went away; commands can no longer be delivered.
    #[error("Render context disconnected")]
    Disconnected,

    /// A merge rectangle would overlap an existing merge or is empty.
    #[error("Invalid merge range at ({row}, {col}) spanning {rows}x{cols}")]
    InvalidMergeRange {
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },

    /// A row/column index outside the grid extent.
    #[error("Index out of bounds: {0}")]
    OutOfBounds(String),

    /// Invalid configuration value.
    #[error("Config error: {0}")]
    Config(String),

    /// JSON (de)serialization error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}

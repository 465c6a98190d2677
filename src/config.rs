//! Grid configuration.
//!
//! All tunables live in [`GridConfig`]. Every field has a default, so a JSON
//! document only needs to name what it overrides.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};
use crate::types::Size;

/// Default column width in pixels.
pub const DEFAULT_COL_WIDTH: f64 = 64.0;

/// Default row height in pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 20.0;

/// Colors and font used for headers, selection and scrollbars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderStyle {
    /// Background color for headers
    pub background_color: String,
    /// Text color for header labels
    pub text_color: String,
    /// Border color for headers and grid lines
    pub border_color: String,
    /// Background color for selected headers
    pub selected_bg_color: String,
    /// Selection outline color
    pub selection_color: String,
    /// CSS-style font used for header labels
    pub font: String,
}

impl Default for HeaderStyle {
    fn default() -> Self {
        Self {
            background_color: "#F3F3F3".to_string(),
            text_color: "#595959".to_string(),
            border_color: "#CCCCCC".to_string(),
            selected_bg_color: "#CFD8E8".to_string(),
            selection_color: "#1A73E8".to_string(),
            font: "500 11px sans-serif".to_string(),
        }
    }
}

/// Tuning for the edge-driven auto-scroll loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AutoScrollConfig {
    /// Width of the band along each edge that drives scrolling (px)
    pub edge_margin: f64,
    /// Velocity cap in px per 60fps tick
    pub max_velocity: f64,
    /// Fraction of the gap to the target velocity closed each tick
    pub ease: f64,
    /// Below this magnitude velocity snaps to exactly zero
    pub stop_threshold: f64,
    /// Lower clamp of the normalized frame delta
    pub dt_min: f64,
    /// Upper clamp of the normalized frame delta
    pub dt_max: f64,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            edge_margin: 48.0,
            max_velocity: 24.0,
            ease: 0.2,
            stop_threshold: 0.05,
            dt_min: 0.5,
            dt_max: 3.0,
        }
    }
}

/// Complete configuration of a grid view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    pub default_row_height: f64,
    pub default_col_width: f64,
    /// Smallest size a resize drag may produce
    pub min_track_size: f64,
    /// Width of the row header band (left)
    pub row_header_width: f64,
    /// Height of the column header band (top)
    pub col_header_height: f64,
    pub scrollbar_thickness: f64,
    pub min_thumb_length: f64,
    /// Half-width of the hit zone straddling each header boundary
    pub resize_margin: f64,
    pub auto_scroll: AutoScrollConfig,
    pub header_style: HeaderStyle,
    /// Font used for cell content when a style doesn't name one
    pub default_font: String,
    pub default_font_size: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            default_row_height: DEFAULT_ROW_HEIGHT,
            default_col_width: DEFAULT_COL_WIDTH,
            min_track_size: 4.0,
            row_header_width: 40.0,
            col_header_height: 20.0,
            scrollbar_thickness: 12.0,
            min_thumb_length: 16.0,
            resize_margin: 4.0,
            auto_scroll: AutoScrollConfig::default(),
            header_style: HeaderStyle::default(),
            default_font: "13px sans-serif".to_string(),
            default_font_size: 13.0,
        }
    }
}

impl GridConfig {
    /// Header bands as a size: row header width by column header height.
    pub fn header_size(&self) -> Size {
        Size::new(self.row_header_width, self.col_header_height)
    }

    /// Parse a JSON config, filling absent fields with defaults.
    ///
    /// # Errors
    /// Returns an error on malformed JSON or out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns [`GridError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("defaultRowHeight", self.default_row_height),
            ("defaultColWidth", self.default_col_width),
            ("minTrackSize", self.min_track_size),
            ("defaultFontSize", self.default_font_size),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GridError::Config(format!("{name} must be positive")));
            }
        }
        let non_negative = [
            ("rowHeaderWidth", self.row_header_width),
            ("colHeaderHeight", self.col_header_height),
            ("scrollbarThickness", self.scrollbar_thickness),
            ("minThumbLength", self.min_thumb_length),
            ("resizeMargin", self.resize_margin),
            ("autoScroll.edgeMargin", self.auto_scroll.edge_margin),
            ("autoScroll.maxVelocity", self.auto_scroll.max_velocity),
            ("autoScroll.stopThreshold", self.auto_scroll.stop_threshold),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GridError::Config(format!("{name} must not be negative")));
            }
        }
        let scroll = &self.auto_scroll;
        if !(scroll.ease > 0.0 && scroll.ease <= 1.0) {
            return Err(GridError::Config("autoScroll.ease must be in (0, 1]".into()));
        }
        if !(scroll.dt_min > 0.0 && scroll.dt_min <= scroll.dt_max && scroll.dt_max.is_finite()) {
            return Err(GridError::Config(
                "autoScroll.dtMin must be positive and not exceed a finite dtMax".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GridConfig::from_json(r#"{"rowHeaderWidth": 50, "autoScroll": {"edgeMargin": 30}}"#)
            .unwrap();
        assert_eq!(config.row_header_width, 50.0);
        assert_eq!(config.auto_scroll.edge_margin, 30.0);
        assert_eq!(config.auto_scroll.ease, 0.2);
        assert_eq!(config.default_col_width, DEFAULT_COL_WIDTH);
    }

    #[test]
    fn test_rejects_bad_ease() {
        let err = GridConfig::from_json(r#"{"autoScroll": {"ease": 0}}"#).unwrap_err();
        assert!(matches!(err, GridError::Config(_)));
    }

    #[test]
    fn test_rejects_non_finite_values() {
        let mut config = GridConfig::default();
        config.auto_scroll.dt_max = f64::INFINITY;
        assert!(matches!(config.validate(), Err(GridError::Config(_))));
        config.auto_scroll.dt_max = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = GridConfig::default();
        config.auto_scroll.ease = f64::NAN;
        assert!(config.validate().is_err());
        config.auto_scroll.ease = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = GridConfig::default();
        config.resize_margin = f64::INFINITY;
        assert!(config.validate().is_err());

        assert!(GridConfig::from_json(r#"{"autoScroll": {"dtMax": 1e309}}"#).is_err());
    }

    #[test]
    fn test_rejects_zero_default_size() {
        assert!(GridConfig::from_json(r#"{"defaultRowHeight": 0}"#).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GridConfig::from_json("{"),
            Err(GridError::Json(_))
        ));
    }
}

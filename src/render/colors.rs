//! Color helpers for the grid layers.
//!
//! Colors travel as CSS strings so they can be handed to Canvas 2D as-is.
//! [`Rgb`] is only used where the engine derives one color from another
//! (scrollbar hover shades, translucent selection fill).

/// RGB color with u8 components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` or `RRGGBB`. Returns None if the format is invalid.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
        let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
        let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;
        Some(Self { r, g, b })
    }

    /// `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// `rgba(r, g, b, a)` with `alpha` clamped to `[0, 1]`.
    pub fn to_rgba(self, alpha: f64) -> String {
        format!(
            "rgba({}, {}, {}, {:.2})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }

    /// Blend toward black. 0.0 = no change, 1.0 = black.
    #[must_use]
    pub fn darken(self, factor: f64) -> Self {
        Self {
            r: Self::blend_component(self.r, 0, factor),
            g: Self::blend_component(self.g, 0, factor),
            b: Self::blend_component(self.b, 0, factor),
        }
    }

    /// Clamped to [0, 255] before the cast.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn blend_component(from: u8, to: u8, factor: f64) -> u8 {
        let from = f64::from(from);
        let to = f64::from(to);
        let blended = from + (to - from) * factor.clamp(0.0, 1.0);
        blended.clamp(0.0, 255.0).round() as u8
    }
}

/// Translucent fill for a selection outlined in `color`. Non-hex colors fall
/// back to the default selection blue.
pub fn selection_fill(color: &str) -> String {
    Rgb::from_hex(color)
        .unwrap_or(Rgb::new(0x1A, 0x73, 0xE8))
        .to_rgba(0.12)
}

/// `base` darkened by `factor`, or `base` unchanged if it is not hex.
pub fn shade(base: &str, factor: f64) -> String {
    Rgb::from_hex(base).map_or_else(|| base.to_string(), |rgb| rgb.darken(factor).to_hex())
}

/// Fixed colors not covered by `HeaderStyle`.
pub mod palette {
    pub const WHITE: &str = "#FFFFFF";

    /// Cell text when a style doesn't set one
    pub const CELL_TEXT: &str = "#202124";

    /// Grid line color
    pub const GRID_LINE: &str = "#E0E0E0";

    /// Resize guide line
    pub const GUIDE: &str = "#1A73E8";

    /// Scrollbar track background
    pub const SCROLLBAR_TRACK: &str = "#F5F5F5";

    /// Scrollbar thumb
    pub const SCROLLBAR_THUMB: &str = "#B4B4B4";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Rgb::from_hex("#FF8040"), Some(Rgb::new(255, 128, 64)));
        assert_eq!(Rgb::from_hex("ff8040"), Some(Rgb::new(255, 128, 64)));
        assert_eq!(Rgb::from_hex("#FFF"), None);
        assert_eq!(Rgb::from_hex("rgb(1, 2, 3)"), None);
    }

    #[test]
    fn test_darken() {
        let c = Rgb::new(200, 100, 0).darken(0.5);
        assert_eq!(c, Rgb::new(100, 50, 0));
        assert_eq!(Rgb::new(10, 10, 10).darken(2.0), Rgb::new(0, 0, 0));
    }

    #[test]
    fn test_selection_fill() {
        assert_eq!(selection_fill("#1A73E8"), "rgba(26, 115, 232, 0.12)");
        assert_eq!(selection_fill("blue"), "rgba(26, 115, 232, 0.12)");
    }

    #[test]
    fn test_shade_passes_through_named_colors() {
        assert_eq!(shade("#B4B4B4", 0.0), "#B4B4B4");
        assert_eq!(shade("gray", 0.3), "gray");
    }
}

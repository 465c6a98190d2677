use serde::{Deserialize, Serialize};

/// Identifier of a style in the grid's style registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    #[default]
    General,
    Left,
    Center,
    Right,
}

/// A registered cell style. Every field is optional; absent means default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub align_h: Option<HAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_text: Option<bool>,
}

impl CellStyle {
    /// CSS font shorthand, e.g. `"bold 13px sans-serif"`.
    pub fn css_font(&self, default_family: &str, default_size: f64) -> String {
        let mut font = String::new();
        if self.italic == Some(true) {
            font.push_str("italic ");
        }
        if self.bold == Some(true) {
            font.push_str("bold ");
        }
        let size = self.font_size.unwrap_or(default_size);
        let family = self.font_family.as_deref().unwrap_or(default_family);
        font.push_str(&format!("{size}px {family}"));
        font
    }

    pub fn wraps(&self) -> bool {
        self.wrap_text == Some(true)
    }
}

//! Drawing surface abstraction.
//!
//! The engine paints into two layers. `Base` holds background, grid lines and
//! cell content and only changes on a full render. `Overlay` holds selection,
//! headers, guides, scrollbars and the editor, and is repainted on its own
//! for UI-only frames.

use serde::{Deserialize, Serialize};

use crate::types::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Layer {
    Base,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// One drawing primitive. Text is positioned by its vertical middle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: String,
    },
    StrokeRect {
        rect: Rect,
        color: String,
        width: f64,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: String,
        width: f64,
    },
    Text {
        text: String,
        x: f64,
        y: f64,
        font: String,
        color: String,
        align: TextAlign,
    },
    /// Intersect the clip region with `rect` until the matching `PopClip`
    PushClip {
        rect: Rect,
    },
    PopClip,
}

/// A 2D target the engine can paint into.
pub trait Surface {
    /// Resize the backing store to `width x height` CSS pixels at `dpr`.
    fn resize(&mut self, width: f64, height: f64, dpr: f64);

    /// Whether `Overlay` is kept separately from `Base`. Surfaces without a
    /// separate overlay get full repaints for every frame.
    fn has_overlay(&self) -> bool {
        true
    }

    fn clear(&mut self, layer: Layer);

    fn draw(&mut self, layer: Layer, op: DrawOp);

    fn fill_rect(&mut self, layer: Layer, rect: Rect, color: &str) {
        if rect.is_empty() {
            return;
        }
        self.draw(
            layer,
            DrawOp::FillRect {
                rect,
                color: color.to_string(),
            },
        );
    }

    fn stroke_rect(&mut self, layer: Layer, rect: Rect, color: &str, width: f64) {
        self.draw(
            layer,
            DrawOp::StrokeRect {
                rect,
                color: color.to_string(),
                width,
            },
        );
    }

    fn line(&mut self, layer: Layer, from: (f64, f64), to: (f64, f64), color: &str, width: f64) {
        self.draw(
            layer,
            DrawOp::Line {
                from,
                to,
                color: color.to_string(),
                width,
            },
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn text(
        &mut self,
        layer: Layer,
        text: &str,
        x: f64,
        y: f64,
        font: &str,
        color: &str,
        align: TextAlign,
    ) {
        if text.is_empty() {
            return;
        }
        self.draw(
            layer,
            DrawOp::Text {
                text: text.to_string(),
                x,
                y,
                font: font.to_string(),
                color: color.to_string(),
                align,
            },
        );
    }

    fn push_clip(&mut self, layer: Layer, rect: Rect) {
        self.draw(layer, DrawOp::PushClip { rect });
    }

    fn pop_clip(&mut self, layer: Layer) {
        self.draw(layer, DrawOp::PopClip);
    }
}

/// Surface that records draw ops per layer. Used headless and in tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayList {
    pub width: f64,
    pub height: f64,
    pub dpr: f64,
    pub base: Vec<DrawOp>,
    pub overlay: Vec<DrawOp>,
    /// Count of base-layer clears, i.e. full repaints
    pub base_frames: u32,
    pub overlay_frames: u32,
}

impl DisplayList {
    pub fn new() -> Self {
        Self {
            dpr: 1.0,
            ..Self::default()
        }
    }

    pub fn layer(&self, layer: Layer) -> &[DrawOp] {
        match layer {
            Layer::Base => &self.base,
            Layer::Overlay => &self.overlay,
        }
    }

    /// Text drawn on `layer`, in paint order.
    pub fn texts(&self, layer: Layer) -> Vec<&str> {
        self.layer(layer)
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Surface for DisplayList {
    fn resize(&mut self, width: f64, height: f64, dpr: f64) {
        self.width = width;
        self.height = height;
        self.dpr = dpr;
    }

    fn clear(&mut self, layer: Layer) {
        match layer {
            Layer::Base => {
                self.base.clear();
                self.base_frames += 1;
            }
            Layer::Overlay => {
                self.overlay.clear();
                self.overlay_frames += 1;
            }
        }
    }

    fn draw(&mut self, layer: Layer, op: DrawOp) {
        match layer {
            Layer::Base => self.base.push(op),
            Layer::Overlay => self.overlay.push(op),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_display_list_layers() {
        let mut list = DisplayList::new();
        list.fill_rect(Layer::Base, Rect::new(0.0, 0.0, 10.0, 10.0), "#fff");
        list.text(Layer::Overlay, "A", 5.0, 5.0, "11px sans", "#000", TextAlign::Center);
        list.fill_rect(Layer::Base, Rect::new(0.0, 0.0, 0.0, 10.0), "#fff");
        list.text(Layer::Overlay, "", 5.0, 5.0, "11px sans", "#000", TextAlign::Center);
        assert_eq!(list.base.len(), 1);
        assert_eq!(list.texts(Layer::Overlay), vec!["A"]);

        list.clear(Layer::Overlay);
        assert!(list.overlay.is_empty());
        assert_eq!(list.base.len(), 1);
        assert_eq!(list.overlay_frames, 1);
    }

    #[test]
    fn test_draw_op_wire_shape() {
        let op = DrawOp::PushClip {
            rect: Rect::new(1.0, 2.0, 3.0, 4.0),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"op": "pushClip", "rect": {"x": 1.0, "y": 2.0, "w": 3.0, "h": 4.0}})
        );
    }
}

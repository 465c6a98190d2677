//! Text layout collaborator: measure, wrap and caret-from-point.
//!
//! The engine only consumes these three pure functions. [`MonospaceLayout`]
//! is a fixed-advance implementation used headless and in tests; a canvas
//! build plugs in real font metrics behind the same trait.

use std::cell::{OnceCell, RefCell};
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Byte range `[start, end)` of one wrapped line.
pub type TextSegment = (usize, usize);

/// Options for [`TextLayout::caret_index_from_point`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaretOptions {
    pub font: String,
    pub default_size: f64,
    /// Wrap width; `None` lays the text out on hard line breaks only
    pub max_width: Option<f64>,
    pub line_height: f64,
}

/// The three text functions the grid needs.
pub trait TextLayout {
    /// Advance width of `text` in pixels.
    fn measure_text(&self, text: &str, font: &str, default_size: f64) -> f64;

    /// Greedy word wrap into line segments no wider than `max_width` (a
    /// single grapheme wider than the limit still gets its own line).
    fn wrap_text_indices(
        &self,
        text: &str,
        max_width: f64,
        font: &str,
        default_size: f64,
    ) -> Vec<TextSegment>;

    /// Byte offset of the grapheme boundary nearest `(rel_x, rel_y)`, measured
    /// from the top-left of the text box.
    fn caret_index_from_point(&self, text: &str, rel_x: f64, rel_y: f64, opts: &CaretOptions)
        -> usize;
}

/// Pixel size named in a CSS font shorthand (`"bold 13px sans-serif"`), or `default_size`.
pub fn font_px(font: &str, default_size: f64) -> f64 {
    font.split_whitespace()
        .find_map(|token| token.strip_suffix("px"))
        .and_then(|n| n.parse::<f64>().ok())
        .filter(|px| px.is_finite() && *px > 0.0)
        .unwrap_or(default_size)
}

/// Per-font measurement state, built on first use.
#[derive(Debug, Default)]
pub struct MeasureContext {
    font_sizes: RefCell<HashMap<String, f64>>,
}

impl MeasureContext {
    fn size_for(&self, font: &str, default_size: f64) -> f64 {
        if let Some(size) = self.font_sizes.borrow().get(font) {
            return *size;
        }
        let size = font_px(font, default_size);
        self.font_sizes.borrow_mut().insert(font.to_string(), size);
        size
    }
}

/// Fixed-advance layout: narrow graphemes advance `ratio * px`, wide (CJK,
/// emoji) graphemes advance `2 * ratio * px`.
#[derive(Debug)]
pub struct MonospaceLayout {
    ratio: f64,
    context: OnceCell<MeasureContext>,
}

impl Default for MonospaceLayout {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl MonospaceLayout {
    pub fn new(ratio: f64) -> Self {
        Self {
            ratio,
            context: OnceCell::new(),
        }
    }

    fn context(&self) -> &MeasureContext {
        self.context.get_or_init(MeasureContext::default)
    }

    fn advance(&self, grapheme: &str, px: f64) -> f64 {
        if grapheme == "\n" {
            return 0.0;
        }
        let wide = grapheme.chars().next().is_some_and(is_wide);
        self.ratio * px * if wide { 2.0 } else { 1.0 }
    }
}

fn is_wide(c: char) -> bool {
    matches!(u32::from(c),
        0x1100..=0x115F
        | 0x2E80..=0xA4CF
        | 0xAC00..=0xD7A3
        | 0xF900..=0xFAFF
        | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60
        | 0xFFE0..=0xFFE6
        | 0x1F300..=0x1FAFF
        | 0x20000..=0x3FFFD)
}

/// Lines split on `\n` only.
pub fn hard_lines(text: &str) -> Vec<TextSegment> {
    let mut lines = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices('\n') {
        lines.push((start, i));
        start = i + 1;
    }
    lines.push((start, text.len()));
    lines
}

/// Greedy word wrap given a per-grapheme advance function. Breaks after the
/// last whitespace that fits; a word wider than the line breaks between
/// graphemes.
pub fn greedy_wrap(text: &str, max_width: f64, advance: impl Fn(&str) -> f64) -> Vec<TextSegment> {
    let mut lines = Vec::new();
    for (line_start, line_end) in hard_lines(text) {
        let line = text.get(line_start..line_end).unwrap_or("");
        let mut start = line_start;
        let mut width = 0.0;
        // Byte offset just past the last whitespace on the current line.
        let mut break_at: Option<(usize, f64)> = None;
        for (offset, g) in line.grapheme_indices(true) {
            let at = line_start + offset;
            let w = advance(g);
            if width + w > max_width && at > start {
                match break_at.filter(|(b, _)| *b > start) {
                    Some((b, width_before)) => {
                        lines.push((start, b));
                        start = b;
                        width -= width_before;
                    }
                    None => {
                        lines.push((start, at));
                        start = at;
                        width = 0.0;
                    }
                }
                break_at = None;
            }
            width += w;
            if g.chars().all(char::is_whitespace) {
                break_at = Some((at + g.len(), width));
            }
        }
        lines.push((start, line_end));
    }
    lines
}

/// Nearest grapheme boundary to `(rel_x, rel_y)` over already laid out `lines`.
pub fn caret_in_lines(
    text: &str,
    lines: &[TextSegment],
    rel_x: f64,
    rel_y: f64,
    line_height: f64,
    advance: impl Fn(&str) -> f64,
) -> usize {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let line_idx = if rel_y <= 0.0 || line_height <= 0.0 {
        0
    } else {
        ((rel_y / line_height).floor() as usize).min(lines.len().saturating_sub(1))
    };
    let Some(&(start, end)) = lines.get(line_idx) else {
        return 0;
    };
    let line = text.get(start..end).unwrap_or("");
    let mut x = 0.0;
    for (offset, g) in line.grapheme_indices(true) {
        let w = advance(g);
        if rel_x < x + w / 2.0 {
            return start + offset;
        }
        x += w;
    }
    end
}

impl TextLayout for MonospaceLayout {
    fn measure_text(&self, text: &str, font: &str, default_size: f64) -> f64 {
        let px = self.context().size_for(font, default_size);
        text.graphemes(true).map(|g| self.advance(g, px)).sum()
    }

    fn wrap_text_indices(
        &self,
        text: &str,
        max_width: f64,
        font: &str,
        default_size: f64,
    ) -> Vec<TextSegment> {
        let px = self.context().size_for(font, default_size);
        greedy_wrap(text, max_width, |g| self.advance(g, px))
    }

    fn caret_index_from_point(
        &self,
        text: &str,
        rel_x: f64,
        rel_y: f64,
        opts: &CaretOptions,
    ) -> usize {
        let px = self.context().size_for(&opts.font, opts.default_size);
        let lines = match opts.max_width {
            Some(width) => self.wrap_text_indices(text, width, &opts.font, opts.default_size),
            None => hard_lines(text),
        };
        let line_height = if opts.line_height > 0.0 {
            opts.line_height
        } else {
            px * 1.2
        };
        caret_in_lines(text, &lines, rel_x, rel_y, line_height, |g| self.advance(g, px))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn layout() -> MonospaceLayout {
        MonospaceLayout::new(0.5)
    }

    #[test]
    fn test_font_px() {
        assert_eq!(font_px("bold 13px sans-serif", 11.0), 13.0);
        assert_eq!(font_px("sans-serif", 11.0), 11.0);
        assert_eq!(font_px("0px mono", 11.0), 11.0);
    }

    #[test]
    fn test_measure_counts_graphemes() {
        let l = layout();
        assert_eq!(l.measure_text("abcd", "10px mono", 12.0), 20.0);
        // e + combining acute is one grapheme
        assert_eq!(l.measure_text("e\u{301}", "10px mono", 12.0), 5.0);
        assert_eq!(l.measure_text("漢", "10px mono", 12.0), 10.0);
    }

    #[test]
    fn test_wrap_on_whitespace() {
        let l = layout();
        let text = "aaaa bbbb cc";
        // 5px per char: six fit on a 30px line
        let lines = l.wrap_text_indices(text, 30.0, "10px mono", 12.0);
        let parts: Vec<&str> = lines.iter().map(|&(s, e)| &text[s..e]).collect();
        assert_eq!(parts, vec!["aaaa ", "bbbb ", "cc"]);
    }

    #[test]
    fn test_wrap_breaks_long_word() {
        let l = layout();
        let text = "abcdefgh";
        let lines = l.wrap_text_indices(text, 15.0, "10px mono", 12.0);
        let parts: Vec<&str> = lines.iter().map(|&(s, e)| &text[s..e]).collect();
        assert_eq!(parts, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_wrap_keeps_hard_breaks() {
        let l = layout();
        let text = "ab\ncd";
        let lines = l.wrap_text_indices(text, 100.0, "10px mono", 12.0);
        assert_eq!(lines, vec![(0, 2), (3, 5)]);
    }

    #[test]
    fn test_caret_from_point() {
        let l = layout();
        let opts = CaretOptions {
            font: "10px mono".into(),
            default_size: 12.0,
            max_width: None,
            line_height: 12.0,
        };
        assert_eq!(l.caret_index_from_point("hello", -3.0, 0.0, &opts), 0);
        assert_eq!(l.caret_index_from_point("hello", 6.0, 0.0, &opts), 1);
        assert_eq!(l.caret_index_from_point("hello", 8.0, 0.0, &opts), 2);
        assert_eq!(l.caret_index_from_point("hello", 99.0, 0.0, &opts), 5);
        assert_eq!(l.caret_index_from_point("ab\ncd", 6.0, 13.0, &opts), 4);
        assert_eq!(l.caret_index_from_point("ab\ncd", 0.0, 500.0, &opts), 3);
    }
}

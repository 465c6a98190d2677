//! Row and column header rendering.
//!
//! - Column headers: A, B, C, ... Z, AA, AB, ...
//! - Row headers: 1, 2, 3, ...
//! - Labels can be overridden per index
//! - Highlighting for selected and fully selected rows/columns

use super::frame::FrameContext;
use super::surface::{Layer, Surface, TextAlign};
use crate::config::HeaderStyle;
use crate::model::GridSource;
use crate::protocol::HeaderLabels;
use crate::types::{CellRange, Rect};

/// Header text color when the whole row/column is selected.
const HEADER_TEXT_SELECTED: &str = "#1A73E8";

/// Labels are skipped on tracks narrower/shorter than this.
const MIN_LABEL_EXTENT: f64 = 12.0;

/// Convert a 0-based column index to column letters (A, B, ..., Z, AA, AB, ...)
#[allow(clippy::cast_possible_truncation)]
pub fn col_to_letter(col: u32) -> String {
    let mut result = String::new();
    let mut n = u64::from(col) + 1; // Convert to 1-based
    while n > 0 {
        n -= 1;
        let c = char::from(b'A' + (n % 26) as u8);
        result.insert(0, c);
        n /= 26;
    }
    result
}

impl HeaderLabels {
    pub fn column(&self, col: u32) -> String {
        self.columns
            .get(&col)
            .cloned()
            .unwrap_or_else(|| col_to_letter(col))
    }

    pub fn row(&self, row: u32) -> String {
        self.rows
            .get(&row)
            .cloned()
            .unwrap_or_else(|| (u64::from(row) + 1).to_string())
    }
}

/// Header highlight for one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Highlight {
    None,
    /// Track intersects the selection
    Selected,
    /// Selection spans the whole track
    Full,
}

/// Render the corner, column band and row band.
pub fn paint_headers<S: Surface>(
    surface: &mut S,
    frame: &FrameContext<'_>,
    style: &HeaderStyle,
    labels: &HeaderLabels,
    selection: Option<&CellRange>,
) {
    let grid = frame.grid;
    let header = frame.header;
    let sel = selection.map(CellRange::normalized);
    let full_cols = sel.is_some_and(|s| s.r0 == 0 && s.r1 + 1 >= grid.rows());
    let full_rows = sel.is_some_and(|s| s.c0 == 0 && s.c1 + 1 >= grid.cols());
    let right = frame.metrics.viewport_width;
    let bottom = frame.metrics.viewport_height;

    if header.height > 0.0 {
        let band = Rect::new(header.width, 0.0, (right - header.width).max(0.0), header.height);
        surface.push_clip(Layer::Overlay, band);
        surface.fill_rect(Layer::Overlay, band, &style.background_color);
        if let Some(vis) = frame.visible {
            for col in vis.col_start..=vis.col_end {
                let x = frame.col_x(col);
                let width = grid.col_widths().size_of(col);
                let highlight = match sel {
                    Some(s) if col >= s.c0 && col <= s.c1 && full_cols => Highlight::Full,
                    Some(s) if col >= s.c0 && col <= s.c1 => Highlight::Selected,
                    _ => Highlight::None,
                };
                let cell = Rect::new(x, 0.0, width, header.height);
                paint_header_cell(surface, cell, &labels.column(col), style, highlight, true);
            }
        }
        surface.pop_clip(Layer::Overlay);
        surface.line(
            Layer::Overlay,
            (header.width, header.height - 0.5),
            (right, header.height - 0.5),
            &style.border_color,
            1.0,
        );
    }

    if header.width > 0.0 {
        let band = Rect::new(0.0, header.height, header.width, (bottom - header.height).max(0.0));
        surface.push_clip(Layer::Overlay, band);
        surface.fill_rect(Layer::Overlay, band, &style.background_color);
        if let Some(vis) = frame.visible {
            for row in vis.row_start..=vis.row_end {
                let y = frame.row_y(row);
                let height = grid.row_heights().size_of(row);
                let highlight = match sel {
                    Some(s) if row >= s.r0 && row <= s.r1 && full_rows => Highlight::Full,
                    Some(s) if row >= s.r0 && row <= s.r1 => Highlight::Selected,
                    _ => Highlight::None,
                };
                let cell = Rect::new(0.0, y, header.width, height);
                paint_header_cell(surface, cell, &labels.row(row), style, highlight, false);
            }
        }
        surface.pop_clip(Layer::Overlay);
        surface.line(
            Layer::Overlay,
            (header.width - 0.5, header.height),
            (header.width - 0.5, bottom),
            &style.border_color,
            1.0,
        );
    }

    let corner = Rect::new(0.0, 0.0, header.width, header.height);
    let corner_bg = if full_cols && full_rows {
        &style.selected_bg_color
    } else {
        &style.background_color
    };
    surface.fill_rect(Layer::Overlay, corner, corner_bg);
    surface.stroke_rect(Layer::Overlay, corner, &style.border_color, 1.0);
}

fn paint_header_cell<S: Surface>(
    surface: &mut S,
    cell: Rect,
    label: &str,
    style: &HeaderStyle,
    highlight: Highlight,
    is_column: bool,
) {
    if highlight != Highlight::None {
        surface.fill_rect(Layer::Overlay, cell, &style.selected_bg_color);
    }

    // Separator on the trailing edge
    let (from, to) = if is_column {
        ((cell.right() - 0.5, cell.y), (cell.right() - 0.5, cell.bottom()))
    } else {
        ((cell.x, cell.bottom() - 0.5), (cell.right(), cell.bottom() - 0.5))
    };
    surface.line(Layer::Overlay, from, to, &style.border_color, 1.0);

    let extent = if is_column { cell.width } else { cell.height };
    if extent < MIN_LABEL_EXTENT {
        return;
    }
    let color = if highlight == Highlight::Full {
        HEADER_TEXT_SELECTED
    } else {
        &style.text_color
    };
    let (x, y) = cell.center();
    surface.text(Layer::Overlay, label, x, y, &style.font, color, TextAlign::Center);
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::layout::ScrollOffset;
    use crate::model::GridData;
    use crate::render::{DisplayList, DrawOp};
    use crate::types::Size;

    #[test]
    fn test_col_to_letter() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(701), "ZZ");
        assert_eq!(col_to_letter(702), "AAA");
        assert_eq!(col_to_letter(u32::MAX), "MWLQKWV");
    }

    #[test]
    fn test_label_overrides() {
        let mut labels = HeaderLabels::default();
        labels.columns.insert(1, "Price".into());
        assert_eq!(labels.column(0), "A");
        assert_eq!(labels.column(1), "Price");
        assert_eq!(labels.row(0), "1");
    }

    #[test]
    fn test_headers_label_visible_tracks() {
        let grid = GridData::new(100, 100, 20.0, 50.0);
        let config = GridConfig::default();
        let frame = FrameContext::new(&grid, &config, Size::new(300.0, 200.0), ScrollOffset::new(50.0, 0.0));
        let mut list = DisplayList::new();
        paint_headers(&mut list, &frame, &config.header_style, &HeaderLabels::default(), None);
        let texts = list.texts(Layer::Overlay);
        assert_eq!(texts.first(), Some(&"B"));
        assert!(texts.contains(&"1"));
        assert!(!texts.contains(&"A"));
    }

    #[test]
    fn test_full_column_selection_highlights_label() {
        let grid = GridData::new(10, 10, 20.0, 50.0);
        let config = GridConfig::default();
        let frame = FrameContext::new(&grid, &config, Size::new(300.0, 300.0), ScrollOffset::default());
        let mut list = DisplayList::new();
        let sel = CellRange::new(0, 2, 9, 2);
        paint_headers(&mut list, &frame, &config.header_style, &HeaderLabels::default(), Some(&sel));
        let c_label = list
            .overlay
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, color, .. } if text == "C" => Some(color.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(c_label, HEADER_TEXT_SELECTED);
    }
}

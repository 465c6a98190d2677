//! Base layer: background, grid lines and cell content.
//!
//! Content is planned before anything is painted so the grid-line pass can
//! skip boundaries that merges or overflowing text cover.

use super::colors::palette;
use super::frame::FrameContext;
use super::overflow::{EdgeSuppression, OverflowSpans};
use super::surface::{Layer, Surface, TextAlign};
use super::text::TextLayout;
use crate::config::GridConfig;
use crate::model::GridSource;
use crate::types::{CellRange, CellStyle, HAlign, Rect};

/// Inner padding between a cell border and its text.
pub const CELL_PADDING: f64 = 3.0;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// One positioned line of text, `y` at its vertical middle.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Everything needed to paint one cell (or one merged block).
#[derive(Debug, Clone, PartialEq)]
pub struct CellPaint {
    pub rect: Rect,
    /// Text clip: the cell itself, or the span it overflows into
    pub clip: Rect,
    pub background: Option<String>,
    pub lines: Vec<TextLine>,
    pub font: String,
    pub color: String,
    pub align: TextAlign,
}

/// Planned content for the visible range.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentPlan {
    pub cells: Vec<CellPaint>,
    pub overflow: OverflowSpans,
}

/// Family part of a CSS font shorthand (`"13px sans-serif"` -> `"sans-serif"`).
pub fn font_family(font: &str) -> &str {
    font.split_once("px ").map_or(font, |(_, family)| family.trim())
}

/// CSS font and pixel size for a cell with `style`.
pub fn resolve_font(config: &GridConfig, style: Option<&CellStyle>) -> (String, f64) {
    match style {
        Some(s) => (
            s.css_font(font_family(&config.default_font), config.default_font_size),
            s.font_size.unwrap_or(config.default_font_size),
        ),
        None => (config.default_font.clone(), config.default_font_size),
    }
}

fn resolve_align(align: Option<HAlign>, value: &str) -> TextAlign {
    match align.unwrap_or_default() {
        HAlign::Left => TextAlign::Left,
        HAlign::Center => TextAlign::Center,
        HAlign::Right => TextAlign::Right,
        HAlign::General if value.trim().parse::<f64>().is_ok() => TextAlign::Right,
        HAlign::General => TextAlign::Left,
    }
}

fn anchor_x(rect: &Rect, align: TextAlign) -> f64 {
    match align {
        TextAlign::Left => rect.x + CELL_PADDING,
        TextAlign::Center => rect.x + rect.width / 2.0,
        TextAlign::Right => rect.right() - CELL_PADDING,
    }
}

/// Lay out backgrounds and text for every cell that intersects the viewport.
pub fn plan_content(frame: &FrameContext<'_>, text: &dyn TextLayout) -> ContentPlan {
    let mut plan = ContentPlan::default();
    let Some(vis) = frame.visible else {
        return plan;
    };
    let grid = frame.grid;
    let visible = CellRange::new(vis.row_start, vis.col_start, vis.row_end, vis.col_end);

    // Merged blocks paint once from their anchor, even when it is scrolled off.
    for merge in grid.merges().iter().filter(|m| m.intersects(&visible)) {
        let rect = frame.range_rect(&merge.to_range());
        let planned = plan_cell(frame, text, merge.row, merge.col, rect, &mut plan.overflow, false);
        if let Some(cell) = planned {
            plan.cells.push(cell);
        }
    }
    for row in vis.row_start..=vis.row_end {
        for col in vis.col_start..=vis.col_end {
            if grid.merge_at(row, col).is_some() {
                continue;
            }
            let rect = frame.range_rect(&CellRange::new(row, col, row, col));
            if let Some(cell) = plan_cell(frame, text, row, col, rect, &mut plan.overflow, true) {
                plan.cells.push(cell);
            }
        }
    }
    plan
}

fn plan_cell(
    frame: &FrameContext<'_>,
    text: &dyn TextLayout,
    row: u32,
    col: u32,
    rect: Rect,
    overflow: &mut OverflowSpans,
    may_overflow: bool,
) -> Option<CellPaint> {
    let grid = frame.grid;
    let config = frame.config;
    let value = grid.value_at(row, col).unwrap_or("");
    let style = grid.style_at(row, col);
    let background = style.and_then(|s| s.bg_color.clone());
    if value.is_empty() && background.is_none() {
        return None;
    }

    let (font, size) = resolve_font(config, style);
    let color = style
        .and_then(|s| s.font_color.clone())
        .unwrap_or_else(|| palette::CELL_TEXT.to_string());
    let align = resolve_align(style.and_then(|s| s.align_h), value);
    let line_height = size * LINE_HEIGHT_FACTOR;
    let x = anchor_x(&rect, align);
    let mut clip = rect;

    let lines = if value.is_empty() {
        Vec::new()
    } else if style.is_some_and(|s| s.wraps()) {
        let max_width = (rect.width - 2.0 * CELL_PADDING).max(0.0);
        text.wrap_text_indices(value, max_width, &font, config.default_font_size)
            .into_iter()
            .enumerate()
            .filter_map(|(i, (start, end))| {
                let line = value.get(start..end)?.trim_end();
                #[allow(clippy::cast_precision_loss)]
                let y = rect.y + CELL_PADDING + line_height * (i as f64 + 0.5);
                Some(TextLine {
                    text: line.to_string(),
                    x,
                    y,
                })
            })
            .collect()
    } else if value.contains('\n') {
        value
            .split('\n')
            .enumerate()
            .map(|(i, line)| {
                #[allow(clippy::cast_precision_loss)]
                let y = rect.y + CELL_PADDING + line_height * (i as f64 + 0.5);
                TextLine {
                    text: line.to_string(),
                    x,
                    y,
                }
            })
            .collect()
    } else {
        if may_overflow && align == TextAlign::Left {
            let needed =
                text.measure_text(value, &font, config.default_font_size) + 2.0 * CELL_PADDING;
            if needed > rect.width {
                let end = overflow_end(frame, row, col, rect.x + needed);
                if end > col {
                    overflow.insert(row, col, end);
                    clip = frame.range_rect(&CellRange::new(row, col, row, end));
                }
            }
        }
        vec![TextLine {
            text: value.to_string(),
            x,
            y: rect.y + rect.height / 2.0,
        }]
    };

    Some(CellPaint {
        rect,
        clip,
        background,
        lines,
        font,
        color,
        align,
    })
}

/// Last column that text starting in `(row, col)` and ending at canvas x
/// `text_right` reaches through empty, unmerged neighbors.
fn overflow_end(frame: &FrameContext<'_>, row: u32, col: u32, text_right: f64) -> u32 {
    let grid = frame.grid;
    let mut end = col;
    while frame.col_x(end + 1) < text_right {
        let next = end + 1;
        if next >= grid.cols()
            || grid.value_at(row, next).is_some()
            || grid.merge_at(row, next).is_some()
        {
            break;
        }
        end = next;
    }
    end
}

/// Clear the base layer to the canvas background.
pub fn paint_background<S: Surface>(surface: &mut S, frame: &FrameContext<'_>) {
    let canvas = Rect::new(
        0.0,
        0.0,
        frame.metrics.viewport_width,
        frame.metrics.viewport_height,
    );
    surface.fill_rect(Layer::Base, canvas, palette::WHITE);
}

/// Grid lines along visible boundaries, broken wherever a merge or an
/// overflow span covers the boundary.
pub fn paint_grid_lines<S: Surface>(
    surface: &mut S,
    frame: &FrameContext<'_>,
    suppression: &dyn EdgeSuppression,
) {
    let Some(vis) = frame.visible else {
        return;
    };
    let grid = frame.grid;
    let color = frame.config.header_style.border_color.as_str();
    surface.push_clip(Layer::Base, frame.cell_area());

    let covers = |row: u32, col: u32, next_row: u32, next_col: u32| {
        grid.merge_at(row, col)
            .is_some_and(|m| m.contains(next_row, next_col))
    };

    for col in vis.col_start..=vis.col_end {
        let x = frame.col_x(col + 1);
        let mut run: Option<f64> = None;
        for row in vis.row_start..=vis.row_end {
            let hidden =
                covers(row, col, row, col + 1) || suppression.suppresses_right_edge(row, col);
            let top = frame.row_y(row);
            if hidden {
                if let Some(start) = run.take() {
                    surface.line(Layer::Base, (x, start), (x, top), color, 1.0);
                }
            } else if run.is_none() {
                run = Some(top);
            }
        }
        if let Some(start) = run {
            let bottom = frame.row_y(vis.row_end + 1);
            surface.line(Layer::Base, (x, start), (x, bottom), color, 1.0);
        }
    }

    for row in vis.row_start..=vis.row_end {
        let y = frame.row_y(row + 1);
        let mut run: Option<f64> = None;
        for col in vis.col_start..=vis.col_end {
            let left = frame.col_x(col);
            if covers(row, col, row + 1, col) {
                if let Some(start) = run.take() {
                    surface.line(Layer::Base, (start, y), (left, y), color, 1.0);
                }
            } else if run.is_none() {
                run = Some(left);
            }
        }
        if let Some(start) = run {
            let right = frame.col_x(vis.col_end + 1);
            surface.line(Layer::Base, (start, y), (right, y), color, 1.0);
        }
    }

    surface.pop_clip(Layer::Base);
}

/// Backgrounds and text from a plan, clipped to the cell area.
pub fn paint_content<S: Surface>(surface: &mut S, frame: &FrameContext<'_>, plan: &ContentPlan) {
    surface.push_clip(Layer::Base, frame.cell_area());
    for cell in &plan.cells {
        if let Some(bg) = &cell.background {
            surface.fill_rect(Layer::Base, cell.rect, bg);
        }
        if cell.lines.is_empty() {
            continue;
        }
        surface.push_clip(Layer::Base, cell.clip);
        for line in &cell.lines {
            surface.text(
                Layer::Base,
                &line.text,
                line.x,
                line.y,
                &cell.font,
                &cell.color,
                cell.align,
            );
        }
        surface.pop_clip(Layer::Base);
    }
    surface.pop_clip(Layer::Base);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::layout::ScrollOffset;
    use crate::model::GridData;
    use crate::render::{DisplayList, DrawOp, MonospaceLayout};
    use crate::types::{CellStyle, MergeRange, Size, StyleId};

    fn config() -> GridConfig {
        GridConfig {
            row_header_width: 40.0,
            col_header_height: 20.0,
            default_font: "10px mono".into(),
            default_font_size: 10.0,
            ..GridConfig::default()
        }
    }

    fn grid() -> GridData {
        GridData::new(10, 10, 20.0, 50.0)
    }

    fn vertical_lines_at(list: &DisplayList, x: f64) -> Vec<(f64, f64)> {
        list.base
            .iter()
            .filter_map(|op| match op {
                DrawOp::Line { from, to, .. } if from.0 == x && to.0 == x => Some((from.1, to.1)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_font_family() {
        assert_eq!(font_family("13px sans-serif"), "sans-serif");
        assert_eq!(font_family("bold 13px Arial, sans-serif"), "Arial, sans-serif");
        assert_eq!(font_family("serif"), "serif");
    }

    #[test]
    fn test_general_alignment() {
        assert_eq!(resolve_align(None, "42.5"), TextAlign::Right);
        assert_eq!(resolve_align(None, "abc"), TextAlign::Left);
        assert_eq!(resolve_align(Some(HAlign::Center), "42"), TextAlign::Center);
    }

    #[test]
    fn test_long_text_overflows_into_empty_neighbors() {
        let mut g = grid();
        // 6px per char at 10px: 20 chars need 126px including padding.
        g.set_value(1, 0, Some("abcdefghijklmnopqrst".into()));
        g.set_value(2, 0, Some("abcdefghijklmnopqrst".into()));
        g.set_value(2, 1, Some("x".into()));
        let config = config();
        let frame = FrameContext::new(&g, &config, Size::new(400.0, 200.0), ScrollOffset::default());
        let plan = plan_content(&frame, &MonospaceLayout::default());

        assert_eq!(plan.overflow.span_at(1, 1), Some((0, 2)));
        assert!(plan.overflow.suppresses_right_edge(1, 0));
        assert!(plan.overflow.suppresses_right_edge(1, 1));
        assert!(!plan.overflow.suppresses_right_edge(1, 2));
        // Blocked by a non-empty neighbor.
        assert_eq!(plan.overflow.span_at(2, 0), None);
    }

    #[test]
    fn test_grid_lines_skip_merge_interior() {
        let mut g = grid();
        g.add_merge(MergeRange::new(0, 0, 2, 2));
        let config = config();
        let frame = FrameContext::new(&g, &config, Size::new(400.0, 200.0), ScrollOffset::default());
        let mut list = DisplayList::new();
        paint_grid_lines(&mut list, &frame, &OverflowSpans::new());

        // Boundary between columns 0 and 1 at x = 40 + 50: broken for rows 0-1.
        let segments = vertical_lines_at(&list, 90.0);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].0, 60.0);
        // Boundary after column 1 runs unbroken from the header.
        assert_eq!(vertical_lines_at(&list, 140.0)[0].0, 20.0);
    }

    #[test]
    fn test_wrapped_text_lines() {
        let mut g = grid();
        g.define_style(
            StyleId(1),
            CellStyle {
                wrap_text: Some(true),
                ..CellStyle::default()
            },
        );
        g.set_row_height(0, 60.0);
        g.set_value(0, 0, Some("aaaa bbbb cccc".into()));
        g.set_cell_style(0, 0, Some(StyleId(1)));
        let config = config();
        let frame = FrameContext::new(&g, &config, Size::new(400.0, 200.0), ScrollOffset::default());
        let plan = plan_content(&frame, &MonospaceLayout::default());
        let cell = &plan.cells[0];
        let texts: Vec<&str> = cell.lines.iter().map(|l| l.text.as_str()).collect();
        // 44px of room at 6px per char: two words never share a line.
        assert_eq!(texts, vec!["aaaa", "bbbb", "cccc"]);
        assert!(plan.overflow.is_empty());
    }
}

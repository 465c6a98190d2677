//! Overlay furniture: resize guides, scrollbars and the in-cell editor.

use super::colors::{palette, selection_fill, shade};
use super::content::{resolve_font, CELL_PADDING, LINE_HEIGHT_FACTOR};
use super::frame::{intersect, FrameContext};
use super::surface::{Layer, Surface, TextAlign};
use super::text::{hard_lines, TextLayout, TextSegment};
use crate::layout::{Orientation, ScrollbarGeometry};
use crate::model::GridSource;
use crate::protocol::{EditorOverlay, Guides, ScrollbarState};
use crate::types::Rect;

/// Gap between the track edge and the thumb, across the scroll axis.
const THUMB_INSET: f64 = 2.0;

pub fn paint_guides<S: Surface>(surface: &mut S, frame: &FrameContext<'_>, guides: &Guides) {
    let (width, height) = (frame.metrics.viewport_width, frame.metrics.viewport_height);
    if let Some(x) = guides.x {
        surface.line(Layer::Overlay, (x, 0.0), (x, height), palette::GUIDE, 1.0);
    }
    if let Some(y) = guides.y {
        surface.line(Layer::Overlay, (0.0, y), (width, y), palette::GUIDE, 1.0);
    }
}

pub fn paint_scrollbars<S: Surface>(
    surface: &mut S,
    frame: &FrameContext<'_>,
    state: &ScrollbarState,
) {
    let bars = &frame.scrollbars;
    if let Some(bar) = &bars.vertical {
        paint_scrollbar(surface, bar, state.v_hover, state.v_active);
    }
    if let Some(bar) = &bars.horizontal {
        paint_scrollbar(surface, bar, state.h_hover, state.h_active);
    }
    if let (Some(v), Some(h)) = (&bars.vertical, &bars.horizontal) {
        let corner = Rect::new(v.track.x, h.track.y, v.track.width, h.track.height);
        surface.fill_rect(Layer::Overlay, corner, palette::SCROLLBAR_TRACK);
    }
}

fn paint_scrollbar<S: Surface>(surface: &mut S, bar: &ScrollbarGeometry, hover: bool, active: bool) {
    surface.fill_rect(Layer::Overlay, bar.track, palette::SCROLLBAR_TRACK);
    let thumb = match bar.orientation {
        Orientation::Vertical => Rect::new(
            bar.thumb.x + THUMB_INSET,
            bar.thumb.y,
            (bar.thumb.width - 2.0 * THUMB_INSET).max(0.0),
            bar.thumb.height,
        ),
        Orientation::Horizontal => Rect::new(
            bar.thumb.x,
            bar.thumb.y + THUMB_INSET,
            bar.thumb.width,
            (bar.thumb.height - 2.0 * THUMB_INSET).max(0.0),
        ),
    };
    let color = if active {
        shade(palette::SCROLLBAR_THUMB, 0.35)
    } else if hover {
        shade(palette::SCROLLBAR_THUMB, 0.2)
    } else {
        palette::SCROLLBAR_THUMB.to_string()
    };
    surface.fill_rect(Layer::Overlay, thumb, &color);
}

/// Lines of editor text: wrapped to the cell when its style wraps, otherwise
/// split on hard breaks.
fn editor_lines(
    text: &str,
    wraps: bool,
    width: f64,
    font: &str,
    default_size: f64,
    layout: &dyn TextLayout,
) -> Vec<TextSegment> {
    if wraps {
        let max_width = (width - 2.0 * CELL_PADDING).max(0.0);
        return layout.wrap_text_indices(text, max_width, font, default_size);
    }
    hard_lines(text)
}

/// Editor box over the edited cell with text, text selection and caret.
pub fn paint_editor<S: Surface>(
    surface: &mut S,
    frame: &FrameContext<'_>,
    editor: &EditorOverlay,
    layout: &dyn TextLayout,
    accent: &str,
) {
    let cell = editor.cell;
    let rect = frame.cell_rect(cell.row, cell.col);
    if intersect(rect, frame.cell_area()).is_none() {
        return;
    }
    let config = frame.config;
    let style = frame.grid.style_at(cell.row, cell.col);
    let (font, size) = resolve_font(config, style);
    let line_height = size * LINE_HEIGHT_FACTOR;
    let wraps = style.is_some_and(|s| s.wraps());
    let lines = editor_lines(&editor.text, wraps, rect.width, &font, config.default_font_size, layout);

    surface.push_clip(Layer::Overlay, frame.cell_area());
    surface.fill_rect(Layer::Overlay, rect, palette::WHITE);
    surface.stroke_rect(Layer::Overlay, rect, accent, 2.0);
    surface.push_clip(Layer::Overlay, rect);

    let selected = editor
        .selection_anchor
        .filter(|&a| a != editor.caret)
        .map(|a| (a.min(editor.caret), a.max(editor.caret)));
    let measure = |s: usize, e: usize| {
        editor
            .text
            .get(s..e)
            .map_or(0.0, |t| layout.measure_text(t, &font, config.default_font_size))
    };
    let x0 = rect.x + CELL_PADDING;
    let single = lines.len() == 1;
    for (i, &(start, end)) in lines.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let y = if single {
            rect.y + rect.height / 2.0
        } else {
            rect.y + CELL_PADDING + line_height * (i as f64 + 0.5)
        };
        if let Some((lo, hi)) = selected {
            let (s, e) = (lo.max(start), hi.min(end));
            if s < e {
                let left = x0 + measure(start, s);
                let right = x0 + measure(start, e);
                let band = Rect::new(left, y - line_height / 2.0, right - left, line_height);
                surface.fill_rect(Layer::Overlay, band, &selection_fill(accent));
            }
        }
        if let Some(line) = editor.text.get(start..end) {
            surface.text(Layer::Overlay, line, x0, y, &font, palette::CELL_TEXT, TextAlign::Left);
        }
        let next_start = lines.get(i + 1).map(|&(s, _)| s);
        let caret_here = editor.caret >= start
            && (editor.caret <= end && next_start.map_or(true, |n| editor.caret < n));
        if caret_here {
            let x = x0 + measure(start, editor.caret.min(end));
            surface.line(
                Layer::Overlay,
                (x, y - line_height / 2.0),
                (x, y + line_height / 2.0),
                palette::CELL_TEXT,
                1.0,
            );
        }
    }
    surface.pop_clip(Layer::Overlay);
    surface.pop_clip(Layer::Overlay);
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
    use crate::render::{DisplayList, DrawOp, MonospaceLayout};
    use crate::types::{CellPos, Size};

    fn config() -> GridConfig {
        GridConfig {
            default_font: "10px mono".into(),
            default_font_size: 10.0,
            ..GridConfig::default()
        }
    }

    fn lines(list: &DisplayList) -> Vec<((f64, f64), (f64, f64))> {
        list.overlay
            .iter()
            .filter_map(|op| match op {
                DrawOp::Line { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_guides() {
        let grid = GridData::new(10, 10, 20.0, 50.0);
        let config = config();
        let frame = FrameContext::new(&grid, &config, Size::new(300.0, 200.0), ScrollOffset::default());
        let mut list = DisplayList::new();
        paint_guides(&mut list, &frame, &Guides { x: Some(120.0), y: None });
        assert_eq!(lines(&list), vec![((120.0, 0.0), (120.0, 200.0))]);
    }

    #[test]
    fn test_scrollbar_thumb_shades() {
        let grid = GridData::new(100, 100, 20.0, 50.0);
        let config = config();
        let frame = FrameContext::new(&grid, &config, Size::new(300.0, 200.0), ScrollOffset::default());
        let mut idle = DisplayList::new();
        paint_scrollbars(&mut idle, &frame, &ScrollbarState::default());
        let mut hot = DisplayList::new();
        let state = ScrollbarState {
            v_active: true,
            ..ScrollbarState::default()
        };
        paint_scrollbars(&mut hot, &frame, &state);
        assert_eq!(idle.overlay.len(), hot.overlay.len());
        assert_ne!(idle.overlay, hot.overlay);
    }

    #[test]
    fn test_editor_caret_position() {
        let grid = GridData::new(10, 10, 20.0, 50.0);
        let config = config();
        let frame = FrameContext::new(&grid, &config, Size::new(300.0, 200.0), ScrollOffset::default());
        let mut list = DisplayList::new();
        let editor = EditorOverlay {
            cell: CellPos::new(0, 0),
            text: "abcd".into(),
            caret: 2,
            selection_anchor: None,
        };
        paint_editor(&mut list, &frame, &editor, &MonospaceLayout::default(), "#1A73E8");
        assert_eq!(list.texts(Layer::Overlay), vec!["abcd"]);
        // Cell (0, 0) starts at x = 40; 3px padding plus two 6px chars.
        let caret = lines(&list);
        assert_eq!(caret.len(), 1);
        assert_eq!(caret[0].0 .0, 55.0);
    }

    #[test]
    fn test_editor_lines_split_hard_breaks() {
        let layout = MonospaceLayout::default();
        assert_eq!(
            editor_lines("ab\ncd", false, 100.0, "10px mono", 10.0, &layout),
            vec![(0, 2), (3, 5)]
        );
    }
}

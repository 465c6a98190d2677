//! Render-context state machine.
//!
//! The engine owns the drawing surface and a mirror of the grid. The mirror
//! changes only by replaying `ApplyOps` batches; nothing on this side writes
//! to it directly.

use tracing::{debug, trace, warn};

use super::chrome::{paint_editor, paint_guides, paint_scrollbars};
use super::content::{paint_background, paint_content, paint_grid_lines, plan_content};
use super::frame::FrameContext;
use super::headers::paint_headers;
use super::overflow::OverflowSpans;
use super::selection::paint_selection;
use super::surface::{Layer, Surface};
use super::text::TextLayout;
use crate::config::GridConfig;
use crate::layout::ScrollOffset;
use crate::model::GridData;
use crate::protocol::{
    Command, EditorOverlay, Guides, HeaderLabels, MetricsSnapshot, RenderEvent, ScrollbarState,
};
use crate::types::{CellPos, CellRange, Size};

/// What the last full render left on the base layer.
#[derive(Debug, Clone)]
struct BaseFrame {
    scroll: ScrollOffset,
    overflow: OverflowSpans,
}

pub struct RenderEngine<S, T> {
    surface: S,
    text: T,
    mirror: GridData,
    config: GridConfig,
    canvas: Size,
    dpr: f64,
    selection: Option<CellRange>,
    anchor: Option<CellPos>,
    guides: Option<Guides>,
    scrollbar_state: ScrollbarState,
    labels: HeaderLabels,
    editor: Option<EditorOverlay>,
    /// None when the base layer must be repainted before any UI-only frame
    base: Option<BaseFrame>,
}

impl<S: Surface, T: TextLayout> RenderEngine<S, T> {
    /// `mirror` is usually `GridData::empty_like` of the authoritative grid;
    /// the control context fills it with a snapshot batch.
    pub fn new(surface: S, text: T, config: GridConfig, mirror: GridData) -> Self {
        Self {
            surface,
            text,
            mirror,
            config,
            canvas: Size::default(),
            dpr: 1.0,
            selection: None,
            anchor: None,
            guides: None,
            scrollbar_state: ScrollbarState::default(),
            labels: HeaderLabels::default(),
            editor: None,
            base: None,
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn text_layout(&self) -> &T {
        &self.text
    }

    pub fn mirror(&self) -> &GridData {
        &self.mirror
    }

    pub fn selection(&self) -> Option<CellRange> {
        self.selection
    }

    /// Process one command; renders and RPCs produce events.
    pub fn handle(&mut self, command: Command) -> Vec<RenderEvent> {
        match command {
            Command::Resize { width, height } => {
                self.canvas = Size::new(width.max(0.0), height.max(0.0));
                self.surface.resize(self.canvas.width, self.canvas.height, self.dpr);
                self.base = None;
            }
            Command::SetDpr { dpr } => {
                if dpr.is_finite() && dpr > 0.0 {
                    self.dpr = dpr;
                    self.surface.resize(self.canvas.width, self.canvas.height, dpr);
                    self.base = None;
                }
            }
            Command::Render { scroll_x, scroll_y } => {
                return vec![RenderEvent::Metrics(
                    self.render(ScrollOffset::new(scroll_x, scroll_y), false),
                )];
            }
            Command::RenderUiOnly { scroll_x, scroll_y } => {
                return vec![RenderEvent::Metrics(
                    self.render(ScrollOffset::new(scroll_x, scroll_y), true),
                )];
            }
            Command::SetSelection { sel, anchor } => {
                self.selection = sel;
                self.anchor = anchor;
            }
            Command::SetGuides { guides } => self.guides = guides,
            Command::SetScrollbarState { state } => self.scrollbar_state.apply(&state),
            Command::SetHeaderStyle { style } => self.config.header_style = style,
            Command::SetHeaderLabels { labels } => self.labels = labels,
            Command::SetEditor { editor } => self.editor = editor,
            Command::ApplyOps { ops } => {
                trace!(count = ops.len(), "replaying ops");
                for op in &ops {
                    if !self.mirror.apply(op) {
                        warn!(?op, "mirror rejected op");
                    }
                }
                if !ops.is_empty() {
                    self.base = None;
                }
            }
            Command::MeasureText {
                id,
                text,
                font,
                default_size,
            } => {
                let width = self.text.measure_text(&text, &font, default_size);
                return vec![RenderEvent::MeasureTextResult { id, width }];
            }
            Command::WrapText {
                id,
                text,
                max_width,
                font,
                default_size,
            } => {
                let lines = self
                    .text
                    .wrap_text_indices(&text, max_width, &font, default_size);
                return vec![RenderEvent::WrapTextResult { id, lines }];
            }
            Command::CaretFromPoint {
                id,
                text,
                rel_x,
                rel_y,
                opts,
            } => {
                let caret = self.text.caret_index_from_point(&text, rel_x, rel_y, &opts);
                return vec![RenderEvent::CaretFromPointResult { id, caret }];
            }
            Command::Shutdown => debug!("render engine shutdown requested"),
        }
        Vec::new()
    }

    /// Paint one frame. A UI-only request repaints just the overlay when the
    /// base layer from the last full render still matches; otherwise it is
    /// promoted to a full render.
    fn render(&mut self, scroll: ScrollOffset, ui_only: bool) -> MetricsSnapshot {
        let frame = FrameContext::new(&self.mirror, &self.config, self.canvas, scroll);
        let reuse = ui_only
            && self.surface.has_overlay()
            && self.base.as_ref().is_some_and(|b| b.scroll == frame.scroll);

        let overflow = if reuse {
            self.base
                .as_ref()
                .map(|b| b.overflow.clone())
                .unwrap_or_default()
        } else {
            self.surface.clear(Layer::Base);
            paint_background(&mut self.surface, &frame);
            let plan = plan_content(&frame, &self.text);
            paint_grid_lines(&mut self.surface, &frame, &plan.overflow);
            paint_content(&mut self.surface, &frame, &plan);
            plan.overflow
        };

        self.surface.clear(Layer::Overlay);
        let style = &self.config.header_style;
        if let Some(range) = &self.selection {
            paint_selection(
                &mut self.surface,
                &frame,
                range,
                self.anchor,
                &style.selection_color,
                &overflow,
            );
        }
        if let Some(editor) = &self.editor {
            paint_editor(&mut self.surface, &frame, editor, &self.text, &style.selection_color);
        }
        paint_headers(
            &mut self.surface,
            &frame,
            style,
            &self.labels,
            self.selection.as_ref(),
        );
        if let Some(guides) = &self.guides {
            paint_guides(&mut self.surface, &frame, guides);
        }
        paint_scrollbars(&mut self.surface, &frame, &self.scrollbar_state);

        let snapshot = frame.snapshot();
        self.base = Some(BaseFrame {
            scroll: frame.scroll,
            overflow,
        });
        trace!(ui_only, reused_base = reuse, "frame rendered");
        snapshot
    }
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
    use crate::model::{GridOp, GridSource};
    use crate::protocol::{RequestId, ScrollbarStatePatch};
    use crate::render::{DisplayList, MonospaceLayout};

    fn engine() -> RenderEngine<DisplayList, MonospaceLayout> {
        let config = GridConfig {
            row_header_width: 40.0,
            col_header_height: 40.0,
            scrollbar_thickness: 12.0,
            ..GridConfig::default()
        };
        let mut engine = RenderEngine::new(
            DisplayList::new(),
            MonospaceLayout::default(),
            config,
            GridData::new(100, 100, 20.0, 50.0),
        );
        engine.handle(Command::Resize {
            width: 300.0,
            height: 200.0,
        });
        engine
    }

    fn metrics(events: &[RenderEvent]) -> MetricsSnapshot {
        match events {
            [RenderEvent::Metrics(m)] => *m,
            other => panic!("expected one metrics event, got {other:?}"),
        }
    }

    #[test]
    fn test_render_reports_metrics() {
        let mut engine = engine();
        let events = engine.handle(Command::Render {
            scroll_x: 0.0,
            scroll_y: 0.0,
        });
        let m = metrics(&events);
        assert_eq!(m.viewport_metrics.width_avail, 248.0);
        assert_eq!(m.viewport_metrics.height_avail, 148.0);
        assert!(m.scrollbars.vertical.is_some());
        assert!(m.scrollbars.horizontal.is_some());
    }

    #[test]
    fn test_ops_replay_into_mirror() {
        let mut engine = engine();
        engine.handle(Command::ApplyOps {
            ops: vec![
                GridOp::SetValue {
                    row: 0,
                    col: 0,
                    value: Some("hello".into()),
                },
                GridOp::SetColWidth { col: 0, width: 80.0 },
            ],
        });
        assert_eq!(engine.mirror().value_at(0, 0), Some("hello"));
        let m = metrics(&engine.handle(Command::Render {
            scroll_x: 0.0,
            scroll_y: 0.0,
        }));
        assert_eq!(m.viewport_metrics.content_width, 5030.0);
        assert!(engine.surface().texts(Layer::Base).contains(&"hello"));
    }

    #[test]
    fn test_ui_only_keeps_base_layer() {
        let mut engine = engine();
        engine.handle(Command::Render {
            scroll_x: 0.0,
            scroll_y: 0.0,
        });
        engine.handle(Command::SetSelection {
            sel: Some(CellRange::new(1, 1, 1, 1)),
            anchor: Some(CellPos::new(1, 1)),
        });
        engine.handle(Command::RenderUiOnly {
            scroll_x: 0.0,
            scroll_y: 0.0,
        });
        assert_eq!(engine.surface().base_frames, 1);
        assert_eq!(engine.surface().overlay_frames, 2);
    }

    #[test]
    fn test_ui_only_promoted_after_scroll_or_ops() {
        let mut engine = engine();
        engine.handle(Command::Render {
            scroll_x: 0.0,
            scroll_y: 0.0,
        });
        engine.handle(Command::RenderUiOnly {
            scroll_x: 0.0,
            scroll_y: 40.0,
        });
        assert_eq!(engine.surface().base_frames, 2);
        engine.handle(Command::ApplyOps {
            ops: vec![GridOp::SetRowHeight { row: 3, height: 30.0 }],
        });
        engine.handle(Command::RenderUiOnly {
            scroll_x: 0.0,
            scroll_y: 40.0,
        });
        assert_eq!(engine.surface().base_frames, 3);
    }

    #[test]
    fn test_render_clamps_scroll() {
        let mut engine = engine();
        let m = metrics(&engine.handle(Command::Render {
            scroll_x: -50.0,
            scroll_y: 1e9,
        }));
        let v = m.scrollbars.vertical.unwrap();
        // Thumb pinned to the end of the track.
        assert_eq!(v.thumb.bottom(), v.track.bottom());
        let h = m.scrollbars.horizontal.unwrap();
        assert_eq!(h.thumb.x, h.track.x);
    }

    #[test]
    fn test_rpc_commands_answer_with_ids() {
        let mut engine = engine();
        let events = engine.handle(Command::MeasureText {
            id: RequestId(9),
            text: "abc".into(),
            font: "10px mono".into(),
            default_size: 10.0,
        });
        assert_eq!(
            events,
            vec![RenderEvent::MeasureTextResult {
                id: RequestId(9),
                width: 18.0
            }]
        );
    }

    #[test]
    fn test_scrollbar_state_patch_merges() {
        let mut engine = engine();
        engine.handle(Command::SetScrollbarState {
            state: ScrollbarStatePatch {
                v_hover: Some(true),
                ..ScrollbarStatePatch::default()
            },
        });
        engine.handle(Command::SetScrollbarState {
            state: ScrollbarStatePatch {
                h_active: Some(true),
                ..ScrollbarStatePatch::default()
            },
        });
        assert!(engine.scrollbar_state.v_hover);
        assert!(engine.scrollbar_state.h_active);
    }
}

//! Common test utilities for the integration suites.
//!
//! Every scenario uses the same fixture: a 300x200 canvas with 40px header
//! bands, 12px scrollbars and a 100x100 grid of 50x20 cells.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use vgrid::config::GridConfig;
use vgrid::layout::{ScrollOffset, Scrollbars, ViewFrame, ViewportCalculator};
use vgrid::model::{GridData, GridSource};
use vgrid::protocol::RenderTransport;
use vgrid::render::{DisplayList, InlineRenderer, MonospaceLayout, RenderEngine};
use vgrid::types::{CellRange, Size};
use vgrid::viewer::GridView;

pub const CANVAS: Size = Size::new(300.0, 200.0);
pub const ROWS: u32 = 100;
pub const COLS: u32 = 100;
pub const ROW_HEIGHT: f64 = 20.0;
pub const COL_WIDTH: f64 = 50.0;
pub const HEADER: f64 = 40.0;

pub type Inline = InlineRenderer<DisplayList, MonospaceLayout>;
pub type Engine = RenderEngine<DisplayList, MonospaceLayout>;

pub fn scenario_config() -> GridConfig {
    GridConfig {
        default_row_height: ROW_HEIGHT,
        default_col_width: COL_WIDTH,
        row_header_width: HEADER,
        col_header_height: HEADER,
        scrollbar_thickness: 12.0,
        ..GridConfig::default()
    }
}

pub fn scenario_grid() -> GridData {
    GridData::new(ROWS, COLS, ROW_HEIGHT, COL_WIDTH)
}

/// Engine drawing into a display list with a mirror shaped like `grid`.
pub fn engine_for(grid: &GridData) -> Engine {
    RenderEngine::new(
        DisplayList::new(),
        MonospaceLayout::default(),
        scenario_config(),
        grid.empty_like(),
    )
}

/// Same-thread view over `grid`, with the first frame already rendered.
pub fn inline_view(grid: GridData) -> GridView<Inline> {
    let transport = InlineRenderer::new(engine_for(&grid));
    let mut view = GridView::new(grid, scenario_config(), transport, CANVAS.width, CANVAS.height);
    view.on_frame(0.0);
    view
}

/// Frame for hit testing `grid` at `scroll` on a canvas at the page origin.
pub fn frame_for(grid: &GridData, canvas: Size, scroll: ScrollOffset) -> ViewFrame {
    let config = scenario_config();
    let header = config.header_size();
    let content = Size::new(grid.col_widths().total(), grid.row_heights().total());
    let metrics =
        ViewportCalculator::compute(canvas, header, config.scrollbar_thickness, content);
    let scroll = scroll.clamped(&metrics);
    ViewFrame {
        origin: (0.0, 0.0),
        header,
        metrics,
        scroll,
        scrollbars: Scrollbars::compute(
            &metrics,
            header,
            config.scrollbar_thickness,
            config.min_thumb_length,
            scroll,
        ),
        resize_margin: config.resize_margin,
    }
}

/// Client center of a cell's rectangle in the view's current frame.
pub fn cell_center<T: RenderTransport>(view: &GridView<T>, row: u32, col: u32) -> (f64, f64) {
    view.cell_to_pixel_rect(row, col).center()
}

pub fn click<T: RenderTransport>(view: &mut GridView<T>, row: u32, col: u32, extend: bool) {
    let (x, y) = cell_center(view, row, col);
    view.pointer_down(x, y, extend);
    view.pointer_up();
}

pub fn selected_range<T: RenderTransport>(view: &GridView<T>) -> CellRange {
    view.selection().expect("no selection").range.normalized()
}

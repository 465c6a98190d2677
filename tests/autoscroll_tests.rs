//! Auto-scroll convergence, standalone and driven by a selection drag.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::*;
use vgrid::config::AutoScrollConfig;
use vgrid::interaction::AutoScroller;
use vgrid::layout::{ScrollOffset, ViewportMetrics};
use vgrid::types::Rect;

const MAX_SETTLE_TICKS: usize = 60;

fn area() -> Rect {
    Rect::new(HEADER, HEADER, 248.0, 148.0)
}

fn metrics() -> ViewportMetrics {
    ViewportMetrics {
        max_scroll_x: 4752.0,
        max_scroll_y: 1852.0,
        ..ViewportMetrics::default()
    }
}

#[test]
fn test_velocity_reaches_exact_zero_and_loop_stops() {
    let config = AutoScrollConfig::default();
    let mut scroller = AutoScroller::new();
    let mut scroll = ScrollOffset::default();
    let mut now = 0.0;

    scroller.update_target(100.0, 400.0, area(), &config);
    assert!(scroller.start());
    for _ in 0..30 {
        now += 16.0;
        scroller.tick(now, &mut scroll, &metrics(), &config);
    }
    assert!(scroll.y > 0.0);

    scroller.update_target(100.0, 100.0, area(), &config);
    let mut ticks = 0;
    while scroller.is_running() {
        now += 16.0;
        scroller.tick(now, &mut scroll, &metrics(), &config);
        ticks += 1;
        assert!(ticks <= MAX_SETTLE_TICKS, "auto-scroll never settled");
    }
    assert_eq!(scroller.velocity(), (0.0, 0.0));
    assert_eq!(scroller.target(), (0.0, 0.0));

    let settled = scroll;
    let tick = scroller.tick(now + 16.0, &mut scroll, &metrics(), &config);
    assert!(!tick.scrolled && !tick.running);
    assert_eq!(scroll, settled);
}

#[test]
fn test_scroll_stops_at_limit() {
    let config = AutoScrollConfig::default();
    let mut scroller = AutoScroller::new();
    let mut scroll = ScrollOffset::new(0.0, 1850.0);
    scroller.update_target(100.0, 1000.0, area(), &config);
    scroller.start();
    for i in 1..=20 {
        scroller.tick(f64::from(i) * 16.0, &mut scroll, &metrics(), &config);
    }
    assert_eq!(scroll.y, 1852.0);
}

#[test]
fn test_selection_drag_below_edge_scrolls_and_extends() {
    let mut view = inline_view(scenario_grid());
    let (x, y) = cell_center(&view, 0, 0);
    view.pointer_down(x, y, false);
    view.pointer_move(x, 400.0);
    assert!(view.is_auto_scrolling());

    let mut now = 0.0;
    for _ in 0..20 {
        now += 16.0;
        view.on_frame(now);
    }
    assert!(view.scroll().y > 0.0);
    let grown = selected_range(&view).r1;
    assert!(grown > 7, "selection should follow the scrolled content, got row {grown}");

    // Back inside the cell area: the loop winds down on its own.
    view.pointer_move(x, 100.0);
    let mut frames = 0;
    while view.is_auto_scrolling() {
        now += 16.0;
        view.on_frame(now);
        frames += 1;
        assert!(frames <= MAX_SETTLE_TICKS, "auto-scroll never settled");
    }
    let settled = view.scroll();
    view.on_frame(now + 16.0);
    assert_eq!(view.scroll(), settled);
    assert!(!view.needs_frame());

    view.pointer_up();
    assert_eq!(view.selection().unwrap().anchor.row, 0);
}

#[test]
fn test_pointer_up_cancels_loop() {
    let mut view = inline_view(scenario_grid());
    let (x, y) = cell_center(&view, 0, 0);
    view.pointer_down(x, y, false);
    view.pointer_move(x, 400.0);
    view.on_frame(16.0);
    view.pointer_up();
    assert!(!view.is_auto_scrolling());
    let scroll = view.scroll();
    view.on_frame(32.0);
    view.on_frame(48.0);
    assert_eq!(view.scroll(), scroll);
}

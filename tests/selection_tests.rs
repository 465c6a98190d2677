//! Merge-aware selection and merge management through the view.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::*;
use test_case::test_case;
use vgrid::layout::MergeIndex;
use vgrid::model::GridSource;
use vgrid::types::{CellPos, CellRange, MergeRange};
use vgrid::viewer::{Key, Modifiers};

fn merged_grid() -> vgrid::model::GridData {
    let mut grid = scenario_grid();
    assert!(grid.add_merge(MergeRange::new(1, 1, 2, 2)));
    grid
}

#[test_case(2, 2 ; "covered cell")]
#[test_case(1, 1 ; "anchor")]
#[test_case(1, 2 ; "top right")]
fn test_click_in_merge_selects_merge(row: u32, col: u32) {
    let mut view = inline_view(merged_grid());
    click(&mut view, row, col, false);
    assert_eq!(selected_range(&view), CellRange::new(1, 1, 2, 2));
}

#[test]
fn test_drag_across_merge_grows_to_cover_it() {
    let mut view = inline_view(merged_grid());
    let (x0, y0) = cell_center(&view, 0, 0);
    let (x1, y1) = cell_center(&view, 1, 3);
    view.pointer_down(x0, y0, false);
    view.pointer_move(x1, y1);
    view.pointer_up();
    // Row 1 touches the merge, which reaches down to row 2.
    assert_eq!(selected_range(&view), CellRange::new(0, 0, 2, 3));
    assert_eq!(view.selection().unwrap().anchor, CellPos::new(0, 0));
}

#[test]
fn test_shift_click_extends_from_anchor() {
    let mut view = inline_view(merged_grid());
    click(&mut view, 4, 4, false);
    click(&mut view, 2, 2, true);
    assert_eq!(selected_range(&view), CellRange::new(1, 1, 4, 4));
    assert_eq!(view.selection().unwrap().anchor, CellPos::new(4, 4));
}

#[test]
fn test_rejected_overlapping_merge_leaves_set_unchanged() {
    let mut merges = MergeIndex::new();
    assert!(merges.add(0, 0, 2, 2));
    assert!(!merges.add(1, 1, 2, 2));
    assert_eq!(merges.iter().copied().collect::<Vec<_>>(), vec![MergeRange::new(0, 0, 2, 2)]);
}

#[test]
fn test_rejected_merge_never_reaches_mirror() {
    let mut view = inline_view(merged_grid());
    assert!(!view.add_merge(MergeRange::new(2, 2, 2, 2)));
    view.on_frame(16.0);
    let mirror = view.transport().engine().mirror();
    assert_eq!(mirror.merges().len(), 1);
    assert_eq!(mirror, view.grid());
}

#[test]
fn test_merge_then_unmerge_selection() {
    let mut view = inline_view(scenario_grid());
    click(&mut view, 3, 3, false);
    click(&mut view, 5, 4, true);
    assert!(view.merge_selection());
    assert_eq!(view.grid().merge_at(4, 4), Some(&MergeRange::new(3, 3, 3, 2)));

    assert!(view.unmerge_at(5, 3));
    assert!(view.grid().merges().is_empty());
    view.on_frame(16.0);
    assert!(view.transport().engine().mirror().merges().is_empty());
}

#[test]
fn test_arrow_keys_step_over_merge() {
    let mut view = inline_view(merged_grid());
    click(&mut view, 1, 0, false);
    assert!(view.key_down(Key::ArrowRight, Modifiers::NONE));
    assert_eq!(selected_range(&view), CellRange::new(1, 1, 2, 2));
    assert!(view.key_down(Key::ArrowRight, Modifiers::NONE));
    assert_eq!(selected_range(&view), CellRange::new(1, 3, 1, 3));
}

#[test]
fn test_corner_click_selects_all() {
    let mut view = inline_view(scenario_grid());
    view.pointer_down(HEADER / 2.0, HEADER / 2.0, false);
    view.pointer_up();
    assert_eq!(selected_range(&view), CellRange::new(0, 0, ROWS - 1, COLS - 1));
}

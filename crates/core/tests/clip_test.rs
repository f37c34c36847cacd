//! Tests for clip paths: bbox tracking and exact clip masks.

use contour_core::interp::{Interpreter, InterpreterOptions};
use contour_core::raster::clip::clip_coverage;
use contour_core::utils::RECT_UNBOUNDED;
use contour_core::{GraphicsState, Resources, tokenize};

fn clip_state(content: &[u8], budget: u32) -> GraphicsState {
    let res = Resources::default();
    let opts = InterpreterOptions::default().with_clip_max_size(budget);
    let mut interp = Interpreter::new(&res, &opts);
    interp.execute(tokenize(content)).unwrap();
    interp.graphics_state().clone()
}

const TRIANGLE: &[u8] = b"0 0 m 100 0 l 0 100 l h W n ";

#[test]
fn test_zero_budget_keeps_bbox_only() {
    let state = clip_state(TRIANGLE, 0);
    assert!(state.clip_mask.is_none());
    assert_eq!(state.clip_bbox, (0.0, 0.0, 100.0, 100.0));
    // Without a mask everything inside the bbox is covered.
    assert_eq!(clip_coverage(&state, (90.0, 90.0)), 1.0);
}

#[test]
fn test_clip_mask_follows_path() {
    let state = clip_state(TRIANGLE, 8);
    let mask = state.clip_mask.as_ref().unwrap();
    assert_eq!((mask.width, mask.height), (8, 8));
    assert_eq!(clip_coverage(&state, (10.0, 10.0)), 1.0);
    assert_eq!(clip_coverage(&state, (90.0, 90.0)), 0.0);
    assert_eq!(clip_coverage(&state, (150.0, 10.0)), 0.0);
}

#[test]
fn test_nested_clips_intersect() {
    let mut content = TRIANGLE.to_vec();
    content.extend_from_slice(b"50 0 50 100 re W n");
    let state = clip_state(&content, 8);
    assert_eq!(state.clip_bbox, (50.0, 0.0, 100.0, 100.0));
    let mask = state.clip_mask.as_ref().unwrap();
    assert_eq!((mask.width, mask.height), (4, 8));
    // Inside both.
    assert_eq!(clip_coverage(&state, (60.0, 10.0)), 1.0);
    // Inside the rectangle, outside the triangle.
    assert_eq!(clip_coverage(&state, (60.0, 60.0)), 0.0);
    // Inside the triangle, outside the rectangle.
    assert_eq!(clip_coverage(&state, (10.0, 10.0)), 0.0);
}

#[test]
fn test_even_odd_clip_leaves_hole() {
    let rings = b"0 0 100 100 re 25 25 50 50 re ";
    let mut even_odd = rings.to_vec();
    even_odd.extend_from_slice(b"W* n");
    let state = clip_state(&even_odd, 8);
    assert_eq!(clip_coverage(&state, (50.0, 50.0)), 0.0);
    assert_eq!(clip_coverage(&state, (10.0, 10.0)), 1.0);

    let mut nonzero = rings.to_vec();
    nonzero.extend_from_slice(b"W n");
    let state = clip_state(&nonzero, 8);
    assert_eq!(clip_coverage(&state, (50.0, 50.0)), 1.0);
}

#[test]
fn test_restore_drops_clip_mask() {
    let mut content = b"q ".to_vec();
    content.extend_from_slice(TRIANGLE);
    content.extend_from_slice(b"Q");
    let state = clip_state(&content, 8);
    assert!(state.clip_mask.is_none());
    assert_eq!(state.clip_bbox, RECT_UNBOUNDED);
}

#[test]
fn test_clip_applies_ctm() {
    let mut content = b"2 0 0 2 0 0 cm ".to_vec();
    content.extend_from_slice(TRIANGLE);
    let state = clip_state(&content, 8);
    assert_eq!(state.clip_bbox, (0.0, 0.0, 200.0, 200.0));
    assert_eq!(clip_coverage(&state, (20.0, 20.0)), 1.0);
    assert_eq!(clip_coverage(&state, (180.0, 180.0)), 0.0);
}

#[test]
fn test_clip_respects_page_bbox() {
    let res = Resources::default();
    let opts = InterpreterOptions::default()
        .with_page_bbox((0.0, 0.0, 50.0, 50.0))
        .with_clip_max_size(8);
    let mut interp = Interpreter::new(&res, &opts);
    interp.execute(tokenize(TRIANGLE)).unwrap();
    let state = interp.graphics_state();
    assert_eq!(state.clip_bbox, (0.0, 0.0, 50.0, 50.0));
    assert_eq!(clip_coverage(state, (60.0, 10.0)), 0.0);
    assert_eq!(clip_coverage(state, (10.0, 10.0)), 1.0);
}

#[test]
fn test_clip_without_points_is_ignored() {
    let state = clip_state(b"h W n", 8);
    assert_eq!(state.clip_bbox, RECT_UNBOUNDED);
    assert!(state.clip_mask.is_none());

    let res = Resources::default();
    let opts = InterpreterOptions::default();
    let mut interp = Interpreter::new(&res, &opts);
    interp.execute(tokenize(b"0 0 50 50 re W n h W n 0 0 10 10 re f")).unwrap();
    let elements = interp.finish();
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].state().clip_bbox, (0.0, 0.0, 50.0, 50.0));
}

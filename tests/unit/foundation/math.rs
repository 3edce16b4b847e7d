use super::*;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
}

#[test]
fn apply_border_insets_each_side() {
    let r = apply_border(
        Rect::new(0.0, 0.0, 100.0, 50.0),
        Borders {
            left: 10.0,
            top: 5.0,
            right: 20.0,
            bottom: 15.0,
        },
    );
    assert_eq!(r, Rect::new(10.0, 15.0, 80.0, 45.0));
}

#[test]
fn apply_border_tolerates_degenerate_results() {
    // Borders larger than the rect: callers must get a well-defined
    // (negative-size) rect back, not a panic.
    let r = apply_border(Rect::new(0.0, 0.0, 10.0, 10.0), Borders::uniform(8.0));
    assert!(r.x1 < r.x0);
    assert!(r.y1 < r.y0);
}

#[test]
fn div_rect_converts_pixels_to_uv() {
    let uv = div_rect(Rect::new(32.0, 16.0, 96.0, 48.0), Vec2::new(128.0, 64.0));
    assert_eq!(uv, Rect::new(0.25, 0.25, 0.75, 0.75));
}

#[test]
fn div_rect_by_zero_size_yields_zeros() {
    let uv = div_rect(Rect::new(1.0, 2.0, 3.0, 4.0), Vec2::ZERO);
    assert_eq!(uv, Rect::new(0.0, 0.0, 0.0, 0.0));
}

#[test]
fn mul_rect_inverts_div_rect() {
    let size = Vec2::new(128.0, 64.0);
    let r = Rect::new(32.0, 16.0, 96.0, 48.0);
    assert_eq!(mul_rect(div_rect(r, size), size), r);
}

#[test]
fn remap_round_trips_inside_the_source_rect() {
    let from = Rect::new(-50.0, -25.0, 150.0, 75.0);
    let to = Rect::new(0.0, 0.0, 1.0, 1.0);
    for p in [
        Point::new(-50.0, -25.0),
        Point::new(0.0, 0.0),
        Point::new(100.0, 60.0),
        Point::new(150.0, 75.0),
    ] {
        let back = remap(remap(p, from, to), to, from);
        assert_close(back.x, p.x);
        assert_close(back.y, p.y);
    }
}

#[test]
fn remap_degenerate_source_maps_to_target_min() {
    let from = Rect::new(5.0, 0.0, 5.0, 10.0);
    let to = Rect::new(0.0, 0.0, 1.0, 1.0);
    let p = remap(Point::new(5.0, 5.0), from, to);
    assert_close(p.x, 0.0);
    assert_close(p.y, 0.5);
}

#[test]
fn preserve_aspect_shrinks_one_axis_anchored_at_min() {
    // Wide source into a square rect: height shrinks.
    let r = preserve_aspect(Rect::new(10.0, 10.0, 110.0, 110.0), Vec2::new(200.0, 100.0));
    assert_eq!(r, Rect::new(10.0, 10.0, 110.0, 60.0));

    // Tall source into a square rect: width shrinks.
    let r = preserve_aspect(Rect::new(10.0, 10.0, 110.0, 110.0), Vec2::new(100.0, 200.0));
    assert_eq!(r, Rect::new(10.0, 10.0, 60.0, 110.0));
}

#[test]
fn preserve_aspect_passes_degenerate_inputs_through() {
    let r = Rect::new(0.0, 0.0, 100.0, 100.0);
    assert_eq!(preserve_aspect(r, Vec2::ZERO), r);
    assert_eq!(preserve_aspect(Rect::ZERO, Vec2::new(2.0, 1.0)), Rect::ZERO);
}

#[test]
fn adjust_borders_leaves_fitting_borders_alone() {
    let b = Borders {
        left: 10.0,
        top: 10.0,
        right: 10.0,
        bottom: 10.0,
    };
    let out = adjust_borders(b, Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(out, b);
}

#[test]
fn adjust_borders_clamps_overlap_preserving_ratio() {
    let b = Borders {
        left: 30.0,
        top: 0.0,
        right: 10.0,
        bottom: 0.0,
    };
    let out = adjust_borders(b, Rect::new(0.0, 0.0, 20.0, 20.0));
    // left + right must now meet exactly at the rect width, in a 3:1 ratio.
    assert_close(out.left + out.right, 20.0);
    assert_close(out.left / out.right, 3.0);
    assert_eq!(out.top, 0.0);
    assert_eq!(out.bottom, 0.0);
}

#[test]
fn adjust_borders_clamps_both_axes_independently() {
    let b = Borders {
        left: 60.0,
        top: 75.0,
        right: 60.0,
        bottom: 25.0,
    };
    let out = adjust_borders(b, Rect::new(0.0, 0.0, 100.0, 50.0));
    assert_close(out.horizontal(), 100.0);
    assert_close(out.vertical(), 50.0);
    assert_close(out.top / out.bottom, 3.0);
}

#[test]
fn slice_axis_maps_the_three_segments() {
    let x = [0.0, 10.0, 90.0, 100.0];
    let u = [0.0, 0.25, 0.75, 1.0];
    assert_close(slice_axis(5.0, x, u), 0.125);
    assert_close(slice_axis(50.0, x, u), 0.5);
    assert_close(slice_axis(95.0, x, u), 0.875);
}

#[test]
fn slice_axis_handles_zero_borders_without_division() {
    // Zero border on this axis: the control points collapse pairwise.
    let x = [0.0, 0.0, 100.0, 100.0];
    let u = [0.0, 0.0, 1.0, 1.0];
    assert_close(slice_axis(50.0, x, u), 0.5);
    assert_close(slice_axis(0.0, x, u), 0.0);
    assert_close(slice_axis(100.0, x, u), 1.0);
}

#[test]
fn inset_border_segments_do_not_repeat() {
    let x = [0.0, 10.0, 90.0, 100.0];
    let u = [0.0, 0.25, 0.75, 1.0];
    assert_close(inset(5.0, x, u, 4.0), 0.125);
    assert_close(inset(95.0, x, u, 4.0), 0.875);
}

#[test]
fn inset_center_repeats_with_integer_repeat() {
    let x = [0.0, 10.0, 90.0, 100.0];
    let u = [0.0, 0.25, 0.75, 1.0];
    // Two tiles across the 80-unit center: the midpoints of each tile hit the
    // same UV.
    let a = inset(30.0, x, u, 2.0);
    let b = inset(70.0, x, u, 2.0);
    assert_close(a, b);
    assert_close(a, 0.5);
}

#[test]
fn inset_non_integer_repeat_yields_partial_tile_at_far_edge() {
    let x = [0.0, 0.0, 100.0, 100.0];
    let u = [0.0, 0.0, 1.0, 1.0];
    // 1.5 tiles: the far half is a partial tile ending mid-image.
    let near_end = inset(99.9, x, u, 1.5);
    assert!(
        (0.49..0.50).contains(&near_end),
        "expected a partial tile, got {near_end}"
    );
}

#[test]
fn inset_degenerate_center_falls_back_without_division() {
    let x = [0.0, 50.0, 50.0, 100.0];
    let u = [0.0, 0.5, 0.5, 1.0];
    assert_close(inset(50.0, x, u, 3.0), 0.5);
}

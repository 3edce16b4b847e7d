use crate::foundation::core::{Borders, Point, Rect, Vec2};

/// Spans at or below this are treated as degenerate by the mapping functions.
pub(crate) const SPAN_EPS: f64 = 1e-9;

pub(crate) fn apply_border(r: Rect, b: Borders) -> Rect {
    Rect::new(r.x0 + b.left, r.y0 + b.bottom, r.x1 - b.right, r.y1 - b.top)
}

pub(crate) fn div_rect(r: Rect, size: Vec2) -> Rect {
    Rect::new(
        div_axis(r.x0, size.x),
        div_axis(r.y0, size.y),
        div_axis(r.x1, size.x),
        div_axis(r.y1, size.y),
    )
}

pub(crate) fn mul_rect(r: Rect, size: Vec2) -> Rect {
    Rect::new(r.x0 * size.x, r.y0 * size.y, r.x1 * size.x, r.y1 * size.y)
}

fn div_axis(v: f64, d: f64) -> f64 {
    if d.abs() <= SPAN_EPS { 0.0 } else { v / d }
}

/// Linear remap of `p` from `from`'s coordinate space into `to`'s.
///
/// Degenerate source spans map to the target minimum, never dividing by zero.
pub(crate) fn remap(p: Point, from: Rect, to: Rect) -> Point {
    Point::new(
        remap_axis(p.x, from.x0, from.x1, to.x0, to.x1),
        remap_axis(p.y, from.y0, from.y1, to.y0, to.y1),
    )
}

pub(crate) fn remap_axis(v: f64, a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    let span = a1 - a0;
    if span.abs() <= SPAN_EPS {
        return b0;
    }
    b0 + (v - a0) / span * (b1 - b0)
}

/// Shrink one axis of `r` so its aspect ratio matches `source`'s, anchored at
/// the min corner.
pub(crate) fn preserve_aspect(r: Rect, source: Vec2) -> Rect {
    if source.x <= SPAN_EPS
        || source.y <= SPAN_EPS
        || r.width() <= SPAN_EPS
        || r.height() <= SPAN_EPS
    {
        return r;
    }
    let rect_aspect = r.width() / r.height();
    let src_aspect = source.x / source.y;
    if src_aspect > rect_aspect {
        let h = r.width() / src_aspect;
        Rect::new(r.x0, r.y0, r.x1, r.y0 + h)
    } else {
        let w = r.height() * src_aspect;
        Rect::new(r.x0, r.y0, r.x0 + w, r.y1)
    }
}

/// Scale down overlapping 9-slice borders so opposite sides meet exactly at
/// the rect's span, preserving their ratio. Non-overlapping borders pass
/// through unchanged.
pub(crate) fn adjust_borders(b: Borders, r: Rect) -> Borders {
    let mut out = b;
    let w = r.width().max(0.0);
    if out.horizontal() > w && out.horizontal() > 0.0 {
        let k = w / out.horizontal();
        out.left *= k;
        out.right *= k;
    }
    let h = r.height().max(0.0);
    if out.vertical() > h && out.vertical() > 0.0 {
        let k = h / out.vertical();
        out.top *= k;
        out.bottom *= k;
    }
    out
}

/// Piecewise-linear 9-slice mapping along one axis (no repetition).
///
/// `x` and `u` hold the four control points (outer-min, inner-min, inner-max,
/// outer-max) in local and UV space respectively. Degenerate segments resolve
/// to the segment-start UV.
pub(crate) fn slice_axis(v: f64, x: [f64; 4], u: [f64; 4]) -> f64 {
    if v < x[1] {
        remap_axis(v, x[0], x[1], u[0], u[1])
    } else if v > x[2] {
        remap_axis(v, x[2], x[3], u[2], u[3])
    } else {
        remap_axis(v, x[1], x[2], u[1], u[2])
    }
}

/// Tiled-mode 1D mapping: border segments map linearly (no repeat), the center
/// repeats `repeat` times.
///
/// A non-integer `repeat` is accepted and yields a partial tile at the far
/// edge; seamless tiling requires an integer-ish ratio of rendered size to
/// source tile size.
pub(crate) fn inset(v: f64, x: [f64; 4], u: [f64; 4], repeat: f64) -> f64 {
    if v < x[1] {
        return remap_axis(v, x[0], x[1], u[0], u[1]);
    }
    if v > x[2] {
        return remap_axis(v, x[2], x[3], u[2], u[3]);
    }
    let span = x[2] - x[1];
    if span <= SPAN_EPS {
        // Degenerate center: fall back to the non-repeating branch.
        return u[1];
    }
    let t = ((v - x[1]) / span * repeat).fract();
    u[1] + (u[2] - u[1]) * t
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;

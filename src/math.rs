//! Scalar and path helpers shared by the simulation and the renderer.

use crate::render::Canvas;

pub const TAU: f64 = std::f64::consts::TAU;

/// Bird pitch limits, radians. Positive is nose-down.
pub const NOSE_UP: f64 = -0.45;
pub const NOSE_DOWN: f64 = 1.2;

/// Largest value of a collection, or `None` when it is empty.
///
/// NaN values are skipped rather than poisoning the result.
pub fn max_of<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |best, v| match best {
            Some(b) if b >= v => Some(b),
            _ => Some(v),
        })
}

pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Axis-aligned overlap test; touching edges do not count.
pub fn rects_overlap(a: (f64, f64, f64, f64), b: (f64, f64, f64, f64)) -> bool {
    let (ax, ay, aw, ah) = a;
    let (bx, by, bw, bh) = b;
    ax < bx + bw && ax + aw > bx && ay < by + bh && ay + ah > by
}

/// Traces a rounded rectangle as a closed subpath. The caller fills or strokes.
///
/// The radius is clamped to half of the shorter side so tiny rectangles still
/// produce a valid outline.
pub fn trace_rounded_rect<C: Canvas>(canvas: &mut C, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let r = r.max(0.0).min(w.abs() / 2.0).min(h.abs() / 2.0);
    canvas.begin_path();
    canvas.move_to(x + r, y);
    canvas.line_to(x + w - r, y);
    canvas.quadratic_to(x + w, y, x + w, y + r);
    canvas.line_to(x + w, y + h - r);
    canvas.quadratic_to(x + w, y + h, x + w - r, y + h);
    canvas.line_to(x + r, y + h);
    canvas.quadratic_to(x, y + h, x, y + h - r);
    canvas.line_to(x, y + r);
    canvas.quadratic_to(x, y, x + r, y);
    canvas.close_path();
}

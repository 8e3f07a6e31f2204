//! Elliptical arcs approximated by cubic Bezier segments.
//!
//! Slide paths declare arcs relative to the current point: radii plus a start angle and a sweep.
//! The end point follows from the ellipse parametrization, after which the arc is converted with
//! the usual endpoint-to-centre construction and split into pieces of at most a quarter turn.
//! A quarter-turn cubic deviates from the true ellipse by under 0.03% of the radius.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::bezier::CubicBezier;
use crate::geom::{Point, Vector, point, vector};

const DEGENERATE: f64 = 1e-12;

/// Offset from an ellipse's centre to the point on it seen at polar angle `angle`.
pub fn ellipse_point(rx: f64, ry: f64, angle: f64) -> Vector {
    let a_sin = rx * angle.sin();
    let b_cos = ry * angle.cos();
    let r = (a_sin * a_sin + b_cos * b_cos).sqrt();
    if r < DEGENERATE {
        return vector(0.0, 0.0);
    }
    vector(rx * b_cos / r, ry * a_sin / r)
}

/// An arc in endpoint parametrization (SVG style, no axis rotation).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndpointArc {
    pub start: Point,
    pub end: Point,
    pub rx: f64,
    pub ry: f64,
    pub large_arc: bool,
    pub sweep: bool,
}

/// Arc starting at `current` on an axis-aligned ellipse, from `start_angle` through `sweep_angle`
/// (radians, positive is clockwise on screen).
///
/// Returns the cubic segments and the arc's end point.
pub fn arc_to_beziers(
    current: Point,
    rx: f64,
    ry: f64,
    start_angle: f64,
    sweep_angle: f64,
) -> (Vec<CubicBezier>, Point) {
    let p1 = ellipse_point(rx, ry, start_angle);
    let p2 = ellipse_point(rx, ry, start_angle + sweep_angle);
    let end = current - p1 + p2;

    if sweep_angle.abs() < DEGENERATE {
        return (Vec::new(), end);
    }

    // A (near) full turn has coincident end points, which the endpoint construction cannot
    // represent. Split it in two halves through the opposite point.
    if (end - current).length() < DEGENERATE * rx.abs().max(ry.abs()).max(1.0) {
        let half = sweep_angle / 2.0;
        let (mut first, mid) = arc_to_beziers(current, rx, ry, start_angle, half);
        let (second, end) = arc_to_beziers(mid, rx, ry, start_angle + half, half);
        first.extend(second);
        return (first, end);
    }

    let arc = EndpointArc {
        start: current,
        end,
        rx,
        ry,
        large_arc: sweep_angle.abs() >= PI,
        sweep: sweep_angle >= 0.0,
    };
    (endpoint_arc_to_cubics(&arc), end)
}

/// Converts an endpoint arc to at most quarter-turn cubic segments.
pub fn endpoint_arc_to_cubics(arc: &EndpointArc) -> Vec<CubicBezier> {
    let (start, end) = (arc.start, arc.end);
    if (start - end).length() < DEGENERATE {
        return Vec::new();
    }
    let mut rx = arc.rx.abs();
    let mut ry = arc.ry.abs();
    if rx < DEGENERATE || ry < DEGENERATE {
        // Zero radius arcs are straight lines.
        return vec![CubicBezier::new(start, start, end, end)];
    }

    let x1p = (start.x - end.x) / 2.0;
    let y1p = (start.y - end.y) / 2.0;

    // Radii too small to span the chord are scaled up uniformly.
    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let rx2 = rx * rx;
    let ry2 = ry * ry;
    let num = rx2 * ry2 - rx2 * y1p * y1p - ry2 * x1p * x1p;
    let den = rx2 * y1p * y1p + ry2 * x1p * x1p;
    let radicand = if den.abs() < DEGENERATE {
        0.0
    } else {
        (num / den).max(0.0)
    };
    let sign = if arc.large_arc == arc.sweep { -1.0 } else { 1.0 };
    let coef = sign * radicand.sqrt();
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;

    let cx = cxp + (start.x + end.x) / 2.0;
    let cy = cyp + (start.y + end.y) / 2.0;

    let theta1 = vector_angle(1.0, 0.0, (x1p - cxp) / rx, (y1p - cyp) / ry);
    let mut delta = vector_angle(
        (x1p - cxp) / rx,
        (y1p - cyp) / ry,
        (-x1p - cxp) / rx,
        (-y1p - cyp) / ry,
    );
    if !arc.sweep && delta > 0.0 {
        delta -= TAU;
    } else if arc.sweep && delta < 0.0 {
        delta += TAU;
    }

    let segments = ((delta.abs() / FRAC_PI_2).ceil() as usize).max(1);
    let step = delta / segments as f64;
    // Control arm length for a unit-circle arc of angle `step`.
    let alpha = 4.0 / 3.0 * (step / 4.0).tan();

    let on_ellipse = |theta: f64| point(cx + rx * theta.cos(), cy + ry * theta.sin());

    let mut out = Vec::with_capacity(segments);
    let mut from = start;
    for i in 0..segments {
        let t0 = theta1 + step * i as f64;
        let t1 = t0 + step;
        let (s0, c0) = t0.sin_cos();
        let (s1, c1) = t1.sin_cos();
        let ctrl1 = point(from.x - alpha * rx * s0, from.y + alpha * ry * c0);
        let to = if i + 1 == segments { end } else { on_ellipse(t1) };
        let ctrl2 = point(to.x + alpha * rx * s1, to.y - alpha * ry * c1);
        out.push(CubicBezier::new(from, ctrl1, ctrl2, to));
        from = to;
    }
    out
}

fn vector_angle(ux: f64, uy: f64, vx: f64, vy: f64) -> f64 {
    let n = (ux * ux + uy * uy).sqrt() * (vx * vx + vy * vy).sqrt();
    if n < DEGENERATE {
        return 0.0;
    }
    let c = ((ux * vx + uy * vy) / n).clamp(-1.0, 1.0);
    let sign = if ux * vy - uy * vx < 0.0 { -1.0 } else { 1.0 };
    sign * c.acos()
}

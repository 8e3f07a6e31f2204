//! Quadratic and cubic Bezier segments with fixed-resolution sampling.

use crate::geom::Point;

pub trait Curve {
    fn point_at(&self, t: f64) -> Point;

    /// Samples the curve at `steps` equal parametric intervals, both end points included.
    fn sample(&self, steps: usize) -> Vec<Point> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| self.point_at(i as f64 / steps as f64))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub start: Point,
    pub ctrl1: Point,
    pub ctrl2: Point,
    pub end: Point,
}

impl CubicBezier {
    pub fn new(start: Point, ctrl1: Point, ctrl2: Point, end: Point) -> Self {
        Self {
            start,
            ctrl1,
            ctrl2,
            end,
        }
    }
}

impl Curve for CubicBezier {
    fn point_at(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt * mt;
        let b = 3.0 * mt * mt * t;
        let c = 3.0 * mt * t * t;
        let d = t * t * t;
        Point::new(
            a * self.start.x + b * self.ctrl1.x + c * self.ctrl2.x + d * self.end.x,
            a * self.start.y + b * self.ctrl1.y + c * self.ctrl2.y + d * self.end.y,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezier {
    pub start: Point,
    pub ctrl: Point,
    pub end: Point,
}

impl QuadraticBezier {
    pub fn new(start: Point, ctrl: Point, end: Point) -> Self {
        Self { start, ctrl, end }
    }
}

impl Curve for QuadraticBezier {
    fn point_at(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt;
        let b = 2.0 * mt * t;
        let c = t * t;
        Point::new(
            a * self.start.x + b * self.ctrl.x + c * self.end.x,
            a * self.start.y + b * self.ctrl.y + c * self.end.y,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::point;

    #[test]
    fn sampling_includes_both_end_points() {
        let bz = CubicBezier::new(
            point(0.0, 0.0),
            point(1.0, 2.0),
            point(3.0, 2.0),
            point(4.0, 0.0),
        );
        let pts = bz.sample(100);
        assert_eq!(pts.len(), 101);
        assert_eq!(pts[0], point(0.0, 0.0));
        assert_eq!(pts[100], point(4.0, 0.0));
    }

    #[test]
    fn quadratic_midpoint() {
        let bz = QuadraticBezier::new(point(0.0, 0.0), point(1.0, 2.0), point(2.0, 0.0));
        assert_eq!(bz.point_at(0.5), point(1.0, 1.0));
    }
}

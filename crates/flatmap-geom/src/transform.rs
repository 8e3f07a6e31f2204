//! Homogeneous 2D transforms.
//!
//! A [`Transform`] is a 3×3 matrix whose last row stays `[0, 0, 1]`. Transforms compose
//! outer-to-inner: `layer * group * shape` applied to a point first places it in the shape's box,
//! then in the group, then on the layer.

use std::ops::Mul;

use nalgebra::{Matrix3, Vector3};

use crate::geom::{Point, Size, point};

/// Extents smaller than this are treated as collapsed (e.g. the height of a horizontal line).
const COLLAPSED_EXTENT: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform(Matrix3<f64>);

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    pub fn from_matrix(matrix: Matrix3<f64>) -> Self {
        Self(matrix)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self(Matrix3::new(sx, 0.0, 0.0, 0.0, sy, 0.0, 0.0, 0.0, 1.0))
    }

    pub fn translate(dx: f64, dy: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, dx, 0.0, 1.0, dy, 0.0, 0.0, 1.0))
    }

    /// Rotation by `radians`. With the source's downward Y axis a positive angle turns clockwise
    /// on screen, which is how slide rotations are declared.
    pub fn rotate(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self(Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0))
    }

    /// Base transform of a layer: source units to metres, Y flipped so north is up, and the
    /// canvas midpoint moved to the origin.
    pub fn canvas(canvas: Size, metres_per_unit: f64) -> Self {
        Self::scale(metres_per_unit, -metres_per_unit)
            * Self::translate(-canvas.width / 2.0, -canvas.height / 2.0)
    }

    /// Maps the box `src_origin..src_origin+src_size` onto `dst_origin..dst_origin+dst_size`.
    ///
    /// Flips mirror about the destination box centre and rotation (degrees, clockwise on screen)
    /// turns about the same centre, matching how slide shapes and groups are placed.
    pub fn box_to_box(
        src_origin: Point,
        src_size: Size,
        dst_origin: Point,
        dst_size: Size,
        rotation_degrees: f64,
        flip_h: bool,
        flip_v: bool,
    ) -> Self {
        let ratio = |dst: f64, src: f64| {
            if src.abs() < COLLAPSED_EXTENT {
                1.0
            } else {
                dst / src
            }
        };
        let src_cx = src_origin.x + src_size.width / 2.0;
        let src_cy = src_origin.y + src_size.height / 2.0;
        let dst_cx = dst_origin.x + dst_size.width / 2.0;
        let dst_cy = dst_origin.y + dst_size.height / 2.0;

        let flip = Self::scale(
            if flip_h { -1.0 } else { 1.0 },
            if flip_v { -1.0 } else { 1.0 },
        );

        Self::translate(dst_cx, dst_cy)
            * Self::rotate(rotation_degrees.to_radians())
            * flip
            * Self::scale(
                ratio(dst_size.width, src_size.width),
                ratio(dst_size.height, src_size.height),
            )
            * Self::translate(-src_cx, -src_cy)
    }

    /// `self @ inner`: apply `inner` first, then `self`.
    pub fn then_inner(&self, inner: &Transform) -> Transform {
        Transform(self.0 * inner.0)
    }

    pub fn apply(&self, p: Point) -> Point {
        let v = self.0 * Vector3::new(p.x, p.y, 1.0);
        point(v.x, v.y)
    }

    pub fn apply_coord(&self, c: geo::Coord<f64>) -> geo::Coord<f64> {
        let v = self.0 * Vector3::new(c.x, c.y, 1.0);
        geo::Coord { x: v.x, y: v.y }
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        Transform(self.0 * rhs.0)
    }
}

impl Mul<&Transform> for &Transform {
    type Output = Transform;

    fn mul(self, rhs: &Transform) -> Transform {
        Transform(self.0 * rhs.0)
    }
}

//! Perspective transforms between quadrilaterals.

use geo::Coord;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::geometry::Geometry;

/// A projective 2D transform; points are divided by their homogeneous weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    /// The unique transform taking each `src[i]` to `dst[i]`.
    ///
    /// Returns `None` when the correspondence is degenerate (three collinear corners, repeated
    /// points). Corners are matched positionally; nothing checks that the quadrilaterals share a
    /// winding or starting corner.
    pub fn from_quads(src: &[Coord<f64>; 4], dst: &[Coord<f64>; 4]) -> Option<Self> {
        // h33 is fixed to 1, leaving eight unknowns and two equations per point pair.
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for i in 0..4 {
            let (x, y) = (src[i].x, src[i].y);
            let (u, v) = (dst[i].x, dst[i].y);
            let r = 2 * i;
            a[(r, 0)] = x;
            a[(r, 1)] = y;
            a[(r, 2)] = 1.0;
            a[(r, 6)] = -x * u;
            a[(r, 7)] = -y * u;
            b[r] = u;

            a[(r + 1, 3)] = x;
            a[(r + 1, 4)] = y;
            a[(r + 1, 5)] = 1.0;
            a[(r + 1, 6)] = -x * v;
            a[(r + 1, 7)] = -y * v;
            b[r + 1] = v;
        }
        let h = a.lu().solve(&b)?;
        if h.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Self(Matrix3::new(
            h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0,
        )))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    pub fn apply(&self, c: Coord<f64>) -> Coord<f64> {
        let v = self.0 * Vector3::new(c.x, c.y, 1.0);
        if v.z == 0.0 {
            return Coord { x: v.x, y: v.y };
        }
        Coord {
            x: v.x / v.z,
            y: v.y / v.z,
        }
    }

    pub fn apply_geometry(&self, geometry: &Geometry) -> Geometry {
        geometry.map_coords(|c| self.apply(c))
    }
}

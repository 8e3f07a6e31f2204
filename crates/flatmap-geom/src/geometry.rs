//! Flattened shape geometry and the measures derived from it.

use geo::{
    Area, BoundingRect, Centroid, Contains, Coord, EuclideanLength, InteriorPoint, LineString,
    MinimumRotatedRect, Polygon,
};

/// `[min_x, min_y, max_x, max_y]`.
pub type Bounds = [f64; 4];

/// Geometry of one shape or synthesized region: a ring-bounded polygon or an open polyline.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon<f64>),
    LineString(LineString<f64>),
}

impl Geometry {
    /// Builds a polygon from a ring, closing it if needed.
    pub fn polygon(ring: Vec<Coord<f64>>) -> Self {
        Self::Polygon(Polygon::new(LineString::new(ring), Vec::new()))
    }

    pub fn line_string(coords: Vec<Coord<f64>>) -> Self {
        Self::LineString(LineString::new(coords))
    }

    pub fn geometry_type(&self) -> &'static str {
        match self {
            Self::Polygon(_) => "Polygon",
            Self::LineString(_) => "LineString",
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Polygon(p) => p.exterior().0.is_empty(),
            Self::LineString(l) => l.0.is_empty(),
        }
    }

    pub fn as_polygon(&self) -> Option<&Polygon<f64>> {
        match self {
            Self::Polygon(p) => Some(p),
            Self::LineString(_) => None,
        }
    }

    pub fn as_line_string(&self) -> Option<&LineString<f64>> {
        match self {
            Self::LineString(l) => Some(l),
            Self::Polygon(_) => None,
        }
    }

    /// Enclosed area; zero for lines.
    pub fn area(&self) -> f64 {
        match self {
            Self::Polygon(p) => p.unsigned_area(),
            Self::LineString(_) => 0.0,
        }
    }

    /// Line length, or the perimeter of every ring of a polygon.
    pub fn length(&self) -> f64 {
        match self {
            Self::Polygon(p) => {
                p.exterior().euclidean_length()
                    + p.interiors()
                        .iter()
                        .map(|ring| ring.euclidean_length())
                        .sum::<f64>()
            }
            Self::LineString(l) => l.euclidean_length(),
        }
    }

    pub fn bounds(&self) -> Option<Bounds> {
        let rect = match self {
            Self::Polygon(p) => p.bounding_rect(),
            Self::LineString(l) => l.bounding_rect(),
        }?;
        Some([rect.min().x, rect.min().y, rect.max().x, rect.max().y])
    }

    pub fn centroid(&self) -> Option<Coord<f64>> {
        let c = match self {
            Self::Polygon(p) => p.centroid(),
            Self::LineString(l) => l.centroid(),
        }?;
        Some(c.0)
    }

    /// A point guaranteed to lie on the geometry (inside, for polygons).
    pub fn representative_point(&self) -> Option<Coord<f64>> {
        let p = match self {
            Self::Polygon(p) => p.interior_point(),
            Self::LineString(l) => l.interior_point(),
        }?;
        Some(p.0)
    }

    /// Every ring of a polygon as an open-ended line, or the line itself.
    pub fn boundary(&self) -> Vec<LineString<f64>> {
        match self {
            Self::Polygon(p) => std::iter::once(p.exterior().clone())
                .chain(p.interiors().iter().cloned())
                .collect(),
            Self::LineString(l) => vec![l.clone()],
        }
    }

    pub fn contains_point(&self, c: Coord<f64>) -> bool {
        match self {
            Self::Polygon(p) => p.contains(&geo::Point(c)),
            Self::LineString(l) => l.contains(&geo::Point(c)),
        }
    }

    /// The four corners of the minimum-area enclosing rectangle, closing point dropped.
    pub fn minimum_rotated_rect_corners(&self) -> Option<[Coord<f64>; 4]> {
        let rect = match self {
            Self::Polygon(p) => p.minimum_rotated_rect(),
            Self::LineString(l) => l.minimum_rotated_rect(),
        }?;
        let ring = &rect.exterior().0;
        if ring.len() < 4 {
            return None;
        }
        Some([ring[0], ring[1], ring[2], ring[3]])
    }

    pub fn map_coords(&self, f: impl Fn(Coord<f64>) -> Coord<f64>) -> Geometry {
        let map_ring = |ring: &LineString<f64>| -> LineString<f64> {
            LineString::new(ring.0.iter().map(|c| f(*c)).collect())
        };
        match self {
            Self::Polygon(p) => Self::Polygon(Polygon::new(
                map_ring(p.exterior()),
                p.interiors().iter().map(map_ring).collect(),
            )),
            Self::LineString(l) => Self::LineString(map_ring(l)),
        }
    }
}

/// Extends both ends of `line` outward along its end segments by `delta`.
///
/// Ends whose segment has zero length are left in place.
pub fn extend_line(line: &LineString<f64>, delta: f64) -> LineString<f64> {
    let mut coords = line.0.clone();
    let n = coords.len();
    if n < 2 {
        return LineString::new(coords);
    }
    let first = extend_point(coords[1], coords[0], delta);
    let last = extend_point(coords[n - 2], coords[n - 1], delta);
    coords[0] = first;
    coords[n - 1] = last;
    LineString::new(coords)
}

/// Moves `to` away from `from` by `delta` along the line through both.
fn extend_point(from: Coord<f64>, to: Coord<f64>, delta: f64) -> Coord<f64> {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return to;
    }
    let scale = (delta + len) / len;
    Coord {
        x: from.x + scale * dx,
        y: from.y + scale * dy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    #[test]
    fn extend_two_point_line_both_ways() {
        let line = LineString::new(vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 0.0 }]);
        let longer = extend_line(&line, 1.0);
        assert_eq!(
            longer.0,
            vec![coord! { x: -1.0, y: 0.0 }, coord! { x: 11.0, y: 0.0 }]
        );
    }

    #[test]
    fn extend_polyline_moves_only_end_points() {
        let line = LineString::new(vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 0.0, y: 5.0 },
            coord! { x: 5.0, y: 5.0 },
        ]);
        let longer = extend_line(&line, 2.0);
        assert_eq!(longer.0[0], coord! { x: 0.0, y: -2.0 });
        assert_eq!(longer.0[1], coord! { x: 0.0, y: 5.0 });
        assert_eq!(longer.0[2], coord! { x: 7.0, y: 5.0 });
    }

    #[test]
    fn polygon_length_is_perimeter() {
        let g = Geometry::polygon(vec![
            coord! { x: 0.0, y: 0.0 },
            coord! { x: 3.0, y: 0.0 },
            coord! { x: 3.0, y: 4.0 },
        ]);
        assert!((g.length() - 12.0).abs() < 1e-12);
        assert!((g.area() - 6.0).abs() < 1e-12);
    }
}

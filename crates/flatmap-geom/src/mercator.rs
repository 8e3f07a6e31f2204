//! Web Mercator (EPSG:3857) metres to WGS84 (EPSG:4326) longitude/latitude degrees.

use geo::Coord;

use crate::geometry::Geometry;

/// WGS84 semi-major axis, the sphere radius of Web Mercator.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

pub fn to_lon_lat(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (c.x / EARTH_RADIUS).to_degrees(),
        y: (c.y / EARTH_RADIUS).sinh().atan().to_degrees(),
    }
}

pub fn from_lon_lat(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: c.x.to_radians() * EARTH_RADIUS,
        y: c.y.to_radians().tan().asinh() * EARTH_RADIUS,
    }
}

/// Reprojects metric geometry for output. Measures must be taken before this.
pub fn inverse_geometry(geometry: &Geometry) -> Geometry {
    geometry.map_coords(to_lon_lat)
}

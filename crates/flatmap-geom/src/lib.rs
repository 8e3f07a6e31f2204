#![forbid(unsafe_code)]

//! Geometry primitives for turning vector-diagram shapes into flatmap feature geometry.
//!
//! Nothing here knows about features or properties. The crate flattens path commands into
//! rings, composes placement transforms, polygonizes divider arrangements and computes the
//! perspective transforms used to remap detail layers. `flatmap-core` builds on top of it.

pub mod arc;
pub mod bezier;
pub mod geom;
pub mod geometry;
pub mod homography;
pub mod mercator;
pub mod path;
pub mod polygonize;
pub mod transform;

pub use geom::{Point, Size, Vector, point, size};
pub use geometry::{Bounds, Geometry, extend_line};
pub use homography::Homography;
pub use path::{DEFAULT_BEZIER_SAMPLES, PathCommand, PathFlattener, flatten_path};
pub use polygonize::polygonize;
pub use transform::Transform;

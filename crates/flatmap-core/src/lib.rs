#![forbid(unsafe_code)]

//! Flatmap feature composition.
//!
//! A [`MapSession`] turns parsed slides ([`LayerSource`]) into layers of features:
//! - shapes are flattened and placed through their enclosing groups,
//! - `children`/`group` annotations supply inherited properties,
//! - `boundary` areas are cut into regions by their dividers,
//! - placeholders with `details` receive remapped copies of high-resolution layers.
//!
//! Output records are GeoJSON-shaped with longitude/latitude coordinates.

pub mod composer;
pub mod config;
pub mod details;
pub mod error;
pub mod feature;
pub mod geojson;
pub mod layer;
pub mod properties;
pub mod regions;
pub mod session;
pub mod shapes;

pub use composer::FeatureComposer;
pub use config::{MapOptions, MapSpecification};
pub use details::DetailRescaler;
pub use error::{Error, Result};
pub use feature::Feature;
pub use geojson::{FeatureCollection, GeoJsonFeature, GeoJsonOutput};
pub use layer::{Layer, REGION_ID_BASE};
pub use properties::Properties;
pub use regions::RegionPartitioner;
pub use session::{FeatureIdCounter, FeatureIndex, MapExtent, MapOutput, MapSession};
pub use shapes::{Group, GroupPlacement, LayerSource, Placement, Shape, ShapeNode, ShapePath};

//! GeoJSON-shaped output records with tile-builder hints.
//!
//! Geometry is projected to longitude/latitude here and only here; `area` and `length` are taken
//! from the metric geometry before projection.

use flatmap_geom::{Geometry, mercator};
use geo::{Coord, LineString};
use serde::Serialize;
use serde_json::Value;

use crate::feature::Feature;
use crate::layer::Layer;
use crate::properties::{self, Properties};

/// Scale reported for features without area.
pub const DEFAULT_SCALE: f64 = 10.0;
/// Features smaller than this scale only appear from [`SMALL_FEATURE_MINZOOM`] on.
pub const SMALL_FEATURE_SCALE: f64 = 6.0;
pub const SMALL_FEATURE_MINZOOM: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum GeoJsonGeometry {
    Polygon(Vec<Vec<[f64; 2]>>),
    LineString(Vec<[f64; 2]>),
}

fn positions(line: &LineString<f64>) -> Vec<[f64; 2]> {
    line.0.iter().map(|c: &Coord<f64>| [c.x, c.y]).collect()
}

impl From<&Geometry> for GeoJsonGeometry {
    fn from(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Polygon(p) => Self::Polygon(
                std::iter::once(p.exterior())
                    .chain(p.interiors())
                    .map(positions)
                    .collect(),
            ),
            Geometry::LineString(l) => Self::LineString(positions(l)),
        }
    }
}

/// Per-feature hints for the vector tile builder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tippecanoe {
    pub layer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoJsonFeature {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: u64,
    pub tippecanoe: Tippecanoe,
    pub geometry: GeoJsonGeometry,
    pub properties: Properties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub id: String,
    pub creator: &'static str,
    pub features: Vec<GeoJsonFeature>,
    pub properties: Properties,
}

/// `log2(sqrt(map_area / area))`, or [`DEFAULT_SCALE`] for features without area.
pub fn feature_scale(map_area: f64, area: f64) -> f64 {
    if area > 0.0 {
        (map_area / area).sqrt().log2()
    } else {
        DEFAULT_SCALE
    }
}

/// Writes the features of one layer.
#[derive(Debug, Clone)]
pub struct GeoJsonOutput<'a> {
    layer_id: &'a str,
    map_area: f64,
}

impl<'a> GeoJsonOutput<'a> {
    pub fn new(layer_id: &'a str, map_area: f64) -> Self {
        Self { layer_id, map_area }
    }

    /// Unique id of a feature across the map's layers.
    pub fn unique_id(&self, feature: &Feature) -> String {
        format!("{}-{}", self.layer_id, feature.id)
    }

    pub fn feature(&self, feature: &Feature) -> Option<GeoJsonFeature> {
        if !feature.is_emitted() {
            return None;
        }
        let geometry = feature.geometry.as_ref()?;
        let area = geometry.area();
        let projected = mercator::inverse_geometry(geometry);
        let bounds = projected.bounds()?;
        let centroid = projected.centroid()?;
        let scale = feature_scale(self.map_area, area);

        let mut tippecanoe = Tippecanoe {
            layer: self.layer_id.to_string(),
            minzoom: feature.property("minzoom").cloned(),
            maxzoom: feature.property("maxzoom").cloned(),
        };
        if scale > SMALL_FEATURE_SCALE
            && !feature.has_property("group")
            && !feature.has_property("minzoom")
        {
            tippecanoe.minzoom = Some(Value::from(SMALL_FEATURE_MINZOOM));
        }

        let mut props = Properties::new();
        props.insert("id".to_string(), Value::from(self.unique_id(feature)));
        props.insert("bounds".to_string(), Value::from(bounds.to_vec()));
        props.insert(
            "centroid".to_string(),
            Value::from(vec![centroid.x, centroid.y]),
        );
        props.insert("area".to_string(), Value::from(area));
        props.insert("length".to_string(), Value::from(geometry.length()));
        props.insert("scale".to_string(), Value::from(scale));
        props.insert("layer".to_string(), Value::from(self.layer_id));
        for (key, value) in &feature.properties {
            if !properties::ignore_output_key(key) {
                props.insert(key.clone(), value.clone());
            }
        }

        Some(GeoJsonFeature {
            kind: "Feature",
            id: feature.id,
            tippecanoe,
            geometry: GeoJsonGeometry::from(&projected),
            properties: props,
        })
    }

    pub fn collection(&self, layer: &Layer) -> FeatureCollection {
        let mut properties = Properties::new();
        properties.insert("id".to_string(), Value::from(layer.id()));
        if let Some(description) = layer.description() {
            properties.insert("description".to_string(), Value::from(description));
        }
        FeatureCollection {
            kind: "FeatureCollection",
            id: layer.id().to_string(),
            creator: concat!("flatmap ", env!("CARGO_PKG_VERSION")),
            features: layer
                .features()
                .iter()
                .filter_map(|f| self.feature(f))
                .collect(),
            properties,
        }
    }

    /// Authored properties of each emitted feature plus its geometry type, keyed by unique id.
    pub fn annotations(&self, layer: &Layer) -> Vec<(String, Properties)> {
        layer
            .features()
            .iter()
            .filter_map(|feature| {
                let geometry = feature.geometry.as_ref()?;
                let mut props = feature.properties.clone();
                props.insert(
                    "geometry".to_string(),
                    Value::from(geometry.geometry_type()),
                );
                Some((self.unique_id(feature), props))
            })
            .collect()
    }
}

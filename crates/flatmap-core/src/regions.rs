//! Partitioning of a divided area into regions.
//!
//! A group whose members include `boundary` shapes is cut up by its divider lines and polygon
//! rings. The faces of the resulting arrangement become region features, identified by the
//! `region` markers that fall inside them.

use flatmap_geom::{Geometry, extend_line, polygonize};
use geo::{BoundingRect, Contains, Coord, LineString, Polygon};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};
use serde_json::Value;

use crate::feature::Feature;
use crate::layer::RegionIdCounter;
use crate::properties::{self, Properties};

/// Divider end points are extended by this fraction of the divided area's side.
const TOLERANCE_FACTOR: f64 = 0.02;
/// Vertex snapping distance relative to the tolerance.
const SNAP_FACTOR: f64 = 1e-5;

/// A point-like annotation naming the region it falls in.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMarker {
    pub id: u64,
    pub point: Coord<f64>,
    pub properties: Properties,
}

#[derive(Debug, Clone)]
pub struct RegionPartitioner {
    layer_id: String,
    tolerance: f64,
    dividers: Vec<LineString<f64>>,
    markers: Vec<RegionMarker>,
}

impl RegionPartitioner {
    pub fn new(layer_id: impl Into<String>, divided_area: f64) -> Self {
        Self {
            layer_id: layer_id.into(),
            tolerance: TOLERANCE_FACTOR * divided_area.max(0.0).sqrt(),
            dividers: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn add_marker(&mut self, id: u64, point: Coord<f64>, properties: Properties) {
        self.markers.push(RegionMarker {
            id,
            point,
            properties,
        });
    }

    /// Adds an open divider, extended at both ends so it reaches the lines it should meet.
    pub fn add_divider_line(&mut self, line: &LineString<f64>) {
        self.dividers.push(extend_line(line, self.tolerance));
    }

    /// Adds every ring of a polygon divider.
    pub fn add_divider_polygon(&mut self, polygon: &Polygon<f64>) {
        self.dividers.push(polygon.exterior().clone());
        self.dividers.extend(polygon.interiors().iter().cloned());
    }

    /// Sorts a divided group's features into dividers, markers and pass-through features, then
    /// appends one feature per region.
    ///
    /// Divider lines stay in the output. Polygon dividers contribute their rings as outline
    /// features unless `invisible`, and `boundary` polygons are also kept as they are. Region
    /// markers and `group` shapes are consumed; `children` shapes are kept like any other.
    pub fn partition(
        mut self,
        features: Vec<Feature>,
        child_properties: &Properties,
        region_ids: &mut RegionIdCounter,
    ) -> Vec<Feature> {
        let mut output = Vec::new();
        for feature in features {
            if feature.is_group {
                output.push(feature);
                continue;
            }
            let Some(geometry) = &feature.geometry else {
                continue;
            };
            if feature.flag("region") {
                match geometry.representative_point() {
                    Some(point) => self.add_marker(feature.id, point, feature.properties),
                    None => tracing::warn!(feature = feature.id, "region marker without a location"),
                }
                continue;
            }
            let is_divider = feature.flag("boundary")
                || feature.flag("divider")
                || properties::is_unannotated(&feature.properties);
            match geometry {
                Geometry::LineString(line) if is_divider => {
                    self.add_divider_line(line);
                    output.push(feature);
                }
                Geometry::Polygon(polygon) if is_divider => {
                    self.add_divider_polygon(polygon);
                    if !feature.flag("invisible") {
                        for ring in geometry.boundary() {
                            let mut props = Properties::new();
                            props.insert("layer".to_string(), Value::from(self.layer_id.as_str()));
                            output.push(Feature::new(
                                region_ids.next_id(),
                                Geometry::LineString(ring),
                                props,
                            ));
                        }
                    }
                    if feature.flag("boundary") {
                        output.push(feature);
                    }
                }
                _ if feature.flag("group") => {}
                _ => output.push(feature),
            }
        }
        output.extend(self.regions(child_properties, region_ids));
        output
    }

    /// One feature per face of the divider arrangement.
    ///
    /// A face takes the id of the region marker inside it, with the marker's properties merged over
    /// `child_properties`. When several markers fall in one face all of their properties are merged
    /// in marker order and the last one's id is used. Faces without a marker get a fresh region id.
    pub fn regions(
        &self,
        child_properties: &Properties,
        region_ids: &mut RegionIdCounter,
    ) -> Vec<Feature> {
        if self.dividers.is_empty() {
            tracing::warn!(layer = %self.layer_id, "divided area has no dividers");
            return Vec::new();
        }
        let snap = (self.tolerance * SNAP_FACTOR).max(f64::EPSILON);
        let faces = polygonize(&self.dividers, snap);
        tracing::debug!(
            layer = %self.layer_id,
            dividers = self.dividers.len(),
            regions = faces.len(),
            "polygonized divided area"
        );

        let index = RTree::bulk_load(
            self.markers
                .iter()
                .enumerate()
                .map(|(i, m)| GeomWithData::new([m.point.x, m.point.y], i))
                .collect(),
        );

        let mut regions = Vec::with_capacity(faces.len());
        for face in faces {
            let mut inside: Vec<usize> = match face.bounding_rect() {
                Some(rect) => index
                    .locate_in_envelope(&AABB::from_corners(
                        [rect.min().x, rect.min().y],
                        [rect.max().x, rect.max().y],
                    ))
                    .map(|entry| entry.data)
                    .filter(|&i| face.contains(&geo::Point(self.markers[i].point)))
                    .collect(),
                None => Vec::new(),
            };
            inside.sort_unstable();

            let mut properties = child_properties.clone();
            let mut region_id = None;
            for i in inside {
                let marker = &self.markers[i];
                region_id = Some(marker.id);
                properties::merge(&mut properties, &marker.properties);
            }
            let id = region_id.unwrap_or_else(|| region_ids.next_id());
            regions.push(Feature::new(id, Geometry::Polygon(face), properties));
        }
        regions
    }
}

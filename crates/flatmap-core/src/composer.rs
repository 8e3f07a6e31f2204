//! Turning a slide's shape tree into the layer's emitted features.

use flatmap_geom::{PathFlattener, Transform};
use serde_json::Value;

use crate::error::Result;
use crate::feature::Feature;
use crate::layer::Layer;
use crate::properties::{self, Properties};
use crate::regions::RegionPartitioner;
use crate::session::FeatureIdCounter;
use crate::shapes::{Group, Shape, ShapeNode};

/// Composes shapes into one layer, drawing feature ids from the session counter.
pub struct FeatureComposer<'a> {
    layer: &'a mut Layer,
    ids: &'a mut FeatureIdCounter,
    samples: usize,
    group_markers: Vec<Feature>,
}

impl<'a> FeatureComposer<'a> {
    pub fn new(layer: &'a mut Layer, ids: &'a mut FeatureIdCounter, samples: usize) -> Self {
        Self {
            layer,
            ids,
            samples,
            group_markers: Vec::new(),
        }
    }

    /// Group markers produced so far; they carry group properties but are never emitted.
    pub fn group_markers(&self) -> &[Feature] {
        &self.group_markers
    }

    pub fn into_group_markers(self) -> Vec<Feature> {
        self.group_markers
    }

    /// Composes a slide's top-level shape list under the layer transform.
    pub fn compose(&mut self, shapes: &[ShapeNode], transform: &Transform) -> Result<()> {
        let features = self.process_shape_list(shapes, transform)?;
        self.add_features(features)?;
        Ok(())
    }

    fn process_shape_list(
        &mut self,
        shapes: &[ShapeNode],
        transform: &Transform,
    ) -> Result<Vec<Feature>> {
        let mut features = Vec::with_capacity(shapes.len());
        for node in shapes {
            match node {
                ShapeNode::Shape(shape) => features.extend(self.process_shape(shape, transform)),
                ShapeNode::Group(group) => features.extend(self.process_group(group, transform)?),
            }
        }
        Ok(features)
    }

    fn process_group(&mut self, group: &Group, transform: &Transform) -> Result<Option<Feature>> {
        let transform = transform.then_inner(&group.placement.transform());
        let features = self.process_shape_list(&group.children, &transform)?;
        self.add_features(features)
    }

    fn process_shape(&mut self, shape: &Shape, transform: &Transform) -> Option<Feature> {
        if let Some(error) = shape.properties.get("error") {
            tracing::warn!(layer = %self.layer.id(), %error, "shape has annotation errors; skipped");
            return None;
        }
        let mut flattener = PathFlattener::new(self.samples);
        for path in &shape.paths {
            let local = transform.then_inner(&shape.path_transform(path));
            flattener.add_path(&path.commands, &local);
        }
        let geometry = flattener.finish();
        if geometry.is_empty() {
            tracing::warn!(layer = %self.layer.id(), "shape has no geometry; skipped");
            return None;
        }
        Some(Feature::new(
            self.ids.next_id(),
            geometry,
            shape.properties.clone(),
        ))
    }

    /// Emits the features of one group (or of the slide itself) into the layer.
    ///
    /// `boundary` shapes make the group a divided area, `children` shapes supply properties for
    /// every sibling and `group` shapes supply the group's own properties. Returns a group marker
    /// when the group has `group` properties.
    pub fn add_features(&mut self, features: Vec<Feature>) -> Result<Option<Feature>> {
        let layer_id = Value::from(self.layer.id());
        let mut child_properties = Properties::new();
        child_properties.insert("layer".to_string(), layer_id.clone());
        let mut group_properties = child_properties.clone();
        let mut has_group_properties = false;
        let mut divided_area = 0.0;

        for feature in features.iter().filter(|f| !f.is_group) {
            if feature.flag("boundary") {
                let area = feature.geometry.as_ref().map_or(0.0, |g| g.area());
                if area <= 0.0 {
                    tracing::warn!(layer = %self.layer.id(), feature = feature.id, "boundary without area");
                }
                divided_area += area;
            } else if feature.flag("children") {
                properties::merge(&mut child_properties, &feature.properties);
            } else if feature.flag("group") {
                properties::merge(&mut group_properties, &feature.properties);
                has_group_properties = true;
            }
        }

        let emitted = if divided_area > 0.0 {
            RegionPartitioner::new(self.layer.id(), divided_area).partition(
                features,
                &child_properties,
                &mut self.layer.region_ids,
            )
        } else {
            features
                .into_iter()
                .filter(|f| {
                    f.is_group
                        || !(f.flag("boundary") || f.flag("children") || f.flag("group"))
                })
                .collect()
        };

        for feature in emitted {
            if !feature.is_emitted() {
                continue;
            }
            let declares_id = feature
                .properties
                .get("id")
                .is_some_and(|id| child_properties.get("id") != Some(id));
            let mut properties = child_properties.clone();
            properties::merge(&mut properties, &feature.properties);
            properties.retain(|key, _| !properties::is_structural(key));
            properties.insert("layer".to_string(), layer_id.clone());
            let feature = Feature {
                properties,
                ..feature
            };
            if declares_id {
                self.layer.add_feature(feature)?;
            } else {
                self.layer.add_inherited_feature(feature)?;
            }
        }

        if !has_group_properties {
            return Ok(None);
        }
        let marker = Feature::group_marker(self.ids.next_id(), group_properties);
        self.group_markers.push(marker.clone());
        Ok(Some(marker))
    }
}

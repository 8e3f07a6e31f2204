//! Remapping high-resolution layers into the footprints of their low-resolution placeholders.

use std::collections::VecDeque;

use flatmap_geom::{Geometry, Homography};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::feature::Feature;
use crate::layer::Layer;
use crate::session::{FeatureIdCounter, FeatureIndex};

/// Id of the layer holding the details synthesized for `layer_id`.
pub fn details_layer_id(layer_id: &str) -> String {
    format!("{layer_id}-details")
}

/// Perspective transform taking `outline`'s minimum rectangle onto `placeholder`'s.
///
/// Corners are paired in the order the rectangles list them, so the result may be turned by a
/// multiple of 90 degrees relative to what the author intended.
pub fn footprint_transform(outline: &Feature, placeholder: &Feature) -> Result<Homography> {
    let corners = |feature: &Feature| {
        feature
            .geometry
            .as_ref()
            .and_then(Geometry::minimum_rotated_rect_corners)
            .ok_or(Error::DegenerateDetailFootprint {
                feature_id: feature.id,
            })
    };
    let src = corners(outline)?;
    let dst = corners(placeholder)?;
    Homography::from_quads(&src, &dst).ok_or(Error::DegenerateDetailFootprint {
        feature_id: placeholder.id,
    })
}

struct Pending {
    placeholder: Feature,
    /// High-resolution layers already expanded on the way to this placeholder.
    chain: Vec<String>,
}

pub struct DetailRescaler<'a> {
    layers: &'a IndexMap<String, Layer>,
    ids: &'a mut FeatureIdCounter,
    index: &'a mut FeatureIndex,
}

impl<'a> DetailRescaler<'a> {
    pub fn new(
        layers: &'a IndexMap<String, Layer>,
        ids: &'a mut FeatureIdCounter,
        index: &'a mut FeatureIndex,
    ) -> Self {
        Self { layers, ids, index }
    }

    /// Builds the details layer of `owner` from its placeholders.
    ///
    /// Each placeholder's `details` names a high-resolution layer whose every feature is copied
    /// into the placeholder's footprint, tagged with the owner's layer id and a `minzoom` one past
    /// the placeholder's `maxzoom`. Copies that declare `details` themselves are expanded in turn.
    pub fn rescale(
        &mut self,
        owner: &str,
        placeholders: impl IntoIterator<Item = Feature>,
    ) -> Result<Layer> {
        let mut details = Layer::details(details_layer_id(owner));
        let mut queue: VecDeque<Pending> = placeholders
            .into_iter()
            .map(|placeholder| Pending {
                placeholder,
                chain: Vec::new(),
            })
            .collect();

        while let Some(Pending { placeholder, chain }) = queue.pop_front() {
            let Some(hires_id) = placeholder.property("details").and_then(Value::as_str) else {
                tracing::warn!(feature = placeholder.id, "`details` is not a layer id; skipped");
                continue;
            };
            if chain.iter().any(|seen| seen == hires_id) {
                return Err(Error::DetailCycle {
                    layer_id: hires_id.to_string(),
                });
            }
            let hires = self
                .layers
                .get(hires_id)
                .ok_or_else(|| Error::LayerNotFound {
                    layer_id: hires_id.to_string(),
                })?;
            let outline_id = hires.outline().ok_or_else(|| Error::MissingOutline {
                layer_id: hires_id.to_string(),
            })?;
            let outline =
                hires
                    .feature_with_id(outline_id)
                    .ok_or_else(|| Error::OutlineNotFound {
                        layer_id: hires_id.to_string(),
                        feature_id: outline_id.to_string(),
                    })?;
            let maxzoom = placeholder
                .property("maxzoom")
                .and_then(Value::as_f64)
                .filter(|zoom| zoom.is_finite() && zoom.fract() == 0.0)
                .map(|zoom| zoom as i64)
                .ok_or(Error::MissingMaxZoom {
                    feature_id: placeholder.id,
                })?;
            let transform = footprint_transform(outline, &placeholder)?;
            let minzoom = maxzoom + 1;

            let mut chain = chain;
            chain.push(hires_id.to_string());
            tracing::debug!(
                layer = owner,
                hires = hires_id,
                features = hires.len(),
                minzoom,
                "adding details"
            );

            for hires_feature in hires.features() {
                let Some(geometry) = &hires_feature.geometry else {
                    continue;
                };
                let mut feature = Feature::new(
                    self.ids.next_id(),
                    transform.apply_geometry(geometry),
                    hires_feature.properties.clone(),
                );
                feature.set_property("layer", owner);
                feature.set_property("minzoom", minzoom);
                self.index.register(&feature);
                if feature.has_property("details") {
                    queue.push_back(Pending {
                        placeholder: feature.clone(),
                        chain: chain.clone(),
                    });
                }
                details.add_feature(feature)?;
            }
        }
        Ok(details)
    }
}

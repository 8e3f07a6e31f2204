//! The map build session: feature ids, layers and the indexes over them.

use flatmap_geom::mercator;
use flatmap_geom::{Bounds, Size, Transform, point};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::time::Instant;

use crate::composer::FeatureComposer;
use crate::config::{MapOptions, MapSpecification};
use crate::details::DetailRescaler;
use crate::error::{Error, Result};
use crate::feature::Feature;
use crate::geojson::{FeatureCollection, GeoJsonOutput};
use crate::layer::Layer;
use crate::properties::Properties;
use crate::shapes::LayerSource;

fn build_timing_enabled() -> bool {
    static ENABLED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *ENABLED.get_or_init(|| match std::env::var("FLATMAP_BUILD_TIMING").as_deref() {
        Ok("1") | Ok("true") => true,
        _ => false,
    })
}

/// Monotonically increasing feature ids, shared by every layer of a build. The first id is 1.
#[derive(Debug, Clone, Default)]
pub struct FeatureIdCounter {
    last: u64,
}

impl FeatureIdCounter {
    pub fn next_id(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    pub fn last(&self) -> u64 {
        self.last
    }
}

/// Lookup from authored `id` and `class` properties to feature ids.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    ids: FxHashMap<String, u64>,
    classes: FxHashMap<String, Vec<u64>>,
}

impl FeatureIndex {
    pub fn register(&mut self, feature: &Feature) {
        if let Some(id) = feature.feature_id() {
            self.ids.insert(id.to_string(), feature.id);
        }
        if let Some(class) = feature.class() {
            self.classes
                .entry(class.to_string())
                .or_default()
                .push(feature.id);
        }
    }

    pub fn feature_for_id(&self, id: &str) -> Option<u64> {
        self.ids.get(id).copied()
    }

    pub fn features_for_class(&self, class: &str) -> &[u64] {
        self.classes.get(class).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Geographic extent of the map, taken from the first source's canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapExtent {
    /// `[west, south, east, north]` in degrees.
    pub bounds: Bounds,
    pub centre: [f64; 2],
    /// Canvas area in square metres.
    pub area: f64,
}

impl MapExtent {
    pub fn of_canvas(canvas: Size, metres_per_unit: f64) -> Self {
        let transform = Transform::canvas(canvas, metres_per_unit);
        let corner = |x: f64, y: f64| {
            let p = transform.apply(point(x, y));
            mercator::to_lon_lat(geo::Coord { x: p.x, y: p.y })
        };
        let top_left = corner(0.0, 0.0);
        let bottom_right = corner(canvas.width, canvas.height);
        let bounds = [top_left.x, bottom_right.y, bottom_right.x, top_left.y];
        Self {
            bounds,
            centre: [
                (bounds[0] + bounds[2]) / 2.0,
                (bounds[1] + bounds[3]) / 2.0,
            ],
            area: canvas.width * canvas.height * metres_per_unit * metres_per_unit,
        }
    }
}

/// Everything a build produces, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct MapOutput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<String>,
    pub extent: Option<MapExtent>,
    pub layers: Vec<FeatureCollection>,
    /// Properties of every emitted feature keyed by `"{layer}-{id}"`.
    pub annotations: IndexMap<String, Properties>,
}

#[derive(Debug)]
pub struct MapSession {
    specification: MapSpecification,
    options: MapOptions,
    ids: FeatureIdCounter,
    layers: IndexMap<String, Layer>,
    visible_layer_count: usize,
    extent: Option<MapExtent>,
    index: FeatureIndex,
}

impl MapSession {
    pub fn new(specification: MapSpecification, options: MapOptions) -> Result<Self> {
        if specification.id.is_empty() {
            return Err(Error::MissingMapId);
        }
        options.validate()?;
        Ok(Self {
            specification,
            options,
            ids: FeatureIdCounter::default(),
            layers: IndexMap::new(),
            visible_layer_count: 0,
            extent: None,
            index: FeatureIndex::default(),
        })
    }

    pub fn id(&self) -> &str {
        &self.specification.id
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn extent(&self) -> Option<&MapExtent> {
        self.extent.as_ref()
    }

    pub fn map_area(&self) -> Option<f64> {
        self.extent.map(|e| e.area)
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.get(id)
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn visible_layer_count(&self) -> usize {
        self.visible_layer_count
    }

    pub fn index(&self) -> &FeatureIndex {
        &self.index
    }

    /// Composes one slide into a layer. The first source fixes the map's extent.
    pub fn add_source(&mut self, source: &LayerSource) -> Result<()> {
        if self.layers.contains_key(&source.id) {
            return Err(Error::DuplicateLayerId {
                layer_id: source.id.clone(),
            });
        }
        let start = build_timing_enabled().then(Instant::now);
        let transform = Transform::canvas(source.canvas, self.options.metres_per_unit);
        let mut layer = Layer::new(&source.id)
            .with_description(source.description.clone())
            .with_hidden(source.hidden)
            .with_outline(source.outline.clone());

        let mut composer =
            FeatureComposer::new(&mut layer, &mut self.ids, self.options.bezier_samples);
        composer.compose(&source.shapes, &transform)?;
        for marker in composer.into_group_markers() {
            self.index.register(&marker);
        }
        for feature in layer.features() {
            self.index.register(feature);
        }
        tracing::debug!(layer = %source.id, features = layer.len(), "composed layer");
        if let Some(start) = start {
            tracing::info!(layer = %source.id, elapsed = ?start.elapsed(), "compose timing");
        }

        if self.extent.is_none() {
            self.extent = Some(MapExtent::of_canvas(
                source.canvas,
                self.options.metres_per_unit,
            ));
        }
        self.add_layer(layer)
    }

    pub fn add_layer(&mut self, layer: Layer) -> Result<()> {
        if self.layers.contains_key(layer.id()) {
            return Err(Error::DuplicateLayerId {
                layer_id: layer.id().to_string(),
            });
        }
        if !layer.hidden() {
            self.visible_layer_count += 1;
        }
        self.layers.insert(layer.id().to_string(), layer);
        Ok(())
    }

    /// Adds detail layers and collects the output of every visible layer.
    pub fn make(&mut self) -> Result<MapOutput> {
        if self.visible_layer_count == 0 {
            return Err(Error::NoVisibleLayers);
        }
        let start = build_timing_enabled().then(Instant::now);
        self.add_details()?;
        if let Some(start) = start {
            tracing::info!(elapsed = ?start.elapsed(), "details timing");
        }

        let start = build_timing_enabled().then(Instant::now);
        let map_area = self.map_area().unwrap_or(0.0);
        let mut layers = Vec::new();
        let mut annotations = IndexMap::new();
        for layer in self.layers.values().filter(|l| !l.hidden()) {
            let output = GeoJsonOutput::new(layer.id(), map_area);
            let collection = output.collection(layer);
            annotations.extend(output.annotations(layer));
            layers.push(collection);
        }
        if let Some(start) = start {
            tracing::info!(elapsed = ?start.elapsed(), "output timing");
        }
        tracing::info!(
            map = %self.specification.id,
            layers = layers.len(),
            features = annotations.len(),
            "map built"
        );
        Ok(MapOutput {
            id: self.specification.id.clone(),
            models: self.specification.models.clone(),
            extent: self.extent,
            layers,
            annotations,
        })
    }

    fn add_details(&mut self) -> Result<()> {
        let mut detail_layers = Vec::new();
        for layer in self.layers.values().filter(|l| !l.hidden()) {
            let placeholders: Vec<Feature> = layer.detail_features().cloned().collect();
            if placeholders.is_empty() {
                continue;
            }
            let mut rescaler = DetailRescaler::new(&self.layers, &mut self.ids, &mut self.index);
            detail_layers.push(rescaler.rescale(layer.id(), placeholders)?);
        }
        for layer in detail_layers {
            self.add_layer(layer)?;
        }
        Ok(())
    }
}

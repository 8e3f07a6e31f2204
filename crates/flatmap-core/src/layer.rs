use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::feature::Feature;

/// First id handed out for synthesized region and divider features, clear of shape ids.
pub const REGION_ID_BASE: u64 = 10000;

/// Sequential ids for features a layer synthesizes itself.
#[derive(Debug, Clone)]
pub struct RegionIdCounter {
    next: u64,
}

impl Default for RegionIdCounter {
    fn default() -> Self {
        Self {
            next: REGION_ID_BASE,
        }
    }
}

impl RegionIdCounter {
    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }
}

/// The emitted features of one slide (or of the details synthesized for one).
#[derive(Debug, Clone)]
pub struct Layer {
    id: String,
    description: Option<String>,
    hidden: bool,
    outline: Option<String>,
    is_details: bool,
    features: Vec<Feature>,
    numeric_ids: FxHashSet<u64>,
    features_with_id: FxHashMap<String, usize>,
    declared_ids: FxHashSet<String>,
    pub(crate) region_ids: RegionIdCounter,
}

impl Layer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            hidden: false,
            outline: None,
            is_details: false,
            features: Vec::new(),
            numeric_ids: FxHashSet::default(),
            features_with_id: FxHashMap::default(),
            declared_ids: FxHashSet::default(),
            region_ids: RegionIdCounter::default(),
        }
    }

    /// A layer holding remapped copies of another layer's features.
    ///
    /// Several placeholders may draw on the same high-resolution layer, so authored `id`s are not
    /// required to be unique here; the first feature with a given `id` is the one looked up.
    pub fn details(id: impl Into<String>) -> Self {
        Self {
            is_details: true,
            ..Self::new(id)
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_outline(mut self, outline: Option<String>) -> Self {
        self.outline = outline;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    pub fn outline(&self) -> Option<&str> {
        self.outline.as_deref()
    }

    pub fn is_details(&self) -> bool {
        self.is_details
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn feature_with_id(&self, id: &str) -> Option<&Feature> {
        self.features_with_id
            .get(id)
            .and_then(|&index| self.features.get(index))
    }

    /// Features referring to a higher-resolution layer through `details`.
    pub fn detail_features(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter().filter(|f| f.has_property("details"))
    }

    pub fn next_region_id(&mut self) -> u64 {
        self.region_ids.next_id()
    }

    /// Appends an emitted feature; numeric ids and authored `id`s must be unique in the layer.
    pub fn add_feature(&mut self, feature: Feature) -> Result<()> {
        self.push_feature(feature, true)
    }

    /// Appends a feature whose `id` came from a `children` shape rather than the shape itself.
    ///
    /// Inherited ids may repeat; lookups by `id` prefer a feature that declares it.
    pub fn add_inherited_feature(&mut self, feature: Feature) -> Result<()> {
        self.push_feature(feature, false)
    }

    fn push_feature(&mut self, feature: Feature, declared: bool) -> Result<()> {
        if !self.numeric_ids.insert(feature.id) {
            return Err(Error::DuplicateFeatureId {
                layer_id: self.id.clone(),
                id: feature.id.to_string(),
            });
        }
        if let Some(id) = feature.feature_id().map(str::to_string) {
            let index = self.features.len();
            if declared && !self.is_details {
                if !self.declared_ids.insert(id.clone()) {
                    return Err(Error::DuplicateFeatureId {
                        layer_id: self.id.clone(),
                        id,
                    });
                }
                self.features_with_id.insert(id, index);
            } else {
                self.features_with_id.entry(id).or_insert(index);
            }
        }
        self.features.push(feature);
        Ok(())
    }
}

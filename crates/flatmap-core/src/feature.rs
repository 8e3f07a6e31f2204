use flatmap_geom::Geometry;
use serde_json::Value;

use crate::properties::{self, Properties};

/// A shape, synthesized region or group marker with its session-wide numeric id.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: u64,
    pub geometry: Option<Geometry>,
    pub properties: Properties,
    /// Group markers carry a group's properties upstream; they are never emitted.
    pub is_group: bool,
}

impl Feature {
    pub fn new(id: u64, geometry: Geometry, properties: Properties) -> Self {
        Self {
            id,
            geometry: Some(geometry),
            properties,
            is_group: false,
        }
    }

    pub fn group_marker(id: u64, properties: Properties) -> Self {
        Self {
            id,
            geometry: None,
            properties,
            is_group: true,
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    pub fn set_property(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }

    pub fn flag(&self, key: &str) -> bool {
        properties::flag(&self.properties, key)
    }

    /// The authored `id` property, when it is a string.
    pub fn feature_id(&self) -> Option<&str> {
        self.property("id").and_then(Value::as_str)
    }

    pub fn class(&self) -> Option<&str> {
        self.property("class").and_then(Value::as_str)
    }

    /// Whether the feature should be written out.
    pub fn is_emitted(&self) -> bool {
        !self.is_group && self.geometry.is_some()
    }
}

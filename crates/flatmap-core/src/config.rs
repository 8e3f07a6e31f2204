//! Build options and the map specification header.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Largest zoom level tiles may be built for.
pub const MAX_ZOOM_LIMIT: u8 = 15;

/// Options controlling a map build.
///
/// Deserializes from camelCase JSON; every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MapOptions {
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub initial_zoom: u8,
    /// Source length units to metres.
    pub metres_per_unit: f64,
    /// Parametric steps used when sampling Bezier segments.
    pub bezier_samples: usize,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_zoom: 2,
            max_zoom: 10,
            initial_zoom: 4,
            metres_per_unit: 0.1,
            bezier_samples: flatmap_geom::DEFAULT_BEZIER_SAMPLES,
        }
    }
}

impl MapOptions {
    pub fn from_value(value: Value) -> Result<Self> {
        let options: Self = serde_json::from_value(value)?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        let (min, max, initial) = (self.min_zoom, self.max_zoom, self.initial_zoom);
        if min > max {
            return Err(Error::InvalidZoom {
                message: format!("min zoom must be between 0 and {max}"),
            });
        }
        if max > MAX_ZOOM_LIMIT {
            return Err(Error::InvalidZoom {
                message: format!("max zoom must be between {min} and {MAX_ZOOM_LIMIT}"),
            });
        }
        if initial < min || initial > max {
            return Err(Error::InvalidZoom {
                message: format!("initial zoom must be between {min} and {max}"),
            });
        }
        Ok(())
    }

    pub fn zoom(&self) -> (u8, u8, u8) {
        (self.min_zoom, self.max_zoom, self.initial_zoom)
    }
}

/// Identity of the map being built.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MapSpecification {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub models: Option<String>,
}

impl MapSpecification {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            models: None,
        }
    }

    pub fn from_value(value: Value) -> Result<Self> {
        let spec: Self = serde_json::from_value(value)?;
        if spec.id.is_empty() {
            return Err(Error::MissingMapId);
        }
        Ok(spec)
    }
}

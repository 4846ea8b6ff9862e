//! Region boundaries: identity, name, and geometry.
//!
//! Boundaries come from a GeoJSON feature collection in which every
//! feature carries the official region code and the region name as
//! properties. Only the centroid of each geometry is used by the engine,
//! so any geometry type with a derivable centroid is accepted.

use geo::{Centroid, Geometry, Point};
use geojson::{Feature, GeoJson};
use serde::{Deserialize, Serialize};

use ripple_types::RegionKey;

use crate::error::EngineError;

/// Default property holding the numeric region code.
pub const DEFAULT_KEY_PROPERTY: &str = "CD_RGINT";

/// Default property holding the region name.
pub const DEFAULT_NAME_PROPERTY: &str = "NM_RGINT";

/// Names of the feature properties that identify a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundaryFields {
    /// Property holding the numeric region code.
    pub key_property: String,
    /// Property holding the region name.
    pub name_property: String,
}

impl Default for BoundaryFields {
    fn default() -> Self {
        Self {
            key_property: String::from(DEFAULT_KEY_PROPERTY),
            name_property: String::from(DEFAULT_NAME_PROPERTY),
        }
    }
}

/// A single region of the boundary dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBoundary {
    /// Official region code.
    pub key: RegionKey,
    /// Region name.
    pub name: String,
    /// Region geometry in the working coordinate system.
    pub geometry: Geometry<f64>,
}

impl RegionBoundary {
    /// Create a boundary from an arbitrary geometry.
    pub fn new(key: RegionKey, name: impl Into<String>, geometry: Geometry<f64>) -> Self {
        Self {
            key,
            name: name.into(),
            geometry,
        }
    }

    /// Create a boundary represented by a single point.
    pub fn from_point(key: RegionKey, name: impl Into<String>, x: f64, y: f64) -> Self {
        Self::new(key, name, Geometry::Point(Point::new(x, y)))
    }

    /// Centroid of the geometry, or `None` for empty geometries.
    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }
}

/// Parse region boundaries from GeoJSON text.
///
/// Accepts a `FeatureCollection` or a single `Feature`. The key property
/// may hold a JSON number or a string of digits. Features without a name
/// fall back to their zero-padded code.
///
/// # Errors
///
/// Returns [`EngineError::Boundary`] if the text is not GeoJSON, a feature
/// lacks a valid key or a geometry, or a geometry cannot be converted.
pub fn parse_geojson(text: &str, fields: &BoundaryFields) -> Result<Vec<RegionBoundary>, EngineError> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| EngineError::Boundary(format!("{e}")))?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(EngineError::Boundary(String::from(
                "a bare geometry carries no region properties",
            )));
        }
    };

    let mut boundaries = Vec::with_capacity(features.len());
    for (index, feature) in features.into_iter().enumerate() {
        let key = feature_key(&feature, &fields.key_property).ok_or_else(|| {
            EngineError::Boundary(format!(
                "feature {index} has no numeric {} property",
                fields.key_property
            ))
        })?;
        let name = feature
            .property(&fields.name_property)
            .and_then(|v| v.as_str())
            .map_or_else(|| key.to_string(), |s| s.trim().to_owned());
        let geometry = feature
            .geometry
            .ok_or_else(|| EngineError::Boundary(format!("region {key} has no geometry")))?;
        let geometry = Geometry::<f64>::try_from(geometry)
            .map_err(|e| EngineError::Boundary(format!("region {key}: {e}")))?;

        boundaries.push(RegionBoundary::new(key, name, geometry));
    }

    tracing::info!(regions = boundaries.len(), "Parsed region boundaries");
    Ok(boundaries)
}

/// Read the region code of a feature.
fn feature_key(feature: &Feature, property: &str) -> Option<RegionKey> {
    let value = feature.property(property)?;
    let code = value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<u64>().ok()))?;
    u32::try_from(code).ok().map(RegionKey)
}

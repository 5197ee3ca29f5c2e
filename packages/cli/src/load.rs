//! Input loading: urban centers, shoreline, raster manifest and config.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo::MultiPolygon;
use geojson::{Feature, GeoJson, feature::Id};
use thiserror::Error;
use urban_metrics_geometry::convert::from_geojson;
use urban_metrics_models::{PipelineConfig, UrbanCenter, UrbanCenterId};
use urban_metrics_raster::{PopulationRaster, RasterError};

/// Errors that can occur while loading run inputs.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid `GeoJSON`.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The raster manifest could not be loaded.
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    /// The config file is not valid TOML.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A feature could not be turned into an input record.
    #[error("Feature {index}: {message}")]
    Feature {
        /// Position of the feature in its collection.
        index: usize,
        /// Description of what went wrong.
        message: String,
    },

    /// Two urban centers share an id.
    #[error("Duplicate urban center id {0}")]
    DuplicateId(UrbanCenterId),
}

fn read_to_string(path: &Path) -> Result<String, LoadError> {
    std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn features(geojson: GeoJson) -> Vec<Feature> {
    match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature::from(geometry)],
    }
}

/// Reads urban centers from a `GeoJSON` file.
///
/// The id is read from the `id_field` property, falling back to the
/// feature id. Every other property becomes an attribute.
///
/// # Errors
///
/// * If the file cannot be read or parsed
/// * If a feature has no id or no areal geometry
/// * If two features share an id
pub fn read_urban_centers(path: &Path, id_field: &str) -> Result<Vec<UrbanCenter>, LoadError> {
    let geojson: GeoJson = read_to_string(path)?.parse()?;
    let mut seen = BTreeSet::new();
    let mut centers = Vec::new();

    for (index, feature) in features(geojson).into_iter().enumerate() {
        let center = urban_center(index, feature, id_field)?;
        if !seen.insert(center.id.clone()) {
            return Err(LoadError::DuplicateId(center.id));
        }
        centers.push(center);
    }

    log::info!("Loaded {} urban centers from {}", centers.len(), path.display());
    Ok(centers)
}

fn urban_center(index: usize, feature: Feature, id_field: &str) -> Result<UrbanCenter, LoadError> {
    let mut attributes = feature.properties.unwrap_or_default();

    let id = attributes
        .remove(id_field)
        .as_ref()
        .and_then(id_from_json)
        .or_else(|| feature.id.as_ref().and_then(id_from_feature_id))
        .ok_or_else(|| LoadError::Feature {
            index,
            message: format!("no '{id_field}' property or feature id"),
        })?;

    let geometry = feature
        .geometry
        .and_then(from_geojson)
        .ok_or_else(|| LoadError::Feature {
            index,
            message: format!("urban center {id} has no polygon geometry"),
        })?;

    Ok(UrbanCenter::new(id, geometry).with_attributes(attributes))
}

fn id_from_json(value: &serde_json::Value) -> Option<UrbanCenterId> {
    match value {
        serde_json::Value::Number(n) => Some(id_from_number(n)),
        serde_json::Value::String(s) => Some(UrbanCenterId::Text(s.clone())),
        _ => None,
    }
}

fn id_from_feature_id(id: &Id) -> Option<UrbanCenterId> {
    match id {
        Id::String(s) => Some(UrbanCenterId::Text(s.clone())),
        Id::Number(n) => Some(id_from_number(n)),
    }
}

/// Integral numbers (including `12.0` from shapefile exports) become
/// numeric ids; anything else keeps its textual form.
#[allow(clippy::cast_possible_truncation)]
fn id_from_number(n: &serde_json::Number) -> UrbanCenterId {
    n.as_i64()
        .or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        })
        .map_or_else(|| UrbanCenterId::Text(n.to_string()), UrbanCenterId::Number)
}

/// Reads land masses from a `GeoJSON` file.
///
/// # Errors
///
/// * If the file cannot be read or parsed
/// * If a feature has no areal geometry
pub fn read_shoreline(path: &Path) -> Result<Vec<MultiPolygon<f64>>, LoadError> {
    let geojson: GeoJson = read_to_string(path)?.parse()?;

    let land = features(geojson)
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            feature
                .geometry
                .and_then(from_geojson)
                .ok_or_else(|| LoadError::Feature {
                    index,
                    message: "shoreline feature has no polygon geometry".to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::info!("Loaded {} land masses from {}", land.len(), path.display());
    Ok(land)
}

/// Reads a population raster manifest.
///
/// # Errors
///
/// * If the file cannot be opened
/// * If the manifest is malformed
pub fn read_raster(path: &Path) -> Result<PopulationRaster, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(PopulationRaster::from_json_reader(BufReader::new(file))?)
}

/// Reads a TOML run configuration.
///
/// # Errors
///
/// * If the file cannot be read or is not valid TOML
pub fn read_config(path: &Path) -> Result<PipelineConfig, LoadError> {
    Ok(toml::from_str(&read_to_string(path)?)?)
}

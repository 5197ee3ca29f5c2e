#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Urban center, per-metric result and pipeline configuration types.
//!
//! These types are shared by the metric calculators, the merge step and
//! the CLI. Geometries are `geo` types in the projected CRS of the source
//! dataset; nothing here performs any computation.

use std::fmt;

use geo::{MultiPolygon, Point};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

/// Default source CRS: Mollweide on WGS84, the equal-area projection of
/// the GHS population grid.
pub const DEFAULT_CRS: &str = "+proj=moll +lon_0=0 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs";

/// Default property holding the urban center identifier.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Opaque urban center identifier, keeping the source key type.
///
/// Numeric ids order before text ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrbanCenterId {
    /// Integer key (e.g. `ID_HDC_G0` in the GHS urban centre database).
    Number(i64),
    /// String key.
    Text(String),
}

impl fmt::Display for UrbanCenterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for UrbanCenterId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for UrbanCenterId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for UrbanCenterId {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// One urban center polygon with its source attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct UrbanCenter {
    /// Unique identifier.
    pub id: UrbanCenterId,
    /// Footprint in the projected CRS.
    pub geometry: MultiPolygon<f64>,
    /// Every other source property, carried through to the output.
    pub attributes: serde_json::Map<String, serde_json::Value>,
}

impl UrbanCenter {
    /// Creates an urban center without extra attributes.
    #[must_use]
    pub fn new(id: impl Into<UrbanCenterId>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            geometry,
            attributes: serde_json::Map::new(),
        }
    }

    /// Replaces the attribute set.
    #[must_use]
    pub fn with_attributes(mut self, attributes: serde_json::Map<String, serde_json::Value>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Land-clipped compactness of one urban center.
#[derive(Debug, Clone, PartialEq)]
pub struct CompactnessResult {
    /// Urban center identifier.
    pub id: UrbanCenterId,
    /// Land-clipped convex hull (or the raw hull on the fallback path).
    pub hull: MultiPolygon<f64>,
    /// `area(land) / area(land-clipped hull)`, clamped to `(0, 1]`.
    pub compactness: f64,
    /// Whether the center missed the shoreline and was measured unclipped.
    pub used_land_fallback: bool,
}

/// Best-fit exponential density decay for one urban center.
///
/// All fields are `None` when no candidate cell yields a defined
/// regression.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityGradientResult {
    /// Urban center identifier.
    pub id: UrbanCenterId,
    /// Negated regression slope of `ln(population)` on distance.
    pub slope: Option<f64>,
    /// Regression intercept.
    pub intercept: Option<f64>,
    /// Centroid of the selected center cell.
    pub center: Option<Point<f64>>,
}

impl DensityGradientResult {
    /// The "undeterminable" result.
    #[must_use]
    pub const fn undetermined(id: UrbanCenterId) -> Self {
        Self {
            id,
            slope: None,
            intercept: None,
            center: None,
        }
    }

    /// Whether a candidate was selected.
    #[must_use]
    pub const fn is_determined(&self) -> bool {
        self.slope.is_some()
    }
}

/// Raster zonal statistics for one urban center.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedDensityResult {
    /// Urban center identifier.
    pub id: UrbanCenterId,
    /// Sum of cell populations.
    pub total_population: f64,
    /// Number of non-missing cells.
    pub cell_count: usize,
    /// `total_population / cell_count`, `None` with zero cells.
    pub mean_density: Option<f64>,
    /// `Σp² / Σp`, or `0` when the total is zero.
    pub weighted_density: f64,
    /// Whether the raster clip failed and an empty raster was substituted.
    pub clip_failed: bool,
}

/// The input sets joined by [`UrbanCenterId`] in the merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ResultSet {
    /// The urban center inputs themselves.
    UrbanCenters,
    /// [`CompactnessResult`] rows.
    Compactness,
    /// [`WeightedDensityResult`] rows.
    WeightedDensity,
    /// [`DensityGradientResult`] rows.
    DensityGradient,
}

/// The per-center passes of a metrics run, in run order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MetricPass {
    #[strum(to_string = "Compactness")]
    Compactness,
    #[strum(to_string = "Weighted density")]
    WeightedDensity,
    #[strum(to_string = "Density gradient")]
    DensityGradient,
}

impl MetricPass {
    /// Every pass, in run order.
    pub const ALL: [Self; 3] = [Self::Compactness, Self::WeightedDensity, Self::DensityGradient];

    /// Position in [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// One output row: the full outer join of every result set for an id.
#[derive(Debug, Clone, PartialEq)]
pub struct UrbanCenterMetrics {
    /// Urban center identifier.
    pub id: UrbanCenterId,
    /// Source geometry, `None` if the id was missing from the inputs.
    pub geometry: Option<MultiPolygon<f64>>,
    /// Source attributes.
    pub attributes: Option<serde_json::Map<String, serde_json::Value>>,
    /// Land-clipped hull.
    pub hull: Option<MultiPolygon<f64>>,
    /// Compactness ratio.
    pub compactness: Option<f64>,
    /// Sum of cell populations.
    pub total_population: Option<f64>,
    /// Number of non-missing cells.
    pub cell_count: Option<usize>,
    /// Unweighted mean cell population (`ghs_density`).
    pub mean_density: Option<f64>,
    /// Population-weighted mean cell population (`ghs_wt_density`).
    pub weighted_density: Option<f64>,
    /// Density gradient slope.
    pub density_gradient_slope: Option<f64>,
    /// Density gradient intercept.
    pub density_gradient_intercept: Option<f64>,
    /// Density gradient center cell centroid.
    pub density_gradient_center: Option<Point<f64>>,
}

impl UrbanCenterMetrics {
    /// A row with every column null except the id.
    #[must_use]
    pub const fn new(id: UrbanCenterId) -> Self {
        Self {
            id,
            geometry: None,
            attributes: None,
            hull: None,
            compactness: None,
            total_population: None,
            cell_count: None,
            mean_density: None,
            weighted_density: None,
            density_gradient_slope: None,
            density_gradient_intercept: None,
            density_gradient_center: None,
        }
    }
}

/// Run configuration, deserialized from TOML. Every field is optional in
/// the file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Property holding the urban center id.
    pub id_field: String,
    /// PROJ string of the CRS all inputs are in.
    pub crs: String,
    /// Worker pool size; rayon picks one per core when unset.
    pub worker_threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id_field: DEFAULT_ID_FIELD.to_string(),
            crs: DEFAULT_CRS.to_string(),
            worker_threads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_sort_before_text_ids() {
        let mut ids = vec![
            UrbanCenterId::from("b"),
            UrbanCenterId::from(12_i64),
            UrbanCenterId::from("a"),
            UrbanCenterId::from(3_i64),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                UrbanCenterId::Number(3),
                UrbanCenterId::Number(12),
                UrbanCenterId::Text("a".to_string()),
                UrbanCenterId::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn id_serializes_as_source_type() {
        assert_eq!(serde_json::to_string(&UrbanCenterId::Number(7)).unwrap(), "7");
        assert_eq!(
            serde_json::to_string(&UrbanCenterId::from("x-1")).unwrap(),
            "\"x-1\""
        );
        let parsed: UrbanCenterId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, UrbanCenterId::Number(42));
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config: PipelineConfig = toml::de::from_str("worker_threads = 4").unwrap();
        assert_eq!(config.worker_threads, Some(4));
        assert_eq!(config.id_field, DEFAULT_ID_FIELD);
        assert_eq!(config.crs, DEFAULT_CRS);
    }

    #[test]
    fn empty_config_is_default() {
        let config: PipelineConfig = toml::de::from_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn result_set_names_are_snake_case() {
        assert_eq!(ResultSet::WeightedDensity.to_string(), "weighted_density");
        assert_eq!(ResultSet::UrbanCenters.as_ref(), "urban_centers");
    }

    #[test]
    fn passes_index_their_run_order() {
        for (position, pass) in MetricPass::ALL.iter().enumerate() {
            assert_eq!(pass.index(), position);
        }
        assert_eq!(MetricPass::DensityGradient.to_string(), "Density gradient");
    }
}

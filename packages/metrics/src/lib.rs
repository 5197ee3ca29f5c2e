#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shape and density metrics for urban center polygons.
//!
//! Three independent calculators run per urban center:
//!
//! - [`compactness`]: land-clipped area over land-clipped convex hull area
//! - [`weighted_density`]: population-weighted mean cell density
//! - [`density_gradient`]: exponential density decay from the best-fitting
//!   center cell
//!
//! [`pipeline::Pipeline`] runs all three over a worker pool and
//! [`merge::merge`] joins the results into one row per urban center.

pub mod compactness;
pub mod density_gradient;
pub mod merge;
pub mod pipeline;
pub mod progress;
pub mod weighted_density;

pub use pipeline::{Pipeline, PipelineInputs};

use thiserror::Error;
use urban_metrics_models::{ResultSet, UrbanCenterId};

/// Errors that abort a metrics run.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// An id appears more than once within a single result set.
    #[error("Duplicate urban center id {id} in {set} results")]
    DuplicateId {
        /// The set containing the duplicate.
        set: ResultSet,
        /// The repeated id.
        id: UrbanCenterId,
    },

    /// The CRS could not be used for area measurement.
    #[error(transparent)]
    Geometry(#[from] urban_metrics_geometry::GeometryError),

    /// The worker pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

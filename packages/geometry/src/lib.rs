#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry primitives for urban center metrics.
//!
//! Wraps the `geo` boolean and hull operations with the repair step every
//! metric applies first, measures area on the WGS84 ellipsoid for
//! geometries stored in a projected CRS, and land-clips geometries against
//! an R-tree of shoreline polygons.

pub mod area;
pub mod convert;
pub mod repair;
pub mod shoreline;

pub use area::EllipsoidalArea;
pub use repair::repair;
pub use shoreline::ShorelineIndex;

use thiserror::Error;

/// Errors that can occur during geometry operations.
#[derive(Debug, Error)]
pub enum GeometryError {
    /// The CRS definition could not be parsed.
    #[error("Invalid CRS '{crs}': {message}")]
    InvalidCrs {
        /// The PROJ string that was rejected.
        crs: String,
        /// Description of what went wrong.
        message: String,
    },

    /// A coordinate could not be transformed.
    #[error("Projection error: {message}")]
    Projection {
        /// Description of what went wrong.
        message: String,
    },
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tiled population raster.
//!
//! A raster is a list of north-up tiles on a shared grid in an equal-area
//! projected CRS. Cells are addressed globally by [`CellKey`], so a cell
//! covered by two overlapping tiles is only counted once.

pub mod clip;
pub mod manifest;
pub mod tile;

pub use clip::ClipOutcome;
pub use tile::RasterTile;

use geo::Point;
use thiserror::Error;

/// Errors that can occur while building a raster.
#[derive(Debug, Error)]
pub enum RasterError {
    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A tile's values do not fill its declared grid.
    #[error("Tile {tile_id} has invalid shape: {message}")]
    Shape {
        /// Offending tile.
        tile_id: u64,
        /// Description of what went wrong.
        message: String,
    },

    /// A tile's pixel size is zero or not finite.
    #[error("Tile {tile_id} has invalid pixel size {pixel_width} x {pixel_height}")]
    PixelSize {
        /// Offending tile.
        tile_id: u64,
        /// Declared pixel width.
        pixel_width: f64,
        /// Declared pixel height.
        pixel_height: f64,
    },
}

/// Global grid address of a cell, derived from its centroid.
///
/// Ordered by column, then row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    /// `floor(center.x / |pixel_width|)`.
    pub col: i64,
    /// `floor(center.y / |pixel_height|)`.
    pub row: i64,
}

/// One non-missing raster cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopulationCell {
    /// Global grid address.
    pub key: CellKey,
    /// Cell centroid in the raster CRS.
    pub center: Point<f64>,
    /// Population count.
    pub population: f64,
}

/// A read-only tiled population raster.
#[derive(Debug, Clone)]
pub struct PopulationRaster {
    tiles: Vec<RasterTile>,
    nodata: Option<f64>,
}

impl PopulationRaster {
    /// Creates a raster from tiles. Earlier tiles win when tiles overlap.
    #[must_use]
    pub const fn new(tiles: Vec<RasterTile>, nodata: Option<f64>) -> Self {
        Self { tiles, nodata }
    }

    /// The tiles, in priority order.
    #[must_use]
    pub fn tiles(&self) -> &[RasterTile] {
        &self.tiles
    }

    /// The declared no-data value.
    #[must_use]
    pub const fn nodata(&self) -> Option<f64> {
        self.nodata
    }

    /// Whether a pixel value carries no population count.
    ///
    /// Non-finite and negative values count as missing along with the
    /// declared no-data value.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_missing(&self, value: f64) -> bool {
        !value.is_finite() || value < 0.0 || self.nodata == Some(value)
    }
}

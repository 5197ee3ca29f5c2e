//! JSON tile manifest for population rasters.
//!
//! ```json
//! {
//!   "nodata": -200,
//!   "tiles": [
//!     { "tileId": 1, "originX": 0, "originY": 2000, "pixelWidth": 1000,
//!       "pixelHeight": -1000, "width": 2, "height": 2,
//!       "values": [10, 20, null, 40] }
//!   ]
//! }
//! ```
//!
//! `values` is row-major from the top-left pixel. `null` marks a missing
//! pixel since JSON has no `NaN`.

use std::io::Read;

use geo::Coord;
use ndarray::Array2;
use serde::Deserialize;

use crate::{PopulationRaster, RasterError, RasterTile};

/// Top-level manifest document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RasterManifest {
    /// Raster-wide no-data value.
    #[serde(default)]
    pub nodata: Option<f64>,
    /// Tiles in priority order.
    pub tiles: Vec<TileManifest>,
}

/// One tile in a [`RasterManifest`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileManifest {
    pub tile_id: u64,
    /// Upper-left corner x.
    pub origin_x: f64,
    /// Upper-left corner y.
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Negative for north-up tiles.
    pub pixel_height: f64,
    pub width: usize,
    pub height: usize,
    /// Row-major pixel values.
    pub values: Vec<Option<f64>>,
}

impl TryFrom<TileManifest> for RasterTile {
    type Error = RasterError;

    fn try_from(tile: TileManifest) -> Result<Self, Self::Error> {
        let values: Vec<f64> = tile
            .values
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();

        let grid = Array2::from_shape_vec((tile.height, tile.width), values).map_err(|e| {
            RasterError::Shape {
                tile_id: tile.tile_id,
                message: format!("expected {} x {} values: {e}", tile.height, tile.width),
            }
        })?;

        Self::new(
            tile.tile_id,
            Coord {
                x: tile.origin_x,
                y: tile.origin_y,
            },
            tile.pixel_width,
            tile.pixel_height,
            grid,
        )
    }
}

impl TryFrom<RasterManifest> for PopulationRaster {
    type Error = RasterError;

    fn try_from(manifest: RasterManifest) -> Result<Self, Self::Error> {
        let tiles = manifest
            .tiles
            .into_iter()
            .map(RasterTile::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(tiles, manifest.nodata))
    }
}

impl PopulationRaster {
    /// Reads a raster from a JSON manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or a tile's values do not
    /// match its declared size.
    pub fn from_json_reader(reader: impl Read) -> Result<Self, RasterError> {
        let manifest: RasterManifest = serde_json::from_reader(reader)?;
        let raster = Self::try_from(manifest)?;
        for tile in raster.tiles() {
            log::debug!(
                "Tile {}: {} x {} cells",
                tile.tile_id(),
                tile.height(),
                tile.width()
            );
        }
        log::info!("Loaded population raster with {} tiles", raster.tiles().len());
        Ok(raster)
    }
}

//! A single georeferenced raster tile.

use std::ops::Range;

use geo::{Coord, Rect};
use ndarray::Array2;

use crate::{CellKey, RasterError};

/// One tile of the population grid.
///
/// Pixel `(row, col)` covers
/// `[origin.x + col * pixel_width, origin.x + (col + 1) * pixel_width]`
/// horizontally and likewise vertically with `pixel_height`, which is
/// negative for north-up tiles.
#[derive(Debug, Clone)]
pub struct RasterTile {
    tile_id: u64,
    origin: Coord<f64>,
    pixel_width: f64,
    pixel_height: f64,
    values: Array2<f64>,
}

impl RasterTile {
    /// Creates a tile from its upper-left corner, pixel size and a
    /// `(rows, cols)` value grid.
    ///
    /// # Errors
    ///
    /// Returns an error if either pixel dimension is zero or not finite.
    pub fn new(
        tile_id: u64,
        origin: Coord<f64>,
        pixel_width: f64,
        pixel_height: f64,
        values: Array2<f64>,
    ) -> Result<Self, RasterError> {
        let usable = |size: f64| size.is_finite() && size != 0.0;
        if !usable(pixel_width) || !usable(pixel_height) {
            return Err(RasterError::PixelSize {
                tile_id,
                pixel_width,
                pixel_height,
            });
        }

        Ok(Self {
            tile_id,
            origin,
            pixel_width,
            pixel_height,
            values,
        })
    }

    #[must_use]
    pub const fn tile_id(&self) -> u64 {
        self.tile_id
    }

    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> usize {
        self.values.nrows()
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> usize {
        self.values.ncols()
    }

    /// Centroid of pixel `(row, col)`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn cell_center(&self, row: usize, col: usize) -> Coord<f64> {
        Coord {
            x: (col as f64 + 0.5).mul_add(self.pixel_width, self.origin.x),
            y: (row as f64 + 0.5).mul_add(self.pixel_height, self.origin.y),
        }
    }

    /// Global grid address of a cell centroid on this tile's grid.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_key(&self, center: Coord<f64>) -> CellKey {
        CellKey {
            col: (center.x / self.pixel_width.abs()).floor() as i64,
            row: (center.y / self.pixel_height.abs()).floor() as i64,
        }
    }

    /// Rows and columns whose centroids fall inside `bounds`, or `None`
    /// when the tile does not overlap it.
    #[must_use]
    pub fn window(&self, bounds: &Rect<f64>) -> Option<(Range<usize>, Range<usize>)> {
        let rows = axis_window(
            self.origin.y,
            self.pixel_height,
            self.height(),
            bounds.min().y,
            bounds.max().y,
        )?;
        let cols = axis_window(
            self.origin.x,
            self.pixel_width,
            self.width(),
            bounds.min().x,
            bounds.max().x,
        )?;
        Some((rows, cols))
    }
}

/// Indices `i` in `0..len` with `origin + (i + 0.5) * size` in `[min, max]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn axis_window(origin: f64, size: f64, len: usize, min: f64, max: f64) -> Option<Range<usize>> {
    let a = (min - origin) / size - 0.5;
    let b = (max - origin) / size - 0.5;
    if !a.is_finite() || !b.is_finite() {
        return None;
    }
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

    let start = lo.ceil().max(0.0);
    let end = (hi.floor() + 1.0).min(len as f64);
    if start >= end {
        return None;
    }

    Some(start as usize..end as usize)
}

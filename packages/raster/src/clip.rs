//! Sampling raster cells by centroid and clipping to a polygon.
//!
//! A cell belongs to a polygon when its centroid intersects it (boundary
//! included). Both the density gradient and the zonal statistics use this
//! rule, so the two metrics see the same cells.

use std::collections::BTreeMap;

use geo::{BoundingRect, Intersects, MultiPolygon, Point, Validation};

use crate::{PopulationCell, PopulationRaster};

/// Result of clipping the raster to a boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    /// Non-missing cells inside the boundary, ordered by [`crate::CellKey`].
    Cells(Vec<PopulationCell>),
    /// The boundary could not be used as a clip mask.
    TopologyFailure {
        /// Why the boundary was rejected.
        reason: String,
    },
}

impl PopulationRaster {
    /// Non-missing cells whose centroid intersects `geometry`, one per
    /// global cell, ordered by key.
    #[must_use]
    pub fn cells_within(&self, geometry: &MultiPolygon<f64>) -> Vec<PopulationCell> {
        let Some(bounds) = geometry.bounding_rect() else {
            return Vec::new();
        };

        let mut cells = BTreeMap::new();

        for tile in self.tiles() {
            let Some((rows, cols)) = tile.window(&bounds) else {
                continue;
            };

            for row in rows {
                for col in cols.clone() {
                    let population = tile.values()[[row, col]];
                    if self.is_missing(population) {
                        continue;
                    }

                    let center = tile.cell_center(row, col);
                    let point = Point::from(center);
                    if !geometry.intersects(&point) {
                        continue;
                    }

                    cells
                        .entry(tile.cell_key(center))
                        .or_insert_with_key(|&key| PopulationCell {
                            key,
                            center: point,
                            population,
                        });
                }
            }
        }

        cells.into_values().collect()
    }

    /// Clips the raster to `boundary`.
    ///
    /// The boundary must be non-empty, finite and valid; anything else is
    /// reported as [`ClipOutcome::TopologyFailure`] rather than sampled.
    #[must_use]
    pub fn clip(&self, boundary: &MultiPolygon<f64>) -> ClipOutcome {
        if boundary.0.is_empty() {
            return ClipOutcome::TopologyFailure {
                reason: "clip boundary is empty".to_string(),
            };
        }

        let finite_bounds = boundary.bounding_rect().is_some_and(|rect| {
            [rect.min().x, rect.min().y, rect.max().x, rect.max().y]
                .iter()
                .all(|v| v.is_finite())
        });
        if !finite_bounds {
            return ClipOutcome::TopologyFailure {
                reason: "clip boundary has no finite extent".to_string(),
            };
        }

        if !boundary.is_valid() {
            return ClipOutcome::TopologyFailure {
                reason: "clip boundary is self-intersecting or degenerate".to_string(),
            };
        }

        ClipOutcome::Cells(self.cells_within(boundary))
    }
}

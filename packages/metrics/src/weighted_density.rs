//! Population-weighted density.
//!
//! Each cell's population is weighted by itself, so the result is the
//! density experienced by the average resident rather than the average
//! cell.

use urban_metrics_geometry::repair;
use urban_metrics_models::{UrbanCenter, UrbanCenterId, WeightedDensityResult};
use urban_metrics_raster::{ClipOutcome, PopulationRaster};

/// Computes zonal density statistics for one urban center.
///
/// A failed raster clip is logged and treated as a center with no cells.
#[must_use]
pub fn weighted_density(center: &UrbanCenter, raster: &PopulationRaster) -> WeightedDensityResult {
    let repaired = repair(&center.geometry);

    let (cells, clip_failed) = match raster.clip(&repaired) {
        ClipOutcome::Cells(cells) => (cells, false),
        ClipOutcome::TopologyFailure { reason } => {
            log::warn!("Raster clip failed for urban center {}: {reason}", center.id);
            (Vec::new(), true)
        }
    };

    let mut result = zonal_statistics(center.id.clone(), cells.iter().map(|c| c.population));
    result.clip_failed = clip_failed;
    result
}

/// Sum, count, mean and population-weighted mean of cell values.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn zonal_statistics(
    id: UrbanCenterId,
    values: impl IntoIterator<Item = f64>,
) -> WeightedDensityResult {
    let (mut total, mut total_squared, mut count) = (0.0, 0.0, 0_usize);
    for value in values {
        total += value;
        total_squared += value * value;
        count += 1;
    }

    WeightedDensityResult {
        id,
        total_population: total,
        cell_count: count,
        mean_density: (count > 0).then(|| total / count as f64),
        weighted_density: if total == 0.0 { 0.0 } else { total_squared / total },
        clip_failed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, MultiPolygon, Polygon, Rect};
    use ndarray::{Array2, array};
    use urban_metrics_raster::RasterTile;

    fn raster(values: Array2<f64>) -> PopulationRaster {
        #[allow(clippy::cast_precision_loss)]
        let origin = Coord {
            x: 0.0,
            y: values.nrows() as f64,
        };
        PopulationRaster::new(vec![RasterTile::new(1, origin, 1.0, -1.0, values).unwrap()], None)
    }

    fn square(size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![
            Rect::new(Coord { x: 0.0, y: 0.0 }, Coord { x: size, y: size }).to_polygon(),
        ])
    }

    #[test]
    fn uniform_cells_have_equal_mean_and_weighted_density() {
        let center = UrbanCenter::new(1_i64, square(2.0));
        let result = weighted_density(&center, &raster(Array2::from_elem((2, 2), 100.0)));
        assert_eq!(result.cell_count, 4);
        assert!((result.total_population - 400.0).abs() < 1e-9);
        assert!((result.mean_density.unwrap() - 100.0).abs() < 1e-9);
        assert!((result.weighted_density - 100.0).abs() < 1e-9);
        assert!(!result.clip_failed);
    }

    #[test]
    fn non_uniform_cells_weight_towards_dense_cells() {
        let center = UrbanCenter::new(1_i64, square(2.0));
        let result = weighted_density(&center, &raster(array![[10.0, 30.0], [0.0, 60.0]]));
        // (100 + 900 + 3600) / 100 = 46
        assert!((result.mean_density.unwrap() - 25.0).abs() < 1e-9);
        assert!((result.weighted_density - 46.0).abs() < 1e-9);
        assert!(result.weighted_density >= result.mean_density.unwrap());
    }

    #[test]
    fn missing_cells_are_not_counted() {
        let center = UrbanCenter::new(1_i64, square(2.0));
        let result = weighted_density(&center, &raster(array![[f64::NAN, 50.0], [-1.0, 50.0]]));
        assert_eq!(result.cell_count, 2);
        assert!((result.total_population - 100.0).abs() < 1e-9);
    }

    #[test]
    fn center_over_empty_raster_area() {
        let center = UrbanCenter::new(2_i64, square(2.0));
        let result = weighted_density(&center, &raster(Array2::zeros((2, 2))));
        assert_eq!(result.cell_count, 4);
        assert_eq!(result.mean_density, Some(0.0));
        assert!(result.weighted_density.abs() < f64::EPSILON);
    }

    #[test]
    fn clip_failure_still_produces_a_row() {
        // Collinear points repair to nothing, leaving no usable boundary.
        let sliver = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (0.0, 0.0)]),
            vec![],
        )]);
        let center = UrbanCenter::new(3_i64, sliver);
        let result = weighted_density(&center, &raster(Array2::from_elem((2, 2), 100.0)));
        assert!(result.clip_failed);
        assert_eq!(result.cell_count, 0);
        assert!(result.total_population.abs() < f64::EPSILON);
        assert_eq!(result.mean_density, None);
        assert!(result.weighted_density.abs() < f64::EPSILON);
    }

    #[test]
    fn statistics_over_no_values() {
        let result = zonal_statistics(UrbanCenterId::from("x"), []);
        assert_eq!(result.cell_count, 0);
        assert_eq!(result.mean_density, None);
        assert!(result.weighted_density.abs() < f64::EPSILON);
    }
}

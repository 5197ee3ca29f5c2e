//! Exponential density gradient.
//!
//! Every populated cell inside an urban center is tried as the center of
//! a negative-exponential density model `ln(p) = intercept - slope * d`,
//! fit by least squares over the distances to every other populated
//! cell. The cell whose fit decays fastest is taken as the center.

use rayon::prelude::*;
use urban_metrics_geometry::repair;
use urban_metrics_models::{DensityGradientResult, UrbanCenter};
use urban_metrics_raster::{CellKey, PopulationCell, PopulationRaster};

use geo::Point;

/// Spread in `x`, relative to `mean(x)²`, below which the distances are
/// taken as all equal. Cell centroids on fractional pixel grids land a few
/// ulps apart, which would otherwise pass as variance.
const RELATIVE_SPREAD_TOLERANCE: f64 = 1e-12;

/// Relative slope difference within which two candidates tie.
const SLOPE_TIE_TOLERANCE: f64 = 1e-9;

/// The fitted model for one candidate center cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateFit {
    /// Grid address of the candidate.
    pub key: CellKey,
    /// Centroid of the candidate.
    pub center: Point<f64>,
    /// Negated regression slope.
    pub slope: f64,
    /// Regression intercept.
    pub intercept: f64,
}

/// Running simple linear regression using mean and co-moment updates.
#[derive(Debug, Default, Clone, Copy)]
struct Regression {
    n: u64,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    sxy: f64,
}

impl Regression {
    #[allow(clippy::cast_precision_loss)]
    fn add(&mut self, x: f64, y: f64) {
        self.n += 1;
        let n = self.n as f64;
        let dx = x - self.mean_x;
        self.mean_x += dx / n;
        self.mean_y += (y - self.mean_y) / n;
        self.sxx += dx * (x - self.mean_x);
        self.sxy += dx * (y - self.mean_y);
    }

    /// `(slope, intercept)`, or `None` with fewer than two observations
    /// or no spread in `x`.
    #[allow(clippy::cast_precision_loss)]
    fn fit(&self) -> Option<(f64, f64)> {
        let scale = self.n as f64 * self.mean_x * self.mean_x;
        if self.n < 2 || self.sxx <= scale * RELATIVE_SPREAD_TOLERANCE {
            return None;
        }
        let slope = self.sxy / self.sxx;
        let intercept = slope.mul_add(-self.mean_x, self.mean_y);
        (slope.is_finite() && intercept.is_finite()).then_some((slope, intercept))
    }
}

/// Fits the density model centered on `candidate` against `cells`.
///
/// Unpopulated cells, the candidate itself and cells at zero distance
/// contribute no observation.
#[must_use]
pub fn fit_candidate(candidate: &PopulationCell, cells: &[PopulationCell]) -> Option<CandidateFit> {
    if candidate.population <= 0.0 {
        return None;
    }

    let mut regression = Regression::default();
    for cell in cells {
        if cell.key == candidate.key || cell.population <= 0.0 {
            continue;
        }
        let distance = (cell.center.x() - candidate.center.x())
            .hypot(cell.center.y() - candidate.center.y());
        if distance <= 0.0 {
            continue;
        }
        regression.add(distance, cell.population.ln());
    }

    let (slope, intercept) = regression.fit()?;
    Some(CandidateFit {
        key: candidate.key,
        center: candidate.center,
        // Subtracting from +0 keeps a flat fit at +0 rather than -0.
        slope: 0.0 - slope,
        intercept,
    })
}

/// The candidate with the steepest decay, ties going to the lowest
/// `(col, row)`.
///
/// Slopes within [`SLOPE_TIE_TOLERANCE`] of the steepest count as tied, so
/// rounding differences between mirror-image candidates do not decide.
#[must_use]
pub fn best_candidate(cells: &[PopulationCell]) -> Option<CandidateFit> {
    let fits: Vec<CandidateFit> = cells
        .par_iter()
        .filter_map(|candidate| fit_candidate(candidate, cells))
        .collect();

    let steepest = fits.iter().map(|fit| fit.slope).max_by(f64::total_cmp)?;
    fits.into_iter()
        .filter(|fit| ties_with(fit.slope, steepest))
        .min_by_key(|fit| fit.key)
}

#[allow(clippy::float_cmp)]
fn ties_with(slope: f64, steepest: f64) -> bool {
    slope == steepest || (steepest - slope).abs() <= SLOPE_TIE_TOLERANCE * steepest.abs()
}

/// Estimates the density gradient of one urban center. Never fails; a
/// center with no usable candidate gets the all-null result.
#[must_use]
pub fn density_gradient(center: &UrbanCenter, raster: &PopulationRaster) -> DensityGradientResult {
    let repaired = repair(&center.geometry);
    let cells = raster.cells_within(&repaired);

    match best_candidate(&cells) {
        Some(best) => DensityGradientResult {
            id: center.id.clone(),
            slope: Some(best.slope),
            intercept: Some(best.intercept),
            center: Some(best.center),
        },
        None => {
            log::debug!(
                "Urban center {} has no determinable density gradient ({} cells)",
                center.id,
                cells.len()
            );
            DensityGradientResult::undetermined(center.id.clone())
        }
    }
}

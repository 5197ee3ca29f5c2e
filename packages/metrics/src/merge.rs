//! Full outer join of the per-metric result sets.

use std::collections::{BTreeMap, BTreeSet};

use urban_metrics_models::{
    CompactnessResult, DensityGradientResult, ResultSet, UrbanCenter, UrbanCenterId,
    UrbanCenterMetrics, WeightedDensityResult,
};

use crate::MetricsError;

/// Joins the urban centers with every result set by id.
///
/// Every id from any set appears exactly once, in id order. Columns from
/// a set that lacks the id stay `None`.
///
/// # Errors
///
/// Returns [`MetricsError::DuplicateId`] if an id appears twice within
/// one set.
pub fn merge(
    centers: &[UrbanCenter],
    compactness: Vec<CompactnessResult>,
    weighted_density: Vec<WeightedDensityResult>,
    density_gradient: Vec<DensityGradientResult>,
) -> Result<Vec<UrbanCenterMetrics>, MetricsError> {
    let mut rows = BTreeMap::new();

    join(
        &mut rows,
        ResultSet::UrbanCenters,
        centers.iter().map(|c| (c.id.clone(), c)),
        |row, center| {
            row.geometry = Some(center.geometry.clone());
            row.attributes = Some(center.attributes.clone());
        },
    )?;

    join(
        &mut rows,
        ResultSet::Compactness,
        compactness.into_iter().map(|r| (r.id.clone(), r)),
        |row, result| {
            row.hull = Some(result.hull);
            row.compactness = Some(result.compactness);
        },
    )?;

    join(
        &mut rows,
        ResultSet::WeightedDensity,
        weighted_density.into_iter().map(|r| (r.id.clone(), r)),
        |row, result| {
            row.total_population = Some(result.total_population);
            row.cell_count = Some(result.cell_count);
            row.mean_density = result.mean_density;
            row.weighted_density = Some(result.weighted_density);
        },
    )?;

    join(
        &mut rows,
        ResultSet::DensityGradient,
        density_gradient.into_iter().map(|r| (r.id.clone(), r)),
        |row, result| {
            row.density_gradient_slope = result.slope;
            row.density_gradient_intercept = result.intercept;
            row.density_gradient_center = result.center;
        },
    )?;

    Ok(rows.into_values().collect())
}

fn join<T>(
    rows: &mut BTreeMap<UrbanCenterId, UrbanCenterMetrics>,
    set: ResultSet,
    items: impl IntoIterator<Item = (UrbanCenterId, T)>,
    mut fill: impl FnMut(&mut UrbanCenterMetrics, T),
) -> Result<(), MetricsError> {
    let mut seen = BTreeSet::new();

    for (id, item) in items {
        if !seen.insert(id.clone()) {
            return Err(MetricsError::DuplicateId { set, id });
        }
        let row = rows
            .entry(id)
            .or_insert_with_key(|id| UrbanCenterMetrics::new(id.clone()));
        fill(row, item);
    }

    Ok(())
}

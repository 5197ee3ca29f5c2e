//! Runs every metric over a set of urban centers.

use std::sync::Arc;

use rayon::prelude::*;
use urban_metrics_geometry::{EllipsoidalArea, ShorelineIndex};
use urban_metrics_models::{PipelineConfig, UrbanCenter, UrbanCenterMetrics};
use urban_metrics_raster::PopulationRaster;

use crate::{
    MetricsError, compactness::compactness, density_gradient::density_gradient, merge::merge,
    progress::{MetricPass, RunProgress},
    weighted_density::weighted_density,
};

/// Everything a run reads. Shared read-only across workers.
pub struct PipelineInputs {
    pub centers: Vec<UrbanCenter>,
    pub shoreline: ShorelineIndex,
    pub raster: PopulationRaster,
}

/// Metrics run with a fixed configuration.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Computes compactness, weighted density and density gradient for
    /// every urban center and joins them into one row per id.
    ///
    /// Each pass reports once per center.
    ///
    /// # Errors
    ///
    /// * If the configured CRS cannot be parsed
    /// * If the worker pool cannot be built
    /// * If an id appears twice in the inputs
    pub fn run(
        &self,
        inputs: &PipelineInputs,
        progress: &Arc<dyn RunProgress>,
    ) -> Result<Vec<UrbanCenterMetrics>, MetricsError> {
        let area = EllipsoidalArea::from_proj_string(&self.config.crs)?;

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.config.worker_threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build()?;

        let centers = &inputs.centers;
        log::info!(
            "Computing metrics for {} urban centers against {} land polygons on {} workers",
            centers.len(),
            inputs.shoreline.len(),
            pool.current_num_threads()
        );
        if inputs.shoreline.is_empty() {
            log::warn!("Shoreline has no land; compactness will use the raw polygons");
        }

        let (compactness, weighted_density, density_gradient) = pool.install(|| {
            let compactness = run_pass(MetricPass::Compactness, centers, progress, |center| {
                compactness(center, &inputs.shoreline, &area)
            });
            let weighted_density =
                run_pass(MetricPass::WeightedDensity, centers, progress, |center| {
                    weighted_density(center, &inputs.raster)
                });
            let density_gradient =
                run_pass(MetricPass::DensityGradient, centers, progress, |center| {
                    density_gradient(center, &inputs.raster)
                });
            (compactness, weighted_density, density_gradient)
        });

        let fallbacks = compactness.iter().filter(|r| r.used_land_fallback).count();
        let clip_failures = weighted_density.iter().filter(|r| r.clip_failed).count();
        let undetermined = density_gradient.iter().filter(|r| !r.is_determined()).count();

        let rows = merge(centers, compactness, weighted_density, density_gradient)?;

        log::info!(
            "Computed metrics for {} urban centers ({fallbacks} land fallbacks, \
             {clip_failures} raster clip failures, {undetermined} undetermined gradients)",
            rows.len()
        );
        progress.run_finished(rows.len());

        Ok(rows)
    }
}

fn run_pass<T, F>(
    pass: MetricPass,
    centers: &[UrbanCenter],
    progress: &Arc<dyn RunProgress>,
    metric: F,
) -> Vec<T>
where
    T: Send,
    F: Fn(&UrbanCenter) -> T + Sync,
{
    progress.pass_started(pass, centers.len() as u64);
    let results = centers
        .par_iter()
        .map(|center| {
            let result = metric(center);
            progress.center_done(pass);
            result
        })
        .collect();
    progress.pass_finished(pass);
    log::debug!("{pass} pass finished");
    results
}

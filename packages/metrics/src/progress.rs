//! Progress reporting for a metrics run.
//!
//! The pipeline announces each [`MetricPass`] and every urban center it
//! finishes. The CLI draws one bar per pass; library callers and tests
//! pass [`null_progress`].

use std::sync::Arc;

pub use urban_metrics_models::MetricPass;

/// Receives progress updates from [`crate::Pipeline::run`].
///
/// `center_done` arrives from pool workers, so implementations must be
/// `Send + Sync`.
pub trait RunProgress: Send + Sync {
    /// `pass` is starting over `centers` urban centers.
    fn pass_started(&self, pass: MetricPass, centers: u64);

    /// One urban center finished in `pass`.
    fn center_done(&self, pass: MetricPass);

    /// Every center has been through `pass`.
    fn pass_finished(&self, pass: MetricPass);

    /// The results were merged into `rows` output rows.
    fn run_finished(&self, rows: usize);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl RunProgress for NullProgress {
    fn pass_started(&self, _pass: MetricPass, _centers: u64) {}
    fn center_done(&self, _pass: MetricPass) {}
    fn pass_finished(&self, _pass: MetricPass) {}
    fn run_finished(&self, _rows: usize) {}
}

/// Returns a shared [`NullProgress`] instance.
#[must_use]
pub fn null_progress() -> Arc<dyn RunProgress> {
    Arc::new(NullProgress)
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal output for the `urban_metrics` CLI.
//!
//! [`PassBars`] draws one bar per metric pass behind the [`RunProgress`]
//! trait, [`loading_bar`] counts input files, and [`init_logger`] sets up
//! `indicatif-log-bridge` so that log lines are suspended while bars
//! redraw.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use urban_metrics::progress::{MetricPass, RunProgress};

pub use indicatif::{MultiProgress, ProgressDrawTarget};

/// One `indicatif` bar per [`MetricPass`], stacked in run order.
///
/// Every bar is sized for all urban centers up front so queued passes show
/// as empty bars.
pub struct PassBars {
    bars: [ProgressBar; 3],
}

impl PassBars {
    #[must_use]
    pub fn new(multi: &MultiProgress, centers: u64) -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{msg:>17} {wide_bar:.cyan/dim} {pos}/{len} {percent}% [{eta}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");

        let bars = MetricPass::ALL.map(|pass| {
            let bar = multi.add(ProgressBar::new(centers));
            bar.set_style(style.clone());
            bar.set_message(pass.to_string());
            bar
        });

        Arc::new(Self { bars })
    }

    fn bar(&self, pass: MetricPass) -> &ProgressBar {
        &self.bars[pass.index()]
    }
}

impl RunProgress for PassBars {
    fn pass_started(&self, pass: MetricPass, centers: u64) {
        let bar = self.bar(pass);
        bar.set_length(centers);
        bar.reset();
        bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn center_done(&self, pass: MetricPass) {
        self.bar(pass).inc(1);
    }

    fn pass_finished(&self, pass: MetricPass) {
        let bar = self.bar(pass);
        bar.disable_steady_tick();
        bar.finish_with_message(format!("{pass} done"));
    }

    fn run_finished(&self, rows: usize) {
        log::info!("Merged {rows} urban center rows");
    }
}

/// A bar counting input files as they load. Call `finish_and_clear` once
/// everything is in memory.
#[must_use]
pub fn loading_bar(multi: &MultiProgress, inputs: u64) -> ProgressBar {
    let bar = multi.add(ProgressBar::new(inputs));
    bar.set_style(
        ProgressStyle::with_template(
            "Loading {msg} {wide_bar:.green/dim} {pos}/{len} [{elapsed_precise}]",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-"),
    );
    bar
}

/// Initializes the global logger wrapped in `indicatif-log-bridge`.
///
/// Returns the [`MultiProgress`] that all progress bars must be added to.
#[must_use]
pub fn init_logger() -> MultiProgress {
    let multi = MultiProgress::new();

    let logger = pretty_env_logger::formatted_builder()
        .parse_env("RUST_LOG")
        .build();
    let level = logger.filter();

    indicatif_log_bridge::LogWrapper::new(multi.clone(), logger)
        .try_init()
        .ok(); // Logger may already be set (e.g., in tests)

    log::set_max_level(level);

    multi
}

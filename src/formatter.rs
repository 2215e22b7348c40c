//! Stage 3: assemble the final report and the run statistics.
//!
//! Formatting cannot fail and never reads the clock; everything time related
//! comes from [`RunState::started_at`] and [`RunState::timings`].

use crate::config::OutputConfig;
use crate::models::{CategoryStatus, RunState, RunStatistics};
use crate::outputs::markdown::run_to_markdown;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub include_metadata: bool,
    pub include_stats: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            include_metadata: true,
            include_stats: true,
        }
    }
}

impl From<&OutputConfig> for ReportOptions {
    fn from(output: &OutputConfig) -> Self {
        Self {
            include_metadata: output.include_metadata,
            include_stats: output.include_stats,
        }
    }
}

pub fn compute_statistics(state: &RunState) -> RunStatistics {
    let total_articles = state.total_articles();
    let total_secs = state.timings.total_secs();
    RunStatistics {
        total_articles,
        categories_requested: state.requested.len(),
        succeeded: state.count_status(CategoryStatus::Success),
        partial: state.count_status(CategoryStatus::Partial),
        failed: state.count_status(CategoryStatus::Failed),
        timings: state.timings,
        articles_per_second: if total_secs > 0.0 {
            total_articles as f64 / total_secs
        } else {
            0.0
        },
    }
}

/// Render `state` into the Markdown report, returning it with the statistics
/// it was rendered from.
#[instrument(level = "info", skip_all, fields(categories = state.requested.len()))]
pub fn format_report(state: &RunState, options: &ReportOptions) -> (String, RunStatistics) {
    let stats = compute_statistics(state);
    let report = run_to_markdown(state, &stats, options);
    info!(
        chars = report.chars().count(),
        total_articles = stats.total_articles,
        succeeded = stats.succeeded,
        partial = stats.partial,
        failed = stats.failed,
        "Report formatted"
    );
    (report, stats)
}

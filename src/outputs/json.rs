//! JSON run summary.
//!
//! The full [`RunState`] plus its [`RunStatistics`] is written per run,
//! organized by date:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 07-05-00.json
//!     └── 18-30-00.json
//! ```

use crate::error::Result;
use crate::models::{RunState, RunStatistics};
use crate::pipeline::RunOutcome;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Serialize)]
struct RunSummary<'a> {
    success: bool,
    stats: &'a RunStatistics,
    state: &'a RunState,
}

/// Write `outcome` to `{json_output_dir}/{date}/{HH-MM-SS}.json`, keyed by the
/// run start time. Returns the written path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_run_summary(outcome: &RunOutcome, json_output_dir: &str) -> Result<PathBuf> {
    let summary = RunSummary {
        success: outcome.success,
        stats: &outcome.stats,
        state: &outcome.state,
    };
    let json = serde_json::to_string_pretty(&summary)?;

    let started_at = outcome.state.started_at;
    let full_json_dir = Path::new(json_output_dir).join(started_at.date_naive().to_string());

    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let path = full_json_dir.join(format!("{}.json", started_at.format("%H-%M-%S")));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Wrote JSON run summary");
    Ok(path)
}

//! Saved Markdown reports: naming, writing, listing and expiry.

use crate::error::Result;
use crate::outputs::indexes::INDEX_FILENAME;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, instrument, warn};

pub const REPORT_SUFFIX: &str = "_news_summary.md";
const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// `{YYYY-MM-DD_HH-MM-SS}_news_summary.md` for a run started at `started_at`.
pub fn report_filename(started_at: &DateTime<Local>) -> String {
    format!("{}{}", started_at.format("%Y-%m-%d_%H-%M-%S"), REPORT_SUFFIX)
}

/// Write `report` into `output_dir`, named after the run unless `filename`
/// is given. Returns the written path.
#[instrument(level = "info", skip(report, started_at), fields(bytes = report.len()))]
pub async fn save_markdown_report(
    output_dir: &str,
    filename: Option<&str>,
    report: &str,
    started_at: &DateTime<Local>,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir).await?;
    let filename = match filename {
        Some(name) if name.ends_with(".md") => name.to_string(),
        Some(name) => format!("{}.md", name),
        None => report_filename(started_at),
    };
    let path = Path::new(output_dir).join(filename);
    fs::write(&path, report).await?;
    info!(path = %path.display(), "Wrote Markdown report");
    Ok(path)
}

/// Saved reports in `output_dir`, most recently modified first.
async fn saved_reports(output_dir: &str) -> Result<Vec<(PathBuf, SystemTime)>> {
    let mut reports = Vec::new();
    if !Path::new(output_dir).is_dir() {
        return Ok(reports);
    }
    let mut entries = fs::read_dir(output_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_report = path.extension().is_some_and(|ext| ext == "md")
            && path.file_name().is_some_and(|name| name != INDEX_FILENAME);
        if !is_report {
            continue;
        }
        let metadata = entry.metadata().await?;
        if metadata.is_file() {
            reports.push((path, metadata.modified()?));
        }
    }
    reports.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
    Ok(reports)
}

/// Up to `limit` report paths, newest first.
pub async fn latest_reports(output_dir: &str, limit: usize) -> Result<Vec<PathBuf>> {
    Ok(saved_reports(output_dir)
        .await?
        .into_iter()
        .take(limit)
        .map(|(path, _)| path)
        .collect())
}

/// Delete reports last modified more than `keep_days` days ago. Returns the
/// file names that were removed.
#[instrument(level = "info")]
pub async fn cleanup_old_reports(output_dir: &str, keep_days: u64) -> Result<Vec<String>> {
    let keep = Duration::from_secs(keep_days.saturating_mul(SECS_PER_DAY));
    let Some(cutoff) = SystemTime::now().checked_sub(keep) else {
        return Ok(Vec::new());
    };

    let mut removed = Vec::new();
    for (path, modified) in saved_reports(output_dir).await? {
        if modified >= cutoff {
            continue;
        }
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed expired report");
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    removed.push(name.to_string());
                }
            }
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove expired report"),
        }
    }
    info!(removed = removed.len(), keep_days, "Report cleanup finished");
    Ok(removed)
}

//! Reports index maintenance.
//!
//! `{output_dir}/index.md` lists every saved report grouped by run date,
//! newest date first:
//!
//! ```text
//! # 📰 뉴스 요약 리포트
//!
//! - **2025-05-06**
//!     - [18:30 Evening](./2025-05-06_18-30-00_news_summary.md)
//!     - [07:05 Morning](./2025-05-06_07-05-00_news_summary.md)
//! ```
//!
//! Updates are idempotent: saving the same report twice leaves a single entry.

use crate::error::Result;
use crate::utils::{time_of_day, upcase};
use chrono::{DateTime, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

pub const INDEX_FILENAME: &str = "index.md";
const INDEX_TITLE: &str = "# 📰 뉴스 요약 리포트";
const ENTRY_INDENT: &str = "    - ";

fn date_heading(started_at: &DateTime<Local>) -> String {
    format!("- **{}**", started_at.date_naive())
}

fn report_entry(started_at: &DateTime<Local>, report_filename: &str) -> String {
    format!(
        "{}[{} {}](./{})",
        ENTRY_INDENT,
        started_at.format("%H:%M"),
        upcase(time_of_day(started_at.time())),
        report_filename
    )
}

/// Insert `report_filename` under its run date. Returns the index path.
#[instrument(level = "info", skip_all, fields(%output_dir, file = %report_filename))]
pub async fn update_report_index(
    output_dir: &str,
    started_at: &DateTime<Local>,
    report_filename: &str,
) -> Result<PathBuf> {
    let index_path = Path::new(output_dir).join(INDEX_FILENAME);
    let content = if index_path.exists() {
        fs::read_to_string(&index_path).await?
    } else {
        format!("{}\n", INDEX_TITLE)
    };

    let date_heading = date_heading(started_at);
    let entry = report_entry(started_at, report_filename);
    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();

    if let Some(i) = lines.iter().position(|l| l.trim() == date_heading) {
        let mut j = i + 1;
        let mut found = false;
        while j < lines.len() && lines[j].starts_with(ENTRY_INDENT) {
            if lines[j] == entry {
                found = true;
                break;
            }
            j += 1;
        }
        if !found {
            // Entries under a date are newest first.
            lines.insert(i + 1, entry);
        }
    } else {
        let insert_at = match lines.iter().position(|l| l.starts_with(INDEX_TITLE)) {
            Some(pos) => pos + 1,
            None => {
                lines.insert(0, INDEX_TITLE.to_string());
                1
            }
        };
        lines.insert(insert_at, String::new());
        lines.insert(insert_at + 1, date_heading);
        lines.insert(insert_at + 2, entry);
    }

    fs::write(&index_path, lines.join("\n") + "\n").await?;
    info!(path = %index_path.display(), "Updated reports index");
    Ok(index_path)
}

/// Drop entries pointing at `removed` files, and dates left without entries.
#[instrument(level = "info", skip_all, fields(%output_dir, removed = removed.len()))]
pub async fn prune_report_index(output_dir: &str, removed: &[String]) -> Result<()> {
    let index_path = Path::new(output_dir).join(INDEX_FILENAME);
    if removed.is_empty() || !index_path.exists() {
        return Ok(());
    }
    let removed: HashSet<String> = removed.iter().map(|f| format!("(./{})", f)).collect();
    let content = fs::read_to_string(&index_path).await?;

    let kept: Vec<&str> = content
        .lines()
        .filter(|l| !(l.starts_with(ENTRY_INDENT) && removed.iter().any(|r| l.ends_with(r.as_str()))))
        .collect();

    let mut lines: Vec<&str> = Vec::with_capacity(kept.len());
    for (i, line) in kept.iter().enumerate() {
        let is_date = line.starts_with("- **");
        let has_entries = kept.get(i + 1).is_some_and(|next| next.starts_with(ENTRY_INDENT));
        if is_date && !has_entries {
            // Also drop the blank separator written before the heading.
            if lines.last().is_some_and(|l| l.is_empty()) {
                lines.pop();
            }
            continue;
        }
        lines.push(*line);
    }

    fs::write(&index_path, lines.join("\n") + "\n").await?;
    info!(path = %index_path.display(), "Pruned reports index");
    Ok(())
}

//! Utility functions for edition naming, log-friendly strings, and output
//! directory checks.

use chrono::{NaiveTime, Timelike};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Classify a time of day into an edition name.
///
/// - **Morning**: 00:00 - 08:00
/// - **Afternoon**: 08:00 - 16:00
/// - **Evening**: 16:00 - 24:00
pub fn time_of_day(at: NaiveTime) -> &'static str {
    match at.hour() {
        0..=7 => "morning",
        8..=15 => "afternoon",
        _ => "evening",
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a char boundary) with an
/// ellipsis and the dropped byte count appended.
///
/// # Arguments
///
/// * `s` - The string to potentially truncate
/// * `max` - Maximum number of bytes to keep
///
/// # Returns
///
/// `s` unchanged if it fits, otherwise the kept prefix followed by
/// `"…(+N bytes)"`.
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Capitalize the first character of a string.
pub fn upcase(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        None => String::new(),
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory (and parents) if needed, then creates and removes a
/// scratch file inside it.
///
/// # Arguments
///
/// * `path` - Directory that reports or JSON summaries will be written to
///
/// # Errors
///
/// Returns the underlying I/O error when the directory cannot be created
/// (for example, a regular file already sits at `path`) or when the scratch
/// file cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let scratch = format!("{}/..__write_check__", path.trim_end_matches('/'));
    stdfs::File::create(&scratch)?;
    let _ = stdfs::remove_file(&scratch);
    info!("Output directory is writable");
    Ok(())
}

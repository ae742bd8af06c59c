//! Log file retention management
//!
//! Prunes per-day log files by the date in their name.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Days, Local, NaiveDate};

use crate::writer::FILE_DATE_FORMAT;

/// Default retention period in days
pub const DEFAULT_RETENTION_DAYS: u64 = 7;

/// Clean up per-day log files older than the default retention period
///
/// Returns the number of files deleted.
pub fn cleanup_old_logs(logs_dir: &Path) -> Result<usize> {
    cleanup_old_logs_with_retention(logs_dir, DEFAULT_RETENTION_DAYS)
}

/// Clean up per-day log files older than the specified number of days
///
/// Returns the number of files deleted.
pub fn cleanup_old_logs_with_retention(logs_dir: &Path, retention_days: u64) -> Result<usize> {
    let today = Local::now().date_naive();
    let cutoff = today
        .checked_sub_days(Days::new(retention_days))
        .unwrap_or(NaiveDate::MIN);
    cleanup_before(logs_dir, cutoff)
}

/// Delete every per-day file dated strictly before `cutoff`
fn cleanup_before(logs_dir: &Path, cutoff: NaiveDate) -> Result<usize> {
    if !logs_dir.exists() {
        return Ok(0);
    }

    let entries = fs::read_dir(logs_dir)
        .with_context(|| format!("Failed to read logs directory {}", logs_dir.display()))?;

    let mut deleted_count = 0;
    for entry in entries {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let Some(date) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(file_date)
        else {
            continue;
        };

        if date < cutoff {
            match fs::remove_file(&path) {
                Ok(()) => deleted_count += 1,
                Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
            }
        }
    }

    Ok(deleted_count)
}

/// Date of a `YYYY-MM-DD[_transactions].log|json` file name
fn file_date(name: &str) -> Option<NaiveDate> {
    let stem = name
        .strip_suffix(".log")
        .or_else(|| name.strip_suffix(".json"))?;
    let date = stem.get(..10)?;
    let rest = &stem[10..];
    if !rest.is_empty() && !rest.starts_with('_') {
        return None;
    }
    NaiveDate::parse_from_str(date, FILE_DATE_FORMAT).ok()
}

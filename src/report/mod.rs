//! Offline listening summary built from a node log.

pub mod period;
pub mod server;
pub mod summary;

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;

use jiff::Zoned;

use crate::registry::Record;

pub use period::{Period, UnknownPeriod};
pub use server::{build_router, serve, ReportState};
pub use summary::{device_spans, hourly, human_duration, render, summarize, DeviceSummary, HourSummary, Span};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("Time zone error: {0}")]
    Time(#[from] jiff::Error),
}

/// Reads every well-formed record; malformed lines are skipped with a warning.
pub fn read_records(path: &Path) -> Result<Vec<Record>, ReportError> {
    let io_err = |source| ReportError::Io { path: path.display().to_string(), source };
    let file = std::fs::File::open(path).map_err(io_err)?;

    let mut records = Vec::new();
    for (n, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.map_err(io_err)?;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<Record>() {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!("{}:{}: {}", path.display(), n + 1, e),
        }
    }
    Ok(records)
}

pub fn load_spans(path: &Path, start: i64, end: i64) -> Result<BTreeMap<String, Vec<Span>>, ReportError> {
    let records = read_records(path)?;
    tracing::debug!("{} record(s) in {}, window {}..{}", records.len(), path.display(), start, end);
    Ok(device_spans(records, start, end))
}

/// Renders the summary of `path` over `period`, relative to `now`.
pub fn report(path: &Path, period: Period, now: &Zoned) -> Result<String, ReportError> {
    let (start, end) = period.window(now)?;
    let spans = load_spans(path, start, end)?;
    let hours = hourly(&spans, now.time_zone())?;
    Ok(render(&summarize(&spans), &hours))
}

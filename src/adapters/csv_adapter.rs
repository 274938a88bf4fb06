//! CSV file data adapter.
//!
//! Columns are located by header name, case-insensitively, so
//! `Timestamp,Open,High,Low,Close,Volume` and any column order work. Extra
//! columns are ignored.

use crate::domain::error::TraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

pub const REQUIRED_COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

pub struct CsvAdapter {
    path: PathBuf,
}

impl CsvAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Accepts RFC 3339, a handful of common date-time layouts, a bare date, or
/// a Unix epoch in seconds or milliseconds.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(epoch) = raw.parse::<i64>() {
        // anything past 1e11 seconds is year 5138+, so it must be millis
        let dt = if epoch.abs() >= 100_000_000_000 {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
        return dt.map(|d| d.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn column_indices(headers: &csv::StringRecord) -> Result<[usize; 6], TraderError> {
    let mut indices = [0usize; 6];
    for (slot, name) in indices.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| {
                TraderError::data(format!(
                    "missing column '{}' (expected: {})",
                    name,
                    REQUIRED_COLUMNS.join(", ")
                ))
            })?;
    }
    Ok(indices)
}

fn parse_price(
    record: &csv::StringRecord,
    index: usize,
    name: &str,
    line: u64,
) -> Result<f64, TraderError> {
    let raw = record.get(index).unwrap_or("").trim();
    let value: f64 = raw.parse().map_err(|e| {
        TraderError::data(format!("line {line}: invalid {name} value '{raw}': {e}"))
    })?;
    if !value.is_finite() {
        return Err(TraderError::data(format!(
            "line {line}: {name} value '{raw}' is not a finite number"
        )));
    }
    Ok(value)
}

/// Sorts by time and rejects repeated timestamps.
fn into_series(mut rows: Vec<(u64, OhlcvBar)>) -> Result<Vec<OhlcvBar>, TraderError> {
    rows.sort_by_key(|(_, bar)| bar.timestamp);
    for pair in rows.windows(2) {
        let (_, prev) = &pair[0];
        let (line, bar) = &pair[1];
        if bar.timestamp <= prev.timestamp {
            return Err(TraderError::data(format!(
                "line {line}: duplicate timestamp {}",
                bar.timestamp
            )));
        }
    }
    Ok(rows.into_iter().map(|(_, bar)| bar).collect())
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(&self) -> Result<Vec<OhlcvBar>, TraderError> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            TraderError::data(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let [ts_idx, open_idx, high_idx, low_idx, close_idx, volume_idx] =
            column_indices(rdr.headers()?)?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let ts_raw = record.get(ts_idx).unwrap_or("");
            let timestamp = parse_timestamp(ts_raw).ok_or_else(|| {
                TraderError::data(format!("line {line}: invalid timestamp '{ts_raw}'"))
            })?;

            let bar = OhlcvBar {
                timestamp,
                open: parse_price(&record, open_idx, "open", line)?,
                high: parse_price(&record, high_idx, "high", line)?,
                low: parse_price(&record, low_idx, "low", line)?,
                close: parse_price(&record, close_idx, "close", line)?,
                volume: parse_price(&record, volume_idx, "volume", line)?,
            };
            rows.push((line, bar));
        }

        into_series(rows)
    }
}

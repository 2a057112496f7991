//! # Water-Level Ingestion
//!
//! Reads gauge exports laid out as `timestamp, <anything>, raw_level, ...`
//! and turns them into a [`TimeSeries`] ready for analysis.
//!
//! ## File Format
//!
//! ```text
//! Date Time,Station,Water Level
//! 08/21/2023 00:00:00,8418150,6.12
//! 08/21/2023 00:06:00,8418150,6.08
//! ```
//!
//! - The first column holds the timestamp (`%m/%d/%Y %H:%M:%S` by default)
//! - The raw level is read from `value_column` (zero-based, default `2`)
//! - Fields may be quoted; a quoted field can contain commas
//! - An optional header row, blank lines and `#` comments are skipped
//!
//! ## Processing Pipeline
//! 1. **Parse**: timestamp and raw level per row
//! 2. **Filter**: keep rows whose *date* lies in `[start_date, end_date]`
//! 3. **Transform**: `value = datum_constant − raw` (depth below a reference
//!    becomes height above it)
//! 4. **Order**: sort by timestamp, dropping repeated instants
//! 5. **Smooth**: optional forward moving average

use crate::{Sample, TimeSeries};
use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;

/// Timestamp layout used by the gauge exports.
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Layout of the start/end date filter.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Errors that can occur while reading a level file.
#[derive(Error, Debug)]
pub enum IngestError {
    /// File could not be opened or read
    #[error("input IO: {0}")]
    Io(#[from] io::Error),

    /// Row structure is broken (e.g. an unterminated quote)
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A data row could not be parsed
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// A data row is too short to hold the value column
    #[error("line {line}: missing column {column}")]
    MissingColumn { line: usize, column: usize },

    /// Start/end date filter is malformed
    #[error("invalid date '{0}': expected mm/dd/yyyy, e.g. 08/21/2023")]
    BadDate(String),
}

/// How rows are interpreted and filtered.
#[derive(Clone, Debug, PartialEq)]
pub struct IngestOptions {
    pub timestamp_format: String,
    /// Zero-based column holding the raw level
    pub value_column: usize,
    /// Reference level the raw measurement is subtracted from
    pub datum_constant: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Forward moving-average width in samples (0 or 1 disables smoothing)
    pub smoothing_window: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            value_column: 2,
            datum_constant: 0.0,
            start_date: None,
            end_date: None,
            smoothing_window: 0,
        }
    }
}

impl IngestOptions {
    fn in_range(&self, date: NaiveDate) -> bool {
        self.start_date.map_or(true, |start| date >= start)
            && self.end_date.map_or(true, |end| date <= end)
    }
}

/// Parse a `mm/dd/yyyy` date, tolerating surrounding whitespace.
pub fn parse_date(text: &str) -> Result<NaiveDate, IngestError> {
    let trimmed = text.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| IngestError::BadDate(trimmed.to_string()))
}

/// Load a level file from disk.
pub fn load_csv<P: AsRef<Path>>(path: P, options: &IngestOptions) -> Result<TimeSeries, IngestError> {
    let file = File::open(path.as_ref())?;
    debug!("reading levels from {}", path.as_ref().display());
    read_csv(file, options)
}

/// Read level rows from any reader.
///
/// Fields may be quoted (`"Portland, ME"`), blank lines and lines starting
/// with `#` are skipped. The first row is a header when either its timestamp
/// or its level does not parse; any later unparsable row is an error.
pub fn read_csv<R: io::Read>(reader: R, options: &IngestOptions) -> Result<TimeSeries, IngestError> {
    let mut rows = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .trim(Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    let mut seen_row = false;
    let mut filtered = 0usize;

    for result in rows.records() {
        let record = result?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line() as usize);

        if !seen_row {
            seen_row = true;
            if let Err(e) = parse_timestamp(&record, line, options)
                .and_then(|_| parse_level(&record, line, options))
            {
                debug!("skipping header row ({e})");
                continue;
            }
        }

        let timestamp = parse_timestamp(&record, line, options)?;
        if !options.in_range(timestamp.date()) {
            filtered += 1;
            continue;
        }
        let raw = parse_level(&record, line, options)?;

        samples.push(Sample::new(timestamp, options.datum_constant - raw));
    }

    let parsed = samples.len();
    let series = TimeSeries::from_unsorted(samples);
    if series.len() < parsed {
        warn!(
            "dropped {} rows with repeated timestamps",
            parsed - series.len()
        );
    }
    debug!(
        "ingested {} samples ({} outside date range)",
        series.len(),
        filtered
    );

    Ok(forward_moving_average(&series, options.smoothing_window))
}

fn parse_timestamp(
    record: &StringRecord,
    line: usize,
    options: &IngestOptions,
) -> Result<NaiveDateTime, IngestError> {
    let text = record.get(0).unwrap_or_default();
    NaiveDateTime::parse_from_str(text, &options.timestamp_format).map_err(|e| {
        IngestError::Parse {
            line,
            reason: format!("bad timestamp '{text}': {e}"),
        }
    })
}

fn parse_level(record: &StringRecord, line: usize, options: &IngestOptions) -> Result<f64, IngestError> {
    let text = record
        .get(options.value_column)
        .ok_or(IngestError::MissingColumn {
            line,
            column: options.value_column,
        })?;
    let raw: f64 = text.parse().map_err(|e| IngestError::Parse {
        line,
        reason: format!("bad level '{text}': {e}"),
    })?;
    if !raw.is_finite() {
        return Err(IngestError::Parse {
            line,
            reason: format!("level '{text}' is not finite"),
        });
    }
    Ok(raw)
}

/// Forward moving average: each sample becomes the mean of itself and the
/// following `window - 1` samples. Near the end the window shrinks to what
/// is left, so the series keeps its length and timestamps.
pub fn forward_moving_average(series: &TimeSeries, window: usize) -> TimeSeries {
    if window <= 1 {
        return series.clone();
    }
    let samples = series.samples();
    let smoothed = (0..samples.len())
        .map(|i| {
            let chunk = &samples[i..i.saturating_add(window).min(samples.len())];
            let mean = chunk.iter().map(|s| s.value).sum::<f64>() / chunk.len() as f64;
            Sample::new(samples[i].timestamp, mean)
        })
        .collect();
    TimeSeries::from_unsorted(smoothed)
}

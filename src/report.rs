//! # Tide Chain Reporting
//!
//! Turns analysis results into something a person or another program can
//! consume: a fixed-width text table for the terminal, JSON, or CSV rows for
//! spreadsheets. Plotting and native spreadsheet encoding live elsewhere.
//!
//! Besides the extrema, the whole processed series (after filtering and the
//! datum transform) can be exported as `timestamp,value` rows.

use crate::chain::{Role, TideChain, TideEvent};
use crate::{Sample, TimeSeries};
use csv::Writer;
use serde::Serialize;
use std::fmt::Write as _;
use std::io;

/// Timestamp layout used in tables and CSV exports (matches the input files).
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// One exported row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub label: String,
    pub role: Role,
    pub timestamp: String,
    pub value: f64,
}

impl EventRow {
    fn numbered(samples: &[Sample], role: Role) -> Vec<EventRow> {
        samples
            .iter()
            .enumerate()
            .map(|(i, s)| EventRow {
                label: format!("{}{}", role.letter(), i + 1),
                role,
                timestamp: format_timestamp(s),
                value: s.value,
            })
            .collect()
    }
}

impl From<&TideEvent> for EventRow {
    fn from(event: &TideEvent) -> Self {
        EventRow {
            label: event.label(),
            role: event.role,
            timestamp: format_timestamp(&event.sample),
            value: event.sample.value,
        }
    }
}

/// JSON document: highs and lows as labelled rows.
#[derive(Debug, Serialize)]
struct ExtremaDocument {
    highs: Vec<EventRow>,
    lows: Vec<EventRow>,
}

/// One row of the processed-series export.
#[derive(Debug, Serialize)]
struct SeriesRow {
    timestamp: String,
    value: f64,
}

fn format_timestamp(sample: &Sample) -> String {
    sample.timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Format a level with two decimals and an explicit sign.
fn format_level(value: f64) -> String {
    format!("{:+.2}", value)
}

fn section(out: &mut String, title: &str, rows: &[(String, Sample)]) {
    let _ = writeln!(out, "{title}");
    if rows.is_empty() {
        let _ = writeln!(out, "  (none)");
        return;
    }
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (label, sample) in rows {
        let _ = writeln!(
            out,
            "  {:<width$}  {}  {:>9}",
            label,
            format_timestamp(sample),
            format_level(sample.value),
            width = width
        );
    }
}

/// Fixed-width table of a chain, highs first.
///
/// ```text
/// High tides (crests)
///   H1 (main)  08/21/2023 06:00:00      +1.00
/// Low tides (troughs)
///   L-1        08/21/2023 00:00:00      -1.00
/// ```
pub fn render_table(chain: &TideChain) -> String {
    let rows = |events: &[TideEvent]| -> Vec<(String, Sample)> {
        events.iter().map(|e| (e.label(), e.sample)).collect()
    };
    let highs = rows(&chain.highs);
    let lows = rows(&chain.lows);

    let mut out = String::new();
    section(&mut out, "High tides (crests)", &highs);
    section(&mut out, "Low tides (troughs)", &lows);
    out
}

/// Fixed-width table of the legacy top-N selection, numbered in time order.
pub fn render_top_n(highs: &[Sample], lows: &[Sample]) -> String {
    let numbered = |samples: &[Sample], letter: char| -> Vec<(String, Sample)> {
        samples
            .iter()
            .enumerate()
            .map(|(i, s)| (format!("{letter}{}", i + 1), *s))
            .collect()
    };
    let highs = numbered(highs, 'H');
    let lows = numbered(lows, 'L');

    let mut out = String::new();
    section(&mut out, "High tides (crests)", &highs);
    section(&mut out, "Low tides (troughs)", &lows);
    out
}

/// Pretty-printed JSON with `highs` and `lows` arrays.
pub fn to_json(chain: &TideChain) -> serde_json::Result<String> {
    let doc = ExtremaDocument {
        highs: chain.highs.iter().map(EventRow::from).collect(),
        lows: chain.lows.iter().map(EventRow::from).collect(),
    };
    serde_json::to_string_pretty(&doc)
}

/// JSON for the legacy top-N selection, rows labelled `H1..Hn` / `L1..Ln`.
pub fn top_n_to_json(highs: &[Sample], lows: &[Sample]) -> serde_json::Result<String> {
    let doc = ExtremaDocument {
        highs: EventRow::numbered(highs, Role::High),
        lows: EventRow::numbered(lows, Role::Low),
    };
    serde_json::to_string_pretty(&doc)
}

fn write_rows<W, T, I>(rows: I, out: W) -> csv::Result<()>
where
    W: io::Write,
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut writer = Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV export of all events in time order: `label,role,timestamp,value`.
pub fn write_csv<W: io::Write>(chain: &TideChain, out: W) -> csv::Result<()> {
    write_rows(chain.events().iter().map(EventRow::from), out)
}

/// CSV export of the legacy top-N selection, highs first.
pub fn write_top_n_csv<W: io::Write>(highs: &[Sample], lows: &[Sample], out: W) -> csv::Result<()> {
    let mut rows = EventRow::numbered(highs, Role::High);
    rows.extend(EventRow::numbered(lows, Role::Low));
    write_rows(rows, out)
}

/// CSV export of every sample: `timestamp,value`.
pub fn write_series_csv<W: io::Write>(series: &TimeSeries, out: W) -> csv::Result<()> {
    write_rows(
        series.samples().iter().map(|s| SeriesRow {
            timestamp: format_timestamp(s),
            value: s.value,
        }),
        out,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::analyze;
    use crate::ingest::{read_csv, IngestOptions};
    use crate::synthetic::SineWave;
    use crate::window::WindowParams;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 8, 21)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn test_chain() -> TideChain {
        let wave = SineWave {
            period_hours: 12.0,
            phase_hours: 3.0,
            ..SineWave::default()
        };
        let series = wave.sample(t0(), 24, 60);
        analyze(&series, &WindowParams::default(), 1e-6).unwrap().1
    }

    #[test]
    fn table_lists_every_event() {
        let table = render_table(&test_chain());
        assert!(table.contains("High tides (crests)"));
        assert!(table.contains("H1 (main)  08/21/2023 06:00:00      +1.00"));
        assert!(table.contains("L-1"));
        assert!(table.contains("08/21/2023 12:00:00"));
        assert!(table.contains("-1.00"));
    }

    #[test]
    fn empty_sections_say_none() {
        let table = render_table(&TideChain::default());
        assert_eq!(table.matches("(none)").count(), 2);
    }

    #[test]
    fn top_n_rows_are_numbered() {
        let s = Sample::new(t0(), 2.5);
        let table = render_top_n(&[s], &[]);
        assert!(table.contains("H1"));
        assert!(table.contains("+2.50"));
        assert!(table.contains("(none)"));
    }

    #[test]
    fn json_has_labelled_rows() {
        let json = to_json(&test_chain()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        let highs = parsed["highs"].as_array().unwrap();
        assert_eq!(highs[0]["label"], "H1 (main)");
        assert_eq!(highs[0]["role"], "high");
        assert_eq!(highs[0]["timestamp"], "08/21/2023 06:00:00");
        assert!(parsed["lows"].as_array().unwrap().len() >= 2);
    }

    #[test]
    fn csv_rows_follow_time_order() {
        let mut buf = Vec::new();
        write_csv(&test_chain(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "label,role,timestamp,value");
        assert!(lines[1].starts_with("L-1,low,08/21/2023 00:00:00,"));
        assert!(lines[2].starts_with("H1 (main),high,08/21/2023 06:00:00,"));
    }

    #[test]
    fn csv_export_reads_back() {
        let chain = test_chain();
        let mut buf = Vec::new();
        write_csv(&chain, &mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        let headers: Vec<&str> = reader.headers().unwrap().iter().collect();
        assert_eq!(headers, ["label", "role", "timestamp", "value"]);
        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        let events = chain.events();
        assert_eq!(records.len(), events.len());
        for (record, event) in records.iter().zip(&events) {
            assert_eq!(&record[0], event.label());
            let value: f64 = record[3].parse().unwrap();
            assert_eq!(value, event.sample.value);
        }
    }

    #[test]
    fn top_n_exports_number_rows_per_kind() {
        let highs = [Sample::new(t0(), 2.5), Sample::new(t0() + Duration::hours(30), 2.0)];
        let lows = [Sample::new(t0() + Duration::hours(6), -1.25)];

        let parsed: serde_json::Value =
            serde_json::from_str(&top_n_to_json(&highs, &lows).unwrap()).unwrap();
        assert_eq!(parsed["highs"][1]["label"], "H2");
        assert_eq!(parsed["highs"][1]["timestamp"], "08/22/2023 06:00:00");
        assert_eq!(parsed["lows"][0]["label"], "L1");
        assert_eq!(parsed["lows"][0]["value"], -1.25);

        let mut buf = Vec::new();
        write_top_n_csv(&highs, &lows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            [
                "label,role,timestamp,value",
                "H1,high,08/21/2023 00:00:00,2.5",
                "H2,high,08/22/2023 06:00:00,2.0",
                "L1,low,08/21/2023 06:00:00,-1.25",
            ]
        );
    }

    #[test]
    fn processed_series_can_be_ingested_again() {
        let series = SineWave::default().sample(t0(), 6, 30);
        let mut buf = Vec::new();
        write_series_csv(&series, &mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("timestamp,value\n08/21/2023 00:00:00,"));

        // Column 1 with a zero datum negates the level
        let options = IngestOptions {
            value_column: 1,
            ..IngestOptions::default()
        };
        let reread = read_csv(buf.as_slice(), &options).unwrap();
        assert_eq!(reread.len(), series.len());
        for (a, b) in reread.samples().iter().zip(series.samples()) {
            assert_eq!(a.timestamp, b.timestamp);
            assert_eq!(a.value, -b.value);
        }
    }
}

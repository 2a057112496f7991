//! # Tide Chain Core Library
//!
//! This library derives a "tide chain" from an irregular series of measured
//! water levels: an alternating run of high and low extrema spaced roughly a
//! fixed number of hours apart, anchored on the dominant high-to-low swing.
//!
//! ## Design Philosophy
//!
//! ### Immutable Input
//! - **Sorted once**: A [`TimeSeries`] is validated (or sorted) at construction
//!   and never mutated afterwards
//! - **Range queries**: Window lookups binary-search the sorted timestamps
//!   instead of scanning the whole series
//! - **Fresh output**: Every analysis produces a new [`chain::TideChain`]
//!
//! ### Data Flow
//! 1. **Ingest**: CSV rows → date filter → `constant − raw` transform → optional smoothing
//! 2. **Anchor**: pick the main high/low pair ([`anchor::select_anchor`])
//! 3. **Chain**: hop forward and backward from the anchor ([`chain::build_chain`])
//! 4. **Report**: text table, JSON or CSV export ([`report`])
//!
//! A legacy mode ([`top_n::select_top_n`]) greedily picks the N most extreme
//! samples that are at least a minimum gap apart.
//!
//! ## Core Types
//! - [`Sample`]: a single level measurement at an instant
//! - [`TimeSeries`]: an ascending, duplicate-free run of samples

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub mod anchor;
pub mod chain;
pub mod config;
pub mod error;
pub mod ingest;
pub mod report;
pub mod synthetic;
pub mod top_n;
pub mod window;

pub use error::ChainError;

/// A single water-level measurement.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_chain_lib::Sample;
///
/// let at = NaiveDate::from_ymd_opt(2023, 8, 21)
///     .unwrap()
///     .and_hms_opt(6, 0, 0)
///     .unwrap();
/// let sample = Sample::new(at, 3.2);
/// assert_eq!(sample.value, 3.2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Instant of the measurement (naive local time, as recorded by the gauge)
    pub timestamp: NaiveDateTime,
    /// Level after the datum transform
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Ordered, duplicate-free sequence of samples.
///
/// Every operation in this crate that assumes sortedness relies on the
/// constructor having checked it, so the inner vector is never exposed
/// mutably.
///
/// # Example
/// ```
/// use chrono::{Duration, NaiveDate};
/// use tide_chain_lib::{Sample, TimeSeries};
///
/// let t0 = NaiveDate::from_ymd_opt(2023, 8, 21).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let series = TimeSeries::new(vec![
///     Sample::new(t0, 1.0),
///     Sample::new(t0 + Duration::hours(1), 2.0),
///     Sample::new(t0 + Duration::hours(2), 0.5),
/// ])
/// .unwrap();
///
/// assert_eq!(series.len(), 3);
/// assert_eq!(series.range(t0, t0 + Duration::hours(1)).len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    /// Wrap already-ordered samples, rejecting out-of-order or duplicate timestamps.
    pub fn new(samples: Vec<Sample>) -> Result<Self, ChainError> {
        if let Some(index) = samples
            .windows(2)
            .position(|w| w[0].timestamp >= w[1].timestamp)
        {
            return Err(ChainError::Unsorted { index: index + 1 });
        }
        Ok(Self { samples })
    }

    /// Sort samples by timestamp and keep only the first sample for each instant.
    pub fn from_unsorted(mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.timestamp);
        samples.dedup_by_key(|s| s.timestamp);
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Samples whose timestamp lies in the closed interval `[start, end]`.
    ///
    /// Returns an empty slice when `start > end` or nothing falls inside.
    pub fn range(&self, start: NaiveDateTime, end: NaiveDateTime) -> &[Sample] {
        if start > end {
            return &[];
        }
        let lo = self.samples.partition_point(|s| s.timestamp < start);
        let hi = self.samples.partition_point(|s| s.timestamp <= end);
        &self.samples[lo..hi]
    }

    /// Lowest value in the series.
    pub fn min_value(&self) -> Option<f64> {
        self.samples.iter().map(|s| s.value).reduce(f64::min)
    }

    /// Highest sample; the earliest one wins when several share the maximum.
    pub fn max_sample(&self) -> Option<Sample> {
        self.samples.iter().copied().reduce(|best, s| {
            if s.value > best.value {
                s
            } else {
                best
            }
        })
    }
}

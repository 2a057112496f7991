//! # Legacy Top-N Extremum Selection
//!
//! Before chain building, extrema were chosen greedily: take the most extreme
//! sample, then the next most extreme one that is at least `min_gap_hours`
//! away (in either direction) from everything already chosen, and so on
//! until `n` samples are picked or candidates run out.

use crate::window::{check_hours, hours, ExtremumKind};
use crate::{ChainError, Sample, TimeSeries};
use log::debug;

/// Default number of extrema picked per kind.
pub const DEFAULT_COUNT: usize = 3;

/// Default minimum spacing between picked extrema.
pub const DEFAULT_MIN_GAP_HOURS: f64 = 24.0;

/// Pick up to `n` extrema of `kind` spaced at least `min_gap_hours` apart.
///
/// Candidates are ranked by value (descending for highs, ascending for
/// lows); equal values are ranked earliest first. The result is returned in
/// ascending time order.
///
/// # Example
/// ```
/// use chrono::{Duration, NaiveDate};
/// use tide_chain_lib::top_n::select_top_n;
/// use tide_chain_lib::window::ExtremumKind;
/// use tide_chain_lib::{Sample, TimeSeries};
///
/// let t0 = NaiveDate::from_ymd_opt(2023, 8, 21).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let series = TimeSeries::new(vec![
///     Sample::new(t0, 5.0),
///     Sample::new(t0 + Duration::hours(1), 4.9),
///     Sample::new(t0 + Duration::hours(30), 3.0),
/// ])
/// .unwrap();
///
/// let highs = select_top_n(&series, 3, 24.0, ExtremumKind::High).unwrap();
/// assert_eq!(highs.len(), 2); // the 4.9 sample is too close to 5.0
/// ```
pub fn select_top_n(
    series: &TimeSeries,
    n: usize,
    min_gap_hours: f64,
    kind: ExtremumKind,
) -> Result<Vec<Sample>, ChainError> {
    check_hours("min_gap_hours", min_gap_hours)?;
    let min_gap = hours(min_gap_hours);

    let mut candidates = series.samples().to_vec();
    candidates.sort_by(|a, b| {
        let by_value = match kind {
            ExtremumKind::High => b.value.total_cmp(&a.value),
            ExtremumKind::Low => a.value.total_cmp(&b.value),
        };
        by_value.then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    let mut selected: Vec<Sample> = Vec::with_capacity(n.min(series.len()));
    for candidate in candidates {
        if selected.len() == n {
            break;
        }
        let clear = selected.iter().all(|s| {
            let delta = candidate.timestamp - s.timestamp;
            delta >= min_gap || -delta >= min_gap
        });
        if clear {
            selected.push(candidate);
        }
    }

    debug!(
        "top-{n} {kind}: picked {} of {} samples",
        selected.len(),
        series.len()
    );
    selected.sort_by_key(|s| s.timestamp);
    Ok(selected)
}

//! # Windowed Extremum Lookup
//!
//! Every chain hop asks the same question: "within `gap ± tolerance` hours of
//! this instant, in this direction, which sample is the most extreme?"
//!
//! ```text
//!   backward window                 anchor                 forward window
//! [a-(gap+tol), a-(gap-tol)]          a          [a+(gap-tol), a+(gap+tol)]
//! ```
//!
//! Both ends of a window are inclusive. An empty window yields `None`, which
//! is an expected outcome rather than an error.

use crate::{ChainError, Sample, TimeSeries};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound accepted for hour parameters (a century).
const MAX_HOURS: f64 = 24.0 * 366.0 * 100.0;

/// Search direction relative to the anchor timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

impl FromStr for Direction {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" => Ok(Direction::Forward),
            "backward" | "back" | "bwd" => Ok(Direction::Backward),
            other => Err(ChainError::InvalidArgument(format!(
                "unknown direction '{other}' (expected forward or backward)"
            ))),
        }
    }
}

/// Which extremum to look for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtremumKind {
    High,
    Low,
}

impl ExtremumKind {
    /// True when `candidate` is strictly more extreme than `current`.
    fn beats(self, candidate: f64, current: f64) -> bool {
        match self {
            ExtremumKind::High => candidate > current,
            ExtremumKind::Low => candidate < current,
        }
    }
}

impl FromStr for ExtremumKind {
    type Err = ChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "crest" => Ok(ExtremumKind::High),
            "low" | "trough" => Ok(ExtremumKind::Low),
            other => Err(ChainError::InvalidArgument(format!(
                "unknown extremum kind '{other}' (expected high or low)"
            ))),
        }
    }
}

impl fmt::Display for ExtremumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtremumKind::High => write!(f, "high"),
            ExtremumKind::Low => write!(f, "low"),
        }
    }
}

/// Spacing between hops and the slack allowed around it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowParams {
    pub gap_hours: f64,
    pub tolerance_hours: f64,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            gap_hours: 6.0,
            tolerance_hours: 2.0,
        }
    }
}

impl WindowParams {
    /// Build and validate window parameters.
    pub fn new(gap_hours: f64, tolerance_hours: f64) -> Result<Self, ChainError> {
        let params = Self {
            gap_hours,
            tolerance_hours,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        check_hours("gap_hours", self.gap_hours)?;
        check_hours("tolerance_hours", self.tolerance_hours)
    }
}

/// Reject negative, non-finite or absurdly large hour counts.
pub(crate) fn check_hours(name: &str, hours: f64) -> Result<(), ChainError> {
    if !hours.is_finite() || !(0.0..=MAX_HOURS).contains(&hours) {
        return Err(ChainError::InvalidArgument(format!(
            "{name} must be a finite number between 0 and {MAX_HOURS}, got {hours}"
        )));
    }
    Ok(())
}

/// Convert fractional hours to a millisecond-resolution duration.
pub(crate) fn hours(h: f64) -> Duration {
    Duration::milliseconds((h * 3_600_000.0).round() as i64)
}

/// Closed time interval searched by one hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Window {
    /// Window `gap ± tolerance` hours away from `anchor` in `direction`.
    pub fn around(anchor: NaiveDateTime, direction: Direction, params: &WindowParams) -> Self {
        let near = hours(params.gap_hours - params.tolerance_hours);
        let far = hours(params.gap_hours + params.tolerance_hours);
        match direction {
            Direction::Forward => Window {
                start: anchor + near,
                end: anchor + far,
            },
            Direction::Backward => Window {
                start: anchor - far,
                end: anchor - near,
            },
        }
    }

    pub fn contains(&self, t: NaiveDateTime) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Most extreme sample inside the window around `anchor`.
///
/// Ties go to the earliest sample in the window. Returns `None` when no
/// sample falls inside.
///
/// # Example
/// ```
/// use chrono::{Duration, NaiveDate};
/// use tide_chain_lib::window::{find_extremum, Direction, ExtremumKind, WindowParams};
/// use tide_chain_lib::{Sample, TimeSeries};
///
/// let t0 = NaiveDate::from_ymd_opt(2023, 8, 21).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let series = TimeSeries::new(
///     (0..12).map(|h| Sample::new(t0 + Duration::hours(h), (h % 7) as f64)).collect(),
/// )
/// .unwrap();
///
/// let params = WindowParams::new(6.0, 2.0).unwrap();
/// let low = find_extremum(&series, t0, Direction::Forward, ExtremumKind::Low, &params);
/// assert_eq!(low.unwrap().value, 0.0); // hour 7
/// ```
pub fn find_extremum(
    series: &TimeSeries,
    anchor: NaiveDateTime,
    direction: Direction,
    kind: ExtremumKind,
    params: &WindowParams,
) -> Option<Sample> {
    let window = Window::around(anchor, direction, params);
    extremum_of(series.range(window.start, window.end), kind)
}

/// String-typed variant of [`find_extremum`] for callers holding raw
/// direction/kind names (configuration files, command lines).
pub fn find_extremum_by_name(
    series: &TimeSeries,
    anchor: NaiveDateTime,
    direction: &str,
    kind: &str,
    params: &WindowParams,
) -> Result<Option<Sample>, ChainError> {
    let direction = direction.parse::<Direction>()?;
    let kind = kind.parse::<ExtremumKind>()?;
    params.validate()?;
    Ok(find_extremum(series, anchor, direction, kind, params))
}

/// First-occurrence extremum of an ordered slice.
pub(crate) fn extremum_of(samples: &[Sample], kind: ExtremumKind) -> Option<Sample> {
    samples.iter().copied().reduce(|best, s| {
        if kind.beats(s.value, best.value) {
            s
        } else {
            best
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Hourly samples with the given values starting at `t0`.
    fn hourly(values: &[f64]) -> TimeSeries {
        TimeSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(h, &v)| Sample::new(t0() + Duration::hours(h as i64), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn forward_window_bounds_are_inclusive() {
        let params = WindowParams::new(6.0, 2.0).unwrap();
        let w = Window::around(t0(), Direction::Forward, &params);
        assert_eq!(w.start, t0() + Duration::hours(4));
        assert_eq!(w.end, t0() + Duration::hours(8));
        assert!(w.contains(w.start));
        assert!(w.contains(w.end));
    }

    #[test]
    fn backward_window_mirrors_forward() {
        let params = WindowParams::new(6.0, 2.0).unwrap();
        let anchor = t0() + Duration::hours(10);
        let w = Window::around(anchor, Direction::Backward, &params);
        assert_eq!(w.start, t0() + Duration::hours(2));
        assert_eq!(w.end, t0() + Duration::hours(6));
    }

    #[test]
    fn picks_boundary_sample_when_it_is_the_extreme() {
        // Hour 8 sits exactly on the far edge of the forward window
        let series = hourly(&[0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 9.0, 20.0]);
        let params = WindowParams::default();
        let high = find_extremum(&series, t0(), Direction::Forward, ExtremumKind::High, &params);
        assert_eq!(high.unwrap().timestamp, t0() + Duration::hours(8));
    }

    #[test]
    fn empty_window_returns_none() {
        let series = hourly(&[1.0, 2.0, 3.0]);
        let params = WindowParams::default();
        assert!(find_extremum(&series, t0(), Direction::Forward, ExtremumKind::High, &params).is_none());
        assert!(find_extremum(&series, t0(), Direction::Backward, ExtremumKind::Low, &params).is_none());
    }

    #[test]
    fn ties_resolve_to_earliest_sample() {
        let series = hourly(&[0.0, 0.0, 0.0, 0.0, 5.0, 3.0, 5.0, 5.0, 1.0]);
        let params = WindowParams::default();
        let high = find_extremum(&series, t0(), Direction::Forward, ExtremumKind::High, &params)
            .unwrap();
        assert_eq!(high.timestamp, t0() + Duration::hours(4));

        let series = hourly(&[9.0, 9.0, 9.0, 9.0, 2.0, -1.0, 4.0, -1.0, 3.0]);
        let low = find_extremum(&series, t0(), Direction::Forward, ExtremumKind::Low, &params)
            .unwrap();
        assert_eq!(low.timestamp, t0() + Duration::hours(5));
    }

    #[test]
    fn result_always_lies_inside_window() {
        let values: Vec<f64> = (0..48).map(|h| ((h * 37) % 11) as f64).collect();
        let series = hourly(&values);
        let params = WindowParams::new(5.0, 1.5).unwrap();
        for anchor_h in 0..48 {
            let anchor = t0() + Duration::hours(anchor_h);
            for direction in [Direction::Forward, Direction::Backward] {
                for kind in [ExtremumKind::High, ExtremumKind::Low] {
                    let window = Window::around(anchor, direction, &params);
                    let inside = series.range(window.start, window.end);
                    match find_extremum(&series, anchor, direction, kind, &params) {
                        Some(s) => {
                            assert!(window.contains(s.timestamp));
                            assert!(!inside.is_empty());
                        }
                        None => assert!(inside.is_empty()),
                    }
                }
            }
        }
    }

    #[test]
    fn unknown_names_are_invalid_arguments() {
        let series = hourly(&[1.0]);
        let params = WindowParams::default();
        let err = find_extremum_by_name(&series, t0(), "sideways", "high", &params).unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument(_)));
        let err = find_extremum_by_name(&series, t0(), "forward", "medium", &params).unwrap_err();
        assert!(matches!(err, ChainError::InvalidArgument(_)));
        assert!(find_extremum_by_name(&series, t0(), "Forward", "LOW", &params)
            .unwrap()
            .is_none());
    }

    #[test]
    fn rejects_negative_or_non_finite_hours() {
        assert!(WindowParams::new(-1.0, 2.0).is_err());
        assert!(WindowParams::new(6.0, f64::NAN).is_err());
        assert!(WindowParams::new(f64::INFINITY, 2.0).is_err());
        assert!(WindowParams::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn fractional_hours_are_honoured() {
        let params = WindowParams::new(1.5, 0.25).unwrap();
        let w = Window::around(t0(), Direction::Forward, &params);
        assert_eq!(w.start, t0() + Duration::minutes(75));
        assert_eq!(w.end, t0() + Duration::minutes(105));
    }
}

//! # Synthetic Water-Level Series
//!
//! Generates clean sinusoidal series for the `--demo` mode and for tests.
//! A single constituent is enough to exercise chain building: crests and
//! troughs alternate every half period.
//!
//! ## Model
//! ```text
//! level(t) = offset + amplitude * sin(2π (t - phase) / period)
//! ```
//! with `t` in hours since the first sample.

use crate::{Sample, TimeSeries};
use chrono::{Duration, NaiveDateTime};

/// Principal lunar semidiurnal period in hours.
pub const M2_PERIOD_HOURS: f64 = 12.42;

/// One sinusoidal constituent.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SineWave {
    pub period_hours: f64,
    pub amplitude: f64,
    pub offset: f64,
    /// Shift of the zero crossing, in hours
    pub phase_hours: f64,
}

impl Default for SineWave {
    fn default() -> Self {
        Self {
            period_hours: M2_PERIOD_HOURS,
            amplitude: 1.0,
            offset: 0.0,
            phase_hours: 0.0,
        }
    }
}

impl SineWave {
    /// Level `hours` after the start of the series.
    pub fn level_at(&self, hours: f64) -> f64 {
        let theta = std::f64::consts::TAU * (hours - self.phase_hours) / self.period_hours;
        self.offset + self.amplitude * theta.sin()
    }

    /// Sample the wave every `step_minutes` from `start` through `start + span_hours`.
    ///
    /// A zero step produces a single sample at `start`.
    pub fn sample(&self, start: NaiveDateTime, span_hours: u32, step_minutes: u32) -> TimeSeries {
        let total_minutes = i64::from(span_hours) * 60;
        let step = i64::from(step_minutes.max(1));
        let count = if step_minutes == 0 {
            1
        } else {
            (total_minutes / step + 1) as usize
        };

        let mut samples = Vec::with_capacity(count);
        for i in 0..count as i64 {
            let minutes = i * step;
            samples.push(Sample::new(
                start + Duration::minutes(minutes),
                self.level_at(minutes as f64 / 60.0),
            ));
        }
        TimeSeries::from_unsorted(samples)
    }
}

/// Zero-phase sinusoid sampled every `step_minutes` over `span_hours`.
pub fn sinusoid(
    start: NaiveDateTime,
    span_hours: u32,
    step_minutes: u32,
    period_hours: f64,
    amplitude: f64,
    offset: f64,
) -> TimeSeries {
    SineWave {
        period_hours,
        amplitude,
        offset,
        phase_hours: 0.0,
    }
    .sample(start, span_hours, step_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 24)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn hourly_series_spans_inclusive_range() {
        let series = sinusoid(t0(), 48, 60, 12.0, 1.0, 0.0);
        assert_eq!(series.len(), 49);
        assert_eq!(series.first().unwrap().timestamp, t0());
        assert_eq!(series.last().unwrap().timestamp, t0() + Duration::hours(48));
    }

    #[test]
    fn crest_and_trough_land_on_quarter_periods() {
        let series = sinusoid(t0(), 12, 60, 12.0, 2.0, 1.0);
        let at = |h: usize| series.samples()[h].value;
        assert!((at(3) - 3.0).abs() < 1e-12);
        assert!((at(9) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn phase_shifts_the_curve() {
        let wave = SineWave {
            period_hours: 12.0,
            phase_hours: 3.0,
            ..SineWave::default()
        };
        assert!((wave.level_at(0.0) + 1.0).abs() < 1e-12);
        assert!((wave.level_at(6.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn samples_are_chronologically_ordered() {
        let series = SineWave::default().sample(t0(), 24, 10);
        assert_eq!(series.len(), 145);
        for w in series.samples().windows(2) {
            assert_eq!(w[1].timestamp - w[0].timestamp, Duration::minutes(10));
        }
    }

    #[test]
    fn zero_step_yields_single_sample() {
        let series = SineWave::default().sample(t0(), 24, 0);
        assert_eq!(series.len(), 1);
    }
}

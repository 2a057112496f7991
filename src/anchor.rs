//! # Anchor Pair Selection
//!
//! The chain is seeded by the dominant high-to-low swing in the series: the
//! highest sample whose forward low window reaches the series' absolute low.
//!
//! Candidates are visited by value, highest first. Samples sharing a value are
//! visited earliest first, so the selection is deterministic. When no
//! candidate pairs with the absolute low, the global maximum is used and its
//! forward low (if any) becomes the main low.

use crate::window::{find_extremum, Direction, ExtremumKind, WindowParams};
use crate::{ChainError, Sample, TimeSeries};
use log::debug;
use serde::Serialize;

/// Default absolute tolerance when matching a forward low against the absolute low.
pub const DEFAULT_NUMERIC_TOLERANCE: f64 = 1e-6;

/// Main high/low pair used to seed chain extension.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AnchorPair {
    pub main_high: Sample,
    pub main_low: Option<Sample>,
    /// True when no candidate paired with the absolute low and the global
    /// maximum was used instead
    pub fallback: bool,
}

/// Pick the anchor pair for `series`.
///
/// # Errors
/// - [`ChainError::EmptySeries`] when the series has no samples
/// - [`ChainError::InvalidArgument`] for bad window parameters or a negative
///   or non-finite `numeric_tolerance`
pub fn select_anchor(
    series: &TimeSeries,
    params: &WindowParams,
    numeric_tolerance: f64,
) -> Result<AnchorPair, ChainError> {
    params.validate()?;
    if !numeric_tolerance.is_finite() || numeric_tolerance < 0.0 {
        return Err(ChainError::InvalidArgument(format!(
            "numeric_tolerance must be finite and non-negative, got {numeric_tolerance}"
        )));
    }

    let absolute_low = series.min_value().ok_or(ChainError::EmptySeries)?;

    let mut candidates = series.samples().to_vec();
    candidates.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    for candidate in &candidates {
        let forward_low = find_extremum(
            series,
            candidate.timestamp,
            Direction::Forward,
            ExtremumKind::Low,
            params,
        );
        if let Some(low) = forward_low {
            if (low.value - absolute_low).abs() <= numeric_tolerance {
                debug!(
                    "anchor paired: high {} ({:.3}) -> low {} ({:.3})",
                    candidate.timestamp, candidate.value, low.timestamp, low.value
                );
                return Ok(AnchorPair {
                    main_high: *candidate,
                    main_low: Some(low),
                    fallback: false,
                });
            }
        }
    }

    // No high reaches the absolute low within one hop
    let main_high = series.max_sample().ok_or(ChainError::EmptySeries)?;
    let main_low = find_extremum(
        series,
        main_high.timestamp,
        Direction::Forward,
        ExtremumKind::Low,
        params,
    );
    debug!(
        "anchor fallback: global max {} ({:.3}), forward low {:?}",
        main_high.timestamp, main_high.value, main_low
    );
    Ok(AnchorPair {
        main_high,
        main_low,
        fallback: true,
    })
}

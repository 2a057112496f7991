//! # Tide Chain Construction
//!
//! Starting from the anchor pair, the chain hops alternately high/low:
//!
//! ```text
//!   L-3 ← H-2 ← L-1 ← [H1 main] → [L1 main] → H2 → L3
//! ```
//!
//! Forward hops start from the main low, backward hops from the main high.
//! A missing hop stops only the hops that depend on it; events already found
//! stay in the result.

use crate::anchor::{select_anchor, AnchorPair};
use crate::window::{find_extremum, Direction, ExtremumKind, WindowParams};
use crate::{ChainError, Sample, TimeSeries};
use log::{debug, info};
use serde::Serialize;
use std::fmt;

/// Whether an event is a crest or a trough.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    High,
    Low,
}

impl Role {
    pub(crate) fn letter(self) -> char {
        match self {
            Role::High => 'H',
            Role::Low => 'L',
        }
    }
}

/// A sample tagged with its place in the chain.
///
/// `position` is relative to the anchor pair: the main high and main low are
/// both `1`, backward hops are negative (`L-1`, `H-2`, `L-3`) and forward
/// hops continue upward (`H2`, `L3`).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TideEvent {
    #[serde(flatten)]
    pub sample: Sample,
    pub role: Role,
    pub position: i8,
    pub main: bool,
}

impl TideEvent {
    fn new(sample: Sample, role: Role, position: i8) -> Self {
        Self {
            sample,
            role,
            position,
            main: false,
        }
    }

    fn main(sample: Sample, role: Role) -> Self {
        Self {
            sample,
            role,
            position: 1,
            main: true,
        }
    }

    /// Positional name such as `H1 (main)`, `L-1` or `L3`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TideEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.role.letter(), self.position)?;
        if self.main {
            write!(f, " (main)")?;
        }
        Ok(())
    }
}

/// Highs (up to 3) and lows (up to 4), each ascending by timestamp.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TideChain {
    pub highs: Vec<TideEvent>,
    pub lows: Vec<TideEvent>,
}

impl TideChain {
    pub fn is_empty(&self) -> bool {
        self.highs.is_empty() && self.lows.is_empty()
    }

    /// All events merged in time order.
    pub fn events(&self) -> Vec<TideEvent> {
        let mut all: Vec<TideEvent> = self.highs.iter().chain(&self.lows).copied().collect();
        all.sort_by_key(|e| e.sample.timestamp);
        all
    }

    pub fn main_high(&self) -> Option<&TideEvent> {
        self.highs.iter().find(|e| e.main)
    }

    pub fn main_low(&self) -> Option<&TideEvent> {
        self.lows.iter().find(|e| e.main)
    }
}

/// Extend the anchor pair into a full chain.
///
/// # Errors
/// - [`ChainError::EmptySeries`] when `main_high` is absent
/// - [`ChainError::InvalidArgument`] for bad window parameters
pub fn build_chain(
    series: &TimeSeries,
    main_high: Option<Sample>,
    main_low: Option<Sample>,
    params: &WindowParams,
) -> Result<TideChain, ChainError> {
    params.validate()?;
    let main_high = main_high.ok_or(ChainError::EmptySeries)?;
    let hop = |from: &Sample, direction, kind| {
        find_extremum(series, from.timestamp, direction, kind, params)
    };

    // Forward: L1 → H2 → L3
    let h2 = main_low
        .as_ref()
        .and_then(|l1| hop(l1, Direction::Forward, ExtremumKind::High));
    let l3 = h2
        .as_ref()
        .and_then(|h2| hop(h2, Direction::Forward, ExtremumKind::Low));

    // Backward: H1 → L-1 → H-2 → L-3
    let l_1 = hop(&main_high, Direction::Backward, ExtremumKind::Low);
    let h_2 = l_1
        .as_ref()
        .and_then(|l| hop(l, Direction::Backward, ExtremumKind::High));
    let l_3 = h_2
        .as_ref()
        .and_then(|h| hop(h, Direction::Backward, ExtremumKind::Low));

    debug!(
        "chain hops: H2={} L3={} L-1={} H-2={} L-3={}",
        h2.is_some(),
        l3.is_some(),
        l_1.is_some(),
        h_2.is_some(),
        l_3.is_some()
    );

    let highs = assemble([
        h_2.map(|s| TideEvent::new(s, Role::High, -2)),
        Some(TideEvent::main(main_high, Role::High)),
        h2.map(|s| TideEvent::new(s, Role::High, 2)),
    ]);
    let lows = assemble([
        l_3.map(|s| TideEvent::new(s, Role::Low, -3)),
        l_1.map(|s| TideEvent::new(s, Role::Low, -1)),
        main_low.map(|s| TideEvent::main(s, Role::Low)),
        l3.map(|s| TideEvent::new(s, Role::Low, 3)),
    ]);

    Ok(TideChain { highs, lows })
}

/// Keep present events, order by time and collapse events that landed on the
/// same sample (only possible when tolerance exceeds the gap).
fn assemble<const N: usize>(events: [Option<TideEvent>; N]) -> Vec<TideEvent> {
    let mut present: Vec<TideEvent> = events.into_iter().flatten().collect();
    present.sort_by_key(|e| e.sample.timestamp);
    present.dedup_by(|later, earlier| {
        if later.sample.timestamp == earlier.sample.timestamp {
            if later.main {
                *earlier = *later;
            }
            true
        } else {
            false
        }
    });
    present
}

/// Select the anchor pair and build the chain in one call.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use tide_chain_lib::chain::analyze;
/// use tide_chain_lib::synthetic::SineWave;
/// use tide_chain_lib::window::WindowParams;
///
/// let t0 = NaiveDate::from_ymd_opt(2023, 8, 21).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// // Troughs at 0h, 12h, 24h...; crests at 6h, 18h...
/// let wave = SineWave { period_hours: 12.0, phase_hours: 3.0, ..SineWave::default() };
/// let series = wave.sample(t0, 48, 60);
/// let (_, chain) = analyze(&series, &WindowParams::default(), 1e-6).unwrap();
///
/// assert!(chain.highs.iter().all(|e| e.sample.value > 0.9));
/// assert!(chain.lows.iter().all(|e| e.sample.value < -0.9));
/// ```
pub fn analyze(
    series: &TimeSeries,
    params: &WindowParams,
    numeric_tolerance: f64,
) -> Result<(AnchorPair, TideChain), ChainError> {
    let anchor = select_anchor(series, params, numeric_tolerance)?;
    let chain = build_chain(series, Some(anchor.main_high), anchor.main_low, params)?;
    info!(
        "tide chain: {} highs, {} lows{}",
        chain.highs.len(),
        chain.lows.len(),
        if anchor.fallback {
            " (anchored on global max)"
        } else {
            ""
        }
    );
    Ok((anchor, chain))
}

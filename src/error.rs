//! Error type shared by the analysis modules.
//!
//! An empty search window is not an error: lookups return `Option::None` and
//! callers skip the dependent chain hops.

use thiserror::Error;

/// Errors raised by chain building and extremum selection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    /// Unknown direction/kind string or an out-of-range numeric parameter
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No samples available to anchor a chain
    #[error("series is empty")]
    EmptySeries,

    /// Timestamp at `index` is not strictly after its predecessor
    #[error("series is not strictly ascending at sample {index}")]
    Unsorted { index: usize },
}

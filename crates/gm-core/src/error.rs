use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the ground-motion pipeline.
///
/// A chunk id with no coordinate file during the index scan is *not* an
/// error (chunks are allowed to be absent); `MissingDataFile` is reserved
/// for files that a resolved station guarantees must exist.
#[derive(Debug, Error)]
pub enum GmError {
    /// A file that must exist for a resolved station is absent — an
    /// index/resolver inconsistency, never silently substituted.
    #[error("missing data file: {path}")]
    MissingDataFile { path: PathBuf },

    /// No chunk coordinate file was found anywhere; the run cannot proceed.
    #[error("no station data found in any chunk coordinate file")]
    EmptyIndex,

    /// Percentile outside [0, 100 + 1e-9]; rejected before any computation.
    #[error("percentile for GMRotDpp must be between 0 and 100, got {0}")]
    InvalidPercentile(f64),

    /// Grid spacing must be positive and finite; anything else would
    /// degenerate into a nonsensical node count.
    #[error("grid spacing must be positive and finite, got {0}")]
    InvalidGridSpacing(f64),

    #[error("malformed coordinate row in {path} at line {line}")]
    MalformedCoordinate { path: PathBuf, line: usize },

    #[error("time step {requested} out of range ({available} steps available)")]
    TimeStepOutOfRange { requested: usize, available: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

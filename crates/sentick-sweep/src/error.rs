use sentick_core::{AlignmentError, ValidationError};
use thiserror::Error;

/// Errors that abort a whole sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("significance level must be in (0, 1), got {0}")]
    Significance(f64),

    #[error("invalid sweep config: {0}")]
    Config(#[from] serde_json::Error),
}

/// Why a single configuration produced no statistics.
///
/// Rejections are recorded against their configuration; the rest of the
/// sweep carries on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error("cannot aggregate sentiment: {0}")]
    Aggregation(#[from] ValidationError),
}

use thiserror::Error;

use crate::UtcDateTime;

/// Validation and input-contract errors exposed by `sentick-core`.
///
/// These signal malformed input from an upstream collaborator. They are
/// fatal for a run: every configuration evaluated on top of such input
/// would be untrustworthy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter: '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("timestamp out of range: {value}")]
    TimestampOutOfRange { value: i64 },

    #[error("invalid span '{value}', expected <count><unit> with unit one of s, m, h, d")]
    InvalidSpan { value: String },
    #[error("span '{field}' must be greater than zero")]
    ZeroSpan { field: &'static str },
    #[error("window {window} is not a multiple of the series period {period}")]
    IncompatibleWindow { window: String, period: String },

    #[error("samples must be sorted by timestamp: index {index} ({current}) precedes {previous}")]
    UnsortedInput {
        index: usize,
        previous: UtcDateTime,
        current: UtcDateTime,
    },
    #[error("duplicate sample timestamp {ts}; aggregate colliding samples explicitly")]
    DuplicateTimestamp { ts: UtcDateTime },
    #[error("sample at {ts} is not aligned to the series period {period}")]
    MisalignedSample { ts: UtcDateTime, period: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },
    #[error("price at {ts} must be strictly positive")]
    NonPositivePrice { ts: UtcDateTime },
    #[error("sentiment score {score} for post '{id}' is outside [-1, 1]")]
    ScoreOutOfRange { id: String, score: String },

    #[error("bar high must be >= low")]
    InvalidBarRange,
    #[error("bar open/close must be within high/low range")]
    InvalidBarBounds,

    #[error("sweep grid axis '{axis}' is empty")]
    EmptyGrid { axis: &'static str },
    #[error("fold_count must be at least 1")]
    InvalidFoldCount,
    #[error("min_rows {min_rows} is below the {required} rows the fold layout needs")]
    MinRowsBelowFolds { min_rows: usize, required: usize },
    #[error("need at least {required} rows, got {actual}")]
    InsufficientRows { required: usize, actual: usize },
}

/// Per-configuration alignment failures.
///
/// Unlike [`ValidationError`], these describe a misconfigured
/// window/lag combination and are reported against the configuration
/// that produced them without aborting a sweep.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AlignmentError {
    #[error(
        "buckets ending {first_bucket} and {second_bucket} both map to as_of {as_of}; \
         window/lag combination is ambiguous on this price grid"
    )]
    Ambiguous {
        as_of: UtcDateTime,
        first_bucket: UtcDateTime,
        second_bucket: UtcDateTime,
    },
    #[error("sentiment input must be a fixed-frequency (aggregated) series")]
    SeriesKind,
    #[error("invalid window spec: {0}")]
    Spec(ValidationError),
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Alignment(#[from] AlignmentError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

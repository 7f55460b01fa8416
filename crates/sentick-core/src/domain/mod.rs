//! # Domain Models
//!
//! Canonical value types shared by every sentick crate.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`UtcDateTime`] | UTC timestamp with epoch-grid arithmetic |
//! | [`Span`] | Non-negative duration (`15m`, `1h`, `7d`) |
//! | [`Symbol`] | Validated asset ticker |
//! | [`Bar`] | OHLCV bar from the market-data provider |
//! | [`ScoredPost`] | Post with its compound sentiment score |
//!
//! All constructors validate their invariants and return
//! [`ValidationError`](crate::ValidationError) on bad input.

mod models;
mod span;
mod symbol;
mod timestamp;

pub use models::{close_series, sentiment_series, Bar, ScoredPost};
pub use span::Span;
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;

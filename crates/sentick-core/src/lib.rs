//! # Sentick Core
//!
//! Time-series primitives and the leakage-safe alignment contract for the
//! Sentick sentiment/price sweep engine.
//!
//! ## Overview
//!
//! - **Validated series** of event-level or fixed-frequency samples
//! - **Aggregation** of sentiment into end-stamped buckets
//! - **Alignment** of buckets with future price moves, without look-ahead
//! - **Correlation statistics** with two-sided significance tests
//! - **Tabular export** of aligned rows and results
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`aggregate`] | Bucketed aggregation (tumbling and trailing windows) |
//! | [`align`] | Feature/label alignment and drop accounting |
//! | [`domain`] | Timestamps, spans, symbols, bars, scored posts |
//! | [`error`] | Core error types |
//! | [`provider`] | Price and sentiment collaborator traits |
//! | [`series`] | `TimeSeries` and the unordered `SampleStore` |
//! | [`stats`] | Pearson and Spearman correlation |
//! | [`table`] | Column/row export |
//!
//! ## Quick Start
//!
//! ```rust
//! use sentick_core::{aggregate, align, Sample, Span, Statistic, TimeSeries, UtcDateTime, WindowSpec};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let at = |s: &str| UtcDateTime::parse(s);
//! let posts = TimeSeries::events(vec![
//!     Sample::new(at("2024-01-01T00:10:00Z")?, 0.4),
//!     Sample::new(at("2024-01-01T00:50:00Z")?, 0.2),
//! ])?;
//! let prices = TimeSeries::fixed(
//!     Span::hours(1),
//!     vec![
//!         Sample::new(at("2024-01-01T01:00:00Z")?, 100.0),
//!         Sample::new(at("2024-01-01T02:00:00Z")?, 102.0),
//!     ],
//! )?;
//!
//! let buckets = aggregate(&posts, Span::hours(1), Statistic::Mean)?;
//! let spec = WindowSpec::new(Span::hours(1), Span::hours(1), Span::ZERO)?;
//! let table = align(&buckets, &prices, spec)?;
//!
//! assert_eq!(table.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Malformed input (unsorted samples, infinite values, bad spans) surfaces
//! as [`ValidationError`] and should abort a run. A window/lag combination
//! that cannot be aligned surfaces as [`AlignmentError`] and is reported
//! against that configuration only.

pub mod aggregate;
pub mod align;
pub mod domain;
pub mod error;
pub mod provider;
pub mod series;
pub mod stats;
pub mod table;

pub use aggregate::{aggregate, AggregationConfig, AggregationMode, Aggregator, EmptyBuckets, Statistic};
pub use align::{
    align, AlignConfig, AlignedRow, AlignedTable, Aligner, AlignmentReport, Direction, Label,
    Target, WindowSpec,
};
pub use domain::{close_series, sentiment_series, Bar, ScoredPost, Span, Symbol, UtcDateTime};
pub use error::{AlignmentError, CoreError, ValidationError};
pub use provider::{MarketDataProvider, ProviderError, SentimentProvider, StaticProvider};
pub use series::{FillReport, Sample, SampleStore, Sampling, TimeSeries};
pub use stats::{pearson, spearman, Correlation};
pub use table::{number_cell, Table, Tabular};

//! # Sentick Sweep
//!
//! Enumerates `(window, horizon, lag)` configurations, aligns sentiment
//! with prices under each one, and reports Pearson and Spearman
//! correlations with their significance.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`engine`] | Lazy and parallel sweep evaluation |
//! | [`error`] | Run-level errors and per-configuration rejections |
//! | [`grid`] | Parameter grid and [`SweepConfig`] |
//! | [`result`] | [`SweepResult`], [`SweepOutcome`], ranked [`SweepTable`] |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sentick_core::{Span, TimeSeries};
//! use sentick_sweep::{SweepConfig, SweepEngine};
//!
//! fn report(posts: &TimeSeries, prices: &TimeSeries) -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = SweepEngine::new(SweepConfig::from_json_str(
//!         r#"{ "grid": { "windows": ["1h", "4h"], "lags": ["0h", "2h"] }, "min_rows": 50 }"#,
//!     )?)?;
//!
//!     let table = engine.run(posts, prices)?;
//!     for result in table.significant_default().into_iter().take(5) {
//!         println!("{} r={:?} n={}", result.spec, result.pearson_r(), result.n);
//!     }
//!     assert!(table.get(sentick_core::WindowSpec::new(Span::hours(1), Span::hours(1), Span::ZERO)?).is_some());
//!     Ok(())
//! }
//! ```
//!
//! ## Failure model
//!
//! A malformed input series aborts the run with [`SweepError`]. A
//! configuration that cannot be aggregated or aligned becomes a
//! [`SweepOutcome::Rejected`] entry and the sweep carries on.

pub mod engine;
pub mod error;
pub mod grid;
pub mod result;

pub use engine::{sweep, AssetInputs, AssetSweep, SweepEngine, SweepIter};
pub use error::{Rejection, SweepError};
pub use grid::{SweepConfig, SweepGrid};
pub use result::{SweepOutcome, SweepResult, SweepTable};

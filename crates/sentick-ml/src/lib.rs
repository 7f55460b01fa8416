//! # Sentick ML
//!
//! Confirms a chosen sweep configuration out of sample with
//! expanding-window (forward-chaining) validation.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`features`] | [`FeatureMatrix`] from aligned rows, optional price context |
//! | [`folds`] | [`FoldPlan`] with label-overlap purging |
//! | [`metrics`] | Classification and regression scores |
//! | [`model`] | [`Classifier`]/[`Regressor`]/[`Interpretable`] capabilities and linear models |
//! | [`validator`] | [`Validator`], [`ValidationReport`] and the full-sample [`FinalModel`] |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sentick_core::{AlignedTable, Span};
//! use sentick_ml::{FeatureMatrix, LogisticRegression, Validator, ValidatorConfig};
//!
//! fn confirm(table: &AlignedTable, prices: &sentick_core::TimeSeries) -> Result<(), Box<dyn std::error::Error>> {
//!     let matrix = FeatureMatrix::with_price_context(table, prices, Span::hours(24))?;
//!     let validator = Validator::new(ValidatorConfig::default())?;
//!     let report = validator.validate_classifier(&matrix, LogisticRegression::default)?;
//!     let final_model = validator.fit_final_classifier(&matrix, LogisticRegression::default())?;
//!
//!     for fold in &report.folds {
//!         println!("fold {}: {:?}", fold.index, fold.metrics);
//!     }
//!     println!("weighted: {:?}", report.aggregate);
//!     println!("coefficients: {:?}", final_model.coefficients);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod features;
pub mod folds;
pub mod metrics;
pub mod model;
pub mod validator;

pub use error::{ModelError, ValidateError};
pub use features::FeatureMatrix;
pub use folds::{FoldPlan, FoldSplit};
pub use metrics::Metrics;
pub use model::{
    Classifier, Interpretable, LinearRegression, LogisticRegression, Regressor, TrainingConfig,
};
pub use validator::{
    validate, FinalModel, TimeRange, ValidationFold, ValidationReport, Validator, ValidatorConfig,
};

//! Chronological expanding-window validation of one configuration.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sentick_core::{
    number_cell, AlignedTable, CoreError, Table, Tabular, UtcDateTime, ValidationError, WindowSpec,
};

use crate::metrics::{classification_metrics, regression_metrics, Metrics};
use crate::{
    Classifier, FeatureMatrix, FoldPlan, FoldSplit, Interpretable, LogisticRegression, ModelError,
    Regressor, ValidateError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub fold_count: usize,
    /// Fewer aligned rows than this is an error.
    pub min_rows: usize,
    /// Size of the first training slice. `None` splits the data into
    /// `fold_count + 1` equal parts.
    pub min_train_rows: Option<usize>,
    /// Drop training rows whose label is realized after the test start.
    pub purge: bool,
    /// Fit folds on the rayon pool. Output order is chronological either
    /// way.
    pub parallel: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            fold_count: 5,
            min_rows: 200,
            min_train_rows: None,
            purge: true,
            parallel: false,
        }
    }
}

impl ValidatorConfig {
    /// Parse and validate a JSON config. Missing fields take their defaults.
    pub fn from_json_str(input: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fold_count == 0 {
            return Err(ValidationError::InvalidFoldCount);
        }
        let required = self.required_rows();
        if self.min_rows < required {
            return Err(ValidationError::MinRowsBelowFolds {
                min_rows: self.min_rows,
                required,
            });
        }
        Ok(())
    }

    /// Smallest row count that gives every fold a non-empty test slice.
    pub fn required_rows(&self) -> usize {
        self.min_train_rows
            .unwrap_or(1)
            .saturating_add(self.fold_count)
    }
}

/// Inclusive `as_of` bounds of a row slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: UtcDateTime,
    pub end: UtcDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFold {
    pub index: usize,
    pub train_range: TimeRange,
    pub test_range: TimeRange,
    pub train_rows: usize,
    pub purged: usize,
    pub test_rows: usize,
    pub metrics: Metrics,
}

impl Tabular for ValidationFold {
    fn columns() -> Vec<&'static str> {
        vec![
            "fold",
            "train_start",
            "train_end",
            "test_start",
            "test_end",
            "train_rows",
            "purged",
            "test_rows",
            "metrics",
        ]
    }

    fn row(&self) -> Vec<Value> {
        let metrics = self
            .metrics
            .iter()
            .map(|(name, value)| (name.clone(), number_cell(*value)))
            .collect();
        vec![
            Value::from(self.index),
            Value::String(self.train_range.start.to_string()),
            Value::String(self.train_range.end.to_string()),
            Value::String(self.test_range.start.to_string()),
            Value::String(self.test_range.end.to_string()),
            Value::from(self.train_rows),
            Value::from(self.purged),
            Value::from(self.test_rows),
            Value::Object(metrics),
        ]
    }
}

/// A model refit on every row, kept for reading its weights.
///
/// Fold metrics say whether the signal generalizes; these coefficients say
/// which feature carries it. They are in-sample and not a performance
/// estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalModel {
    /// `(feature name, standardized weight)` in column order.
    pub coefficients: Vec<(String, f64)>,
    pub intercept: f64,
    pub rows: usize,
}

impl FinalModel {
    fn from_model<M: Interpretable>(matrix: &FeatureMatrix, model: &M) -> Result<Self, ModelError> {
        let (Some(weights), Some(intercept)) = (model.coefficients(), model.intercept()) else {
            return Err(ModelError::NotFitted);
        };
        Ok(Self {
            coefficients: matrix
                .names()
                .iter()
                .map(|name| name.to_string())
                .zip(weights.iter().copied())
                .collect(),
            intercept,
            rows: matrix.len(),
        })
    }

    pub fn coefficient(&self, name: &str) -> Option<f64> {
        self.coefficients
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, weight)| *weight)
    }
}

/// Per-fold results and their test-size weighted mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub spec: WindowSpec,
    pub folds: Vec<ValidationFold>,
    pub aggregate: Metrics,
    /// Rows in the feature matrix.
    pub rows: usize,
    /// Full-sample refit, when one was requested.
    #[serde(default)]
    pub final_model: Option<FinalModel>,
}

impl ValidationReport {
    pub fn to_table(&self) -> Table {
        Table::from_records(&self.folds)
    }

    pub fn with_final_model(self, final_model: FinalModel) -> Self {
        Self {
            final_model: Some(final_model),
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Result<Self, ValidationError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> ValidatorConfig {
        self.config
    }

    /// Fit a fresh classifier per fold and score direction predictions.
    ///
    /// Labels above zero are the up class, so both return and direction
    /// targets work.
    pub fn validate_classifier<M, F>(
        &self,
        matrix: &FeatureMatrix,
        factory: F,
    ) -> Result<ValidationReport, ValidateError>
    where
        M: Classifier,
        F: Fn() -> M + Sync,
    {
        self.run(matrix, |split| {
            let (x_train, y_train) = matrix.select(&split.train);
            let (x_test, y_test) = matrix.select_range(split.test.clone());
            let y_train = y_train.mapv(up);
            let y_test = y_test.mapv(up);

            let mut model = factory();
            model.fit(x_train.view(), y_train.view())?;
            let predicted = model.predict(x_test.view())?;
            Ok(classification_metrics(y_test.view(), predicted.view()))
        })
    }

    pub fn validate_regressor<M, F>(
        &self,
        matrix: &FeatureMatrix,
        factory: F,
    ) -> Result<ValidationReport, ValidateError>
    where
        M: Regressor,
        F: Fn() -> M + Sync,
    {
        self.run(matrix, |split| {
            let (x_train, y_train) = matrix.select(&split.train);
            let (x_test, y_test) = matrix.select_range(split.test.clone());

            let mut model = factory();
            model.fit(x_train.view(), y_train.view())?;
            let predicted = model.predict(x_test.view())?;
            Ok(regression_metrics(y_test.view(), predicted.view()))
        })
    }

    /// Fit `model` on every row of `matrix` and read back its weights.
    pub fn fit_final_classifier<M>(&self, matrix: &FeatureMatrix, mut model: M) -> Result<FinalModel, ValidateError>
    where
        M: Classifier + Interpretable,
    {
        let labels = matrix.labels().mapv(up);
        model
            .fit(matrix.features(), labels.view())
            .map_err(ValidateError::FinalModel)?;
        self.final_model(matrix, &model)
    }

    pub fn fit_final_regressor<M>(&self, matrix: &FeatureMatrix, mut model: M) -> Result<FinalModel, ValidateError>
    where
        M: Regressor + Interpretable,
    {
        model
            .fit(matrix.features(), matrix.labels())
            .map_err(ValidateError::FinalModel)?;
        self.final_model(matrix, &model)
    }

    fn final_model<M: Interpretable>(&self, matrix: &FeatureMatrix, model: &M) -> Result<FinalModel, ValidateError> {
        let final_model = FinalModel::from_model(matrix, model).map_err(ValidateError::FinalModel)?;
        log::info!(
            "{}: final model on {} rows {:?}",
            matrix.spec(),
            final_model.rows,
            final_model.coefficients
        );
        Ok(final_model)
    }

    fn run<S>(&self, matrix: &FeatureMatrix, score: S) -> Result<ValidationReport, ValidateError>
    where
        S: Fn(&FoldSplit) -> Result<Metrics, ModelError> + Sync,
    {
        let plan = FoldPlan::new(matrix, &self.config)?;
        log::info!(
            "{}: validating {} rows over {} folds",
            matrix.spec(),
            matrix.len(),
            plan.len()
        );

        let evaluate = |split: &FoldSplit| -> Result<ValidationFold, ValidateError> {
            let fold = self.fold(matrix, split, &score)?;
            log::debug!(
                "{}: fold {} train={} purged={} test={} {:?}",
                matrix.spec(),
                fold.index,
                fold.train_rows,
                fold.purged,
                fold.test_rows,
                fold.metrics
            );
            Ok(fold)
        };

        let folds: Vec<ValidationFold> = if self.config.parallel {
            plan.splits().par_iter().map(evaluate).collect::<Result<_, _>>()?
        } else {
            plan.splits().iter().map(evaluate).collect::<Result<_, _>>()?
        };

        let aggregate = weighted_mean(&folds);
        log::info!("{}: validation finished {:?}", matrix.spec(), aggregate);
        Ok(ValidationReport {
            spec: matrix.spec(),
            folds,
            aggregate,
            rows: matrix.len(),
            final_model: None,
        })
    }

    fn fold<S>(&self, matrix: &FeatureMatrix, split: &FoldSplit, score: &S) -> Result<ValidationFold, ValidateError>
    where
        S: Fn(&FoldSplit) -> Result<Metrics, ModelError>,
    {
        let as_of = matrix.as_of();
        let model_error = |source| ValidateError::Model {
            fold: split.index,
            source,
        };

        let (Some(&train_first), Some(&train_last)) = (split.train.first(), split.train.last()) else {
            return Err(model_error(ModelError::EmptyTrainingSet));
        };
        let metrics = score(split).map_err(model_error)?;

        Ok(ValidationFold {
            index: split.index,
            train_range: TimeRange {
                start: as_of[train_first],
                end: as_of[train_last],
            },
            test_range: TimeRange {
                start: as_of[split.test.start],
                end: as_of[split.test.end - 1],
            },
            train_rows: split.train.len(),
            purged: split.purged,
            test_rows: split.test.len(),
            metrics,
        })
    }
}

/// Validate the sentiment feature alone with balanced logistic regression,
/// then refit on every row for the final coefficients.
pub fn validate(table: &AlignedTable, fold_count: usize) -> Result<ValidationReport, ValidateError> {
    let matrix = FeatureMatrix::from_table(table);
    let validator = Validator::new(ValidatorConfig {
        fold_count,
        ..ValidatorConfig::default()
    })?;
    let report = validator.validate_classifier(&matrix, LogisticRegression::default)?;
    let final_model = validator.fit_final_classifier(&matrix, LogisticRegression::default())?;
    Ok(report.with_final_model(final_model))
}

fn up(label: f64) -> f64 {
    if label > 0.0 {
        1.0
    } else {
        0.0
    }
}

fn weighted_mean(folds: &[ValidationFold]) -> Metrics {
    let total: usize = folds.iter().map(|fold| fold.test_rows).sum();
    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    for fold in folds {
        for (name, value) in &fold.metrics {
            *sums.entry(name.clone()).or_insert(0.0) += value * fold.test_rows as f64;
        }
    }
    if total > 0 {
        for value in sums.values_mut() {
            *value /= total as f64;
        }
    }
    sums
}

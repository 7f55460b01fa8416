//! Model capabilities and the built-in linear models.
//!
//! The validator only needs [`Classifier`] or [`Regressor`]; any model can
//! be plugged in. Both built-ins standardize features with statistics fit
//! on the training rows only and train by deterministic batch gradient
//! descent, so a fit is reproducible bit for bit.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Probability threshold for an `Up` prediction.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Binary classifier over labels `1.0` (up) and `0.0` (down).
pub trait Classifier {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>) -> Result<(), ModelError>;

    /// Probability of the `1.0` class per row.
    fn predict_probability(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError>;

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        Ok(self
            .predict_probability(features)?
            .mapv(|p| if p >= DECISION_THRESHOLD { 1.0 } else { 0.0 }))
    }
}

pub trait Regressor {
    fn fit(&mut self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<(), ModelError>;

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError>;
}

/// A fitted model whose decision is a weighted sum of its features.
pub trait Interpretable {
    /// Weights in standardized feature space, one per column; `None`
    /// before fitting. A positive weight pushes towards up.
    fn coefficients(&self) -> Option<ArrayView1<'_, f64>>;

    fn intercept(&self) -> Option<f64>;
}

/// Gradient-descent settings shared by the linear models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// L2 penalty on the weights (not the intercept).
    pub l2: f64,
    pub learning_rate: f64,
    pub iterations: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            l2: 0.01,
            learning_rate: 0.5,
            iterations: 500,
        }
    }
}

/// Column means and standard deviations from the training rows.
#[derive(Debug, Clone, PartialEq)]
struct Standardizer {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl Standardizer {
    fn fit(features: ArrayView2<'_, f64>) -> Self {
        let n = features.nrows().max(1) as f64;
        let mean = features.sum_axis(Axis(0)) / n;
        let scale = features
            .axis_iter(Axis(1))
            .zip(mean.iter())
            .map(|(column, &m)| {
                let std = (column.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();
        Self { mean, scale }
    }

    fn transform(&self, features: ArrayView2<'_, f64>) -> Array2<f64> {
        (&features - &self.mean) / &self.scale
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Linear {
    standardizer: Standardizer,
    weights: Array1<f64>,
    intercept: f64,
}

impl Linear {
    fn scores(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        check_columns(features, self.weights.len())?;
        Ok(self.standardizer.transform(features).dot(&self.weights) + self.intercept)
    }
}

/// Logistic regression with balanced class weights.
///
/// Each class contributes half of the loss regardless of its frequency,
/// so a model trained on a trending period does not collapse into always
/// predicting the majority direction.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: TrainingConfig,
    fitted: Option<Linear>,
}

impl LogisticRegression {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }
}

impl Interpretable for LogisticRegression {
    fn coefficients(&self) -> Option<ArrayView1<'_, f64>> {
        self.fitted.as_ref().map(|fitted| fitted.weights.view())
    }

    fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|fitted| fitted.intercept)
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, features: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>) -> Result<(), ModelError> {
        check_training(features, labels)?;
        let positives = labels.iter().filter(|&&y| y > 0.5).count();
        let n = labels.len();
        if positives == 0 || positives == n {
            return Err(ModelError::SingleClass);
        }

        let positive_weight = n as f64 / (2.0 * positives as f64);
        let negative_weight = n as f64 / (2.0 * (n - positives) as f64);
        let sample_weights = labels.mapv(|y| if y > 0.5 { positive_weight } else { negative_weight });
        let targets = labels.mapv(|y| if y > 0.5 { 1.0 } else { 0.0 });

        let standardizer = Standardizer::fit(features);
        let x = standardizer.transform(features);
        let mut weights = Array1::<f64>::zeros(x.ncols());
        let mut intercept = 0.0;

        for _ in 0..self.config.iterations {
            let probabilities = (x.dot(&weights) + intercept).mapv(sigmoid);
            let residual = (probabilities - &targets) * &sample_weights;
            let gradient = (x.t().dot(&residual) + &weights * self.config.l2) / n as f64;
            let intercept_gradient = residual.sum() / n as f64;
            weights = weights - gradient * self.config.learning_rate;
            intercept -= intercept_gradient * self.config.learning_rate;
        }

        self.fitted = Some(Linear {
            standardizer,
            weights,
            intercept,
        });
        Ok(())
    }

    fn predict_probability(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        let fitted = self.fitted.as_ref().ok_or(ModelError::NotFitted)?;
        Ok(fitted.scores(features)?.mapv(sigmoid))
    }
}

/// Ridge regression on standardized features.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    config: TrainingConfig,
    fitted: Option<Linear>,
}

impl LinearRegression {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            fitted: None,
        }
    }
}

impl Interpretable for LinearRegression {
    fn coefficients(&self) -> Option<ArrayView1<'_, f64>> {
        self.fitted.as_ref().map(|fitted| fitted.weights.view())
    }

    fn intercept(&self) -> Option<f64> {
        self.fitted.as_ref().map(|fitted| fitted.intercept)
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<(), ModelError> {
        check_training(features, targets)?;
        let n = targets.len() as f64;

        let standardizer = Standardizer::fit(features);
        let x = standardizer.transform(features);
        let mut weights = Array1::<f64>::zeros(x.ncols());
        let intercept = targets.sum() / n;

        for _ in 0..self.config.iterations {
            let residual = x.dot(&weights) + intercept - &targets;
            let gradient = (x.t().dot(&residual) + &weights * self.config.l2) / n;
            weights = weights - gradient * self.config.learning_rate;
        }

        self.fitted = Some(Linear {
            standardizer,
            weights,
            intercept,
        });
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>, ModelError> {
        self.fitted.as_ref().ok_or(ModelError::NotFitted)?.scores(features)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn check_training(features: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>) -> Result<(), ModelError> {
    if features.nrows() == 0 {
        return Err(ModelError::EmptyTrainingSet);
    }
    if features.nrows() != labels.len() {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{} labels", features.nrows()),
            actual: format!("{} labels", labels.len()),
        });
    }
    Ok(())
}

fn check_columns(features: ArrayView2<'_, f64>, expected: usize) -> Result<(), ModelError> {
    if features.ncols() != expected {
        return Err(ModelError::ShapeMismatch {
            expected: format!("{expected} feature columns"),
            actual: format!("{} feature columns", features.ncols()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn logistic_regression_separates_classes() {
        let x = array![[-2.0], [-1.5], [-1.0], [-0.5], [0.5], [1.0], [1.5], [2.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let mut model = LogisticRegression::default();

        model.fit(x.view(), y.view()).expect("fit");
        let predictions = model.predict(x.view()).expect("predict");

        assert_eq!(predictions, y);
        assert!(model.coefficients().expect("fitted")[0] > 0.0);
    }

    #[test]
    fn balanced_weights_keep_minority_class_alive() {
        // 2 ups among 10 rows; the ups sit at the high end.
        let x = array![[0.0], [0.1], [0.2], [0.3], [0.4], [0.5], [0.6], [0.7], [1.8], [2.0]];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0];
        let mut model = LogisticRegression::default();

        model.fit(x.view(), y.view()).expect("fit");
        let predictions = model.predict(array![[1.9], [0.0]].view()).expect("predict");

        assert_eq!(predictions, array![1.0, 0.0]);
    }

    #[test]
    fn rejects_single_class_and_unfitted_use() {
        let x = array![[1.0], [2.0]];
        let mut model = LogisticRegression::default();

        assert_eq!(
            model.predict_probability(x.view()).expect_err("unfitted"),
            ModelError::NotFitted
        );
        assert_eq!(
            model.fit(x.view(), array![1.0, 1.0].view()).expect_err("single class"),
            ModelError::SingleClass
        );
        assert_eq!(
            model
                .fit(Array2::<f64>::zeros((0, 1)).view(), Array1::<f64>::zeros(0).view())
                .expect_err("empty"),
            ModelError::EmptyTrainingSet
        );
    }

    #[test]
    fn prediction_checks_column_count() {
        let mut model = LogisticRegression::default();
        model
            .fit(array![[0.0], [1.0]].view(), array![0.0, 1.0].view())
            .expect("fit");

        let err = model
            .predict(array![[0.0, 1.0]].view())
            .expect_err("shape");

        assert!(matches!(err, ModelError::ShapeMismatch { .. }));
    }

    #[test]
    fn linear_regression_recovers_a_line() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let y = array![1.0, 3.0, 5.0, 7.0, 9.0];
        let mut model = LinearRegression::new(TrainingConfig {
            l2: 0.0,
            learning_rate: 0.1,
            iterations: 2000,
        });

        model.fit(x.view(), y.view()).expect("fit");
        let predicted = model.predict(array![[5.0]].view()).expect("predict");

        assert!((predicted[0] - 11.0).abs() < 1e-6, "got {}", predicted[0]);
        assert_eq!(model.intercept(), Some(5.0));
    }

    #[test]
    fn constant_columns_do_not_blow_up() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = LogisticRegression::default();

        model.fit(x.view(), y.view()).expect("fit");
        let probabilities = model.predict_probability(x.view()).expect("predict");

        assert!(probabilities.iter().all(|p| p.is_finite()));
        assert!(probabilities[3] > probabilities[0]);
    }
}

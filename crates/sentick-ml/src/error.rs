use sentick_core::ValidationError;
use thiserror::Error;

/// Fit/predict failures of a model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("model must be fitted before predicting")]
    NotFitted,
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
    #[error("training labels contain a single class")]
    SingleClass,
    #[error("training set is empty")]
    EmptyTrainingSet,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("fold {fold}: {source}")]
    Model {
        fold: usize,
        #[source]
        source: ModelError,
    },

    #[error("final model: {0}")]
    FinalModel(#[source] ModelError),
}

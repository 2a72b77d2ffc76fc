use std::{error::Error, fmt};

use crate::DataError;

/// The result type used across the estimators.
pub type Result<T> = std::result::Result<T, MlError>;

/// Errors produced by estimators when inputs or hyperparameters are invalid.
#[derive(Debug)]
pub enum MlError {
    /// An input is invalid for semantic or domain reasons.
    InvalidInput(&'static str),

    /// A shape invariant was violated (e.g. mismatched feature counts).
    ShapeMismatch {
        /// Human-readable context for the mismatch (e.g. "features").
        what: &'static str,
        /// Observed value.
        got: usize,
        /// Expected value.
        expected: usize,
    },

    /// The estimator does not accept a hyperparameter with this name.
    UnknownParam { model: &'static str, param: String },

    /// The hyperparameter exists but the value has the wrong type or range.
    InvalidParam {
        model: &'static str,
        param: &'static str,
        value: String,
    },

    /// `predict` was called before a successful `fit`.
    NotFitted(&'static str),

    /// The dataset handed to the estimator is malformed.
    Data(DataError),
}

impl fmt::Display for MlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            MlError::ShapeMismatch {
                what,
                got,
                expected,
            } => {
                write!(f, "shape mismatch for {what}: got {got}, expected {expected}")
            }
            MlError::UnknownParam { model, param } => {
                write!(f, "{model} has no hyperparameter named '{param}'")
            }
            MlError::InvalidParam {
                model,
                param,
                value,
            } => write!(f, "invalid value {value} for {model}.{param}"),
            MlError::NotFitted(model) => write!(f, "{model} must be fitted before predicting"),
            MlError::Data(e) => write!(f, "data error: {e}"),
        }
    }
}

impl Error for MlError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlError::Data(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DataError> for MlError {
    fn from(value: DataError) -> Self {
        Self::Data(value)
    }
}

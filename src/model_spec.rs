use ml_core::{Classifier, DataError, Dataset, MlError, ParamSet};
use rand::Rng;
use serde::Serialize;

use crate::{
    error::{RegistryErr, Result},
    grid::ParamGrid,
    kind::{ClassifierBuilder, ClassifierKind},
};

/// One entry of a catalog: an estimator and the space to search it over.
#[derive(Debug)]
pub struct ModelSpec {
    /// Unique key of the entry within its catalog.
    pub name: String,
    pub kind: ClassifierKind,
    /// Unfitted estimator with default hyperparameters.
    pub classifier: Box<dyn Classifier>,
    pub params: ParamGrid,
    /// Fraction of the dataset a grid sweep should use, `None` for all of it.
    pub test_run_size: Option<f64>,
}

/// Serializable description of a `ModelSpec`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub name: String,
    pub classifier: ClassifierKind,
    pub estimator: &'static str,
    pub params: ParamGrid,
    pub test_run_size: Option<f64>,
    pub combinations: usize,
}

impl ModelSpec {
    /// Creates a new `ModelSpec` with an empty grid that uses the whole
    /// dataset.
    ///
    /// # Arguments
    /// * `name` - The key of the entry.
    /// * `kind` - The estimator to build.
    /// * `builder` - Creates the estimator instance.
    pub fn new(name: impl Into<String>, kind: ClassifierKind, builder: &ClassifierBuilder) -> Self {
        Self {
            name: name.into(),
            kind,
            classifier: builder.build(kind),
            params: ParamGrid::new(),
            test_run_size: None,
        }
    }

    pub fn with_params(mut self, params: ParamGrid) -> Self {
        self.params = params;
        self
    }

    pub fn with_test_run_size(mut self, test_run_size: Option<f64>) -> Self {
        self.test_run_size = test_run_size;
        self
    }

    /// Returns an unfitted estimator with `combination` applied over the
    /// entry's defaults.
    ///
    /// # Errors
    /// The estimator's error for the first hyperparameter it rejects.
    pub fn trial(&self, combination: &ParamSet) -> ml_core::Result<Box<dyn Classifier>> {
        let mut classifier = self.classifier.fresh();
        classifier.set_params(combination)?;
        Ok(classifier)
    }

    /// Returns every grid point paired with its estimator, in grid order.
    pub fn trials(
        &self,
    ) -> impl Iterator<Item = (ParamSet, ml_core::Result<Box<dyn Classifier>>)> + '_ {
        self.params.combinations().map(|combination| {
            let trial = self.trial(&combination);
            (combination, trial)
        })
    }

    /// Returns the amount of rows a sweep should use out of `n`, the same
    /// amount `sample` draws.
    ///
    /// # Errors
    /// `DataError::InvalidFraction` if `test_run_size` is out of `(0, 1]`.
    pub fn sample_size(&self, n: usize) -> std::result::Result<usize, DataError> {
        match self.test_run_size {
            Some(fraction) => ml_core::sample_size(n, fraction),
            None => Ok(n),
        }
    }

    /// Draws the portion of `data` a sweep of this entry should run on.
    ///
    /// # Errors
    /// `DataError::InvalidFraction` if `test_run_size` is out of `(0, 1]`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        data: &Dataset,
        rng: &mut R,
    ) -> ml_core::Result<Dataset> {
        match self.test_run_size {
            Some(fraction) => Ok(data.subsample(fraction, rng)?),
            None => Ok(data.clone()),
        }
    }

    /// Checks the entry without fitting anything.
    ///
    /// # Errors
    /// - `RegistryErr::InvalidTestRunSize` if the fraction is out of `(0, 1]`.
    /// - `RegistryErr::EmptyAxis` if an axis has no candidates.
    /// - `RegistryErr::Ml` if an axis is not among the estimator's accepted
    ///   hyperparameters or the estimator rejects any of its values.
    pub fn validate(&self) -> Result<()> {
        if let Some(value) = self.test_run_size {
            if !(value > 0.0 && value <= 1.0) {
                return Err(RegistryErr::InvalidTestRunSize {
                    model: self.name.clone(),
                    value,
                });
            }
        }

        for (param, values) in self.params.axes() {
            if values.is_empty() {
                return Err(RegistryErr::EmptyAxis {
                    model: self.name.clone(),
                    param: param.to_string(),
                });
            }

            if !self.classifier.accepted_params().contains(&param) {
                return Err(RegistryErr::Ml(MlError::UnknownParam {
                    model: self.classifier.name(),
                    param: param.to_string(),
                }));
            }

            for value in values {
                self.classifier.fresh().set_param(param, value)?;
            }
        }

        Ok(())
    }

    pub fn summary(&self) -> ModelSummary {
        ModelSummary {
            name: self.name.clone(),
            classifier: self.kind,
            estimator: self.classifier.name(),
            params: self.params.clone(),
            test_run_size: self.test_run_size,
            combinations: self.params.num_combinations(),
        }
    }
}

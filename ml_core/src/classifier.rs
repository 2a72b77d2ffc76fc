use std::fmt::Debug;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::{Dataset, MlError, ParamSet, ParamValue, Result};

/// A supervised classification estimator.
///
/// A `Classifier` is created untrained with default hyperparameters, tuned by
/// name through `set_param`, then fitted once and used for predictions.
/// Fitting mutates the estimator, so a grid search must use one instance per
/// trial; `fresh` hands out an unfitted copy with the same hyperparameters.
pub trait Classifier: Send + Sync + Debug {
    /// Returns the name of the estimator (e.g. "RandomForestClassifier").
    fn name(&self) -> &'static str;

    /// Returns the hyperparameter names `set_param` understands.
    fn accepted_params(&self) -> &'static [&'static str];

    /// Sets a single hyperparameter.
    ///
    /// # Errors
    /// - `MlError::UnknownParam` if `name` is not in `accepted_params`.
    /// - `MlError::InvalidParam` if `value` has the wrong type or range.
    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()>;

    /// Sets every hyperparameter of a grid point, stopping at the first error.
    fn set_params(&mut self, params: &ParamSet) -> Result<()> {
        params
            .iter()
            .try_for_each(|(name, value)| self.set_param(name, value))
    }

    /// Fits the estimator, discarding the result of any previous fit.
    ///
    /// # Errors
    /// Returns an `MlError` if the dataset cannot be learned from (e.g. a
    /// single class).
    fn fit(&mut self, data: &Dataset) -> Result<()>;

    /// Predicts a label for every row of `x`.
    ///
    /// # Errors
    /// - `MlError::NotFitted` before a successful `fit`.
    /// - `MlError::ShapeMismatch` if `x` has a different amount of features.
    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>>;

    /// Returns the mean accuracy of the predictions over `data`.
    fn score(&self, data: &Dataset) -> Result<f64> {
        let predictions = self.predict(data.x())?;
        let hits = predictions
            .iter()
            .zip(data.y())
            .filter(|(pred, label)| pred == label)
            .count();

        Ok(hits as f64 / data.len() as f64)
    }

    /// Returns an unfitted copy with the same hyperparameters.
    fn fresh(&self) -> Box<dyn Classifier>;
}

pub(crate) fn unknown_param(model: &'static str, name: &str) -> MlError {
    MlError::UnknownParam {
        model,
        param: name.to_string(),
    }
}

pub(crate) fn check_features(n_features: usize, x: ArrayView2<f64>) -> Result<()> {
    if x.ncols() != n_features {
        return Err(MlError::ShapeMismatch {
            what: "features",
            got: x.ncols(),
            expected: n_features,
        });
    }
    Ok(())
}

/// Fails when the dataset holds a single class, nothing to discriminate.
pub(crate) fn check_classes(classes: &[usize]) -> Result<()> {
    if classes.len() < 2 {
        return Err(MlError::InvalidInput("at least two classes are needed to fit a classifier"));
    }
    Ok(())
}

/// Index of the largest value, the first one on ties.
pub(crate) fn argmax(values: ArrayView1<f64>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best, max), (i, &v)| {
            if v > max { (i, v) } else { (best, max) }
        })
        .0
}

/// Turns every row of raw scores into probabilities in place.
pub(crate) fn softmax_rows(scores: &mut Array2<f64>) {
    for mut row in scores.rows_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
}

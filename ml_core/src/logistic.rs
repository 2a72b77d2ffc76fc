use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::{
    Classifier, Dataset, MlError, ParamValue, Result,
    classifier::{argmax, check_classes, check_features, softmax_rows, unknown_param},
    data::encode_labels,
    param,
};

const NAME: &str = "LogisticRegression";

const PARAMS: &[&str] = &["C", "tol", "max_iter", "fit_intercept"];

/// Multinomial logistic regression with an L2 penalty.
///
/// Minimizes `mean(cross_entropy) + |W|^2 / (2 * C * n)` by full-batch
/// gradient descent with a step of `1 / L`, `L` being an upper bound of the
/// gradient's Lipschitz constant. Training stops once every gradient
/// component is below `tol` or after `max_iter` steps.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    c: f64,
    tol: f64,
    max_iter: usize,
    fit_intercept: bool,
    fitted: Option<Linear>,
}

#[derive(Debug, Clone)]
struct Linear {
    classes: Vec<usize>,
    /// `n_features x n_classes`.
    weights: Array2<f64>,
    intercept: Array1<f64>,
    iterations: usize,
}

impl LogisticRegression {
    /// Creates a new `LogisticRegression` with `C = 1` and `tol = 1e-4`.
    pub fn new() -> Self {
        Self {
            c: 1.0,
            tol: 1e-4,
            max_iter: 1000,
            fit_intercept: true,
            fitted: None,
        }
    }

    pub fn c(&self) -> f64 {
        self.c
    }

    pub fn tol(&self) -> f64 {
        self.tol
    }

    /// Returns the amount of gradient steps the last fit took.
    pub fn n_iter(&self) -> Option<usize> {
        self.fitted.as_ref().map(|linear| linear.iterations)
    }

    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let linear = self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?;
        check_features(linear.weights.nrows(), x)?;

        let mut scores = x.dot(&linear.weights) + &linear.intercept;
        softmax_rows(&mut scores);
        Ok(scores)
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &'static str {
        NAME
    }

    fn accepted_params(&self) -> &'static [&'static str] {
        PARAMS
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "C" => self.c = param::positive_f64(NAME, "C", value)?,
            "tol" => self.tol = param::positive_f64(NAME, "tol", value)?,
            "max_iter" => self.max_iter = param::at_least(NAME, "max_iter", value, 1)?,
            "fit_intercept" => self.fit_intercept = param::flag(NAME, "fit_intercept", value)?,
            other => return Err(unknown_param(NAME, other)),
        }
        Ok(())
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.fitted = None;

        let classes = data.classes();
        check_classes(&classes)?;

        let x = data.x();
        let (n, d) = x.dim();
        let k = classes.len();
        let nf = n as f64;

        let mut one_hot = Array2::<f64>::zeros((n, k));
        encode_labels(data.y(), &classes)
            .into_iter()
            .enumerate()
            .for_each(|(i, c)| one_hot[[i, c]] = 1.0);

        let penalty = 1.0 / (self.c * nf);
        let max_norm = x
            .rows()
            .into_iter()
            .map(|row| row.dot(&row))
            .fold(0.0, f64::max);
        let intercept_norm = if self.fit_intercept { 1.0 } else { 0.0 };
        let step = 1.0 / (0.5 * (max_norm + intercept_norm) + penalty);

        let mut weights = Array2::<f64>::zeros((d, k));
        let mut intercept = Array1::<f64>::zeros(k);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iter {
            let mut residuals = x.dot(&weights) + &intercept;
            softmax_rows(&mut residuals);
            residuals -= &one_hot;

            let grad_w = x.t().dot(&residuals) / nf + &weights * penalty;
            let grad_b = residuals
                .mean_axis(Axis(0))
                .ok_or(MlError::InvalidInput("cannot fit an empty dataset"))?;

            let grad_max = grad_w
                .iter()
                .chain(grad_b.iter().filter(|_| self.fit_intercept))
                .fold(0.0_f64, |m, g| m.max(g.abs()));
            if grad_max < self.tol {
                converged = true;
                break;
            }

            weights.scaled_add(-step, &grad_w);
            if self.fit_intercept {
                intercept.scaled_add(-step, &grad_b);
            }
            iterations += 1;
        }

        if !converged {
            log::warn!(
                "{NAME}: did not converge in {} iterations (C={}, tol={})",
                self.max_iter,
                self.c,
                self.tol
            );
        }

        self.fitted = Some(Linear {
            classes,
            weights,
            intercept,
            iterations,
        });
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        let classes = &self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?.classes;

        Ok(proba.rows().into_iter().map(|row| classes[argmax(row)]).collect())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(Self {
            fitted: None,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{blobs, three_blobs};

    #[test]
    fn learns_separable_blobs() {
        let data = blobs();
        let mut lr = LogisticRegression::new();
        lr.fit(&data).unwrap();
        assert_eq!(lr.score(&data).unwrap(), 1.0);
    }

    #[test]
    fn learns_three_classes() {
        let data = three_blobs();
        let mut lr = LogisticRegression::new();
        lr.set_param("C", &ParamValue::Float(1e2)).unwrap();
        lr.fit(&data).unwrap();
        assert_eq!(lr.score(&data).unwrap(), 1.0);
    }

    #[test]
    fn loose_tolerance_stops_early() {
        let data = blobs();
        let mut loose = LogisticRegression::new();
        loose.set_param("tol", &ParamValue::Float(1e-1)).unwrap();
        loose.fit(&data).unwrap();

        let mut strict = LogisticRegression::new();
        strict.set_param("tol", &ParamValue::Float(1e-6)).unwrap();
        strict.fit(&data).unwrap();

        assert!(loose.n_iter().unwrap() < strict.n_iter().unwrap());
    }

    #[test]
    fn accepts_integer_c() {
        let mut lr = LogisticRegression::new();
        lr.set_param("C", &ParamValue::Int(10)).unwrap();
        assert_eq!(lr.c(), 10.0);
        assert!(lr.set_param("C", &ParamValue::Float(-1.0)).is_err());
        assert!(matches!(
            lr.set_param("penalty", &ParamValue::Tag("l1".into())),
            Err(MlError::UnknownParam { .. })
        ));
    }
}

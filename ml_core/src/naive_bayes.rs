use std::f64::consts::PI;

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::{
    Classifier, Dataset, MlError, ParamValue, Result,
    classifier::{argmax, check_classes, check_features, unknown_param},
    param,
};

const NAME: &str = "GaussianNB";

const PARAMS: &[&str] = &["var_smoothing"];

/// Gaussian naive Bayes.
///
/// Every feature is modeled as an independent normal distribution per class.
/// `var_smoothing` times the largest feature variance is added to every
/// variance for stability.
#[derive(Debug, Clone)]
pub struct GaussianNb {
    var_smoothing: f64,
    fitted: Option<Gaussians>,
}

#[derive(Debug, Clone)]
struct Gaussians {
    classes: Vec<usize>,
    log_priors: Array1<f64>,
    /// `n_classes x n_features`.
    means: Array2<f64>,
    variances: Array2<f64>,
}

impl GaussianNb {
    pub fn new() -> Self {
        Self {
            var_smoothing: 1e-9,
            fitted: None,
        }
    }

    /// Returns the joint log likelihood of every row under every class.
    pub fn joint_log_likelihood(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let g = self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?;
        check_features(g.means.ncols(), x)?;

        Ok(Array2::from_shape_fn((x.nrows(), g.classes.len()), |(i, c)| {
            let row = x.row(i);
            let log_pdf: f64 = row
                .iter()
                .zip(g.means.row(c))
                .zip(g.variances.row(c))
                .map(|((&v, &mean), &var)| {
                    -0.5 * (2.0 * PI * var).ln() - (v - mean).powi(2) / (2.0 * var)
                })
                .sum();
            g.log_priors[c] + log_pdf
        }))
    }
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GaussianNb {
    fn name(&self) -> &'static str {
        NAME
    }

    fn accepted_params(&self) -> &'static [&'static str] {
        PARAMS
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "var_smoothing" => {
                self.var_smoothing = param::non_negative_f64(NAME, "var_smoothing", value)?
            }
            other => return Err(unknown_param(NAME, other)),
        }
        Ok(())
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.fitted = None;

        let classes = data.classes();
        check_classes(&classes)?;

        let x = data.x();
        let d = data.n_features();
        let epsilon = self.var_smoothing * x.var_axis(Axis(0), 0.0).fold(0.0_f64, |m, &v| m.max(v));

        let mut log_priors = Array1::zeros(classes.len());
        let mut means = Array2::zeros((classes.len(), d));
        let mut variances = Array2::zeros((classes.len(), d));

        for (c, &label) in classes.iter().enumerate() {
            let rows: Vec<usize> = (0..data.len()).filter(|&i| data.y()[i] == label).collect();
            let xc = x.select(Axis(0), &rows);

            log_priors[c] = (rows.len() as f64 / data.len() as f64).ln();
            means.row_mut(c).assign(&xc.mean_axis(Axis(0)).ok_or(MlError::InvalidInput(
                "every class needs at least one sample",
            ))?);
            variances
                .row_mut(c)
                .assign(&(xc.var_axis(Axis(0), 0.0) + epsilon));
        }

        // A constant feature with no smoothing would divide by zero.
        variances.mapv_inplace(|v| if v > 0.0 { v } else { f64::MIN_POSITIVE });

        self.fitted = Some(Gaussians {
            classes,
            log_priors,
            means,
            variances,
        });
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>> {
        let jll = self.joint_log_likelihood(x)?;
        let classes = &self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?.classes;

        Ok(jll.rows().into_iter().map(|row| classes[argmax(row)]).collect())
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
    fn learns_blobs() {
        for data in [blobs(), three_blobs()] {
            let mut nb = GaussianNb::new();
            nb.fit(&data).unwrap();
            assert_eq!(nb.score(&data).unwrap(), 1.0);
        }
    }

    #[test]
    fn priors_follow_class_frequencies() {
        let data = Dataset::from_rows(vec![0.0, 0.1, 0.2, 5.0], 1, vec![0, 0, 0, 1]).unwrap();
        let mut nb = GaussianNb::new();
        nb.fit(&data).unwrap();

        let priors = &nb.fitted.as_ref().unwrap().log_priors;
        assert!((priors[0] - 0.75_f64.ln()).abs() < 1e-12);
        assert!((priors[1] - 0.25_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn has_no_search_axes_besides_smoothing() {
        let mut nb = GaussianNb::new();
        assert_eq!(nb.accepted_params(), &["var_smoothing"]);
        assert!(nb.set_param("max_depth", &ParamValue::Int(5)).is_err());
    }
}

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;

use crate::{
    Classifier, Dataset, MlError, ParamValue, Result,
    classifier::{argmax, check_classes, check_features, unknown_param},
    data::encode_labels,
    param::{self, invalid},
};

const NAME: &str = "SVC";

const PARAMS: &[&str] = &[
    "C",
    "kernel",
    "degree",
    "gamma",
    "coef0",
    "tol",
    "max_iter",
    "random_state",
];

/// Sweeps without any multiplier update before SMO stops.
const QUIET_PASSES: usize = 5;

/// Multipliers below this are not kept as support vectors.
const ALPHA_EPS: f64 = 1e-8;

/// The kernel of an `Svc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Linear,
    Poly,
    Rbf,
    Sigmoid,
}

impl Kernel {
    fn parse(value: &ParamValue) -> Result<Self> {
        match value.as_tag() {
            Some("linear") => Ok(Kernel::Linear),
            Some("poly") => Ok(Kernel::Poly),
            Some("rbf") => Ok(Kernel::Rbf),
            Some("sigmoid") => Ok(Kernel::Sigmoid),
            _ => Err(invalid(NAME, "kernel", value)),
        }
    }
}

/// The kernel coefficient of the rbf, poly and sigmoid kernels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gamma {
    /// `1 / (n_features * var(x))`.
    Scale,
    /// `1 / n_features`.
    Auto,
    Value(f64),
}

impl Gamma {
    fn parse(value: &ParamValue) -> Result<Self> {
        match value.as_tag() {
            Some("scale") => Ok(Gamma::Scale),
            Some("auto") => Ok(Gamma::Auto),
            Some(_) => Err(invalid(NAME, "gamma", value)),
            None => param::positive_f64(NAME, "gamma", value).map(Gamma::Value),
        }
    }

    fn resolve(self, x: ArrayView2<f64>) -> f64 {
        let n_features = x.ncols() as f64;
        match self {
            Gamma::Scale => {
                let var = x.var(0.0);
                if var > 0.0 { 1.0 / (n_features * var) } else { 1.0 }
            }
            Gamma::Auto => 1.0 / n_features,
            Gamma::Value(gamma) => gamma,
        }
    }
}

/// A kernel evaluated with resolved coefficients.
#[derive(Debug, Clone, Copy)]
struct KernelFn {
    kernel: Kernel,
    gamma: f64,
    degree: i32,
    coef0: f64,
}

impl KernelFn {
    /// Returns the Gram matrix between the rows of `a` and the rows of `b`.
    fn matrix(&self, a: ArrayView2<f64>, b: ArrayView2<f64>) -> Array2<f64> {
        let dot = a.dot(&b.t());
        let KernelFn {
            kernel,
            gamma,
            degree,
            coef0,
        } = *self;

        match kernel {
            Kernel::Linear => dot,
            Kernel::Poly => dot.mapv(|d| (gamma * d + coef0).powi(degree)),
            Kernel::Sigmoid => dot.mapv(|d| (gamma * d + coef0).tanh()),
            Kernel::Rbf => {
                let na = a.map_axis(Axis(1), |row| row.dot(&row));
                let nb = b.map_axis(Axis(1), |row| row.dot(&row));
                Array2::from_shape_fn(dot.dim(), |(i, j)| {
                    let dist = (na[i] + nb[j] - 2.0 * dot[[i, j]]).max(0.0);
                    (-gamma * dist).exp()
                })
            }
        }
    }
}

/// A binary machine separating one class (`+1`) from the rest (`-1`).
#[derive(Debug, Clone)]
struct Machine {
    support: Array2<f64>,
    /// `alpha_i * y_i` of every support vector.
    dual_coef: Array1<f64>,
    bias: f64,
}

impl Machine {
    fn decision(&self, kernel: &KernelFn, x: ArrayView2<f64>) -> Array1<f64> {
        if self.dual_coef.is_empty() {
            return Array1::from_elem(x.nrows(), self.bias);
        }
        kernel.matrix(x, self.support.view()).dot(&self.dual_coef) + self.bias
    }
}

/// A C-support vector classifier trained with sequential minimal optimization.
///
/// Two classes are separated by a single machine; more classes are handled
/// one-vs-rest, predicting the class with the largest decision value.
#[derive(Debug, Clone)]
pub struct Svc {
    c: f64,
    kernel: Kernel,
    degree: u32,
    gamma: Gamma,
    coef0: f64,
    tol: f64,
    max_iter: usize,
    random_state: Option<u64>,
    fitted: Option<SvcModel>,
}

#[derive(Debug, Clone)]
struct SvcModel {
    classes: Vec<usize>,
    n_features: usize,
    kernel: KernelFn,
    machines: Vec<Machine>,
}

impl Svc {
    /// Creates a new `Svc` with an rbf kernel, `C = 1` and `gamma = "scale"`.
    pub fn new() -> Self {
        Self {
            c: 1.0,
            kernel: Kernel::Rbf,
            degree: 3,
            gamma: Gamma::Scale,
            coef0: 0.0,
            tol: 1e-3,
            max_iter: 1000,
            random_state: None,
            fitted: None,
        }
    }

    pub fn with_kernel(mut self, kernel: Kernel) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn degree(&self) -> u32 {
        self.degree
    }

    /// Returns the decision values, one column per machine.
    pub fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let model = self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?;
        check_features(model.n_features, x)?;

        let mut values = Array2::zeros((x.nrows(), model.machines.len()));
        for (k, machine) in model.machines.iter().enumerate() {
            values
                .column_mut(k)
                .assign(&machine.decision(&model.kernel, x));
        }
        Ok(values)
    }

    /// Solves the dual problem for labels in `{-1, +1}` over a precomputed Gram matrix.
    fn smo<R: Rng + ?Sized>(
        &self,
        gram: &Array2<f64>,
        y: &[f64],
        rng: &mut R,
    ) -> (Array1<f64>, f64) {
        let n = y.len();
        let c = self.c;
        let tol = self.tol;
        let mut alpha = Array1::<f64>::zeros(n);
        let mut b = 0.0;

        let f = |alpha: &Array1<f64>, b: f64, i: usize| -> f64 {
            gram.row(i)
                .iter()
                .zip(alpha.iter().zip(y))
                .map(|(k, (a, yj))| a * yj * k)
                .sum::<f64>()
                + b
        };

        let mut quiet = 0;
        let mut iter = 0;
        while quiet < QUIET_PASSES && iter < self.max_iter {
            iter += 1;
            let mut changed = 0;

            for i in 0..n {
                let e_i = f(&alpha, b, i) - y[i];
                let violates = (y[i] * e_i < -tol && alpha[i] < c)
                    || (y[i] * e_i > tol && alpha[i] > 0.0);
                if !violates {
                    continue;
                }

                let j = {
                    let j = rng.random_range(0..n - 1);
                    if j >= i { j + 1 } else { j }
                };
                let e_j = f(&alpha, b, j) - y[j];
                let (ai_old, aj_old) = (alpha[i], alpha[j]);

                let (lo, hi) = if y[i] != y[j] {
                    ((aj_old - ai_old).max(0.0), (c + aj_old - ai_old).min(c))
                } else {
                    ((ai_old + aj_old - c).max(0.0), (ai_old + aj_old).min(c))
                };
                if hi - lo < 1e-12 {
                    continue;
                }

                let eta = 2.0 * gram[[i, j]] - gram[[i, i]] - gram[[j, j]];
                if eta >= 0.0 {
                    continue;
                }

                let aj = (aj_old - y[j] * (e_i - e_j) / eta).clamp(lo, hi);
                if (aj - aj_old).abs() < 1e-5 {
                    continue;
                }
                let ai = ai_old + y[i] * y[j] * (aj_old - aj);
                alpha[i] = ai;
                alpha[j] = aj;

                let b1 = b
                    - e_i
                    - y[i] * (ai - ai_old) * gram[[i, i]]
                    - y[j] * (aj - aj_old) * gram[[i, j]];
                let b2 = b
                    - e_j
                    - y[i] * (ai - ai_old) * gram[[i, j]]
                    - y[j] * (aj - aj_old) * gram[[j, j]];
                b = if ai > 0.0 && ai < c {
                    b1
                } else if aj > 0.0 && aj < c {
                    b2
                } else {
                    (b1 + b2) / 2.0
                };

                changed += 1;
            }

            quiet = if changed == 0 { quiet + 1 } else { 0 };
        }

        if quiet < QUIET_PASSES {
            log::warn!("{NAME}: SMO stopped after max_iter={} sweeps", self.max_iter);
        }

        (alpha, b)
    }
}

impl Default for Svc {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for Svc {
    fn name(&self) -> &'static str {
        NAME
    }

    fn accepted_params(&self) -> &'static [&'static str] {
        PARAMS
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "C" => self.c = param::positive_f64(NAME, "C", value)?,
            "kernel" => self.kernel = Kernel::parse(value)?,
            "degree" => {
                let degree = param::at_least(NAME, "degree", value, 0)?;
                self.degree = u32::try_from(degree).map_err(|_| invalid(NAME, "degree", value))?;
            }
            "gamma" => self.gamma = Gamma::parse(value)?,
            "coef0" => self.coef0 = param::finite_f64(NAME, "coef0", value)?,
            "tol" => self.tol = param::positive_f64(NAME, "tol", value)?,
            "max_iter" => self.max_iter = param::at_least(NAME, "max_iter", value, 1)?,
            "random_state" => self.random_state = param::seed(NAME, "random_state", value)?,
            other => return Err(unknown_param(NAME, other)),
        }
        Ok(())
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.fitted = None;

        let classes = data.classes();
        check_classes(&classes)?;

        let x = data.x();
        let y = encode_labels(data.y(), &classes);
        let kernel = KernelFn {
            kernel: self.kernel,
            gamma: self.gamma.resolve(x),
            degree: i32::try_from(self.degree).unwrap_or(i32::MAX),
            coef0: self.coef0,
        };
        let gram = kernel.matrix(x, x);
        let mut rng = crate::seeded_rng(self.random_state);

        // Two classes need a single machine for the second one.
        let positives: Vec<usize> = if classes.len() == 2 {
            vec![1]
        } else {
            (0..classes.len()).collect()
        };

        let machines = positives
            .into_iter()
            .map(|positive| {
                let signs: Vec<f64> = y
                    .iter()
                    .map(|&c| if c == positive { 1.0 } else { -1.0 })
                    .collect();
                let (alpha, bias) = self.smo(&gram, &signs, &mut rng);

                let support: Vec<usize> = (0..alpha.len())
                    .filter(|&i| alpha[i] > ALPHA_EPS)
                    .collect();
                Machine {
                    support: x.select(Axis(0), &support),
                    dual_coef: support.iter().map(|&i| alpha[i] * signs[i]).collect(),
                    bias,
                }
            })
            .collect();

        self.fitted = Some(SvcModel {
            classes,
            n_features: data.n_features(),
            kernel,
            machines,
        });
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>> {
        let values = self.decision_function(x)?;
        let classes = &self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?.classes;

        let pick = |row: ArrayView1<f64>| match row.len() {
            1 => usize::from(row[0] > 0.0),
            _ => argmax(row),
        };

        Ok(values.rows().into_iter().map(|row| classes[pick(row)]).collect())
    }

    fn fresh(&self) -> Box<dyn Classifier> {
        Box::new(Self {
            fitted: None,
            ..self.clone()
        })
    }
}

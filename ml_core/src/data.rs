use std::{collections::BTreeSet, error::Error, fmt};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::{Rng, seq::index};

/// Errors produced while building or slicing a dataset.
#[derive(Debug)]
pub enum DataError {
    /// The dataset has no samples or no features.
    Empty,

    /// The feature matrix and the label vector disagree in length.
    LengthMismatch { features: usize, labels: usize },

    /// A sampling fraction outside of `(0, 1]`.
    InvalidFraction(f64),

    /// The requested sample index is out of bounds.
    OutOfBounds { index: usize },

    /// A row-major buffer whose length is not a multiple of the row width.
    RaggedRows { len: usize, n_features: usize },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Empty => write!(f, "dataset must have at least one sample and one feature"),
            DataError::LengthMismatch { features, labels } => write!(
                f,
                "feature matrix has {features} rows but there are {labels} labels"
            ),
            DataError::InvalidFraction(fraction) => {
                write!(f, "sampling fraction {fraction} is not in (0, 1]")
            }
            DataError::OutOfBounds { index } => write!(f, "sample index {index} is out of bounds"),
            DataError::RaggedRows { len, n_features } => write!(
                f,
                "{len} values cannot be split into rows of {n_features} features"
            ),
        }
    }
}

impl Error for DataError {}

/// A labeled, in-memory classification dataset.
///
/// Rows of `x` are samples, columns are features. Labels are arbitrary class
/// ids; estimators map them to dense indices internally and predict the
/// original ids back.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f64>,
    y: Array1<usize>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `x` - The feature matrix, one row per sample.
    /// * `y` - The label of each row.
    ///
    /// # Returns
    /// The dataset or an error if it is empty or the lengths disagree.
    pub fn new(x: Array2<f64>, y: Array1<usize>) -> Result<Self, DataError> {
        if x.nrows() != y.len() {
            return Err(DataError::LengthMismatch {
                features: x.nrows(),
                labels: y.len(),
            });
        }

        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(DataError::Empty);
        }

        Ok(Self { x, y })
    }

    /// Creates a new `Dataset` from a row-major buffer.
    ///
    /// # Arguments
    /// * `data` - The features of every sample, laid out row after row.
    /// * `n_features` - The amount of features per sample.
    /// * `labels` - The label of each sample.
    pub fn from_rows(
        data: Vec<f64>,
        n_features: usize,
        labels: Vec<usize>,
    ) -> Result<Self, DataError> {
        if n_features == 0 || data.is_empty() {
            return Err(DataError::Empty);
        }
        if data.len() % n_features != 0 {
            return Err(DataError::RaggedRows {
                len: data.len(),
                n_features,
            });
        }

        let rows = data.len() / n_features;
        let x = Array2::from_shape_vec((rows, n_features), data).map_err(|_| {
            DataError::LengthMismatch {
                features: rows,
                labels: labels.len(),
            }
        })?;

        Self::new(x, Array1::from(labels))
    }

    /// Returns the amount of samples.
    pub fn len(&self) -> usize {
        self.y.len()
    }

    /// A validated dataset is never empty; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    /// Returns the amount of features per sample.
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    pub fn y(&self) -> ArrayView1<'_, usize> {
        self.y.view()
    }

    /// Returns the distinct labels present in the dataset, sorted ascending.
    pub fn classes(&self) -> Vec<usize> {
        self.y
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Builds a new dataset out of the given rows, in the given order.
    ///
    /// # Errors
    /// `DataError::OutOfBounds` if an index exceeds the amount of samples and
    /// `DataError::Empty` if no index is given.
    pub fn select(&self, indices: &[usize]) -> Result<Self, DataError> {
        if let Some(&index) = indices.iter().find(|&&i| i >= self.len()) {
            return Err(DataError::OutOfBounds { index });
        }

        Self::new(
            self.x.select(Axis(0), indices),
            self.y.select(Axis(0), indices),
        )
    }

    /// Draws a random subset of `ceil(len * fraction)` samples without
    /// replacement.
    ///
    /// # Arguments
    /// * `fraction` - The proportion of the dataset to keep, in `(0, 1]`.
    /// * `rng` - The source of randomness.
    pub fn subsample<R: Rng + ?Sized>(
        &self,
        fraction: f64,
        rng: &mut R,
    ) -> Result<Self, DataError> {
        let n = self.len();
        let amount = sample_size(n, fraction)?;
        let indices = index::sample(rng, n, amount).into_vec();
        self.select(&indices)
    }
}

/// Returns how many of `n` samples a `fraction` keeps: `ceil(n * fraction)`,
/// at least one unless `n` is zero.
///
/// # Errors
/// `DataError::InvalidFraction` if `fraction` is not in `(0, 1]`.
pub fn sample_size(n: usize, fraction: f64) -> Result<usize, DataError> {
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(DataError::InvalidFraction(fraction));
    }
    if n == 0 {
        return Ok(0);
    }
    Ok(((n as f64 * fraction).ceil() as usize).clamp(1, n))
}

/// Maps every label to its position in `classes` (which must be sorted).
pub(crate) fn encode_labels(y: ArrayView1<usize>, classes: &[usize]) -> Vec<usize> {
    y.iter()
        .map(|label| classes.binary_search(label).unwrap_or_default())
        .collect()
}

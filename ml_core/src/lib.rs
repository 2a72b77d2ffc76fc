//! Classification estimators with named, grid-searchable hyperparameters.

mod boosting;
mod classifier;
mod data;
mod error;
mod forest;
mod logistic;
mod naive_bayes;
mod param;
mod svm;
mod test;
mod tree;

use rand::{SeedableRng, rngs::StdRng};

pub use boosting::GradientBoostingClassifier;
pub use classifier::Classifier;
pub use data::{DataError, Dataset, sample_size};
pub use error::{MlError, Result};
pub use forest::RandomForestClassifier;
pub use logistic::LogisticRegression;
pub use naive_bayes::GaussianNb;
pub use param::{ParamSet, ParamValue};
pub use svm::{Gamma, Kernel, Svc};
pub use tree::{MaxFeatures, TreeParams};

/// Returns a generator seeded with `seed`, or from the thread rng when `None`.
pub(crate) fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

use ndarray::{Array1, Array2, ArrayView2, Zip};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use crate::{
    Classifier, Dataset, MlError, ParamValue, Result,
    classifier::{argmax, check_classes, check_features, unknown_param},
    data::encode_labels,
    param,
    tree::{DecisionTree, MaxFeatures, Target, TreeParams},
};

const NAME: &str = "RandomForestClassifier";

const PARAMS: &[&str] = &[
    "n_estimators",
    "max_depth",
    "max_features",
    "min_samples_split",
    "min_samples_leaf",
    "min_impurity_decrease",
    "bootstrap",
    "random_state",
];

/// A bagged ensemble of gini decision trees.
///
/// Every tree is grown on a bootstrap sample of the dataset, considering a
/// random subset of the features at each split. Predictions average the
/// class proportions of the leaves each sample falls into.
#[derive(Debug, Clone)]
pub struct RandomForestClassifier {
    n_estimators: usize,
    tree: TreeParams,
    bootstrap: bool,
    random_state: Option<u64>,
    fitted: Option<Forest>,
}

#[derive(Debug, Clone)]
struct Forest {
    classes: Vec<usize>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForestClassifier {
    /// Creates a new `RandomForestClassifier` with 100 fully grown trees
    /// considering `sqrt(n_features)` features per split.
    pub fn new() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams {
                max_features: MaxFeatures::Sqrt,
                ..TreeParams::default()
            },
            bootstrap: true,
            random_state: None,
            fitted: None,
        }
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators.max(1);
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn tree_params(&self) -> &TreeParams {
        &self.tree
    }

    /// Returns the averaged class probabilities, one column per class in
    /// ascending label order.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let forest = self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?;
        check_features(forest.n_features, x)?;

        let mut proba = Array2::zeros((x.nrows(), forest.classes.len()));
        let n_trees = forest.trees.len() as f64;

        Zip::from(proba.rows_mut())
            .and(x.rows())
            .par_for_each(|mut p, row| {
                for tree in &forest.trees {
                    p.iter_mut()
                        .zip(tree.predict_row(row))
                        .for_each(|(p, v)| *p += v / n_trees);
                }
            });

        Ok(proba)
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for RandomForestClassifier {
    fn name(&self) -> &'static str {
        NAME
    }

    fn accepted_params(&self) -> &'static [&'static str] {
        PARAMS
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "n_estimators" => self.n_estimators = param::at_least(NAME, "n_estimators", value, 1)?,
            "bootstrap" => self.bootstrap = param::flag(NAME, "bootstrap", value)?,
            "random_state" => self.random_state = param::seed(NAME, "random_state", value)?,
            other => {
                if !self.tree.set(NAME, other, value)? {
                    return Err(unknown_param(NAME, other));
                }
            }
        }
        Ok(())
    }

    fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.fitted = None;

        let classes = data.classes();
        check_classes(&classes)?;

        let y = encode_labels(data.y(), &classes);
        let target = Target::Classes {
            y: &y,
            n_classes: classes.len(),
        };
        let x = data.x();
        let n = data.len();
        let (bootstrap, params) = (self.bootstrap, self.tree);

        // Seeds are drawn up front so the ensemble does not depend on how
        // rayon schedules the trees.
        let mut rng = crate::seeded_rng(self.random_state);
        let seeds: Vec<u64> = (0..self.n_estimators).map(|_| rng.random()).collect();

        let trees = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let samples = if bootstrap {
                    (0..n).map(|_| rng.random_range(0..n)).collect()
                } else {
                    (0..n).collect()
                };
                DecisionTree::fit(x, &target, samples, &params, &mut rng)
            })
            .collect();

        log::debug!("{NAME}: grew {} trees on {n} samples", self.n_estimators);

        self.fitted = Some(Forest {
            classes,
            n_features: data.n_features(),
            trees,
        });
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>> {
        let proba = self.predict_proba(x)?;
        let classes = &self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?.classes;

        Ok(proba
            .rows()
            .into_iter()
            .map(|row| classes[argmax(row)])
            .collect())
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
        let mut forest = RandomForestClassifier::new()
            .with_n_estimators(15)
            .with_random_state(3);

        forest.fit(&data).unwrap();
        assert_eq!(forest.score(&data).unwrap(), 1.0);
    }

    #[test]
    fn probabilities_sum_to_one() {
        let data = three_blobs();
        let mut forest = RandomForestClassifier::new()
            .with_n_estimators(10)
            .with_random_state(11);
        forest.fit(&data).unwrap();

        let proba = forest.predict_proba(data.x()).unwrap();
        assert_eq!(proba.ncols(), 3);
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let data = three_blobs();
        let mut a = RandomForestClassifier::new()
            .with_n_estimators(8)
            .with_random_state(5);
        let mut b = a.clone();
        a.fit(&data).unwrap();
        b.fit(&data).unwrap();

        assert_eq!(
            a.predict_proba(data.x()).unwrap(),
            b.predict_proba(data.x()).unwrap()
        );
    }

    #[test]
    fn accepts_tree_hyperparameters() {
        let mut forest = RandomForestClassifier::new();
        forest
            .set_param("max_features", &ParamValue::Unbounded)
            .unwrap();
        forest.set_param("max_depth", &ParamValue::Int(25)).unwrap();
        forest
            .set_param("min_impurity_decrease", &ParamValue::Float(0.2))
            .unwrap();

        assert_eq!(forest.tree_params().max_features, MaxFeatures::All);
        assert_eq!(forest.tree_params().max_depth, Some(25));
        assert!(matches!(
            forest.set_param("learning_rate", &ParamValue::Int(1)),
            Err(MlError::UnknownParam { .. })
        ));
    }

    #[test]
    fn predict_before_fit_fails() {
        let forest = RandomForestClassifier::new();
        assert!(matches!(
            forest.predict(blobs().x()),
            Err(MlError::NotFitted(_))
        ));
    }
}

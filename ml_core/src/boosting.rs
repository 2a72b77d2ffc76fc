use std::collections::HashMap;

use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::{
    Classifier, Dataset, MlError, ParamValue, Result,
    classifier::{argmax, check_classes, check_features, softmax_rows, unknown_param},
    data::encode_labels,
    param,
    tree::{DecisionTree, Target, TreeParams},
};

const NAME: &str = "GradientBoostingClassifier";

const PARAMS: &[&str] = &[
    "learning_rate",
    "n_estimators",
    "max_depth",
    "max_features",
    "min_samples_split",
    "min_samples_leaf",
    "min_impurity_decrease",
    "random_state",
];

/// Raw scores are kept inside this range so the softmax stays finite even
/// with very large learning rates.
const SCORE_LIMIT: f64 = 1e6;

/// Gradient boosting of regression trees on the multinomial deviance.
///
/// Each stage fits one tree per class to the residuals `y - p` and sets the
/// leaf values with a single Newton step, then adds them to the raw scores
/// scaled by `learning_rate`.
#[derive(Debug, Clone)]
pub struct GradientBoostingClassifier {
    learning_rate: f64,
    n_estimators: usize,
    tree: TreeParams,
    random_state: Option<u64>,
    fitted: Option<Boosted>,
}

#[derive(Debug, Clone)]
struct Boosted {
    classes: Vec<usize>,
    n_features: usize,
    learning_rate: f64,
    init: Array1<f64>,
    /// One tree per class for every stage.
    stages: Vec<Vec<DecisionTree>>,
}

impl GradientBoostingClassifier {
    /// Creates a new `GradientBoostingClassifier` with 100 stages of depth 3
    /// trees and a learning rate of 0.1.
    pub fn new() -> Self {
        Self {
            learning_rate: 0.1,
            n_estimators: 100,
            tree: TreeParams {
                max_depth: Some(3),
                ..TreeParams::default()
            },
            random_state: None,
            fitted: None,
        }
    }

    pub fn with_n_estimators(mut self, n_estimators: usize) -> Self {
        self.n_estimators = n_estimators.max(1);
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn tree_params(&self) -> &TreeParams {
        &self.tree
    }

    /// Returns the raw additive scores, one column per class.
    pub fn decision_function(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let boosted = self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?;
        check_features(boosted.n_features, x)?;

        let mut scores = Array2::from_shape_fn((x.nrows(), boosted.classes.len()), |(_, k)| {
            boosted.init[k]
        });

        for stage in &boosted.stages {
            for (k, tree) in stage.iter().enumerate() {
                for (i, row) in x.rows().into_iter().enumerate() {
                    scores[[i, k]] += boosted.learning_rate * tree.predict_row(row)[0];
                }
            }
        }

        scores.mapv_inplace(|s| s.clamp(-SCORE_LIMIT, SCORE_LIMIT));
        Ok(scores)
    }

    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let mut scores = self.decision_function(x)?;
        softmax_rows(&mut scores);
        Ok(scores)
    }
}

impl Default for GradientBoostingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GradientBoostingClassifier {
    fn name(&self) -> &'static str {
        NAME
    }

    fn accepted_params(&self) -> &'static [&'static str] {
        PARAMS
    }

    fn set_param(&mut self, name: &str, value: &ParamValue) -> Result<()> {
        match name {
            "learning_rate" => {
                self.learning_rate = param::positive_f64(NAME, "learning_rate", value)?
            }
            "n_estimators" => self.n_estimators = param::at_least(NAME, "n_estimators", value, 1)?,
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

        let n = data.len();
        let k = classes.len();
        let x = data.x();
        let y = encode_labels(data.y(), &classes);

        let mut one_hot = Array2::<f64>::zeros((n, k));
        y.iter().enumerate().for_each(|(i, &c)| one_hot[[i, c]] = 1.0);

        // Start from the log class priors.
        let init = one_hot
            .mean_axis(Axis(0))
            .ok_or(MlError::InvalidInput("cannot boost an empty dataset"))?
            .mapv(f64::ln);

        let mut scores = Array2::from_shape_fn((n, k), |(_, c)| init[c]);
        let mut rng = crate::seeded_rng(self.random_state);
        let mut stages = Vec::with_capacity(self.n_estimators);
        let newton_scale = (k - 1) as f64 / k as f64;

        for _ in 0..self.n_estimators {
            let mut proba = scores.clone();
            softmax_rows(&mut proba);
            let residuals = &one_hot - &proba;

            let mut stage = Vec::with_capacity(k);
            for c in 0..k {
                let r = residuals.column(c).to_vec();
                let mut tree = DecisionTree::fit(
                    x,
                    &Target::Values(&r),
                    (0..n).collect(),
                    &self.tree,
                    &mut rng,
                );

                let mut leaves: HashMap<usize, (f64, f64)> = HashMap::new();
                for (i, row) in x.rows().into_iter().enumerate() {
                    let (num, den) = leaves.entry(tree.leaf_index(row)).or_default();
                    *num += r[i];
                    *den += r[i].abs() * (1.0 - r[i].abs());
                }

                for (leaf, (num, den)) in leaves {
                    let value = if den.abs() < 1e-150 {
                        0.0
                    } else {
                        newton_scale * num / den
                    };
                    tree.set_leaf_value(leaf, vec![value]);
                }

                for (i, row) in x.rows().into_iter().enumerate() {
                    let score = scores[[i, c]] + self.learning_rate * tree.predict_row(row)[0];
                    scores[[i, c]] = score.clamp(-SCORE_LIMIT, SCORE_LIMIT);
                }

                stage.push(tree);
            }
            stages.push(stage);
        }

        log::debug!(
            "{NAME}: fitted {} stages of {k} trees on {n} samples",
            self.n_estimators
        );

        self.fitted = Some(Boosted {
            classes,
            n_features: data.n_features(),
            learning_rate: self.learning_rate,
            init,
            stages,
        });
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<usize>> {
        let scores = self.decision_function(x)?;
        let classes = &self.fitted.as_ref().ok_or(MlError::NotFitted(NAME))?.classes;

        Ok(scores
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

use ndarray::{ArrayView1, ArrayView2};
use rand::{Rng, seq::index};

use crate::{
    ParamValue, Result,
    param::{self, invalid},
};

/// Below this impurity a node is considered pure.
const PURE: f64 = 1e-12;

/// Two feature values closer than this are not split apart.
const FEATURE_EPS: f64 = 1e-9;

/// How many features a split considers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    All,
    Sqrt,
    Log2,
    Count(usize),
    Fraction(f64),
}

impl MaxFeatures {
    /// Parses the `max_features` hyperparameter.
    ///
    /// Accepts `"sqrt"`, `"log2"`, a positive count, a fraction in `(0, 1]`
    /// or `Unbounded` for every feature.
    pub(crate) fn parse(model: &'static str, value: &ParamValue) -> Result<Self> {
        match value {
            ParamValue::Unbounded => Ok(MaxFeatures::All),
            ParamValue::Tag(tag) => match tag.as_str() {
                "sqrt" => Ok(MaxFeatures::Sqrt),
                "log2" => Ok(MaxFeatures::Log2),
                _ => Err(invalid(model, "max_features", value)),
            },
            ParamValue::Int(n) if *n >= 1 => Ok(MaxFeatures::Count(*n as usize)),
            ParamValue::Float(f) if *f > 0.0 && *f <= 1.0 => Ok(MaxFeatures::Fraction(*f)),
            _ => Err(invalid(model, "max_features", value)),
        }
    }

    /// Returns the amount of features to draw out of `n_features`, at least one.
    pub(crate) fn resolve(self, n_features: usize) -> usize {
        let n = n_features as f64;
        let k = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => n.sqrt() as usize,
            MaxFeatures::Log2 => n.log2() as usize,
            MaxFeatures::Count(k) => k,
            MaxFeatures::Fraction(f) => (f * n) as usize,
        };
        k.clamp(1, n_features.max(1))
    }
}

/// Growth limits of a single tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub min_impurity_decrease: f64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            max_features: MaxFeatures::All,
            min_samples_split: 2,
            min_samples_leaf: 1,
            min_impurity_decrease: 0.0,
        }
    }
}

impl TreeParams {
    /// Applies one of the tree hyperparameters shared by the ensembles.
    ///
    /// # Returns
    /// `Ok(false)` if `name` is not a tree hyperparameter.
    pub(crate) fn set(
        &mut self,
        model: &'static str,
        name: &str,
        value: &ParamValue,
    ) -> Result<bool> {
        match name {
            "max_depth" => self.max_depth = param::optional_at_least(model, "max_depth", value, 1)?,
            "max_features" => self.max_features = MaxFeatures::parse(model, value)?,
            "min_samples_split" => {
                self.min_samples_split = param::at_least(model, "min_samples_split", value, 2)?
            }
            "min_samples_leaf" => {
                self.min_samples_leaf = param::at_least(model, "min_samples_leaf", value, 1)?
            }
            "min_impurity_decrease" => {
                self.min_impurity_decrease =
                    param::non_negative_f64(model, "min_impurity_decrease", value)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// What a tree is fitted against.
pub(crate) enum Target<'a> {
    /// Class indices in `0..n_classes`; leaves hold class proportions (gini).
    Classes { y: &'a [usize], n_classes: usize },
    /// Real values; leaves hold the mean (squared error).
    Values(&'a [f64]),
}

impl Target<'_> {
    fn impurity(&self, samples: &[usize]) -> f64 {
        match self {
            Target::Classes { y, n_classes } => {
                let mut counts = vec![0.0; *n_classes];
                samples.iter().for_each(|&s| counts[y[s]] += 1.0);
                gini(&counts, samples.len() as f64)
            }
            Target::Values(y) => {
                let (sum, sq) = samples
                    .iter()
                    .fold((0.0, 0.0), |(sum, sq), &s| (sum + y[s], sq + y[s] * y[s]));
                variance(sum, sq, samples.len() as f64)
            }
        }
    }

    fn leaf_value(&self, samples: &[usize]) -> Vec<f64> {
        let n = samples.len() as f64;
        match self {
            Target::Classes { y, n_classes } => {
                let mut proba = vec![0.0; *n_classes];
                samples.iter().for_each(|&s| proba[y[s]] += 1.0);
                proba.iter_mut().for_each(|p| *p /= n);
                proba
            }
            Target::Values(y) => vec![samples.iter().map(|&s| y[s]).sum::<f64>() / n],
        }
    }
}

fn gini(counts: &[f64], n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / n).powi(2)).sum::<f64>()
}

fn variance(sum: f64, sq: f64, n: f64) -> f64 {
    if n == 0.0 {
        return 0.0;
    }
    (sq / n - (sum / n).powi(2)).max(0.0)
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

struct Split {
    feature: usize,
    threshold: f64,
    /// Weighted impurity of both children.
    impurity: f64,
    left: Vec<usize>,
    right: Vec<usize>,
}

/// A CART decision tree stored as a node arena, the root is node `0`.
#[derive(Debug, Clone)]
pub(crate) struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Grows a tree over the given sample indices.
    ///
    /// # Arguments
    /// * `x` - The full feature matrix.
    /// * `target` - The target of every row of `x`.
    /// * `samples` - The rows to grow the tree on, repetitions allowed (bootstrap).
    /// * `params` - Growth limits.
    /// * `rng` - Used to draw the candidate features of each split.
    pub(crate) fn fit<R: Rng + ?Sized>(
        x: ArrayView2<f64>,
        target: &Target,
        samples: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let n_total = samples.len() as f64;
        let n_features = x.ncols();
        let k = params.max_features.resolve(n_features);

        let mut nodes = vec![Node::Leaf { value: Vec::new() }];
        let mut pending = vec![(0, samples, 0)];

        while let Some((idx, samples, depth)) = pending.pop() {
            let impurity = target.impurity(&samples);
            let n = samples.len();

            let can_split = impurity > PURE
                && n >= params.min_samples_split
                && n >= 2 * params.min_samples_leaf
                && params.max_depth.is_none_or(|max| depth < max);

            let split = can_split
                .then(|| {
                    let features = if k < n_features {
                        index::sample(rng, n_features, k).into_vec()
                    } else {
                        (0..n_features).collect()
                    };
                    best_split(x, target, &samples, &features, params.min_samples_leaf)
                })
                .flatten()
                .filter(|split| {
                    let decrease = n as f64 / n_total * (impurity - split.impurity);
                    decrease >= params.min_impurity_decrease
                });

            let Some(split) = split else {
                nodes[idx] = Node::Leaf {
                    value: target.leaf_value(&samples),
                };
                continue;
            };

            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { value: Vec::new() });
            nodes.push(Node::Leaf { value: Vec::new() });
            nodes[idx] = Node::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };

            pending.push((right, split.right, depth + 1));
            pending.push((left, split.left, depth + 1));
        }

        Self { nodes }
    }

    /// Returns the index of the leaf `row` falls into.
    pub(crate) fn leaf_index(&self, row: ArrayView1<f64>) -> usize {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { .. } => return idx,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Returns the leaf value for `row`.
    pub(crate) fn predict_row(&self, row: ArrayView1<f64>) -> &[f64] {
        match &self.nodes[self.leaf_index(row)] {
            Node::Leaf { value } => value.as_slice(),
            Node::Split { .. } => unreachable!("leaf_index always stops at a leaf"),
        }
    }

    /// Overwrites the value of a leaf, ignored for split nodes.
    pub(crate) fn set_leaf_value(&mut self, leaf: usize, value: Vec<f64>) {
        if let Some(Node::Leaf { value: v }) = self.nodes.get_mut(leaf) {
            *v = value;
        }
    }

    #[cfg(test)]
    pub(crate) fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, Node::Leaf { .. }))
            .count()
    }

    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        walk(&self.nodes, 0)
    }
}

/// Finds the split of `samples` with the lowest weighted child impurity.
fn best_split(
    x: ArrayView2<f64>,
    target: &Target,
    samples: &[usize],
    features: &[usize],
    min_samples_leaf: usize,
) -> Option<Split> {
    let n = samples.len();
    let mut best: Option<(usize, f64, f64, usize)> = None;
    let mut sorted = samples.to_vec();

    for &feature in features {
        sorted.sort_by(|&a, &b| x[[a, feature]].total_cmp(&x[[b, feature]]));

        let mut sweep = Sweep::new(target, &sorted);
        for i in 0..n - 1 {
            sweep.move_left(sorted[i]);

            let n_left = i + 1;
            if n_left < min_samples_leaf || n - n_left < min_samples_leaf {
                continue;
            }

            let (lo, hi) = (x[[sorted[i], feature]], x[[sorted[i + 1], feature]]);
            if hi - lo <= FEATURE_EPS {
                continue;
            }

            let impurity = sweep.weighted_impurity(n_left, n);
            if best.is_none_or(|(_, _, best_impurity, _)| impurity < best_impurity) {
                best = Some((feature, (lo + hi) / 2.0, impurity, n_left));
            }
        }
    }

    let (feature, threshold, impurity, _) = best?;
    let (left, right) = samples
        .iter()
        .partition(|&&s| x[[s, feature]] <= threshold);

    Some(Split {
        feature,
        threshold,
        impurity,
        left,
        right,
    })
}

/// Running sufficient statistics of both sides while sweeping a sorted feature.
enum Sweep<'a> {
    Classes {
        y: &'a [usize],
        left: Vec<f64>,
        right: Vec<f64>,
    },
    Values {
        y: &'a [f64],
        left: (f64, f64),
        right: (f64, f64),
    },
}

impl<'a> Sweep<'a> {
    fn new(target: &Target<'a>, samples: &[usize]) -> Self {
        match *target {
            Target::Classes { y, n_classes } => {
                let mut right = vec![0.0; n_classes];
                samples.iter().for_each(|&s| right[y[s]] += 1.0);
                Sweep::Classes {
                    y,
                    left: vec![0.0; n_classes],
                    right,
                }
            }
            Target::Values(y) => {
                let right = samples
                    .iter()
                    .fold((0.0, 0.0), |(sum, sq), &s| (sum + y[s], sq + y[s] * y[s]));
                Sweep::Values {
                    y,
                    left: (0.0, 0.0),
                    right,
                }
            }
        }
    }

    fn move_left(&mut self, sample: usize) {
        match self {
            Sweep::Classes { y, left, right } => {
                left[y[sample]] += 1.0;
                right[y[sample]] -= 1.0;
            }
            Sweep::Values { y, left, right } => {
                let v = y[sample];
                left.0 += v;
                left.1 += v * v;
                right.0 -= v;
                right.1 -= v * v;
            }
        }
    }

    fn weighted_impurity(&self, n_left: usize, n: usize) -> f64 {
        let (nl, nr) = (n_left as f64, (n - n_left) as f64);
        let (il, ir) = match self {
            Sweep::Classes { left, right, .. } => (gini(left, nl), gini(right, nr)),
            Sweep::Values { left, right, .. } => (
                variance(left.0, left.1, nl),
                variance(right.0, right.1, nr),
            ),
        };
        (nl * il + nr * ir) / n as f64
    }
}

use std::{fmt, str::FromStr};

use ml_core::{
    Classifier, GaussianNb, GradientBoostingClassifier, LogisticRegression,
    RandomForestClassifier, Svc,
};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryErr, Result};

/// The specification for the estimator behind a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    GradientBoosting,
    RandomForest,
    Svc,
    LogisticRegression,
    GaussianNb,
}

impl ClassifierKind {
    pub const ALL: [ClassifierKind; 5] = [
        ClassifierKind::GradientBoosting,
        ClassifierKind::RandomForest,
        ClassifierKind::Svc,
        ClassifierKind::LogisticRegression,
        ClassifierKind::GaussianNb,
    ];

    /// The name used in JSON catalogs.
    pub fn name(self) -> &'static str {
        match self {
            ClassifierKind::GradientBoosting => "gradient_boosting",
            ClassifierKind::RandomForest => "random_forest",
            ClassifierKind::Svc => "svc",
            ClassifierKind::LogisticRegression => "logistic_regression",
            ClassifierKind::GaussianNb => "gaussian_nb",
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassifierKind {
    type Err = RegistryErr;

    fn from_str(s: &str) -> Result<Self> {
        ClassifierKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| RegistryErr::UnknownClassifier(s.to_string()))
    }
}

/// Builds unfitted `Classifier`s given their kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifierBuilder {
    random_state: Option<u64>,
}

impl ClassifierBuilder {
    /// Creates a new `ClassifierBuilder` that leaves estimators unseeded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds every randomized estimator this builder creates.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Builds a new estimator with its default hyperparameters.
    ///
    /// # Arguments
    /// * `kind` - The estimator to create.
    pub fn build(&self, kind: ClassifierKind) -> Box<dyn Classifier> {
        match kind {
            ClassifierKind::GradientBoosting => {
                let gb = GradientBoostingClassifier::new();
                Box::new(self.seed(gb, GradientBoostingClassifier::with_random_state))
            }
            ClassifierKind::RandomForest => {
                let rf = RandomForestClassifier::new();
                Box::new(self.seed(rf, RandomForestClassifier::with_random_state))
            }
            ClassifierKind::Svc => Box::new(self.seed(Svc::new(), Svc::with_random_state)),
            ClassifierKind::LogisticRegression => Box::new(LogisticRegression::new()),
            ClassifierKind::GaussianNb => Box::new(GaussianNb::new()),
        }
    }

    fn seed<C, F>(&self, classifier: C, with_seed: F) -> C
    where
        F: FnOnce(C, u64) -> C,
    {
        match self.random_state {
            Some(seed) => with_seed(classifier, seed),
            None => classifier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_serde() {
        for kind in ClassifierKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
            assert_eq!(kind.name().parse::<ClassifierKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(matches!(
            "svm".parse::<ClassifierKind>(),
            Err(RegistryErr::UnknownClassifier(name)) if name == "svm"
        ));
    }

    #[test]
    fn builds_the_matching_estimator() {
        let builder = ClassifierBuilder::new().with_random_state(7);
        let names: Vec<&str> = ClassifierKind::ALL
            .into_iter()
            .map(|kind| builder.build(kind).name())
            .collect();

        assert_eq!(
            names,
            [
                "GradientBoostingClassifier",
                "RandomForestClassifier",
                "SVC",
                "LogisticRegression",
                "GaussianNB",
            ]
        );
    }
}

use ml_core::ParamValue::{self, Float, Int, Unbounded};

use crate::{
    catalog::Catalog,
    grid::ParamGrid,
    kind::{ClassifierBuilder, ClassifierKind},
    model_spec::ModelSpec,
    profile::Profile,
};

/// Hands out the model catalog of a profile.
///
/// Every call builds a new catalog, so callers own their estimators and may
/// fit them without affecting other catalogs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModelRegistry {
    profile: Profile,
    builder: ClassifierBuilder,
}

impl ModelRegistry {
    /// Creates a new `ModelRegistry` for the given profile.
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            builder: ClassifierBuilder::new(),
        }
    }

    /// Seeds the randomized estimators of every catalog.
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.builder = self.builder.with_random_state(seed);
        self
    }

    pub fn profile(&self) -> Profile {
        self.profile
    }

    pub fn builder(&self) -> &ClassifierBuilder {
        &self.builder
    }

    /// Returns a new catalog with the grid of every model of the profile.
    pub fn get_models(&self) -> Catalog {
        let profile = self.profile;
        let b = &self.builder;

        let mut models = vec![
            gradient_boosting(profile, b),
            random_forest(profile, b),
            svm(profile, b),
            logistic_regression(profile, b),
        ];
        if profile.is_tuned() {
            models.push(naive_bayes(profile, b));
        }

        log::debug!("built the '{profile}' catalog with {} models", models.len());
        Catalog::from_specs(models)
    }
}

/// Returns the catalog of `profile` with unseeded estimators.
pub fn get_models(profile: Profile) -> Catalog {
    ModelRegistry::new(profile).get_models()
}

fn gradient_boosting(profile: Profile, builder: &ClassifierBuilder) -> ModelSpec {
    let params = ParamGrid::new()
        .axis("learning_rate", [Int(1), Int(10), Int(100)])
        .axis("max_depth", [Int(5), Int(25), Unbounded])
        .axis("max_features", [tag("sqrt"), tag("log2"), Unbounded]);

    ModelSpec::new("gradient_boosting", ClassifierKind::GradientBoosting, builder)
        .with_params(leaf_constraints(profile, params))
        .with_test_run_size(run_size(profile, 0.08))
}

fn random_forest(profile: Profile, builder: &ClassifierBuilder) -> ModelSpec {
    let params = ParamGrid::new()
        .axis("max_features", [tag("sqrt"), tag("log2"), Unbounded])
        .axis("max_depth", [Int(5), Int(25), Unbounded]);

    ModelSpec::new("random_forest", ClassifierKind::RandomForest, builder)
        .with_params(leaf_constraints(profile, params))
        .with_test_run_size(run_size(profile, 0.5))
}

fn svm(profile: Profile, builder: &ClassifierBuilder) -> ModelSpec {
    let params = ParamGrid::new()
        .axis("kernel", [tag("linear"), tag("poly"), tag("rbf")])
        .axis("degree", [Int(1), Int(2), Int(5), Int(10)]);

    ModelSpec::new("svm", ClassifierKind::Svc, builder)
        .with_params(params)
        .with_test_run_size(run_size(profile, 0.08))
}

fn logistic_regression(profile: Profile, builder: &ClassifierBuilder) -> ModelSpec {
    let params = ParamGrid::new()
        .axis("tol", [Float(1e-1), Float(1e-2), Float(1e-4), Float(1e-6)])
        .axis("C", [Float(1e2), Int(10), Float(1e0), Float(1e-1), Float(1e-3)]);

    ModelSpec::new("logistic_regression", ClassifierKind::LogisticRegression, builder)
        .with_params(params)
        .with_test_run_size(run_size(profile, 0.5))
}

/// Baseline of the tuned profile, fitted with its defaults only.
fn naive_bayes(profile: Profile, builder: &ClassifierBuilder) -> ModelSpec {
    ModelSpec::new("naive_bayes", ClassifierKind::GaussianNb, builder)
        .with_test_run_size(run_size(profile, 0.5))
}

/// Tree growth limits searched by the tuned profile on top of the base grid.
fn leaf_constraints(profile: Profile, params: ParamGrid) -> ParamGrid {
    if !profile.is_tuned() {
        return params;
    }

    params
        .axis("min_impurity_decrease", [Float(0.1), Float(0.2), Float(0.5)])
        .axis("min_samples_leaf", [Int(10), Int(100), Int(1000)])
}

fn run_size(profile: Profile, fraction: f64) -> Option<f64> {
    profile.is_tuned().then_some(fraction)
}

fn tag(value: &str) -> ParamValue {
    ParamValue::Tag(value.to_string())
}

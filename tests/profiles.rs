use model_registry::{Classifier, Dataset, MlError, Profile, RegistryErr, get_models};
use serde_json::{Value, json};

fn blobs() -> Dataset {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (label, center) in [(0, -3.0), (1, 3.0)] {
        for i in 0..10 {
            let offset = f64::from(i) * 0.1 - 0.5;
            rows.extend([center + offset, center - offset]);
            labels.push(label);
        }
    }
    Dataset::from_rows(rows, 2, labels).unwrap()
}

fn summary(profile: Profile) -> Value {
    serde_json::to_value(get_models(profile).summary()).unwrap()
}

#[test]
fn base_catalog_values() {
    let expected = json!({"models": [
        {
            "name": "gradient_boosting",
            "classifier": "gradient_boosting",
            "estimator": "GradientBoostingClassifier",
            "params": {
                "learning_rate": [1, 10, 100],
                "max_depth": [5, 25, null],
                "max_features": ["sqrt", "log2", null]
            },
            "test_run_size": null,
            "combinations": 27
        },
        {
            "name": "random_forest",
            "classifier": "random_forest",
            "estimator": "RandomForestClassifier",
            "params": {
                "max_features": ["sqrt", "log2", null],
                "max_depth": [5, 25, null]
            },
            "test_run_size": null,
            "combinations": 9
        },
        {
            "name": "svm",
            "classifier": "svc",
            "estimator": "SVC",
            "params": {
                "kernel": ["linear", "poly", "rbf"],
                "degree": [1, 2, 5, 10]
            },
            "test_run_size": null,
            "combinations": 12
        },
        {
            "name": "logistic_regression",
            "classifier": "logistic_regression",
            "estimator": "LogisticRegression",
            "params": {
                "tol": [0.1, 0.01, 0.0001, 0.000001],
                "C": [100.0, 10, 1.0, 0.1, 0.001]
            },
            "test_run_size": null,
            "combinations": 20
        }
    ]});

    assert_eq!(summary(Profile::Base), expected);
}

#[test]
fn best_catalog_values() {
    let expected = json!({"models": [
        {
            "name": "gradient_boosting",
            "classifier": "gradient_boosting",
            "estimator": "GradientBoostingClassifier",
            "params": {
                "learning_rate": [1, 10, 100],
                "max_depth": [5, 25, null],
                "max_features": ["sqrt", "log2", null],
                "min_impurity_decrease": [0.1, 0.2, 0.5],
                "min_samples_leaf": [10, 100, 1000]
            },
            "test_run_size": 0.08,
            "combinations": 243
        },
        {
            "name": "random_forest",
            "classifier": "random_forest",
            "estimator": "RandomForestClassifier",
            "params": {
                "max_features": ["sqrt", "log2", null],
                "max_depth": [5, 25, null],
                "min_impurity_decrease": [0.1, 0.2, 0.5],
                "min_samples_leaf": [10, 100, 1000]
            },
            "test_run_size": 0.5,
            "combinations": 81
        },
        {
            "name": "svm",
            "classifier": "svc",
            "estimator": "SVC",
            "params": {
                "kernel": ["linear", "poly", "rbf"],
                "degree": [1, 2, 5, 10]
            },
            "test_run_size": 0.08,
            "combinations": 12
        },
        {
            "name": "logistic_regression",
            "classifier": "logistic_regression",
            "estimator": "LogisticRegression",
            "params": {
                "tol": [0.1, 0.01, 0.0001, 0.000001],
                "C": [100.0, 10, 1.0, 0.1, 0.001]
            },
            "test_run_size": 0.5,
            "combinations": 20
        },
        {
            "name": "naive_bayes",
            "classifier": "gaussian_nb",
            "estimator": "GaussianNB",
            "params": {},
            "test_run_size": 0.5,
            "combinations": 1
        }
    ]});

    assert_eq!(summary(Profile::Best), expected);
}

#[test]
fn axis_order_is_preserved() {
    let catalog = get_models(Profile::Best);
    let axes: Vec<Vec<&str>> = catalog
        .iter()
        .map(|spec| spec.params.names().collect())
        .collect();

    assert_eq!(
        axes,
        [
            vec![
                "learning_rate",
                "max_depth",
                "max_features",
                "min_impurity_decrease",
                "min_samples_leaf",
            ],
            vec![
                "max_features",
                "max_depth",
                "min_impurity_decrease",
                "min_samples_leaf",
            ],
            vec!["kernel", "degree"],
            vec!["tol", "C"],
            vec![],
        ]
    );
}

#[test]
fn base_profile() {
    let catalog = get_models(Profile::Base);

    assert_eq!(catalog.len(), 4);
    assert!(!catalog.contains("naive_bayes"));
    assert!(catalog.iter().all(|spec| spec.test_run_size.is_none()));
}

#[test]
fn best_profile() {
    let catalog = get_models(Profile::Best);

    assert_eq!(catalog.len(), 5);
    for spec in &catalog {
        let size = spec.test_run_size.unwrap();
        assert!(size > 0.0 && size <= 1.0, "{}: {size}", spec.name);
    }

    let base = get_models(Profile::Base);
    for name in ["gradient_boosting", "random_forest"] {
        for axis in ["min_impurity_decrease", "min_samples_leaf"] {
            assert!(catalog.get(name).unwrap().params.contains(axis));
            assert!(!base.get(name).unwrap().params.contains(axis));
        }
    }
}

#[test]
fn naive_bayes_searches_nothing() {
    let catalog = get_models(Profile::Best);
    let nb = catalog.get("naive_bayes").unwrap();

    assert!(nb.params.is_empty());
    assert_eq!(nb.params.combinations().count(), 1);
    assert_eq!(nb.classifier.name(), "GaussianNB");
}

#[test]
fn repeated_calls_are_equivalent() {
    for profile in Profile::ALL {
        let first = get_models(profile);
        let second = get_models(profile);

        assert_eq!(first.summary(), second.summary());
        assert!(first.names().eq(second.names()));
    }
}

#[test]
fn classifiers_are_not_shared() {
    let mut first = get_models(Profile::Best);
    let second = get_models(Profile::Best);
    let data = blobs();

    let svm = &mut first.get_mut("svm").unwrap().classifier;
    svm.fit(&data).unwrap();
    assert_eq!(svm.score(&data).unwrap(), 1.0);

    let untouched = &second.get("svm").unwrap().classifier;
    assert!(matches!(
        untouched.predict(data.x()),
        Err(MlError::NotFitted(_))
    ));
}

#[test]
fn every_grid_value_is_accepted() {
    for profile in Profile::ALL {
        for spec in &get_models(profile) {
            for (axis, values) in spec.params.axes() {
                for value in values {
                    let mut classifier: Box<dyn Classifier> = spec.classifier.fresh();
                    classifier
                        .set_param(axis, value)
                        .unwrap_or_else(|e| panic!("{}: {axis}={value}: {e}", spec.name));
                }
            }
        }
    }
}

#[test]
fn unknown_profiles_are_rejected() {
    assert!(matches!(
        "nightly".parse::<Profile>(),
        Err(RegistryErr::UnknownProfile(name)) if name == "nightly"
    ));
}

use model_registry::{Catalog, ClassifierBuilder, Dataset, ParamValue};
use rand::{SeedableRng, rngs::StdRng};

const CATALOG: &str = r#"{
    "models": [
        {"name": "logistic_regression", "classifier": "logistic_regression",
         "params": {"tol": [0.1, 0.0001], "C": [100.0, 0.001]},
         "test_run_size": 0.5},
        {"name": "forest", "classifier": "random_forest",
         "params": {"n_estimators": [5], "max_features": [null], "max_depth": [1, null]}},
        {"name": "naive_bayes", "classifier": "gaussian_nb", "test_run_size": 0.5}
    ]
}"#;

fn blobs() -> Dataset {
    let mut rows = Vec::new();
    let mut labels = Vec::new();
    for (label, (cx, cy)) in [(2, (-4.0, 0.0)), (7, (4.0, 0.0))] {
        for i in 0..20 {
            let offset = f64::from(i % 5) * 0.2 - 0.4;
            rows.extend([cx + offset, cy + f64::from(i / 5) * 0.2]);
            labels.push(label);
        }
    }
    Dataset::from_rows(rows, 2, labels).unwrap()
}

#[test]
fn grid_search_over_a_custom_catalog() {
    let builder = ClassifierBuilder::new().with_random_state(11);
    let catalog = Catalog::from_json_str(CATALOG, &builder).unwrap();
    let data = blobs();
    let mut rng = StdRng::seed_from_u64(5);

    for spec in &catalog {
        let sample = spec.sample(&data, &mut rng).unwrap();
        assert_eq!(sample.len(), spec.sample_size(data.len()).unwrap());

        let mut trials = 0;
        let mut best = 0.0_f64;
        for (combination, classifier) in spec.trials() {
            let mut classifier = classifier.unwrap();
            classifier.fit(&sample).unwrap();
            let score = classifier.score(&data).unwrap();
            assert!((0.0..=1.0).contains(&score), "{}: {combination}", spec.name);
            best = best.max(score);
            trials += 1;
        }

        assert_eq!(trials, spec.params.num_combinations());
        assert_eq!(best, 1.0, "{} never separated the blobs", spec.name);
    }
}

#[test]
fn trials_apply_the_combination() {
    let catalog = Catalog::from_json_str(CATALOG, &ClassifierBuilder::new()).unwrap();
    let spec = catalog.get("logistic_regression").unwrap();

    let combinations: Vec<_> = spec.params.combinations().collect();
    assert_eq!(combinations.len(), 4);
    assert_eq!(combinations[0].get("tol"), Some(&ParamValue::Float(0.1)));
    assert_eq!(combinations[0].get("C"), Some(&ParamValue::Float(100.0)));
    assert_eq!(combinations[3].get("C"), Some(&ParamValue::Float(0.001)));
}

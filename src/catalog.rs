use std::{collections::HashSet, fs, path::Path, slice, vec};

use serde::{Deserialize, Serialize};

use crate::{
    error::{RegistryErr, Result},
    grid::ParamGrid,
    kind::{ClassifierBuilder, ClassifierKind},
    model_spec::{ModelSpec, ModelSummary},
};

/// An insertion-ordered collection of `ModelSpec`s keyed by name.
#[derive(Debug, Default)]
pub struct Catalog {
    models: Vec<ModelSpec>,
}

/// Serializable description of a whole catalog.
///
/// Its JSON form is also a valid catalog document for `Catalog::from_json_str`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub models: Vec<ModelSummary>,
}

/// The on-disk form of a catalog.
#[derive(Debug, Deserialize)]
struct CatalogDoc {
    models: Vec<ModelDoc>,
}

#[derive(Debug, Deserialize)]
struct ModelDoc {
    name: String,
    classifier: ClassifierKind,
    #[serde(default)]
    params: ParamGrid,
    #[serde(default)]
    test_run_size: Option<f64>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps entries whose names are already known to be unique.
    pub(crate) fn from_specs(models: Vec<ModelSpec>) -> Self {
        Self { models }
    }

    /// Appends an entry.
    ///
    /// # Errors
    /// `RegistryErr::DuplicateModel` if the name is already taken.
    pub fn insert(&mut self, spec: ModelSpec) -> Result<()> {
        if self.get(&spec.name).is_some() {
            return Err(RegistryErr::DuplicateModel(spec.name));
        }
        self.models.push(spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|spec| spec.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ModelSpec> {
        self.models.iter_mut().find(|spec| spec.name == name)
    }

    /// Takes ownership of a single entry, keeping the order of the rest.
    pub fn remove(&mut self, name: &str) -> Option<ModelSpec> {
        let position = self.models.iter().position(|spec| spec.name == name)?;
        Some(self.models.remove(position))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|spec| spec.name.as_str())
    }

    pub fn iter(&self) -> slice::Iter<'_, ModelSpec> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Checks every entry and the uniqueness of their names.
    ///
    /// Every candidate value is applied to a fresh estimator, so a catalog
    /// that validates can be swept without hyperparameter errors.
    ///
    /// # Errors
    /// The first problem found, see `ModelSpec::validate`.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.models.len());
        for spec in &self.models {
            if !seen.insert(spec.name.as_str()) {
                return Err(RegistryErr::DuplicateModel(spec.name.clone()));
            }
            spec.validate()?;
        }
        Ok(())
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            models: self.models.iter().map(ModelSpec::summary).collect(),
        }
    }

    /// Parses and validates a JSON catalog.
    ///
    /// # Arguments
    /// * `json` - A document of the form
    ///   `{"models": [{"name", "classifier", "params", "test_run_size"}]}`.
    /// * `builder` - Creates the estimator of every entry.
    ///
    /// # Errors
    /// `RegistryErr::Json` on malformed documents or unknown classifiers,
    /// otherwise any error of `Catalog::validate`.
    pub fn from_json_str(json: &str, builder: &ClassifierBuilder) -> Result<Self> {
        let doc: CatalogDoc = serde_json::from_str(json)?;

        let mut catalog = Catalog::new();
        for model in doc.models {
            let spec = ModelSpec::new(model.name, model.classifier, builder)
                .with_params(model.params)
                .with_test_run_size(model.test_run_size);
            catalog.insert(spec)?;
        }

        catalog.validate()?;
        log::debug!("loaded a catalog of {} models", catalog.len());
        Ok(catalog)
    }

    /// Reads a JSON catalog from a file, see `Catalog::from_json_str`.
    pub fn from_json_file(path: impl AsRef<Path>, builder: &ClassifierBuilder) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        log::debug!("reading catalog from {}", path.display());
        Self::from_json_str(&json, builder)
    }
}

impl IntoIterator for Catalog {
    type Item = ModelSpec;
    type IntoIter = vec::IntoIter<ModelSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.into_iter()
    }
}

impl<'a> IntoIterator for &'a Catalog {
    type Item = &'a ModelSpec;
    type IntoIter = slice::Iter<'a, ModelSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.models.iter()
    }
}

#[cfg(test)]
mod tests {
    use ml_core::{MlError, ParamValue};

    use super::*;

    const CUSTOM: &str = r#"{
        "models": [
            {"name": "forest", "classifier": "random_forest",
             "params": {"max_depth": [3, null], "max_features": ["sqrt"]},
             "test_run_size": 0.25},
            {"name": "nb", "classifier": "gaussian_nb"}
        ]
    }"#;

    fn load(json: &str) -> Result<Catalog> {
        Catalog::from_json_str(json, &ClassifierBuilder::new())
    }

    #[test]
    fn loads_a_custom_catalog() {
        let catalog = load(CUSTOM).unwrap();

        assert_eq!(catalog.names().collect::<Vec<_>>(), ["forest", "nb"]);
        let forest = catalog.get("forest").unwrap();
        assert_eq!(forest.kind, ClassifierKind::RandomForest);
        assert_eq!(
            forest.params.get("max_depth"),
            Some(&[ParamValue::Int(3), ParamValue::Unbounded][..])
        );
        assert_eq!(forest.test_run_size, Some(0.25));

        let nb = catalog.get("nb").unwrap();
        assert!(nb.params.is_empty());
        assert_eq!(nb.test_run_size, None);
    }

    #[test]
    fn rejects_duplicate_names() {
        let json = r#"{"models": [
            {"name": "a", "classifier": "svc"},
            {"name": "a", "classifier": "gaussian_nb"}
        ]}"#;
        assert!(matches!(load(json), Err(RegistryErr::DuplicateModel(name)) if name == "a"));
    }

    #[test]
    fn rejects_unknown_classifiers_and_values() {
        let unknown = r#"{"models": [{"name": "a", "classifier": "xgboost"}]}"#;
        assert!(matches!(load(unknown), Err(RegistryErr::Json(_))));

        let bad_value = r#"{"models": [
            {"name": "a", "classifier": "svc", "params": {"kernel": ["linear", "cubic"]}}
        ]}"#;
        assert!(matches!(
            load(bad_value),
            Err(RegistryErr::Ml(MlError::InvalidParam { .. }))
        ));

        let bad_size = r#"{"models": [
            {"name": "a", "classifier": "svc", "test_run_size": 1.5}
        ]}"#;
        assert!(matches!(
            load(bad_size),
            Err(RegistryErr::InvalidTestRunSize { .. })
        ));
    }

    #[test]
    fn summary_reloads_as_the_same_catalog() {
        let catalog = load(CUSTOM).unwrap();
        let json = serde_json::to_string(&catalog.summary()).unwrap();
        let reloaded = load(&json).unwrap();

        assert_eq!(reloaded.summary(), catalog.summary());
    }

    #[test]
    fn remove_keeps_the_order() {
        let mut catalog = load(CUSTOM).unwrap();
        catalog
            .insert(ModelSpec::new("svm", ClassifierKind::Svc, &ClassifierBuilder::new()))
            .unwrap();

        let forest = catalog.remove("forest").unwrap();
        assert_eq!(forest.name, "forest");
        assert!(catalog.remove("forest").is_none());
        assert_eq!(catalog.names().collect::<Vec<_>>(), ["nb", "svm"]);
        assert_eq!(catalog.into_iter().count(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let loaded = Catalog::from_json_file("no/such/catalog.json", &ClassifierBuilder::new());
        assert!(matches!(loaded, Err(RegistryErr::Io(_))));
    }
}

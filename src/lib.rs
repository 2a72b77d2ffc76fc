//! Catalogs of classifiers and the hyperparameter grids to search them over.
//!
//! ```no_run
//! use model_registry::{Profile, get_models};
//!
//! for spec in &get_models(Profile::Best) {
//!     println!("{}: {} combinations", spec.name, spec.params.num_combinations());
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod grid;
pub mod kind;
pub mod model_spec;
pub mod profile;
pub mod registry;

pub use catalog::{Catalog, CatalogSummary};
pub use error::{RegistryErr, Result};
pub use grid::{Combinations, ParamGrid};
pub use kind::{ClassifierBuilder, ClassifierKind};
pub use model_spec::{ModelSpec, ModelSummary};
pub use profile::Profile;
pub use registry::{ModelRegistry, get_models};

pub use ml_core::{Classifier, Dataset, MlError, ParamSet, ParamValue};

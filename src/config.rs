use std::{env, fmt, path::PathBuf};

use crate::{
    catalog::Catalog,
    error::{RegistryErr, Result},
    profile::Profile,
    registry::ModelRegistry,
};

/// Selects the built-in profile when no catalog file is given.
pub const PROFILE_VAR: &str = "MODEL_REGISTRY_PROFILE";
/// Path of a JSON catalog that replaces the built-in profiles.
pub const CATALOG_VAR: &str = "MODEL_REGISTRY_CATALOG";
/// Seed for the randomized estimators.
pub const SEED_VAR: &str = "MODEL_REGISTRY_SEED";

/// Where a catalog comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogSource {
    Profile(Profile),
    File(PathBuf),
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogSource::Profile(profile) => write!(f, "profile '{profile}'"),
            CatalogSource::File(path) => write!(f, "file '{}'", path.display()),
        }
    }
}

/// Runtime configuration of the registry binary.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    pub source: CatalogSource,
    pub random_state: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            source: CatalogSource::Profile(Profile::default()),
            random_state: None,
        }
    }
}

impl RegistryConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, a catalog file wins over a
    /// profile.
    ///
    /// # Errors
    /// `RegistryErr::UnknownProfile` or `RegistryErr::InvalidArgs` on values
    /// that do not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = match (lookup(CATALOG_VAR), lookup(PROFILE_VAR)) {
            (Some(path), _) => CatalogSource::File(PathBuf::from(path)),
            (None, Some(profile)) => CatalogSource::Profile(profile.parse()?),
            (None, None) => CatalogSource::Profile(Profile::default()),
        };

        let random_state = lookup(SEED_VAR)
            .map(|seed| {
                seed.trim().parse::<u64>().map_err(|e| {
                    RegistryErr::InvalidArgs(format!("{SEED_VAR}='{seed}': {e}"))
                })
            })
            .transpose()?;

        Ok(Self {
            source,
            random_state,
        })
    }

    /// Overrides the configuration with command line arguments.
    ///
    /// Accepts either a profile name or `--catalog <path>`.
    pub fn with_args<I>(mut self, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        match args.next().as_deref() {
            None => {}
            Some("--catalog") => {
                let path = args.next().ok_or_else(|| {
                    RegistryErr::InvalidArgs("--catalog expects a path".to_string())
                })?;
                self.source = CatalogSource::File(PathBuf::from(path));
            }
            Some(profile) => self.source = CatalogSource::Profile(profile.parse()?),
        }

        if let Some(extra) = args.next() {
            return Err(RegistryErr::InvalidArgs(format!("unexpected argument '{extra}'")));
        }
        Ok(self)
    }

    /// Builds or reads the configured catalog.
    pub fn load(&self) -> Result<Catalog> {
        let mut registry = match &self.source {
            CatalogSource::Profile(profile) => ModelRegistry::new(*profile),
            CatalogSource::File(_) => ModelRegistry::default(),
        };
        if let Some(seed) = self.random_state {
            registry = registry.with_random_state(seed);
        }

        match &self.source {
            CatalogSource::Profile(_) => Ok(registry.get_models()),
            CatalogSource::File(path) => Catalog::from_json_file(path, registry.builder()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    fn args(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn defaults_to_the_best_profile() {
        let config = RegistryConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(config.source, CatalogSource::Profile(Profile::Best));
    }

    #[test]
    fn reads_the_environment() {
        let config =
            RegistryConfig::from_lookup(lookup(&[(PROFILE_VAR, "Base"), (SEED_VAR, "42")]))
                .unwrap();
        assert_eq!(config.source, CatalogSource::Profile(Profile::Base));
        assert_eq!(config.random_state, Some(42));

        let config = RegistryConfig::from_lookup(lookup(&[
            (PROFILE_VAR, "base"),
            (CATALOG_VAR, "models.json"),
        ]))
        .unwrap();
        assert_eq!(config.source, CatalogSource::File("models.json".into()));
    }

    #[test]
    fn rejects_bad_environment_values() {
        assert!(matches!(
            RegistryConfig::from_lookup(lookup(&[(PROFILE_VAR, "worst")])),
            Err(RegistryErr::UnknownProfile(_))
        ));
        assert!(matches!(
            RegistryConfig::from_lookup(lookup(&[(SEED_VAR, "-1")])),
            Err(RegistryErr::InvalidArgs(_))
        ));
    }

    #[test]
    fn arguments_override_the_environment() {
        let config = RegistryConfig::default();

        let base = config.clone().with_args(args(&["base"])).unwrap();
        assert_eq!(base.source, CatalogSource::Profile(Profile::Base));

        let file = config.clone().with_args(args(&["--catalog", "c.json"])).unwrap();
        assert_eq!(file.source, CatalogSource::File("c.json".into()));

        assert_eq!(config.clone().with_args(Vec::new()).unwrap(), config);
        assert!(config.clone().with_args(args(&["--catalog"])).is_err());
        assert!(config.with_args(args(&["base", "best"])).is_err());
    }

    #[test]
    fn loads_the_configured_profile() {
        let config = RegistryConfig {
            source: CatalogSource::Profile(Profile::Base),
            random_state: Some(1),
        };
        assert_eq!(config.load().unwrap().len(), 4);
    }
}

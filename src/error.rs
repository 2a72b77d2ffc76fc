use std::{error::Error, fmt, io};

use ml_core::MlError;

/// The registry's result type.
pub type Result<T> = std::result::Result<T, RegistryErr>;

/// Failures of catalog lookup, validation and loading.
#[derive(Debug)]
pub enum RegistryErr {
    UnknownProfile(String),
    UnknownClassifier(String),
    DuplicateModel(String),
    EmptyAxis {
        model: String,
        param: String,
    },
    InvalidTestRunSize {
        model: String,
        value: f64,
    },
    InvalidArgs(String),
    Ml(MlError),
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for RegistryErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryErr::UnknownProfile(name) => {
                write!(f, "unknown profile '{name}', expected 'base' or 'best'")
            }
            RegistryErr::UnknownClassifier(name) => write!(f, "unknown classifier '{name}'"),
            RegistryErr::DuplicateModel(name) => write!(f, "model '{name}' is defined twice"),
            RegistryErr::EmptyAxis { model, param } => {
                write!(f, "{model}: hyperparameter '{param}' has no candidate values")
            }
            RegistryErr::InvalidTestRunSize { model, value } => {
                write!(f, "{model}: test run size {value} is not in (0, 1]")
            }
            RegistryErr::InvalidArgs(msg) => write!(f, "invalid arguments: {msg}"),
            RegistryErr::Ml(e) => write!(f, "estimator error: {e}"),
            RegistryErr::Io(e) => write!(f, "io error: {e}"),
            RegistryErr::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for RegistryErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RegistryErr::Ml(e) => Some(e),
            RegistryErr::Io(e) => Some(e),
            RegistryErr::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlError> for RegistryErr {
    fn from(value: MlError) -> Self {
        Self::Ml(value)
    }
}

impl From<io::Error> for RegistryErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RegistryErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Boundary conversion for the binary.
impl From<RegistryErr> for io::Error {
    fn from(value: RegistryErr) -> Self {
        match value {
            RegistryErr::Io(e) => e,
            RegistryErr::InvalidArgs(_) | RegistryErr::UnknownProfile(_) => {
                io::Error::new(io::ErrorKind::InvalidInput, value)
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimator_errors_keep_their_source() {
        let err = RegistryErr::from(MlError::NotFitted("Svc"));
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("estimator error"));
    }

    #[test]
    fn usage_errors_map_to_invalid_input() {
        let err: io::Error = RegistryErr::UnknownProfile("worst".into()).into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(err.to_string().contains("worst"));
    }
}

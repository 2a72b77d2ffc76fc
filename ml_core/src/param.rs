use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MlError, Result};

/// A single candidate value of a hyperparameter.
///
/// Grids mix numbers, string enum tags and the "no constraint" marker in the
/// same axis, so the value is a tagged variant rather than a number.
/// In JSON it is written untagged: `1`, `0.5`, `"sqrt"` or `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Absence of a constraint, the estimator falls back to its unbounded behavior.
    Unbounded,
    Int(i64),
    Float(f64),
    Tag(String),
}

impl ParamValue {
    /// Numeric view of the value, integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            ParamValue::Int(i) => Some(i as f64),
            ParamValue::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&str> {
        match self {
            ParamValue::Tag(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, ParamValue::Unbounded)
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Unbounded => write!(f, "unbounded"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Tag(tag) => write!(f, "'{tag}'"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Tag(value.to_string())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ParamValue::Unbounded, Into::into)
    }
}

/// One point of a hyperparameter grid: a value for each named axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParamSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, replacing a previous value for the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, ParamValue)> for ParamSet {
    fn from_iter<I: IntoIterator<Item = (S, ParamValue)>>(iter: I) -> Self {
        let mut set = ParamSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl fmt::Display for ParamSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        write!(f, "}}")
    }
}

// Coercions shared by the estimators' `set_param` implementations.

pub(crate) fn invalid(model: &'static str, param: &'static str, value: &ParamValue) -> MlError {
    MlError::InvalidParam {
        model,
        param,
        value: value.to_string(),
    }
}

pub(crate) fn positive_f64(
    model: &'static str,
    param: &'static str,
    value: &ParamValue,
) -> Result<f64> {
    match value.as_f64() {
        Some(x) if x.is_finite() && x > 0.0 => Ok(x),
        _ => Err(invalid(model, param, value)),
    }
}

pub(crate) fn non_negative_f64(
    model: &'static str,
    param: &'static str,
    value: &ParamValue,
) -> Result<f64> {
    match value.as_f64() {
        Some(x) if x.is_finite() && x >= 0.0 => Ok(x),
        _ => Err(invalid(model, param, value)),
    }
}

pub(crate) fn finite_f64(
    model: &'static str,
    param: &'static str,
    value: &ParamValue,
) -> Result<f64> {
    match value.as_f64() {
        Some(x) if x.is_finite() => Ok(x),
        _ => Err(invalid(model, param, value)),
    }
}

pub(crate) fn at_least(
    model: &'static str,
    param: &'static str,
    value: &ParamValue,
    min: usize,
) -> Result<usize> {
    match *value {
        ParamValue::Int(i) if i >= min as i64 => Ok(i as usize),
        _ => Err(invalid(model, param, value)),
    }
}

/// Like `at_least`, but `Unbounded` maps to `None`.
pub(crate) fn optional_at_least(
    model: &'static str,
    param: &'static str,
    value: &ParamValue,
    min: usize,
) -> Result<Option<usize>> {
    if value.is_unbounded() {
        return Ok(None);
    }
    at_least(model, param, value, min).map(Some)
}

pub(crate) fn seed(
    model: &'static str,
    param: &'static str,
    value: &ParamValue,
) -> Result<Option<u64>> {
    match *value {
        ParamValue::Unbounded => Ok(None),
        ParamValue::Int(i) if i >= 0 => Ok(Some(i as u64)),
        _ => Err(invalid(model, param, value)),
    }
}

pub(crate) fn flag(model: &'static str, param: &'static str, value: &ParamValue) -> Result<bool> {
    match value.as_tag() {
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        _ => match *value {
            ParamValue::Int(0) => Ok(false),
            ParamValue::Int(1) => Ok(true),
            _ => Err(invalid(model, param, value)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_values_are_untagged() {
        let values: Vec<ParamValue> = serde_json::from_str(r#"[5, 0.5, "sqrt", null]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ParamValue::Int(5),
                ParamValue::Float(0.5),
                ParamValue::Tag("sqrt".into()),
                ParamValue::Unbounded,
            ]
        );

        let back = serde_json::to_string(&values).unwrap();
        assert_eq!(back, r#"[5,0.5,"sqrt",null]"#);
    }

    #[test]
    fn integers_widen_to_floats() {
        assert_eq!(ParamValue::Int(10).as_f64(), Some(10.0));
        assert_eq!(ParamValue::Tag("rbf".into()).as_f64(), None);
    }

    #[test]
    fn option_none_is_unbounded() {
        assert_eq!(ParamValue::from(None::<i64>), ParamValue::Unbounded);
        assert_eq!(ParamValue::from(Some(25_i64)), ParamValue::Int(25));
    }

    #[test]
    fn param_set_replaces_existing_names() {
        let mut set = ParamSet::new();
        set.insert("max_depth", ParamValue::Int(5));
        set.insert("max_depth", ParamValue::Unbounded);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("max_depth"), Some(&ParamValue::Unbounded));
        assert_eq!(set.to_string(), "{max_depth: unbounded}");
    }

    #[test]
    fn coercions_check_ranges() {
        assert!(positive_f64("m", "p", &ParamValue::Int(0)).is_err());
        assert_eq!(positive_f64("m", "p", &ParamValue::Int(10)).unwrap(), 10.0);
        assert!(at_least("m", "p", &ParamValue::Int(0), 1).is_err());
        assert_eq!(optional_at_least("m", "p", &ParamValue::Unbounded, 1).unwrap(), None);
        assert!(at_least("m", "p", &ParamValue::Float(2.0), 1).is_err());
    }
}

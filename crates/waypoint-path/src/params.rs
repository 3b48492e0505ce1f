//! Parameters captured from, or substituted into, a path.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PathError;

/// The value bound to one key.
///
/// Repeating keys (`:segment+`, `:segment*`) capture every segment
/// separately; all other keys capture a single string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// A single captured segment.
    Single(String),
    /// Segments captured by a repeating key, in order.
    Repeated(Vec<String>),
}

impl ParamValue {
    /// Returns the value when it is a single segment.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Repeated(_) => None,
        }
    }

    /// Returns every segment; a single value is a one-element slice.
    pub fn segments(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Repeated(values) => values,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => f.write_str(value),
            Self::Repeated(values) => f.write_str(&values.join("/")),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        Self::Repeated(values)
    }
}

/// Parameters keyed by name.
///
/// Unnamed groups such as `(.*)` are keyed by their index (`"0"`, `"1"`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    params: HashMap<String, ParamValue>,
}

impl Params {
    /// Creates new empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    /// Gets a single-valued parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(ParamValue::as_str)
    }

    /// Gets the raw value of a parameter.
    pub fn value(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Gets every segment of a parameter.
    pub fn get_all(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(ParamValue::segments)
    }

    /// Returns whether the parameter is bound.
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Gets a required parameter.
    pub fn require(&self, key: &str) -> Result<&str, PathError> {
        self.get(key).ok_or_else(|| PathError::MissingParam {
            name: key.to_string(),
            expected: "a string",
        })
    }

    /// Parses a parameter into `T`.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|s| s.parse().ok())
    }

    /// Copies every parameter of `other` over `self`.
    pub fn extend(&mut self, other: &Self) {
        for (key, value) in &other.params {
            self.params.insert(key.clone(), value.clone());
        }
    }

    /// Returns a copy of `self` overlaid with `other`.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        merged.extend(other);
        merged
    }

    /// Iterates over all parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns whether no parameter is bound.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_and_repeated() {
        let mut params = Params::new();
        params.insert("id", "42");
        params.insert("rest", vec!["a".to_string(), "b".to_string()]);

        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.get("rest"), None);
        assert_eq!(
            params.get_all("rest"),
            Some(&["a".to_string(), "b".to_string()][..])
        );
        assert_eq!(params.parse::<u32>("id"), Some(42));
        assert!(params.require("missing").is_err());
    }

    #[test]
    fn test_require_reports_missing_param() {
        let params: Params = [("id", "1")].into_iter().collect();
        assert_eq!(params.require("id"), Ok("1"));
        assert_eq!(
            params.require("slug"),
            Err(PathError::MissingParam {
                name: "slug".to_string(),
                expected: "a string",
            })
        );
    }

    #[test]
    fn test_merged_overrides() {
        let base: Params = [("id", "1"), ("tab", "info")].into_iter().collect();
        let overlay: Params = [("id", "2")].into_iter().collect();

        let merged = base.merged(&overlay);
        assert_eq!(merged.get("id"), Some("2"));
        assert_eq!(merged.get("tab"), Some("info"));
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"id":"7","parts":["x","y"]}"#;
        let params: Params = serde_json::from_str(json).unwrap();
        assert_eq!(params.get("id"), Some("7"));
        assert_eq!(params.get_all("parts").map(<[String]>::len), Some(2));
    }
}

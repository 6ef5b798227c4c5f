//! List filters sent as the `filters` query parameter.
//!
//! On the wire a filter set is a single compact JSON object mapping each key
//! to an array of accepted values, e.g. `{"dangling":["true"],"label":["a=b"]}`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Mapping of filter key to the set of values accepted for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filters(BTreeMap<String, BTreeSet<String>>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value under `key`. Adding the same pair twice has no effect.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.entry(key.into()).or_default().insert(value.into());
        self
    }

    /// Builder form of [`Filters::add`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add(key, value);
        self
    }

    /// Removes one value. The key disappears with its last value.
    pub fn del(&mut self, key: &str, value: &str) {
        if let Some(values) = self.0.get_mut(key) {
            values.remove(value);
            if values.is_empty() {
                self.0.remove(key);
            }
        }
    }

    pub fn get(&self, key: &str) -> Vec<&str> {
        self.0
            .get(key)
            .map(|values| values.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// True when `key` is unset or `value` is one of its values.
    pub fn exact_match(&self, key: &str, value: &str) -> bool {
        match self.0.get(key) {
            None => true,
            Some(values) => values.contains(value),
        }
    }

    /// True when `key` is unset or any of its values is a substring of
    /// `source`.
    pub fn include(&self, key: &str, source: &str) -> bool {
        match self.0.get(key) {
            None => true,
            Some(values) => values.iter().any(|v| source.contains(v.as_str())),
        }
    }

    /// Compact JSON with keys and values in sorted order. The empty set
    /// encodes as `{}`.
    pub fn encode(&self) -> String {
        // string keys and values always serialize
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parses the wire form. Anything other than an object whose values are
    /// arrays of strings is rejected.
    pub fn decode(text: &str) -> Result<Self, ValidationError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ValidationError::FilterFormat {
                reason: e.to_string(),
            })?;

        let object = value.as_object().ok_or_else(|| ValidationError::FilterFormat {
            reason: "expected a JSON object".to_string(),
        })?;

        let mut filters = Filters::new();
        for (key, values) in object {
            let items = values.as_array().ok_or_else(|| ValidationError::FilterFormat {
                reason: format!("values for '{key}' must be an array"),
            })?;
            let set = filters.0.entry(key.clone()).or_default();
            for item in items {
                let s = item.as_str().ok_or_else(|| ValidationError::FilterFormat {
                    reason: format!("value {item} for '{key}' is not a string"),
                })?;
                set.insert(s.to_string());
            }
        }
        Ok(filters)
    }
}

impl fmt::Display for Filters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Parses the encoded JSON form, the inverse of `Display`. Command-line
/// `key=value` arguments go through [`parse_filter_arg`].
impl FromStr for Filters {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Filters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = Filters::new();
        for (k, v) in iter {
            filters.add(k, v);
        }
        filters
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Filters {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.add(k, v);
        }
    }
}

/// Parses a command-line `key=value` filter argument.
pub fn parse_filter_arg(arg: &str) -> Result<(String, String), ValidationError> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_lowercase(), value.to_string()))
        }
        _ => Err(ValidationError::FilterFormat {
            reason: format!("bad format of filter '{arg}' (expected name=value)"),
        }),
    }
}

/// Serializes a filter set as its encoded string, for the `filters` field of
/// option structs.
pub(crate) fn serialize_filters<S>(filters: &Filters, s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    s.serialize_str(&filters.encode())
}

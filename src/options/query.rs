//! Flattening of option structs into query pairs.
//!
//! Booleans render as `1`/`0`, arrays repeat the key once per element and
//! `null` fields are dropped. Anything nested deeper than one array level
//! has no query form and is rejected; map-valued parameters must be
//! serialized to a JSON string by the field itself.

use serde::Serialize;
use serde_json::Value;

use crate::error::EncodingError;

pub fn to_pairs<T: Serialize + ?Sized>(options: &T) -> Result<Vec<(String, String)>, EncodingError> {
    let map = match serde_json::to_value(options)? {
        Value::Object(map) => map,
        Value::Null => return Ok(Vec::new()),
        other => {
            return Err(EncodingError::Unrepresentable {
                field: "<options>".to_string(),
                reason: format!("expected a struct of query fields, found {other}"),
            });
        }
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(s) = scalar(&key, item)? {
                        pairs.push((key.clone(), s));
                    }
                }
            }
            other => {
                if let Some(s) = scalar(&key, other)? {
                    pairs.push((key, s));
                }
            }
        }
    }
    Ok(pairs)
}

fn scalar(key: &str, value: Value) -> Result<Option<String>, EncodingError> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(if b { "1" } else { "0" }.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::String(s) => Ok(Some(s)),
        Value::Array(_) | Value::Object(_) => Err(EncodingError::Unrepresentable {
            field: key.to_string(),
            reason: "nested values have no query form".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    struct Sample {
        #[serde(skip_serializing_if = "Option::is_none")]
        all: Option<bool>,
        force: Option<bool>,
        limit: Option<i64>,
        t: Vec<String>,
        #[serde(skip)]
        _id: String,
    }

    #[test]
    fn test_scalars_and_repeats() {
        let sample = Sample {
            all: Some(true),
            force: Some(false),
            limit: None,
            t: vec!["app:1".into(), "app:latest".into()],
            _id: "skipped".into(),
        };
        assert_eq!(
            to_pairs(&sample).unwrap(),
            vec![
                ("all".to_string(), "1".to_string()),
                ("force".to_string(), "0".to_string()),
                ("t".to_string(), "app:1".to_string()),
                ("t".to_string(), "app:latest".to_string()),
            ]
        );
    }

    #[test]
    fn test_nested_map_fails_closed() {
        #[derive(Serialize)]
        struct Nested {
            labels: BTreeMap<String, String>,
        }
        let nested = Nested {
            labels: [("a".to_string(), "b".to_string())].into(),
        };
        assert!(matches!(
            to_pairs(&nested),
            Err(EncodingError::Unrepresentable { field, .. }) if field == "labels"
        ));
    }

    #[test]
    fn test_nested_array_fails_closed() {
        #[derive(Serialize)]
        struct Nested {
            v: Vec<Vec<u8>>,
        }
        assert!(to_pairs(&Nested { v: vec![vec![1]] }).is_err());
    }
}

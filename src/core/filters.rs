//! `--filter key=value` parsing and storage
//!
//! Each command declares which keys take a single value (last one wins) and
//! which accumulate. The collected set is either applied locally or sent to
//! the server as a JSON `search` parameter.

use crate::error::ValidationError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Split `key=value` on the first `=`, lowercasing the key.
pub fn parse_key_value(filter: &str) -> Result<(String, String), ValidationError> {
    match filter.split_once('=') {
        Some((key, value)) => Ok((key.to_lowercase(), value.to_string())),
        None => Err(ValidationError::FilterFormat),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters {
    single_keys: Vec<String>,
    multi_keys: Vec<String>,
    single: BTreeMap<String, String>,
    multi: BTreeMap<String, Vec<String>>,
}

impl Filters {
    pub fn new<S: AsRef<str>>(
        single_keys: &[&str],
        multi_keys: &[&str],
        filters: &[S],
    ) -> Result<Self, ValidationError> {
        let mut set = Self {
            single_keys: single_keys.iter().map(|k| k.to_string()).collect(),
            multi_keys: multi_keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        };
        for filter in filters {
            set.add(filter.as_ref())?;
        }
        Ok(set)
    }

    pub fn add(&mut self, filter: &str) -> Result<(), ValidationError> {
        let (key, value) = parse_key_value(filter)?;
        if self.is_single(&key) {
            self.single.insert(key, value);
        } else if self.is_multi(&key) {
            self.multi.entry(key).or_default().push(value);
        } else {
            return Err(ValidationError::UnknownFilter {
                key,
                available: self.available_keys(),
            });
        }
        Ok(())
    }

    /// Value of a single-value filter, or an empty string when unset.
    pub fn get_single(&self, key: &str) -> Result<String, ValidationError> {
        if !self.is_single(key) {
            return Err(ValidationError::NotSingleFilter {
                key: key.to_string(),
                available: self.single_keys.join(", "),
            });
        }
        Ok(self.single.get(key).cloned().unwrap_or_default())
    }

    /// Values of a multi-value filter, or an empty list when unset.
    pub fn get_multi(&self, key: &str) -> Result<Vec<String>, ValidationError> {
        if !self.is_multi(key) {
            return Err(ValidationError::NotMultiFilter {
                key: key.to_string(),
                available: self.multi_keys.join(", "),
            });
        }
        Ok(self.multi.get(key).cloned().unwrap_or_default())
    }

    /// Canonical JSON object with the requested keys that are declared and
    /// set. Returns an empty string when nothing matches.
    pub fn get_json(&self, keys: &[&str]) -> Result<String, ValidationError> {
        let mut sorted = keys.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut object = Map::new();
        for key in &sorted {
            if let Some(value) = self.single.get(*key) {
                object.insert(key.to_string(), Value::String(value.clone()));
            } else if let Some(values) = self.multi.get(*key) {
                let list = values.iter().cloned().map(Value::String).collect();
                object.insert(key.to_string(), Value::Array(list));
            }
        }
        if object.is_empty() {
            return Ok(String::new());
        }
        serde_json::to_string(&Value::Object(object))
            .map_err(|e| ValidationError::Other(format!("failed to encode filters: {}", e)))
    }

    /// Check that every value given for `key` is one of `allowed`.
    pub fn validate_values(&self, key: &str, allowed: &[&str]) -> Result<(), ValidationError> {
        let values = if self.is_single(key) {
            self.single.get(key).into_iter().cloned().collect()
        } else if self.is_multi(key) {
            self.multi.get(key).cloned().unwrap_or_default()
        } else {
            return Err(ValidationError::UnknownFilter {
                key: key.to_string(),
                available: self.available_keys(),
            });
        };

        for value in values {
            if !allowed.contains(&value.as_str()) {
                return Err(ValidationError::FilterValue {
                    key: key.to_string(),
                    value,
                    available: allowed.join(", "),
                });
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.single.is_empty() && self.multi.is_empty()
    }

    fn is_single(&self, key: &str) -> bool {
        self.single_keys.iter().any(|k| k == key)
    }

    fn is_multi(&self, key: &str) -> bool {
        self.multi_keys.iter().any(|k| k == key)
    }

    fn available_keys(&self) -> String {
        self.single_keys
            .iter()
            .chain(self.multi_keys.iter())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

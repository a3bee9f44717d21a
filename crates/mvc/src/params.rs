use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DispatchError;

/// Named request parameters handed to an action.
///
/// Query strings only carry text, so typed lookups fall back to reading a
/// string value as JSON (`"5"` binds to an integer, `"true"` to a bool).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn raw(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Later values win.
    pub fn merge(&mut self, other: Params) {
        self.0.extend(other.0);
    }

    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, DispatchError> {
        match self.0.get(name) {
            Some(value) => bind_value(name, value).map(Some),
            None => Ok(None),
        }
    }

    pub fn get_or<T: DeserializeOwned>(&self, name: &str, default: T) -> Result<T, DispatchError> {
        Ok(self.get(name)?.unwrap_or(default))
    }

    pub fn require<T: DeserializeOwned>(&self, name: &str) -> Result<T, DispatchError> {
        self.get(name)?.ok_or_else(|| {
            DispatchError::BadRequest(format!("Missing required parameters: {name}"))
        })
    }

    /// Checks every name at once so the error lists all that are absent.
    pub fn require_all(&self, names: &[&str]) -> Result<(), DispatchError> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|name| !self.contains(name))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::BadRequest(format!(
                "Missing required parameters: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Params {
    fn from(value: Map<String, Value>) -> Self {
        Self(value)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), Value::String(value.into())))
                .collect(),
        )
    }
}

fn bind_value<T: DeserializeOwned>(name: &str, value: &Value) -> Result<T, DispatchError> {
    if let Ok(bound) = T::deserialize(value) {
        return Ok(bound);
    }
    if let Value::String(raw) = value {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            if let Ok(bound) = T::deserialize(&parsed) {
                return Ok(bound);
            }
        }
    }
    Err(DispatchError::BadRequest(format!(
        "Invalid data received for parameter \"{name}\"."
    )))
}

#[cfg(test)]
#[path = "tests/params_tests.rs"]
mod tests;

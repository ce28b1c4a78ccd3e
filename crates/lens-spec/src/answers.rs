use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Problems converting loosely typed JSON into an [`AnswerSet`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnswerError {
    #[error("answers must be a JSON object")]
    NotAnObject,
    #[error("answer '{0}' must be a string, number, or boolean")]
    UnsupportedValue(String),
}

/// Raw answers keyed by field name.
///
/// Values are kept exactly as entered; numbers and booleans are stored in their
/// string form so every field shares one representation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnswerSet {
    values: BTreeMap<String, String>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Current value of `name`, or the empty string when unanswered.
    pub fn value(&self, name: &str) -> &str {
        self.get(name).unwrap_or("")
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.values.remove(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Builds an answer set from a JSON object, stringifying numbers and booleans.
    /// `null` entries are treated as unanswered.
    pub fn from_json(value: &Value) -> Result<Self, AnswerError> {
        let object = value.as_object().ok_or(AnswerError::NotAnObject)?;
        let mut answers = Self::new();
        for (name, raw) in object {
            match raw {
                Value::Null => {}
                Value::String(text) => answers.set(name.clone(), text.clone()),
                Value::Number(number) => answers.set(name.clone(), number.to_string()),
                Value::Bool(flag) => answers.set(name.clone(), flag.to_string()),
                Value::Array(_) | Value::Object(_) => {
                    return Err(AnswerError::UnsupportedValue(name.clone()));
                }
            }
        }
        Ok(answers)
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();
        Value::Object(map)
    }
}

impl<K, V> FromIterator<(K, V)> for AnswerSet
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// Validation failure for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub code: String,
}

/// Per-field errors for the currently active fields.
///
/// A field without an entry is either valid or inactive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub errors: BTreeMap<String, ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: BTreeMap<String, ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn error(&self, field: &str) -> Option<&ValidationError> {
        self.errors.get(field)
    }

    pub fn message(&self, field: &str) -> Option<&str> {
        self.error(field).map(|error| error.message.as_str())
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

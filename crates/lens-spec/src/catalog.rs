use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Lens-type names offered for each wearing schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct LensCatalog {
    entries: BTreeMap<String, Vec<String>>,
}

impl LensCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(
        mut self,
        key: impl Into<String>,
        lens_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.entries.insert(
            key.into(),
            lens_types.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Ordered lens types for `key`, or `None` when the schedule is unknown.
    pub fn entry(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

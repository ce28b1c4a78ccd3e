use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rule::RequirementRule;

/// Supported field data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Enum,
    Boolean,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Enum => "enum",
            FieldKind::Boolean => "boolean",
        }
    }
}

/// Where an enum field takes its allowed values from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum OptionSource {
    /// A fixed, ordered list declared with the field.
    Fixed { values: Vec<String> },
    /// The catalog entry keyed by the current value of another field.
    Catalog { keyed_by: String },
}

impl OptionSource {
    /// Name of the field this source depends on, if any.
    pub fn governing_field(&self) -> Option<&str> {
        match self {
            OptionSource::Fixed { .. } => None,
            OptionSource::Catalog { keyed_by } => Some(keyed_by),
        }
    }
}

/// Format checks applied to an active, non-empty value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_message: Option<String>,
    /// Numeric values must be strictly greater than zero.
    #[serde(default)]
    pub positive: bool,
}

/// Definition of a single form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub required: RequirementRule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_message: Option<String>,
}

impl FieldSpec {
    /// Message reported when an active field is left empty.
    pub fn required_message(&self) -> String {
        self.required_message
            .clone()
            .unwrap_or_else(|| format!("{} is required", self.label))
    }

    /// Fields whose values decide whether this one is active or which options it offers.
    pub fn governing_fields(&self) -> Vec<&str> {
        let mut governing = Vec::new();
        if let Some(name) = self.required.governing_field() {
            governing.push(name);
        }
        if let Some(name) = self
            .options
            .as_ref()
            .and_then(OptionSource::governing_field)
            && !governing.contains(&name)
        {
            governing.push(name);
        }
        governing
    }
}

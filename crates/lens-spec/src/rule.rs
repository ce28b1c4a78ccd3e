use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Decides whether a field must be answered given the answers before it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RequirementRule {
    #[default]
    Always,
    Never,
    /// Required only while `field` is active and holds exactly `value`.
    WhenEquals { field: String, value: String },
}

impl RequirementRule {
    pub fn when_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        RequirementRule::WhenEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn governing_field(&self) -> Option<&str> {
        match self {
            RequirementRule::WhenEquals { field, .. } => Some(field),
            RequirementRule::Always | RequirementRule::Never => None,
        }
    }
}

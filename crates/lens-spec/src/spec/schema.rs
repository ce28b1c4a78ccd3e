use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::catalog::LensCatalog;
use crate::spec::field::FieldSpec;

/// Top-level form schema as declared on disk, before registry checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub catalog: LensCatalog,
    pub fields: Vec<FieldSpec>,
}

impl SchemaSpec {
    /// JSON Schema describing the on-disk field schema format.
    pub fn definition_schema() -> serde_json::Value {
        schemars::schema_for!(SchemaSpec).to_value()
    }
}

use serde_json::{Map, Value};

use crate::activity::ActivityMap;
use crate::answers::AnswerSet;
use crate::registry::FieldRegistry;
use crate::spec::field::{FieldKind, FieldSpec};

/// Generates an answers JSON schema restricted to the visible fields.
///
/// All values travel as strings, so numeric and boolean fields are expressed as
/// string patterns rather than JSON number/boolean types.
pub fn generate(registry: &FieldRegistry, answers: &AnswerSet, activity: &ActivityMap) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in registry.fields() {
        let Some(state) = activity.get(&field.name) else {
            continue;
        };
        if !state.is_visible() {
            continue;
        }
        properties.insert(field.name.clone(), field_schema(registry, field, answers));
        if state.is_active() {
            required.push(Value::String(field.name.clone()));
        }
    }

    let mut root = Map::new();
    root.insert("$id".into(), Value::String(registry.id().to_string()));
    root.insert("title".into(), Value::String(registry.title().to_string()));
    root.insert("type".into(), Value::String("object".into()));
    root.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        root.insert("required".into(), Value::Array(required));
    }

    Value::Object(root)
}

fn field_schema(registry: &FieldRegistry, field: &FieldSpec, answers: &AnswerSet) -> Value {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("string".into()));
    schema.insert("title".into(), Value::String(field.label.clone()));

    match field.kind {
        FieldKind::Text => {
            schema.insert("minLength".into(), Value::Number(1.into()));
            if let Some(pattern) = field
                .constraint
                .as_ref()
                .and_then(|constraint| constraint.pattern.clone())
            {
                schema.insert("pattern".into(), Value::String(pattern));
            }
        }
        FieldKind::Number => {
            schema.insert(
                "pattern".into(),
                Value::String(r"^\s*[-+]?(\d+\.?\d*|\.\d+)([eE][-+]?\d+)?\s*$".into()),
            );
        }
        FieldKind::Enum => {
            let options = registry.options_for(field, answers).unwrap_or_default();
            schema.insert(
                "enum".into(),
                Value::Array(
                    options
                        .iter()
                        .map(|value| Value::String(value.clone()))
                        .collect(),
                ),
            );
        }
        FieldKind::Boolean => {
            schema.insert(
                "enum".into(),
                Value::Array(vec![
                    Value::String("true".into()),
                    Value::String("false".into()),
                ]),
            );
        }
    }

    Value::Object(schema)
}

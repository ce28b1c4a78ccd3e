use std::collections::BTreeMap;

use crate::activity::{Activity, ActivityMap};
use crate::answers::{AnswerSet, ValidationError, ValidationResult};
use crate::registry::FieldRegistry;
use crate::rule::RequirementRule;
use crate::spec::field::{FieldKind, FieldSpec, OptionSource};

/// Activity and validation computed together in a single declared-order pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub activity: ActivityMap,
    pub result: ValidationResult,
}

pub fn validate(registry: &FieldRegistry, answers: &AnswerSet) -> ValidationResult {
    evaluate(registry, answers).result
}

/// Resolves activity for every field and validates the active ones.
///
/// Fields are visited in declared order, so every governing field has already
/// been resolved (and, if active, validated) when its dependents are reached.
pub fn evaluate(registry: &FieldRegistry, answers: &AnswerSet) -> Evaluation {
    let mut activity = ActivityMap::new();
    let mut errors = BTreeMap::new();

    for field in registry.fields() {
        let state = resolve_field(registry, field, answers, &activity, &errors);
        activity.insert(field.name.clone(), state);

        if state.is_active()
            && let Some(error) = validate_value(registry, field, answers)
        {
            errors.insert(field.name.clone(), error);
        }
    }

    Evaluation {
        activity,
        result: ValidationResult::from_errors(errors),
    }
}

fn resolve_field(
    registry: &FieldRegistry,
    field: &FieldSpec,
    answers: &AnswerSet,
    activity: &ActivityMap,
    errors: &BTreeMap<String, ValidationError>,
) -> Activity {
    let base = match &field.required {
        RequirementRule::Always => Activity::Active,
        RequirementRule::Never => Activity::Optional,
        RequirementRule::WhenEquals {
            field: governing,
            value,
        } => {
            let governing_visible = activity.get(governing).is_some_and(Activity::is_visible);
            if governing_visible && answers.value(governing).trim() == value {
                Activity::Active
            } else {
                Activity::Hidden
            }
        }
    };

    if base == Activity::Hidden {
        return base;
    }

    if let Some(OptionSource::Catalog { keyed_by }) = &field.options {
        let key = answers.value(keyed_by).trim();
        let governing_ready = activity.get(keyed_by).is_some_and(Activity::is_active)
            && !errors.contains_key(keyed_by)
            && !key.is_empty()
            && registry.catalog().contains_key(key);
        if !governing_ready {
            return Activity::Hidden;
        }
    }

    base
}

fn validate_value(
    registry: &FieldRegistry,
    field: &FieldSpec,
    answers: &AnswerSet,
) -> Option<ValidationError> {
    let raw = answers.value(&field.name);
    let value = raw.trim();

    if value.is_empty() {
        return Some(base_error(field, field.required_message(), "required"));
    }

    match field.kind {
        FieldKind::Text => {
            if let Some(pattern) = registry.pattern(&field.name)
                && !pattern.is_match(raw)
            {
                let message = field
                    .constraint
                    .as_ref()
                    .and_then(|constraint| constraint.pattern_message.clone())
                    .unwrap_or_else(|| format!("Invalid {}", field.label.to_lowercase()));
                return Some(base_error(field, message, "pattern_mismatch"));
            }
        }
        FieldKind::Number => {
            let Some(number) = value.parse::<f64>().ok().filter(|number| number.is_finite())
            else {
                return Some(base_error(
                    field,
                    format!("{} must be a number", field.label),
                    "not_a_number",
                ));
            };
            let positive = field
                .constraint
                .as_ref()
                .is_some_and(|constraint| constraint.positive);
            if positive && number <= 0.0 {
                return Some(base_error(
                    field,
                    format!("{} must be positive", field.label),
                    "not_positive",
                ));
            }
        }
        FieldKind::Enum => {
            let allowed = registry.options_for(field, answers).unwrap_or_default();
            if !allowed.iter().any(|option| option == value) {
                return Some(base_error(
                    field,
                    format!("Please select a valid {}", field.label.to_lowercase()),
                    "enum_mismatch",
                ));
            }
        }
        FieldKind::Boolean => {
            if value != "true" && value != "false" {
                return Some(base_error(
                    field,
                    format!("{} must be true or false", field.label),
                    "invalid_boolean",
                ));
            }
        }
    }

    None
}

fn base_error(field: &FieldSpec, message: String, code: &str) -> ValidationError {
    ValidationError {
        field: field.name.clone(),
        message,
        code: code.into(),
    }
}

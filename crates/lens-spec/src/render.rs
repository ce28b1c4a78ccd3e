use std::collections::BTreeSet;

use serde_json::{Map, Value, json};

use crate::{
    activity::Activity,
    answers::AnswerSet,
    answers_schema,
    registry::FieldRegistry,
    spec::field::FieldKind,
    validate::{Evaluation, evaluate},
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// At least one active field is missing or invalid.
    NeedInput,
    /// Every active field holds a valid value.
    Complete,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Complete => "complete",
        }
    }
}

/// Progress counters exposed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProgress {
    pub answered: usize,
    pub total: usize,
}

/// Describes a single field for render outputs.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub activity: Activity,
    pub required: bool,
    pub visible: bool,
    pub touched: bool,
    pub current_value: Option<String>,
    pub options: Option<Vec<String>>,
    /// Inline message, present only once the field has been touched.
    pub error: Option<String>,
}

/// Read-only projection of the form consumed by presentation layers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub form_id: String,
    pub form_title: String,
    pub form_version: String,
    pub status: RenderStatus,
    pub next_field: Option<String>,
    pub progress: RenderProgress,
    pub help: Option<String>,
    pub fields: Vec<RenderField>,
    pub schema: Value,
}

impl RenderPayload {
    pub fn field(&self, name: &str) -> Option<&RenderField> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Build the renderer payload from the registry, answers, and touched fields.
pub fn build_render_payload(
    registry: &FieldRegistry,
    answers: &AnswerSet,
    touched: &BTreeSet<String>,
) -> RenderPayload {
    let evaluation = evaluate(registry, answers);
    build_render_payload_with(registry, answers, touched, &evaluation)
}

/// Same as [`build_render_payload`] but reuses an existing evaluation.
pub fn build_render_payload_with(
    registry: &FieldRegistry,
    answers: &AnswerSet,
    touched: &BTreeSet<String>,
    evaluation: &Evaluation,
) -> RenderPayload {
    let Evaluation { activity, result } = evaluation;

    let mut next_field = None;
    let mut answered = 0;
    let mut total = 0;

    let fields = registry
        .fields()
        .iter()
        .map(|field| {
            let state = activity
                .get(&field.name)
                .copied()
                .unwrap_or(Activity::Hidden);
            let has_error = result.has_error(&field.name);
            if state.is_active() {
                total += 1;
                if has_error {
                    next_field.get_or_insert_with(|| field.name.clone());
                } else {
                    answered += 1;
                }
            }
            let is_touched = touched.contains(&field.name);
            RenderField {
                name: field.name.clone(),
                label: field.label.clone(),
                kind: field.kind,
                activity: state,
                required: state.is_active(),
                visible: state.is_visible(),
                touched: is_touched,
                current_value: answers.get(&field.name).map(str::to_string),
                options: registry
                    .options_for(field, answers)
                    .filter(|_| state.is_visible())
                    .map(<[String]>::to_vec),
                error: result
                    .message(&field.name)
                    .filter(|_| is_touched)
                    .map(str::to_string),
            }
        })
        .collect::<Vec<_>>();

    let status = if result.is_valid() {
        RenderStatus::Complete
    } else {
        RenderStatus::NeedInput
    };

    RenderPayload {
        form_id: registry.id().to_string(),
        form_title: registry.title().to_string(),
        form_version: registry.version().to_string(),
        status,
        next_field,
        progress: RenderProgress { answered, total },
        help: registry.description().map(str::to_string),
        fields,
        schema: answers_schema::generate(registry, answers, activity),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("name".into(), Value::String(field.name.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.as_str().to_string()));
            map.insert("activity".into(), Value::String(field.activity.as_str().to_string()));
            map.insert("required".into(), Value::Bool(field.required));
            map.insert("visible".into(), Value::Bool(field.visible));
            map.insert("touched".into(), Value::Bool(field.touched));
            if let Some(current_value) = &field.current_value {
                map.insert("current_value".into(), Value::String(current_value.clone()));
            }
            if let Some(options) = &field.options {
                map.insert(
                    "options".into(),
                    Value::Array(
                        options
                            .iter()
                            .map(|option| Value::String(option.clone()))
                            .collect(),
                    ),
                );
            }
            if let Some(error) = &field.error {
                map.insert("error".into(), Value::String(error.clone()));
            }
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "form_id": payload.form_id,
        "form_title": payload.form_title,
        "form_version": payload.form_version,
        "status": payload.status.as_str(),
        "next_field": payload.next_field,
        "progress": {
            "answered": payload.progress.answered,
            "total": payload.progress.total,
        },
        "help": payload.help,
        "fields": fields,
        "schema": payload.schema,
    })
}

/// Render the payload as human-friendly text.
///
/// Every declared field is listed with its activity; values and inline
/// errors are shown only for visible fields.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = vec![format!(
        "{} v{} [{}] {}/{} required answered",
        payload.form_title,
        payload.form_version,
        payload.status.as_str(),
        payload.progress.answered,
        payload.progress.total
    )];
    if let Some(help) = &payload.help {
        lines.push(help.clone());
    }

    match payload.next_field.as_deref().and_then(|name| payload.field(name)) {
        Some(field) => {
            lines.push(format!("Next field: {} ({})", field.name, field.label));
            if let Some(options) = &field.options {
                lines.push(format!("  choose one of: {}", options.join(" | ")));
            }
        }
        None => lines.push("All active fields are valid.".to_string()),
    }

    lines.push("Fields:".to_string());
    for field in &payload.fields {
        let mut entry = format!(
            "  {:<8} {} ({})",
            field.activity.as_str(),
            field.name,
            field.label
        );
        if field.visible {
            if let Some(value) = field.current_value.as_deref().filter(|value| !value.is_empty()) {
                entry.push_str(&format!(" = {value}"));
            }
            if let Some(error) = &field.error {
                entry.push_str(&format!("  <- {error}"));
            }
        }
        lines.push(entry);
    }

    lines.join("\n")
}

#![allow(missing_docs)]

pub mod activity;
pub mod answers;
pub mod answers_schema;
pub mod catalog;
pub mod registry;
pub mod render;
pub mod rule;
pub mod spec;
pub mod validate;

pub use activity::{Activity, ActivityMap, active_fields, resolve_activity};
pub use answers::{AnswerError, AnswerSet, ValidationError, ValidationResult};
pub use answers_schema::generate as answers_schema;
pub use catalog::LensCatalog;
pub use registry::{FieldRegistry, SchemaError, contact_lens};
pub use render::{
    RenderField, RenderPayload, RenderProgress, RenderStatus, build_render_payload,
    build_render_payload_with, render_json_ui, render_text,
};
pub use rule::RequirementRule;
pub use spec::{Constraint, FieldKind, FieldSpec, OptionSource, SchemaSpec};
pub use validate::{Evaluation, evaluate, validate};

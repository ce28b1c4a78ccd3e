pub mod field;
pub mod schema;

pub use field::{Constraint, FieldKind, FieldSpec, OptionSource};
pub use schema::SchemaSpec;

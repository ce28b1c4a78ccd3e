use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use regex::Regex;
use thiserror::Error;

use crate::answers::AnswerSet;
use crate::catalog::LensCatalog;
use crate::spec::field::{FieldKind, FieldSpec, OptionSource};
use crate::spec::schema::SchemaSpec;

const CONTACT_LENS_SCHEMA: &str = include_str!("../schemas/contact_lens.json");

static CONTACT_LENS: OnceCell<Arc<FieldRegistry>> = OnceCell::new();

/// Reasons a schema is rejected at construction time.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),
    #[error("field '{field}' references unknown field '{references}'")]
    UnknownReference { field: String, references: String },
    #[error("field '{field}' references '{references}', which is not declared before it")]
    ForwardReference { field: String, references: String },
    #[error("enum field '{0}' declares no options")]
    MissingOptions(String),
    #[error("field '{field}' has an invalid pattern")]
    InvalidPattern {
        field: String,
        #[source]
        source: regex::Error,
    },
}

/// Checked, immutable view of a [`SchemaSpec`] with lookup by name.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    spec: SchemaSpec,
    index: BTreeMap<String, usize>,
    patterns: BTreeMap<String, Regex>,
}

impl FieldRegistry {
    pub fn new(spec: SchemaSpec) -> Result<Self, SchemaError> {
        let mut index = BTreeMap::new();
        let mut patterns = BTreeMap::new();

        for (position, field) in spec.fields.iter().enumerate() {
            if index.insert(field.name.clone(), position).is_some() {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }

            for governing in field.governing_fields() {
                check_reference(&spec.fields, &index, position, field, governing)?;
            }

            if matches!(field.kind, FieldKind::Enum) && field.options.is_none() {
                return Err(SchemaError::MissingOptions(field.name.clone()));
            }

            if let Some(pattern) = field
                .constraint
                .as_ref()
                .and_then(|constraint| constraint.pattern.as_deref())
            {
                let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                    field: field.name.clone(),
                    source,
                })?;
                patterns.insert(field.name.clone(), regex);
            }
        }

        Ok(Self {
            spec,
            index,
            patterns,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, SchemaError> {
        let spec: SchemaSpec = serde_json::from_str(raw)?;
        Self::new(spec)
    }

    pub fn id(&self) -> &str {
        &self.spec.id
    }

    pub fn title(&self) -> &str {
        &self.spec.title
    }

    pub fn version(&self) -> &str {
        &self.spec.version
    }

    pub fn description(&self) -> Option<&str> {
        self.spec.description.as_deref()
    }

    /// Fields in declared (natural answer) order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.spec.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|position| &self.spec.fields[*position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn catalog(&self) -> &LensCatalog {
        &self.spec.catalog
    }

    pub fn spec(&self) -> &SchemaSpec {
        &self.spec
    }

    pub(crate) fn pattern(&self, name: &str) -> Option<&Regex> {
        self.patterns.get(name)
    }

    /// Fields whose activity or options depend on `name`.
    pub fn dependents_of(&self, name: &str) -> Vec<&str> {
        self.spec
            .fields
            .iter()
            .filter(|field| field.governing_fields().contains(&name))
            .map(|field| field.name.as_str())
            .collect()
    }

    /// Allowed values of an enum field given the current answers.
    ///
    /// Catalog-backed fields resolve against the trimmed value of their governing
    /// field; `None` means no option set applies right now.
    pub fn options_for<'a>(
        &'a self,
        field: &'a FieldSpec,
        answers: &AnswerSet,
    ) -> Option<&'a [String]> {
        match field.options.as_ref()? {
            OptionSource::Fixed { values } => Some(values.as_slice()),
            OptionSource::Catalog { keyed_by } => {
                self.catalog().entry(answers.value(keyed_by).trim())
            }
        }
    }
}

fn check_reference(
    fields: &[FieldSpec],
    index: &BTreeMap<String, usize>,
    position: usize,
    field: &FieldSpec,
    references: &str,
) -> Result<(), SchemaError> {
    if index.get(references).is_some_and(|found| *found < position) {
        return Ok(());
    }
    if fields.iter().any(|candidate| candidate.name == references) {
        Err(SchemaError::ForwardReference {
            field: field.name.clone(),
            references: references.to_string(),
        })
    } else {
        Err(SchemaError::UnknownReference {
            field: field.name.clone(),
            references: references.to_string(),
        })
    }
}

/// Canonical contact-lens registry, built once per process.
pub fn contact_lens() -> Result<Arc<FieldRegistry>, SchemaError> {
    CONTACT_LENS
        .get_or_try_init(|| FieldRegistry::from_json(CONTACT_LENS_SCHEMA).map(Arc::new))
        .map(Arc::clone)
}

use lens_spec::{ActivityMap, AnswerSet, FieldRegistry};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Serialize, Serializer};

use crate::config::PayloadEncoding;

/// Characters left unescaped by JavaScript's `encodeURIComponent`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Ordered key/value record sent to the intake endpoint.
///
/// Every registry field is present; hidden fields carry an empty value so the
/// endpoint always receives the same key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRecord {
    fields: Vec<(String, String)>,
}

impl WireRecord {
    pub fn from_answers(
        registry: &FieldRegistry,
        answers: &AnswerSet,
        activity: &ActivityMap,
    ) -> Self {
        let fields = registry
            .fields()
            .iter()
            .map(|field| {
                let visible = activity
                    .get(&field.name)
                    .is_some_and(|state| state.is_visible());
                let value = if visible {
                    answers.value(&field.name).to_string()
                } else {
                    String::new()
                };
                (field.name.clone(), value)
            })
            .collect();
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Encodes the record as a request body. Both encodings keep declared order.
    pub fn encode(&self, encoding: PayloadEncoding) -> Result<WirePayload, serde_json::Error> {
        let body = match encoding {
            PayloadEncoding::FormUrlencoded => self
                .fields
                .iter()
                .map(|(key, value)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(key, COMPONENT),
                        utf8_percent_encode(value, COMPONENT)
                    )
                })
                .collect::<Vec<_>>()
                .join("&"),
            PayloadEncoding::Json => serde_json::to_string(self)?,
        };

        Ok(WirePayload {
            content_type: encoding.content_type(),
            body,
        })
    }
}

impl Serialize for WireRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.fields.iter().map(|(key, value)| (key, value)))
    }
}

/// Encoded request body plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WirePayload {
    pub content_type: &'static str,
    pub body: String,
}

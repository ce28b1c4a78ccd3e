use serde::Serialize;

use crate::answers::AnswerSet;
use crate::registry::FieldRegistry;
use crate::validate::evaluate;

pub type ActivityMap = std::collections::BTreeMap<String, Activity>;

/// How a field participates in the form for a given answer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// Visible and required; validated.
    Active,
    /// Visible but never required; not validated.
    Optional,
    /// Hidden; any stored value is ignored.
    Hidden,
}

impl Activity {
    pub fn is_active(&self) -> bool {
        matches!(self, Activity::Active)
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Activity::Hidden)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Activity::Active => "active",
            Activity::Optional => "optional",
            Activity::Hidden => "hidden",
        }
    }
}

/// Resolves which fields are active for `answers`.
pub fn resolve_activity(registry: &FieldRegistry, answers: &AnswerSet) -> ActivityMap {
    evaluate(registry, answers).activity
}

/// Names of the active fields in declared order.
pub fn active_fields<'a>(registry: &'a FieldRegistry, activity: &ActivityMap) -> Vec<&'a str> {
    registry
        .fields()
        .iter()
        .filter(|field| activity.get(&field.name).is_some_and(Activity::is_active))
        .map(|field| field.name.as_str())
        .collect()
}

//! Shapes exchanged by the form pipeline: raw multi-value fields, field
//! violations, pick-list entries and the redisplay payload.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A submitted field that may carry one value or several
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    One(String),
    Many(Vec<String>),
}

impl FieldValue {
    /// Coerce an optional field to a sequence, keeping the submitted order
    pub fn normalize(value: Option<FieldValue>) -> Vec<String> {
        match value {
            None => Vec::new(),
            Some(FieldValue::One(v)) => vec![v],
            Some(FieldValue::Many(vs)) => vs,
        }
    }
}

/// One failed field rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Option of a pick-list (author select, genre checkboxes, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PickListEntry {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// Everything a form view needs to show a rejected submission again
#[derive(Debug, Clone, Serialize)]
pub struct Redisplay<T, C = ()> {
    pub draft: T,
    /// Sanitized submitted values in form field order, including the ones
    /// that could not be parsed into the draft
    pub values: IndexMap<&'static str, FieldValue>,
    pub errors: Vec<FieldViolation>,
    pub choices: C,
}

/// Result of running a submission through the pipeline
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FormOutcome<T, C = ()> {
    /// Stored (or found, for genre find-or-create); redirect to its url
    Persisted(T),
    /// Rejected; nothing was written
    Invalid(Redisplay<T, C>),
}

impl<T, C> FormOutcome<T, C> {
    pub fn is_persisted(&self) -> bool {
        matches!(self, FormOutcome::Persisted(_))
    }
}

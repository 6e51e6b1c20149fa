use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single validated field value.
///
/// Serialized without a tag so that payloads sent to the record store and the
/// persisted form data are plain JSON objects (`{"loanAmount": 20000.0}`).
/// `Date` is tried before `Text` on the way back in, so ISO dates come back as
/// dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Date(NaiveDate),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Text a form would show when the field is edited again.
    pub fn to_input_string(&self) -> String {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_input_string())
    }
}

/// Field name to value mapping, used both for one step's payload and for the
/// data accumulated across steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, FieldValue>);

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.0.insert(field.into(), value);
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Copies every entry of `other` into `self`, overwriting existing keys.
    pub fn merge(&mut self, other: &FormData) {
        for (field, value) in &other.0 {
            self.0.insert(field.clone(), value.clone());
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldValue)> for FormData {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Identifier the remote record store hands out when the application record
/// is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The persisted subset of a session: enough to resume after a restart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub active_step: usize,
    pub data: FormData,
    pub record_id: Option<RecordId>,
}

/// Where a session currently sits in the step sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardState {
    Step(usize),
    Review,
    Submitted,
}

/// Progress of one loan application.
///
/// Only the wizard controller mutates a session; everything else reads it
/// through the accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardSession {
    pub(crate) active_step: usize,
    pub(crate) data: FormData,
    pub(crate) record_id: Option<RecordId>,
    pub(crate) confirmed: bool,
    pub(crate) submitted: bool,
}

impl WizardSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            active_step: snapshot.active_step,
            data: snapshot.data,
            record_id: snapshot.record_id,
            confirmed: false,
            submitted: false,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            active_step: self.active_step,
            data: self.data.clone(),
            record_id: self.record_id.clone(),
        }
    }

    pub fn active_step(&self) -> usize {
        self.active_step
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        self.record_id.as_ref()
    }

    pub fn confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn submitted(&self) -> bool {
        self.submitted
    }

    /// State of the session for a sequence of `step_count` steps.
    pub fn state(&self, step_count: usize) -> WizardState {
        if self.submitted {
            WizardState::Submitted
        } else if self.active_step >= step_count {
            WizardState::Review
        } else {
            WizardState::Step(self.active_step)
        }
    }
}

//! Validation engine applying a [`StepContract`] to raw form input.
//!
//! Validation is pure: it never touches the network or the session. Every
//! violated rule is reported, not just the first one, so a form can mark all
//! problems at once.

use std::collections::BTreeMap;

use chrono::{Local, Months, NaiveDate};

use super::contracts::{CrossFieldRule, FieldKind, FieldRule, StepContract};
use super::errors::FieldErrors;
use super::models::{FieldValue, FormData};

/// Raw text per field name, as typed by the user.
pub type RawInput = BTreeMap<String, String>;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Payload that passed validation for one step.
///
/// Only [`validate`] and [`validate_at`] produce values of this type, so the
/// controller never merges unchecked data.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedData {
    step: usize,
    fields: FormData,
}

impl ValidatedData {
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn fields(&self) -> &FormData {
        &self.fields
    }

    pub fn into_fields(self) -> FormData {
        self.fields
    }
}

/// Validates `candidate` against `contract` as of today.
pub fn validate(contract: &StepContract, candidate: &RawInput) -> Result<ValidatedData, FieldErrors> {
    validate_at(contract, candidate, Local::now().date_naive())
}

/// Validates `candidate` against `contract`, measuring ages from `today`.
///
/// Fields not declared by the contract are dropped. Blank optional fields are
/// left out of the result rather than stored as zero.
pub fn validate_at(
    contract: &StepContract,
    candidate: &RawInput,
    today: NaiveDate,
) -> Result<ValidatedData, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut fields = FormData::new();

    for rule in &contract.fields {
        let raw = candidate.get(rule.name).map(|s| s.trim()).unwrap_or("");
        if raw.is_empty() {
            if rule.required {
                errors.push(rule.name, format!("{} is required", rule.label));
            }
            continue;
        }
        match check_field(rule, raw, today) {
            Ok(value) => fields.insert(rule.name, value),
            Err(messages) => {
                for message in messages {
                    errors.push(rule.name, message);
                }
            }
        }
    }

    if errors.is_empty() {
        for rule in &contract.cross_field {
            if let Some((field, message)) = check_cross_field(rule, &fields) {
                errors.push(field, message);
            }
        }
    }

    if errors.is_empty() {
        Ok(ValidatedData {
            step: contract.index,
            fields,
        })
    } else {
        Err(errors)
    }
}

fn check_field(rule: &FieldRule, raw: &str, today: NaiveDate) -> Result<FieldValue, Vec<String>> {
    let mut messages = Vec::new();

    let value = match &rule.kind {
        FieldKind::Text { min_len, patterns } => {
            for pattern in patterns {
                if !pattern.is_match(raw) {
                    messages.push(pattern.message().to_string());
                }
            }
            if let Some((len, message)) = min_len {
                if raw.chars().count() < *len {
                    messages.push(message.to_string());
                }
            }
            FieldValue::Text(raw.to_string())
        }
        FieldKind::Number { min, max } => {
            let number = match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => n,
                Ok(_) => return Err(vec![format!("{} must be a finite number", rule.label)]),
                Err(_) => return Err(vec![format!("{} must be a number", rule.label)]),
            };
            if let Some(bound) = min {
                if number < bound.value {
                    messages.push(bound.message.to_string());
                }
            }
            if let Some(bound) = max {
                if number > bound.value {
                    messages.push(bound.message.to_string());
                }
            }
            FieldValue::Number(number)
        }
        FieldKind::Date { max_age_years, message } => {
            let date = NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map_err(|_| vec![format!("{} must be a date (YYYY-MM-DD)", rule.label)])?;
            let earliest = today
                .checked_sub_months(Months::new(max_age_years * 12))
                .unwrap_or(NaiveDate::MIN);
            if date < earliest {
                messages.push(message.to_string());
            }
            FieldValue::Date(date)
        }
    };

    if messages.is_empty() { Ok(value) } else { Err(messages) }
}

fn check_cross_field(rule: &CrossFieldRule, fields: &FormData) -> Option<(&'static str, &'static str)> {
    match rule {
        CrossFieldRule::LessThan { field, limit, message } => {
            let value = fields.number(field)?;
            let limit = fields.number(limit)?;
            if value < limit { None } else { Some((*field, *message)) }
        }
    }
}

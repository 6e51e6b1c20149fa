//! Step contracts describing the data each wizard step collects.
//!
//! A contract is built once at startup and never changes afterwards. The
//! validation engine interprets it; the controller only consults it for
//! ordering and for the affordability flag.

use regex::Regex;

use super::errors::ContractError;
use super::models::FieldValue;

/// Field names shared between the contracts, the affordability gate and the
/// record store payloads.
pub mod fields {
    pub const FIRST_NAME: &str = "firstName";
    pub const LAST_NAME: &str = "lastName";
    pub const DATE_OF_BIRTH: &str = "dateOfBirth";
    pub const EMAIL: &str = "email";
    pub const PHONE: &str = "phone";
    pub const LOAN_AMOUNT: &str = "loanAmount";
    pub const UPFRONT_PAYMENT: &str = "upfrontPayment";
    pub const TERMS: &str = "terms";
    pub const MONTHLY_SALARY: &str = "monthlySalary";
    pub const ADDITIONAL_INCOME: &str = "additionalIncome";
    pub const MORTGAGE: &str = "mortgage";
    pub const OTHER_CREDITS: &str = "otherCredits";
}

/// Oldest applicant accepted, in years.
pub const MAX_APPLICANT_AGE_YEARS: u32 = 79;

#[derive(Debug, Clone)]
pub struct TextPattern {
    regex: Regex,
    message: &'static str,
}

impl TextPattern {
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    pub fn message(&self) -> &'static str {
        self.message
    }
}

/// Inclusive numeric bound with the message shown when it is crossed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub message: &'static str,
}

#[derive(Debug, Clone)]
pub enum FieldKind {
    Text {
        min_len: Option<(usize, &'static str)>,
        patterns: Vec<TextPattern>,
    },
    Number {
        min: Option<Bound>,
        max: Option<Bound>,
    },
    Date {
        max_age_years: u32,
        message: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

impl FieldRule {
    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            required: true,
            kind: FieldKind::Text {
                min_len: None,
                patterns: Vec::new(),
            },
        }
    }

    pub fn number(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            required: true,
            kind: FieldKind::Number { min: None, max: None },
        }
    }

    pub fn date(name: &'static str, label: &'static str, max_age_years: u32, message: &'static str) -> Self {
        Self {
            name,
            label,
            required: true,
            kind: FieldKind::Date { max_age_years, message },
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Minimum length in characters. Ignored for non-text fields.
    pub fn min_len(mut self, len: usize, message: &'static str) -> Self {
        if let FieldKind::Text { min_len, .. } = &mut self.kind {
            *min_len = Some((len, message));
        }
        self
    }

    /// Adds a pattern the whole value must match. Ignored for non-text fields.
    pub fn pattern(mut self, pattern: &str, message: &'static str) -> Result<Self, ContractError> {
        let regex = Regex::new(pattern).map_err(|source| ContractError::Pattern {
            field: self.name.to_string(),
            source,
        })?;
        if let FieldKind::Text { patterns, .. } = &mut self.kind {
            patterns.push(TextPattern { regex, message });
        }
        Ok(self)
    }

    pub fn min(mut self, value: f64, message: &'static str) -> Self {
        if let FieldKind::Number { min, .. } = &mut self.kind {
            *min = Some(Bound { value, message });
        }
        self
    }

    pub fn max(mut self, value: f64, message: &'static str) -> Self {
        if let FieldKind::Number { max, .. } = &mut self.kind {
            *max = Some(Bound { value, message });
        }
        self
    }

    /// Whether `value` has the kind validation produces for this field.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self.kind {
            FieldKind::Text { .. } => matches!(value, FieldValue::Text(_)),
            FieldKind::Number { .. } => value.as_number().is_some(),
            FieldKind::Date { .. } => value.as_date().is_some(),
        }
    }
}

/// Rule spanning two fields, checked once every single-field rule of the step
/// has passed.
#[derive(Debug, Clone, PartialEq)]
pub enum CrossFieldRule {
    /// `field` must be strictly less than `limit`. The error is reported on
    /// `field`.
    LessThan {
        field: &'static str,
        limit: &'static str,
        message: &'static str,
    },
}

#[derive(Debug, Clone)]
pub struct StepContract {
    pub index: usize,
    pub title: &'static str,
    pub fields: Vec<FieldRule>,
    pub cross_field: Vec<CrossFieldRule>,
    pub requires_affordability_check: bool,
}

impl StepContract {
    pub fn new(index: usize, title: &'static str) -> Self {
        Self {
            index,
            title,
            fields: Vec::new(),
            cross_field: Vec::new(),
            requires_affordability_check: false,
        }
    }

    pub fn field(mut self, rule: FieldRule) -> Self {
        self.fields.push(rule);
        self
    }

    pub fn cross_field(mut self, rule: CrossFieldRule) -> Self {
        self.cross_field.push(rule);
        self
    }

    pub fn with_affordability_check(mut self) -> Self {
        self.requires_affordability_check = true;
        self
    }

    pub fn rule(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|rule| rule.name)
    }
}

/// The fixed, ordered list of steps. Index `len()` is the review position.
#[derive(Debug, Clone)]
pub struct StepSequence {
    steps: Vec<StepContract>,
}

impl StepSequence {
    pub fn new(steps: Vec<StepContract>) -> Result<Self, ContractError> {
        if steps.is_empty() {
            return Err(ContractError::Empty);
        }
        for (expected, step) in steps.iter().enumerate() {
            if step.index != expected {
                return Err(ContractError::OutOfOrder {
                    expected,
                    found: step.index,
                });
            }
        }
        Ok(Self { steps })
    }

    /// Personal info, contact details, loan request and financial info.
    pub fn loan_application() -> Result<Self, ContractError> {
        use fields::*;

        let personal = StepContract::new(0, "Personal info")
            .field(
                FieldRule::text(FIRST_NAME, "First name")
                    .pattern(r"^[a-zA-ZäöüÄÖÜß]+$", "Only Latin and German letters allowed, single name")?
                    .min_len(2, "First name is required"),
            )
            .field(
                FieldRule::text(LAST_NAME, "Last name")
                    .pattern(r"^[a-zA-ZäöüÄÖÜß\s-]+$", "Only Latin and German letters allowed")?
                    .min_len(2, "Last name is required"),
            )
            .field(FieldRule::date(
                DATE_OF_BIRTH,
                "Date of birth",
                MAX_APPLICANT_AGE_YEARS,
                "Maximum age is 79 years",
            ));

        let contact = StepContract::new(1, "Contact details")
            .field(FieldRule::text(EMAIL, "Email").pattern(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", "Invalid email format")?)
            .field(
                FieldRule::text(PHONE, "Phone number")
                    .min_len(10, "Phone number must contain at least 10 characters")
                    .pattern(r"^\+[1-9]\d{1,14}$", "Invalid E.164 phone number format")?,
            );

        let loan = StepContract::new(2, "Loan request")
            .field(
                FieldRule::number(LOAN_AMOUNT, "Loan amount")
                    .min(10_000.0, "Loan amount must be at least 10,000")
                    .max(70_000.0, "Loan amount must be at most 70,000"),
            )
            .field(
                FieldRule::number(UPFRONT_PAYMENT, "Upfront payment")
                    .min(0.0, "Upfront payment must be a non-negative number"),
            )
            .field(
                FieldRule::number(TERMS, "Terms (months)")
                    .min(10.0, "Terms must be at least 10 months")
                    .max(30.0, "Terms must be at most 30 months"),
            )
            .cross_field(CrossFieldRule::LessThan {
                field: UPFRONT_PAYMENT,
                limit: LOAN_AMOUNT,
                message: "Upfront payment must be less than the loan amount",
            });

        let financial = StepContract::new(3, "Financial info")
            .field(
                FieldRule::number(MONTHLY_SALARY, "Monthly salary")
                    .min(0.0, "Monthly salary must be a non-negative number"),
            )
            .field(
                FieldRule::number(ADDITIONAL_INCOME, "Additional income")
                    .optional()
                    .min(0.0, "Additional income must be a non-negative number"),
            )
            .field(
                FieldRule::number(MORTGAGE, "Mortgage")
                    .optional()
                    .min(0.0, "Mortgage must be a non-negative number"),
            )
            .field(
                FieldRule::number(OTHER_CREDITS, "Other credits")
                    .optional()
                    .min(0.0, "Other credits must be a non-negative number"),
            )
            .with_affordability_check();

        Self::new(vec![personal, contact, loan, financial])
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepContract> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepContract> {
        self.steps.iter()
    }

    pub fn review_index(&self) -> usize {
        self.steps.len()
    }

    /// Rules of every step before `step`, i.e. the fields a session at `step`
    /// has already collected.
    pub fn rules_before(&self, step: usize) -> impl Iterator<Item = &FieldRule> {
        self.steps.iter().take(step).flat_map(|contract| contract.fields.iter())
    }
}

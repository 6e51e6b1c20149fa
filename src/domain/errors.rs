use thiserror::Error;

/// Every rule a candidate payload violated, grouped by field in the order the
/// step declares its fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    entries: Vec<(String, Vec<String>)>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        let message = message.into();
        match self.entries.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.entries.push((field.to_string(), vec![message])),
        }
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
            .unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(name, messages)| (name.as_str(), messages.as_slice()))
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.entries {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("invalid pattern for field {field}: {source}")]
    Pattern {
        field: String,
        #[source]
        source: regex::Error,
    },
    #[error("step {found} declared at position {expected}")]
    OutOfOrder { expected: usize, found: usize },
    #[error("a step sequence needs at least one step")]
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_group_by_field() {
        let mut errors = FieldErrors::new();
        errors.push("firstName", "Only Latin and German letters allowed, single name");
        errors.push("lastName", "Last name is required");
        errors.push("firstName", "First name is required");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("firstName").len(), 2);
        assert!(errors.get("email").is_empty());
        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["firstName", "lastName"]);
    }

    #[test]
    fn test_field_errors_display() {
        let mut errors = FieldErrors::new();
        errors.push("terms", "Terms must be at least 10 months");
        errors.push("upfrontPayment", "Upfront payment must be less than the loan amount");

        assert_eq!(
            errors.to_string(),
            "terms: Terms must be at least 10 months; upfrontPayment: Upfront payment must be less than the loan amount"
        );
    }
}

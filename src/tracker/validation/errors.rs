//! Canonical validation error set.

use crate::tracker::ports::StoreError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Field errors keyed by field name, plus the `non_field_errors` bucket for
/// cross-field rules. Several messages may accumulate per field.
///
/// # Examples
///
/// ```
/// use taskledger::tracker::validation::FieldErrors;
///
/// let mut errors = FieldErrors::default();
/// errors.add("title", "Title must be at least 3 characters.");
/// errors.add_non_field("Critical priority tasks cannot be marked as completed.");
///
/// assert_eq!(errors.field("title"), ["Title must be at least 3 characters."]);
/// assert_eq!(errors.non_field().len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Key of the bucket collecting cross-field errors.
    pub const NON_FIELD: &'static str = "non_field_errors";

    /// Creates an error set holding a single message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Appends a message for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    /// Appends a cross-field message.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(Self::NON_FIELD, message);
    }

    /// Returns `true` when no message was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the messages recorded for `field`.
    #[must_use]
    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the cross-field messages.
    #[must_use]
    pub fn non_field(&self) -> &[String] {
        self.field(Self::NON_FIELD)
    }

    /// Iterates over fields and their messages in field-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(field, messages)| (field.as_str(), messages.as_slice()))
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, messages)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {}", messages.join(" "))?;
        }
        Ok(())
    }
}

/// Outcome of a failed validation.
#[derive(Debug, Clone, Error)]
pub enum Rejection {
    /// The payload broke one or more rules.
    #[error("invalid payload: {0}")]
    Invalid(FieldErrors),

    /// A store-backed check could not run.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<FieldErrors> for Rejection {
    fn from(errors: FieldErrors) -> Self {
        Self::Invalid(errors)
    }
}

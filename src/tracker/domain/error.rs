//! Error types for parsing stored domain values.

use thiserror::Error;

/// Error returned when a stored or supplied value is not one of the
/// permitted choices for an enumerated field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {field} value: {value}")]
pub struct ParseChoiceError {
    /// Name of the enumerated field.
    pub field: &'static str,
    /// The rejected value.
    pub value: String,
}

impl ParseChoiceError {
    pub(crate) fn new(field: &'static str, value: &str) -> Self {
        Self {
            field,
            value: value.to_owned(),
        }
    }
}

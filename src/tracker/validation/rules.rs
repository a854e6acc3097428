//! Reusable field and cross-field rules.
//!
//! Field rules run only for values present in the payload; absent values
//! either carry the stored value forward or, when the field is required
//! and no stored value applies, record "This field is required.". Every
//! rule records into a shared [`FieldErrors`] set and still returns the
//! merged value so that cross-field rules can inspect it.

use super::{FieldErrors, Rejection};
use chrono::NaiveDate;

pub(crate) const REQUIRED: &str = "This field is required.";
pub(crate) const BLANK: &str = "This field may not be blank.";

/// Message reported when a referenced row is absent or out of scope.
pub(crate) fn missing_object(id: impl std::fmt::Display) -> String {
    format!("Invalid pk \"{id}\" - object does not exist.")
}

fn too_long(max: usize) -> String {
    format!("Ensure this field has no more than {max} characters.")
}

fn choices_message(subject: &str, choices: &[&str]) -> String {
    format!("Invalid {subject}. Valid values: {}", choices.join(", "))
}

/// Length limits and messages for one text field.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TextRule {
    pub field: &'static str,
    pub min_chars: usize,
    pub min_message: &'static str,
    pub max_chars: Option<usize>,
}

impl TextRule {
    pub(crate) const fn new(field: &'static str) -> Self {
        Self {
            field,
            min_chars: 0,
            min_message: "",
            max_chars: None,
        }
    }

    pub(crate) const fn min(mut self, chars: usize, message: &'static str) -> Self {
        self.min_chars = chars;
        self.min_message = message;
        self
    }

    pub(crate) const fn max(mut self, chars: usize) -> Self {
        self.max_chars = Some(chars);
        self
    }
}

/// Accumulates errors while merging a payload over a stored image.
#[derive(Debug)]
pub(crate) struct Checker {
    errors: FieldErrors,
    carry_current: bool,
    require_missing: bool,
    today: NaiveDate,
}

impl Checker {
    /// `carry_current` keeps stored values for absent optional fields;
    /// `require_missing` reports absent required fields.
    pub(crate) fn new(carry_current: bool, require_missing: bool, today: NaiveDate) -> Self {
        Self {
            errors: FieldErrors::default(),
            carry_current,
            require_missing,
            today,
        }
    }

    pub(crate) fn errors_mut(&mut self) -> &mut FieldErrors {
        &mut self.errors
    }

    pub(crate) const fn today(&self) -> NaiveDate {
        self.today
    }

    fn check_text(&mut self, rule: TextRule, trimmed: &str) {
        if trimmed.chars().count() < rule.min_chars {
            self.errors.add(rule.field, rule.min_message);
        }
        if let Some(max) = rule.max_chars.filter(|max| trimmed.chars().count() > *max) {
            self.errors.add(rule.field, too_long(max));
        }
    }

    /// Merges a required text field. Blank input is rejected outright.
    pub(crate) fn required_text(
        &mut self,
        rule: TextRule,
        supplied: Option<&str>,
        current: Option<&str>,
    ) -> Option<String> {
        let Some(raw) = supplied else {
            return self.carry_required(rule.field, current.map(str::to_owned));
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            self.errors.add(rule.field, BLANK);
            return Some(String::new());
        }
        self.check_text(rule, trimmed);
        Some(trimmed.to_owned())
    }

    /// Merges an optional text field. Blank input and an explicit `null`
    /// clear the value.
    pub(crate) fn optional_text(
        &mut self,
        rule: TextRule,
        supplied: Option<Option<&str>>,
        current: Option<&str>,
    ) -> Option<String> {
        let raw = match supplied {
            Some(Some(raw)) => raw,
            Some(None) => return None,
            None => return self.carry(current.map(str::to_owned)),
        };
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        self.check_text(rule, trimmed);
        Some(trimmed.to_owned())
    }

    /// Merges a field restricted to `choices`, returning the raw merged
    /// value. Absent values fall back to the stored value, then `default`.
    pub(crate) fn choice(
        &mut self,
        field: &'static str,
        subject: &str,
        choices: &[&str],
        supplied: Option<&str>,
        current: Option<&str>,
        default: Option<&str>,
    ) -> Option<String> {
        let Some(raw) = supplied else {
            if let Some(value) = self.carry(current).or(default) {
                return Some(value.to_owned());
            }
            return self.carry_required(field, None);
        };
        if !choices.contains(&raw) {
            self.errors.add(field, choices_message(subject, choices));
        }
        Some(raw.to_owned())
    }

    /// Merges an optional date that may not lie in the past.
    pub(crate) fn future_date(
        &mut self,
        field: &'static str,
        message: &'static str,
        supplied: Option<Option<NaiveDate>>,
        current: Option<NaiveDate>,
    ) -> Option<NaiveDate> {
        match supplied {
            Some(Some(date)) => {
                if date < self.today {
                    self.errors.add(field, message);
                }
                Some(date)
            }
            Some(None) => None,
            None => self.carry(current),
        }
    }

    /// Merges an optional date without further checks.
    pub(crate) fn date(
        &self,
        supplied: Option<Option<NaiveDate>>,
        current: Option<NaiveDate>,
    ) -> Option<NaiveDate> {
        supplied.unwrap_or_else(|| self.carry(current))
    }

    /// Merges a required reference to another row.
    pub(crate) fn reference<T: Copy>(
        &mut self,
        field: &'static str,
        supplied: Option<T>,
        current: Option<T>,
    ) -> Option<T> {
        match supplied {
            Some(value) => Some(value),
            None => self.carry_required(field, current),
        }
    }

    fn carry<T>(&self, current: Option<T>) -> Option<T> {
        if self.carry_current { current } else { None }
    }

    fn carry_required<T>(&mut self, field: &'static str, current: Option<T>) -> Option<T> {
        if self.require_missing {
            self.errors.add(field, REQUIRED);
            return None;
        }
        let carried = self.carry(current);
        if carried.is_none() {
            self.errors.add(field, REQUIRED);
        }
        carried
    }

    /// Fails with the accumulated errors, if any.
    pub(crate) fn finish(self) -> Result<(), Rejection> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Rejection::Invalid(self.errors))
        }
    }
}

/// Unwraps a merged value that [`Checker::finish`] has vouched for.
pub(crate) fn present<T>(value: Option<T>, field: &'static str) -> Result<T, Rejection> {
    value.ok_or_else(|| Rejection::Invalid(FieldErrors::single(field, REQUIRED)))
}

/// Completion rules shared by writes and the completion toggle: critical
/// tasks cannot be completed, nor can tasks whose due date has passed.
pub(crate) fn completion_rules(
    errors: &mut FieldErrors,
    status: Option<&str>,
    priority: Option<&str>,
    due_date: Option<NaiveDate>,
    today: NaiveDate,
) {
    if status != Some("completed") {
        return;
    }
    if priority == Some("critical") {
        errors.add_non_field("Critical priority tasks cannot be marked as completed.");
    }
    if due_date.is_some_and(|due| due < today) {
        errors.add_non_field("Tasks with a past due date cannot be marked as completed.");
    }
}

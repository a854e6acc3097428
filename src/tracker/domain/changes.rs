//! Before/after diffs over an entity's declared fields.

use super::Entity;
use std::fmt;

/// One changed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    /// Declared field name.
    pub field: &'static str,
    /// Rendered value before the mutation.
    pub before: Option<String>,
    /// Rendered value after the mutation.
    pub after: Option<String>,
}

/// Ordered list of field changes between a pre-image and a post-image.
///
/// Renders as `field: 'old' -> 'new'` entries joined by `, `, or as
/// `no changes` when nothing differs. Absent values render as `''`.
///
/// # Examples
///
/// ```
/// use taskledger::tracker::domain::{ChangeSet, FieldChange};
///
/// let changes = ChangeSet::from_changes(vec![FieldChange {
///     field: "status",
///     before: Some("pending".to_owned()),
///     after: Some("completed".to_owned()),
/// }]);
/// assert_eq!(changes.to_string(), "status: 'pending' -> 'completed'");
/// assert_eq!(ChangeSet::default().to_string(), "no changes");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet(Vec<FieldChange>);

impl ChangeSet {
    /// Diffs two images of the same entity over its declared fields.
    #[must_use]
    pub fn between<E: Entity>(before: &E, after: &E) -> Self {
        let changes = before
            .snapshot()
            .into_iter()
            .zip(after.snapshot())
            .filter(|((_, old), (_, new))| old != new)
            .map(|((field, old), (_, new))| FieldChange {
                field,
                before: old,
                after: new,
            })
            .collect();
        Self(changes)
    }

    /// Builds a change set from explicit entries.
    #[must_use]
    pub const fn from_changes(changes: Vec<FieldChange>) -> Self {
        Self(changes)
    }

    /// Returns `true` when no declared field changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the individual changes in declaration order.
    #[must_use]
    pub fn changes(&self) -> &[FieldChange] {
        &self.0
    }

    /// Returns `true` when `field` is among the changes.
    #[must_use]
    pub fn touches(&self, field: &str) -> bool {
        self.0.iter().any(|change| change.field == field)
    }
}

impl fmt::Display for ChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no changes");
        }
        for (index, change) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{}: '{}' -> '{}'",
                change.field,
                change.before.as_deref().unwrap_or_default(),
                change.after.as_deref().unwrap_or_default()
            )?;
        }
        Ok(())
    }
}

//! Audit log records and their taxonomy.

use super::AuditEvent;
use crate::access::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use thiserror::Error;
use uuid::Uuid;

/// Maximum length of an action label, in characters.
pub const MAX_ACTION_CHARS: usize = 100;

/// Error returned while parsing stored level or category values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown audit {field}: {value}")]
pub struct ParseLogValueError {
    /// Which column held the value.
    pub field: &'static str,
    /// The rejected value.
    pub value: String,
}

/// Severity of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    /// Routine event.
    Info,
    /// Noteworthy but expected event.
    Warning,
    /// Failed operation.
    Error,
    /// System-level failure.
    Critical,
}

impl LogLevel {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }
}

impl TryFrom<&str> for LogLevel {
    type Error = ParseLogValueError;

    fn try_from(value: &str) -> Result<Self, ParseLogValueError> {
        match value {
            "INFO" => Ok(Self::Info),
            "WARNING" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(ParseLogValueError {
                field: "level",
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Taxonomy bucket of an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogCategory {
    /// Authentication and authorization events.
    Security,
    /// Entity operations.
    Operation,
    /// Validation, store and system failures.
    Error,
    /// Reserved for performance instrumentation.
    Performance,
}

impl LogCategory {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Security => "SECURITY",
            Self::Operation => "OPERATION",
            Self::Error => "ERROR",
            Self::Performance => "PERFORMANCE",
        }
    }
}

impl TryFrom<&str> for LogCategory {
    type Error = ParseLogValueError;

    fn try_from(value: &str) -> Result<Self, ParseLogValueError> {
        match value {
            "SECURITY" => Ok(Self::Security),
            "OPERATION" => Ok(Self::Operation),
            "ERROR" => Ok(Self::Error),
            "PERFORMANCE" => Ok(Self::Performance),
            _ => Err(ParseLogValueError {
                field: "category",
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for an audit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(Uuid);

impl LogId {
    /// Creates a new random record identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a record identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for LogId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Append-only audit record.
///
/// The timestamp is assigned when the record is built and never changes.
/// The only mutation a stored record admits is clearing its actor when
/// that user is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    id: LogId,
    recorded_at: DateTime<Utc>,
    level: LogLevel,
    category: LogCategory,
    actor: Option<UserId>,
    origin: Option<IpAddr>,
    action: String,
    details: String,
}

/// Parameter object for reconstructing a persisted audit record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedLogEntry {
    /// Persisted identifier.
    pub id: LogId,
    /// Persisted timestamp.
    pub recorded_at: DateTime<Utc>,
    /// Persisted level.
    pub level: LogLevel,
    /// Persisted category.
    pub category: LogCategory,
    /// Persisted actor, if still present.
    pub actor: Option<UserId>,
    /// Persisted origin address.
    pub origin: Option<IpAddr>,
    /// Persisted action label.
    pub action: String,
    /// Persisted details.
    pub details: String,
}

impl LogEntry {
    /// Builds a record for `event` stamped at `recorded_at`.
    ///
    /// Action labels longer than [`MAX_ACTION_CHARS`] are truncated.
    #[must_use]
    pub fn from_event(event: AuditEvent, recorded_at: DateTime<Utc>) -> Self {
        let action = event.action.chars().take(MAX_ACTION_CHARS).collect();
        Self {
            id: LogId::new(),
            recorded_at,
            level: event.level,
            category: event.category,
            actor: event.actor,
            origin: event.origin,
            action,
            details: event.details,
        }
    }

    /// Reconstructs a record from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedLogEntry) -> Self {
        Self {
            id: data.id,
            recorded_at: data.recorded_at,
            level: data.level,
            category: data.category,
            actor: data.actor,
            origin: data.origin,
            action: data.action,
            details: data.details,
        }
    }

    /// Returns the record identifier.
    #[must_use]
    pub const fn id(&self) -> LogId {
        self.id
    }

    /// Returns when the record was written.
    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// Returns the severity.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }

    /// Returns the taxonomy bucket.
    #[must_use]
    pub const fn category(&self) -> LogCategory {
        self.category
    }

    /// Returns the acting user, if known and not deleted.
    #[must_use]
    pub const fn actor(&self) -> Option<UserId> {
        self.actor
    }

    /// Returns the request origin, if known.
    #[must_use]
    pub const fn origin(&self) -> Option<IpAddr> {
        self.origin
    }

    /// Returns the short action label.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Returns the free-text details.
    #[must_use]
    pub fn details(&self) -> &str {
        &self.details
    }

    /// Clears the actor reference after the user is deleted.
    pub fn clear_actor(&mut self) {
        self.actor = None;
    }
}

/// Criteria for listing audit records. Lists are ordered newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogFilter {
    /// Only records by this actor.
    pub actor: Option<UserId>,
    /// Only records in this category.
    pub category: Option<LogCategory>,
    /// Only records at this level.
    pub level: Option<LogLevel>,
    /// Case-insensitive substring over action, details and origin.
    pub search: Option<String>,
    /// Records to skip.
    pub offset: usize,
    /// Maximum records to return.
    pub limit: Option<usize>,
}

impl LogFilter {
    /// Returns the trimmed search term, ignoring blank input.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    /// Returns `true` when `entry` passes every criterion except paging.
    #[must_use]
    pub fn admits(&self, entry: &LogEntry) -> bool {
        let actor_ok = self.actor.is_none_or(|actor| entry.actor() == Some(actor));
        let category_ok = self
            .category
            .is_none_or(|category| entry.category() == category);
        let level_ok = self.level.is_none_or(|level| entry.level() == level);
        let search_ok = self.search_term().is_none_or(|term| {
            let needle = term.to_lowercase();
            entry.action().to_lowercase().contains(&needle)
                || entry.details().to_lowercase().contains(&needle)
                || entry
                    .origin()
                    .is_some_and(|origin| origin.to_string().contains(&needle))
        });
        actor_ok && category_ok && level_ok && search_ok
    }
}

//! Audit events emitted by the pipeline and the identity collaborator.

use super::{LogCategory, LogLevel};
use crate::access::{RequestContext, UserId};
use crate::tracker::domain::{ChangeSet, EntityKind};
use crate::tracker::validation::FieldErrors;
use chrono::{DateTime, Utc};
use std::net::IpAddr;

/// An audit event before it is stamped and stored.
///
/// Constructors cover the fixed event taxonomy; each fills in the level,
/// category, action label and human-readable details.
///
/// # Examples
///
/// ```
/// use taskledger::access::{Principal, RequestContext, UserId};
/// use taskledger::audit::domain::{AuditEvent, LogCategory, LogLevel};
/// use taskledger::tracker::domain::EntityKind;
///
/// let context = RequestContext::new(Principal::user(UserId::new(), "alice"));
/// let event = AuditEvent::entity_created(&context, EntityKind::Task, "Write report");
///
/// assert_eq!(event.category, LogCategory::Operation);
/// assert_eq!(event.level, LogLevel::Info);
/// assert_eq!(event.action, "Task Created");
/// assert_eq!(event.details, "User 'alice' created task 'Write report'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    /// Severity.
    pub level: LogLevel,
    /// Taxonomy bucket.
    pub category: LogCategory,
    /// Short action label.
    pub action: String,
    /// Free-text details.
    pub details: String,
    /// Acting user, if known.
    pub actor: Option<UserId>,
    /// Request origin, if known.
    pub origin: Option<IpAddr>,
}

impl AuditEvent {
    /// Builds an event from its raw parts.
    #[must_use]
    pub fn new(
        level: LogLevel,
        category: LogCategory,
        action: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            action: action.into(),
            details: details.into(),
            actor: None,
            origin: None,
        }
    }

    /// Attributes the event to `actor`.
    #[must_use]
    pub fn by(mut self, actor: Option<UserId>) -> Self {
        self.actor = actor;
        self
    }

    /// Records where the request came from.
    #[must_use]
    pub fn from_origin(mut self, origin: Option<IpAddr>) -> Self {
        self.origin = origin;
        self
    }

    fn for_request(self, context: &RequestContext) -> Self {
        self.by(Some(context.principal().user_id()))
            .from_origin(context.origin())
    }

    /// A user authenticated successfully.
    #[must_use]
    pub fn login_succeeded(user: UserId, username: &str, origin: Option<IpAddr>) -> Self {
        Self::new(
            LogLevel::Info,
            LogCategory::Security,
            "Login Succeeded",
            format!("User '{username}' logged in successfully"),
        )
        .by(Some(user))
        .from_origin(origin)
    }

    /// An authentication attempt failed. No actor is attached.
    #[must_use]
    pub fn login_failed(username: &str, origin: Option<IpAddr>, reason: &str) -> Self {
        Self::new(
            LogLevel::Warning,
            LogCategory::Security,
            "Failed Login Attempt",
            format!("User '{username}' could not log in. Reason: {reason}"),
        )
        .from_origin(origin)
    }

    /// A user logged out.
    #[must_use]
    pub fn logged_out(user: UserId, username: &str, origin: Option<IpAddr>) -> Self {
        Self::new(
            LogLevel::Info,
            LogCategory::Security,
            "Logout",
            format!("User '{username}' logged out"),
        )
        .by(Some(user))
        .from_origin(origin)
    }

    /// A principal tried to act on a resource it may not touch.
    #[must_use]
    pub fn unauthorized_access(context: &RequestContext, resource: &str) -> Self {
        Self::new(
            LogLevel::Warning,
            LogCategory::Security,
            "Unauthorized Access Attempt",
            format!(
                "User '{}' tried to access {resource}",
                context.principal().username()
            ),
        )
        .for_request(context)
    }

    /// A list endpoint was read.
    #[must_use]
    pub fn api_access(context: &RequestContext, endpoint: &str, method: &str) -> Self {
        Self::new(
            LogLevel::Info,
            LogCategory::Operation,
            "API Access",
            format!(
                "User '{}' accessed {method} {endpoint}",
                context.principal().username()
            ),
        )
        .for_request(context)
    }

    /// An entity was created.
    #[must_use]
    pub fn entity_created(context: &RequestContext, kind: EntityKind, label: &str) -> Self {
        Self::new(
            LogLevel::Info,
            LogCategory::Operation,
            format!("{} Created", kind.display_name()),
            format!(
                "User '{}' created {} '{label}'",
                context.principal().username(),
                kind.display_name().to_lowercase()
            ),
        )
        .for_request(context)
    }

    /// An entity was updated; `changes` lists the field diff.
    #[must_use]
    pub fn entity_updated(
        context: &RequestContext,
        kind: EntityKind,
        label: &str,
        changes: &ChangeSet,
    ) -> Self {
        Self::new(
            LogLevel::Info,
            LogCategory::Operation,
            format!("{} Updated", kind.display_name()),
            format!(
                "User '{}' updated {} '{label}'. Changes: {changes}",
                context.principal().username(),
                kind.display_name().to_lowercase()
            ),
        )
        .for_request(context)
    }

    /// An entity was deleted.
    #[must_use]
    pub fn entity_deleted(context: &RequestContext, kind: EntityKind, label: &str) -> Self {
        Self::new(
            LogLevel::Warning,
            LogCategory::Operation,
            format!("{} Deleted", kind.display_name()),
            format!(
                "User '{}' deleted {} '{label}'",
                context.principal().username(),
                kind.display_name().to_lowercase()
            ),
        )
        .for_request(context)
    }

    /// A task's completion was toggled.
    #[must_use]
    pub fn task_toggled(context: &RequestContext, label: &str, changes: &ChangeSet) -> Self {
        Self::new(
            LogLevel::Info,
            LogCategory::Operation,
            "Task Toggled",
            format!(
                "User '{}' toggled task '{label}'. Changes: {changes}",
                context.principal().username()
            ),
        )
        .for_request(context)
    }

    /// A payload was rejected by validation.
    #[must_use]
    pub fn validation_failed(
        context: &RequestContext,
        kind: EntityKind,
        errors: &FieldErrors,
    ) -> Self {
        Self::new(
            LogLevel::Warning,
            LogCategory::Error,
            "Validation Error",
            format!(
                "User '{}' submitted an invalid {}: {errors}",
                context.principal().username(),
                kind.display_name().to_lowercase()
            ),
        )
        .for_request(context)
    }

    /// The entity store failed during `operation`.
    #[must_use]
    pub fn store_failed(context: &RequestContext, operation: &str, error: &str) -> Self {
        Self::new(
            LogLevel::Error,
            LogCategory::Error,
            "Database Error",
            format!(
                "User '{}' hit a database error during {operation}: {error}",
                context.principal().username()
            ),
        )
        .for_request(context)
    }

    /// An unexpected system failure outside any request principal.
    #[must_use]
    pub fn system_error(message: &str, origin: Option<IpAddr>) -> Self {
        Self::new(
            LogLevel::Critical,
            LogCategory::Error,
            "System Error",
            format!("System error: {message}"),
        )
        .from_origin(origin)
    }

    /// Audit records older than `cutoff` were purged.
    #[must_use]
    pub fn audit_purged(context: &RequestContext, cutoff: DateTime<Utc>, removed: u64) -> Self {
        Self::new(
            LogLevel::Warning,
            LogCategory::Operation,
            "Audit Log Purged",
            format!(
                "User '{}' purged {removed} audit records older than {}",
                context.principal().username(),
                cutoff.to_rfc3339()
            ),
        )
        .for_request(context)
    }
}

//! Privileged read and purge access to the audit log.

use super::AuditLogSink;
use crate::access::RequestContext;
use crate::audit::{
    domain::{AuditEvent, LogEntry, LogFilter},
    ports::{AuditLogError, AuditLogRepository},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use thiserror::Error;

/// Errors returned by [`AuditMaintenance`].
#[derive(Debug, Clone, Error)]
pub enum AuditAccessError {
    /// The principal may not perform the operation.
    #[error("you do not have permission to perform this action")]
    Forbidden,

    /// The repository failed.
    #[error(transparent)]
    Repository(#[from] AuditLogError),
}

/// Result type for audit maintenance operations.
pub type AuditAccessResult<T> = Result<T, AuditAccessError>;

/// Read and retention operations over the audit log.
///
/// Non-admin principals only ever see their own records. Purging is
/// reserved for superusers and is itself audited.
pub struct AuditMaintenance<R, C>
where
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    sink: AuditLogSink<R, C>,
}

impl<R, C> Clone for AuditMaintenance<R, C>
where
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
        }
    }
}

impl<R, C> AuditMaintenance<R, C>
where
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates the service on top of `sink`'s repository.
    #[must_use]
    pub const fn new(sink: AuditLogSink<R, C>) -> Self {
        Self { sink }
    }

    /// Lists records visible to the caller, newest first.
    ///
    /// A non-admin filter naming another actor matches nothing.
    ///
    /// # Errors
    ///
    /// Returns [`AuditAccessError::Repository`] when the read fails.
    pub async fn list(
        &self,
        context: &RequestContext,
        filter: LogFilter,
    ) -> AuditAccessResult<Vec<LogEntry>> {
        let principal = context.principal();
        if principal.is_admin() {
            return Ok(self.sink.repository().list(&filter).await?);
        }
        let caller = principal.user_id();
        if filter.actor.is_some_and(|actor| actor != caller) {
            return Ok(Vec::new());
        }
        let scoped = LogFilter {
            actor: Some(caller),
            ..filter
        };
        Ok(self.sink.repository().list(&scoped).await?)
    }

    /// Deletes records older than `cutoff`. Superuser only.
    ///
    /// # Errors
    ///
    /// Returns [`AuditAccessError::Forbidden`] for any other principal and
    /// [`AuditAccessError::Repository`] when the delete fails.
    pub async fn purge(
        &self,
        context: &RequestContext,
        cutoff: DateTime<Utc>,
    ) -> AuditAccessResult<u64> {
        if !context.principal().is_superuser() {
            self.sink
                .record(AuditEvent::unauthorized_access(context, "audit log purge"))
                .await;
            return Err(AuditAccessError::Forbidden);
        }
        let removed = self.sink.repository().purge_before(cutoff).await?;
        tracing::info!(removed, cutoff = %cutoff, "purged audit records");
        self.sink
            .record(AuditEvent::audit_purged(context, cutoff, removed))
            .await;
        Ok(removed)
    }
}

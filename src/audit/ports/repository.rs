//! Repository port for append-only audit records.

use crate::access::UserId;
use crate::audit::domain::{LogEntry, LogFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for audit repository operations.
pub type AuditLogResult<T> = Result<T, AuditLogError>;

/// Audit record persistence contract.
///
/// Normal application paths only ever append. Purging and actor clearing
/// exist for the privileged maintenance path and the user-deletion hook.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Appends a record.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Duplicate`] when the record identifier is
    /// already stored.
    async fn append(&self, entry: &LogEntry) -> AuditLogResult<()>;

    /// Lists records matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Persistence`] when the backend fails.
    async fn list(&self, filter: &LogFilter) -> AuditLogResult<Vec<LogEntry>>;

    /// Deletes records written before `cutoff` and returns how many went.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Persistence`] when the backend fails.
    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AuditLogResult<u64>;

    /// Clears the actor reference on every record by `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Persistence`] when the backend fails.
    async fn forget_actor(&self, actor: UserId) -> AuditLogResult<u64>;
}

/// Errors returned by audit repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AuditLogError {
    /// A record with the same identifier already exists.
    #[error("duplicate audit record")]
    Duplicate,

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AuditLogError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

//! In-memory audit log repository.

use crate::access::UserId;
use crate::audit::{
    domain::{LogEntry, LogFilter},
    ports::{AuditLogError, AuditLogRepository, AuditLogResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory audit log, kept in append order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<LogEntry>>>,
}

impl InMemoryAuditLog {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored record in append order.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLogError::Persistence`] when the lock is poisoned.
    pub fn entries(&self) -> AuditLogResult<Vec<LogEntry>> {
        let entries = self.entries.read().map_err(|err| {
            AuditLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(entries.clone())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLog {
    async fn append(&self, entry: &LogEntry) -> AuditLogResult<()> {
        let mut entries = self.entries.write().map_err(|err| {
            AuditLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        if entries.iter().any(|stored| stored.id() == entry.id()) {
            return Err(AuditLogError::Duplicate);
        }
        entries.push(entry.clone());
        Ok(())
    }

    async fn list(&self, filter: &LogFilter) -> AuditLogResult<Vec<LogEntry>> {
        let entries = self.entries.read().map_err(|err| {
            AuditLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut matching: Vec<LogEntry> = entries
            .iter()
            .filter(|entry| filter.admits(entry))
            .cloned()
            .collect();
        matching.reverse();
        matching.sort_by_key(|entry| std::cmp::Reverse(entry.recorded_at()));
        Ok(matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AuditLogResult<u64> {
        let mut entries = self.entries.write().map_err(|err| {
            AuditLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let before = entries.len();
        entries.retain(|entry| entry.recorded_at() >= cutoff);
        u64::try_from(before - entries.len()).map_err(AuditLogError::persistence)
    }

    async fn forget_actor(&self, actor: UserId) -> AuditLogResult<u64> {
        let mut entries = self.entries.write().map_err(|err| {
            AuditLogError::persistence(std::io::Error::other(err.to_string()))
        })?;
        let mut cleared = 0_u64;
        for entry in entries.iter_mut().filter(|entry| entry.actor() == Some(actor)) {
            entry.clear_actor();
            cleared += 1;
        }
        Ok(cleared)
    }
}

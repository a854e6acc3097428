//! Advisory audit sink used by the operation pipeline.
//!
//! Every event is mirrored to `tracing` before it is written, so an
//! operator still sees it when the repository is down. Storage failures and
//! slow writes are reported through `tracing` only and never reach the
//! caller.

use crate::access::UserId;
use crate::audit::{
    domain::{AuditEvent, LogEntry, LogLevel},
    ports::AuditLogRepository,
};
use async_trait::async_trait;
use mockable::Clock;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on a single audit write when none is configured.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Stamps audit events and appends them without failing the caller.
pub struct AuditLogSink<R, C>
where
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    write_timeout: Duration,
}

impl<R, C> Clone for AuditLogSink<R, C>
where
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            write_timeout: self.write_timeout,
        }
    }
}

impl<R, C> AuditLogSink<R, C>
where
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    /// Creates a sink with the default write timeout.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Overrides the per-write timeout.
    #[must_use]
    pub const fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Returns the repository the sink appends to.
    #[must_use]
    pub const fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Returns the sink's clock.
    #[must_use]
    pub const fn clock(&self) -> &Arc<C> {
        &self.clock
    }

    /// Records `event`.
    ///
    /// Always completes. A failed or timed-out append is logged at error
    /// level and dropped.
    pub async fn record(&self, event: AuditEvent) {
        mirror(&event);
        let entry = LogEntry::from_event(event, self.clock.utc());
        match tokio::time::timeout(self.write_timeout, self.repository.append(&entry)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::error!(
                error = %err,
                action = entry.action(),
                "audit record could not be stored"
            ),
            Err(_) => tracing::error!(
                timeout_ms = u64::try_from(self.write_timeout.as_millis()).unwrap_or(u64::MAX),
                action = entry.action(),
                "audit record write timed out"
            ),
        }
    }
}

fn mirror(event: &AuditEvent) {
    let category = event.category.as_str();
    let action = event.action.as_str();
    let details = event.details.as_str();
    match event.level {
        LogLevel::Critical | LogLevel::Error => tracing::error!(
            category,
            action,
            actor = ?event.actor,
            origin = ?event.origin,
            "{details}"
        ),
        LogLevel::Warning => tracing::warn!(
            category,
            action,
            actor = ?event.actor,
            origin = ?event.origin,
            "{details}"
        ),
        LogLevel::Info => tracing::info!(
            category,
            action,
            actor = ?event.actor,
            origin = ?event.origin,
            "{details}"
        ),
    }
}

/// Authentication notifications emitted by the identity collaborator.
///
/// The identity service itself lives outside this crate; it calls these
/// hooks so security events land in the same audit trail.
#[async_trait]
pub trait AuthEventHook: Send + Sync {
    /// A user authenticated.
    async fn login_succeeded(&self, user: UserId, username: &str, origin: Option<IpAddr>);

    /// An authentication attempt was refused.
    async fn login_failed(&self, username: &str, origin: Option<IpAddr>, reason: &str);

    /// A user logged out.
    async fn logged_out(&self, user: UserId, username: &str, origin: Option<IpAddr>);
}

#[async_trait]
impl<R, C> AuthEventHook for AuditLogSink<R, C>
where
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    async fn login_succeeded(&self, user: UserId, username: &str, origin: Option<IpAddr>) {
        self.record(AuditEvent::login_succeeded(user, username, origin))
            .await;
    }

    async fn login_failed(&self, username: &str, origin: Option<IpAddr>, reason: &str) {
        self.record(AuditEvent::login_failed(username, origin, reason))
            .await;
    }

    async fn logged_out(&self, user: UserId, username: &str, origin: Option<IpAddr>) {
        self.record(AuditEvent::logged_out(user, username, origin))
            .await;
    }
}

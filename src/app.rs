//! Composition root.
//!
//! [`TaskLedger`] bundles the operation pipeline, the audit sink and audit
//! maintenance over one entity store and one audit repository. Two
//! ready-made compositions exist: [`InMemoryLedger`] for tests and
//! single-process embedding, and [`PostgresLedger`], which shares one
//! connection pool between the store and the audit log.

use crate::audit::{
    adapters::{InMemoryAuditLog, PostgresAuditLog},
    ports::AuditLogRepository,
    services::{AuditLogSink, AuditMaintenance},
};
use crate::config::{ConfigError, ServiceConfig};
use crate::tracker::{
    adapters::{InMemoryEntityStore, PostgresEntityStore, StorePgPool},
    ports::{EntityStore, StoreError, StoreResult},
    services::OperationPipeline,
};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

const CREATE_TASK_TABLES_SQL: &str =
    include_str!("../migrations/2026-10-17-000000_create_task_tables/up.sql");
const CREATE_AUDIT_LOG_SQL: &str =
    include_str!("../migrations/2026-10-17-000001_create_audit_log/up.sql");

/// Errors raised while assembling a ledger.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Configuration was incomplete or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The database could not be reached or prepared.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The assembled service core.
pub struct TaskLedger<S, R, C>
where
    S: EntityStore,
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    pipeline: OperationPipeline<S, R, C>,
    maintenance: AuditMaintenance<R, C>,
}

impl<S, R, C> Clone for TaskLedger<S, R, C>
where
    S: EntityStore,
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            pipeline: self.pipeline.clone(),
            maintenance: self.maintenance.clone(),
        }
    }
}

impl<S, R, C> TaskLedger<S, R, C>
where
    S: EntityStore,
    R: AuditLogRepository,
    C: Clock + Send + Sync,
{
    /// Wires `store` and `audit_log` together under `config`.
    #[must_use]
    pub fn new(store: Arc<S>, audit_log: Arc<R>, clock: Arc<C>, config: &ServiceConfig) -> Self {
        let sink = AuditLogSink::new(audit_log, clock)
            .with_write_timeout(config.audit_write_timeout());
        Self {
            pipeline: OperationPipeline::new(store, sink.clone(), config.pipeline),
            maintenance: AuditMaintenance::new(sink),
        }
    }

    /// Returns the operation pipeline.
    #[must_use]
    pub const fn pipeline(&self) -> &OperationPipeline<S, R, C> {
        &self.pipeline
    }

    /// Returns the audit list and purge service.
    #[must_use]
    pub const fn maintenance(&self) -> &AuditMaintenance<R, C> {
        &self.maintenance
    }

    /// Returns the sink the identity collaborator reports logins to
    /// through [`AuthEventHook`](crate::audit::services::AuthEventHook).
    #[must_use]
    pub const fn auth_events(&self) -> &AuditLogSink<R, C> {
        self.pipeline.audit()
    }
}

/// Ledger over in-memory tables and audit log.
pub type InMemoryLedger = TaskLedger<InMemoryEntityStore, InMemoryAuditLog, DefaultClock>;

impl InMemoryLedger {
    /// Creates an empty in-memory ledger.
    #[must_use]
    pub fn in_memory(config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(InMemoryEntityStore::new()),
            Arc::new(InMemoryAuditLog::new()),
            Arc::new(DefaultClock),
            config,
        )
    }
}

/// Ledger over `PostgreSQL`.
pub type PostgresLedger = TaskLedger<PostgresEntityStore, PostgresAuditLog, DefaultClock>;

impl PostgresLedger {
    /// Connects to the configured database.
    ///
    /// Pool construction opens connections eagerly, so call this from a
    /// synchronous context or `spawn_blocking`.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::Config`] when no database URL is configured
    /// and [`StartupError::Store`] when the pool cannot be built.
    pub fn connect_postgres(config: &ServiceConfig) -> Result<Self, StartupError> {
        let pool = build_pool(config.database_url()?, config.pool_max_size)?;
        info!(max_size = config.pool_max_size, "postgres pool ready");
        Ok(Self::with_pool(pool, config))
    }

    /// Wires a ledger over an existing pool.
    #[must_use]
    pub fn with_pool(pool: StorePgPool, config: &ServiceConfig) -> Self {
        Self::new(
            Arc::new(PostgresEntityStore::new(pool.clone())),
            Arc::new(PostgresAuditLog::new(pool)),
            Arc::new(DefaultClock),
            config,
        )
    }
}

/// Builds a connection pool for `database_url`.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] when the pool cannot be built.
pub fn build_pool(database_url: &str, max_size: u32) -> StoreResult<StorePgPool> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder()
        .max_size(max_size)
        .build(manager)
        .map_err(StoreError::persistence)
}

/// Creates the task and audit tables on `connection`.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] when a statement fails, for
/// example because the tables already exist.
pub fn install_schema(connection: &mut PgConnection) -> StoreResult<()> {
    connection
        .batch_execute(CREATE_TASK_TABLES_SQL)
        .map_err(StoreError::persistence)?;
    connection
        .batch_execute(CREATE_AUDIT_LOG_SQL)
        .map_err(StoreError::persistence)?;
    info!("taskledger schema installed");
    Ok(())
}

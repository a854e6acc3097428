//! `PostgreSQL` repository implementation for the audit log.

use super::{
    models::{LogRow, NewLogRow},
    schema::logs,
};
use crate::access::UserId;
use crate::audit::{
    domain::{LogCategory, LogEntry, LogFilter, LogId, LogLevel, PersistedLogEntry},
    ports::{AuditLogError, AuditLogRepository, AuditLogResult},
};
use crate::tracker::adapters::postgres::{StorePgPool, contains_pattern};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::net::IpAddr;

/// `PostgreSQL`-backed audit log repository.
#[derive(Debug, Clone)]
pub struct PostgresAuditLog {
    pool: StorePgPool,
}

impl PostgresAuditLog {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: StorePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> AuditLogResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AuditLogResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(AuditLogError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(AuditLogError::persistence)?
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLog {
    async fn append(&self, entry: &LogEntry) -> AuditLogResult<()> {
        let new_row = NewLogRow::from(entry);
        self.run_blocking(move |connection| {
            diesel::insert_into(logs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        AuditLogError::Duplicate
                    }
                    _ => AuditLogError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn list(&self, filter: &LogFilter) -> AuditLogResult<Vec<LogEntry>> {
        let criteria = filter.clone();
        self.run_blocking(move |connection| {
            let mut query = logs::table.into_boxed();
            if let Some(actor) = criteria.actor {
                query = query.filter(logs::actor_id.eq(actor.into_inner()));
            }
            if let Some(category) = criteria.category {
                query = query.filter(logs::category.eq(category.as_str()));
            }
            if let Some(level) = criteria.level {
                query = query.filter(logs::level.eq(level.as_str()));
            }
            if let Some(term) = criteria.search_term() {
                let pattern = contains_pattern(term);
                query = query.filter(
                    logs::action
                        .ilike(pattern.clone())
                        .or(logs::details.ilike(pattern.clone()))
                        .or(logs::origin.ilike(pattern)),
                );
            }
            let offset = i64::try_from(criteria.offset).map_err(AuditLogError::persistence)?;
            query = query
                .order((logs::recorded_at.desc(), logs::id.desc()))
                .offset(offset);
            if let Some(limit) = criteria.limit {
                query = query.limit(i64::try_from(limit).map_err(AuditLogError::persistence)?);
            }
            let rows = query
                .select(LogRow::as_select())
                .load::<LogRow>(connection)
                .map_err(AuditLogError::persistence)?;
            rows.into_iter().map(row_to_entry).collect()
        })
        .await
    }

    async fn purge_before(&self, cutoff: DateTime<Utc>) -> AuditLogResult<u64> {
        self.run_blocking(move |connection| {
            let removed = diesel::delete(logs::table.filter(logs::recorded_at.lt(cutoff)))
                .execute(connection)
                .map_err(AuditLogError::persistence)?;
            u64::try_from(removed).map_err(AuditLogError::persistence)
        })
        .await
    }

    async fn forget_actor(&self, actor: UserId) -> AuditLogResult<u64> {
        self.run_blocking(move |connection| {
            let cleared = diesel::update(logs::table.filter(logs::actor_id.eq(actor.into_inner())))
                .set(logs::actor_id.eq(None::<uuid::Uuid>))
                .execute(connection)
                .map_err(AuditLogError::persistence)?;
            u64::try_from(cleared).map_err(AuditLogError::persistence)
        })
        .await
    }
}

fn row_to_entry(row: LogRow) -> AuditLogResult<LogEntry> {
    let level = LogLevel::try_from(row.level.as_str()).map_err(AuditLogError::persistence)?;
    let category =
        LogCategory::try_from(row.category.as_str()).map_err(AuditLogError::persistence)?;
    let origin = row
        .origin
        .as_deref()
        .map(str::parse::<IpAddr>)
        .transpose()
        .map_err(AuditLogError::persistence)?;
    Ok(LogEntry::from_persisted(PersistedLogEntry {
        id: LogId::from_uuid(row.id),
        recorded_at: row.recorded_at,
        level,
        category,
        actor: row.actor_id.map(UserId::from_uuid),
        origin,
        action: row.action,
        details: row.details,
    }))
}

//! Diesel row models for audit log persistence.

use super::schema::logs;
use crate::audit::domain::LogEntry;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for audit records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LogRow {
    pub id: uuid::Uuid,
    pub recorded_at: DateTime<Utc>,
    pub level: String,
    pub category: String,
    pub actor_id: Option<uuid::Uuid>,
    pub origin: Option<String>,
    pub action: String,
    pub details: String,
}

/// Insert model for audit records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = logs)]
pub struct NewLogRow {
    pub id: uuid::Uuid,
    pub recorded_at: DateTime<Utc>,
    pub level: String,
    pub category: String,
    pub actor_id: Option<uuid::Uuid>,
    pub origin: Option<String>,
    pub action: String,
    pub details: String,
}

impl From<&LogEntry> for NewLogRow {
    fn from(entry: &LogEntry) -> Self {
        Self {
            id: entry.id().into_inner(),
            recorded_at: entry.recorded_at(),
            level: entry.level().as_str().to_owned(),
            category: entry.category().as_str().to_owned(),
            actor_id: entry.actor().map(crate::access::UserId::into_inner),
            origin: entry.origin().map(|origin| origin.to_string()),
            action: entry.action().to_owned(),
            details: entry.details().to_owned(),
        }
    }
}

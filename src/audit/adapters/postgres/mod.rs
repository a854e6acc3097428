//! `PostgreSQL` adapter for audit log persistence.

mod models;
mod repository;
mod schema;

pub use repository::PostgresAuditLog;

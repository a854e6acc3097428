//! Append-only audit log.
//!
//! The pipeline reports every read, write, rejection and failure to an
//! [`services::AuditLogSink`]. The sink is advisory: it mirrors events to
//! `tracing`, writes them through an [`ports::AuditLogRepository`] under a
//! timeout, and never fails the operation that produced them.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

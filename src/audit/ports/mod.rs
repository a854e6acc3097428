//! Port contracts for audit log persistence.

pub mod repository;

pub use repository::{AuditLogError, AuditLogRepository, AuditLogResult};

#[cfg(test)]
pub use repository::MockAuditLogRepository;

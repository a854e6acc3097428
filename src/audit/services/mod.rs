//! Audit services: the advisory sink and privileged maintenance.

mod maintenance;
mod sink;

pub use maintenance::{AuditAccessError, AuditAccessResult, AuditMaintenance};
pub use sink::{AuditLogSink, AuthEventHook, DEFAULT_WRITE_TIMEOUT};

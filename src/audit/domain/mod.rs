//! Audit log domain: events, stored records and list filters.

mod entry;
mod event;

pub use entry::{
    LogCategory, LogEntry, LogFilter, LogId, LogLevel, MAX_ACTION_CHARS, ParseLogValueError,
    PersistedLogEntry,
};
pub use event::AuditEvent;

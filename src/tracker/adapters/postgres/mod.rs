//! `PostgreSQL` adapter for the entity store.

mod models;
mod schema;
mod store;
mod tables;

pub use store::{PostgresEntityStore, StorePgPool};

use crate::tracker::ports::StoreError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Maps a Diesel error onto the store port's error type, keeping the name
/// of a violated constraint.
pub(crate) fn store_error(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreError::UniqueViolation(info.constraint_name().unwrap_or_default().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            StoreError::ForeignKeyViolation(info.constraint_name().unwrap_or_default().to_owned())
        }
        other => StoreError::persistence(other),
    }
}

/// Builds an `ILIKE` pattern matching `term` anywhere, with wildcard
/// characters in `term` matched literally.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

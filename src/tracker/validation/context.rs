//! Per-write validation context.

use super::rules::Checker;
use crate::access::{OwnershipRule, Principal, ScopePredicate, resolve_scope};
use chrono::{DateTime, NaiveDate, Utc};

/// How a payload is applied to the stored image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// A new row; required fields must be supplied.
    Create,
    /// Full replacement; required fields must be supplied, absent optional
    /// fields keep their stored values.
    Replace,
    /// Partial update; absent fields keep their stored values.
    Patch,
}

/// What the validation engine knows about the write being validated.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    principal: &'a Principal,
    now: DateTime<Utc>,
    mode: WriteMode,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context for `principal` writing at `now`.
    #[must_use]
    pub const fn new(principal: &'a Principal, now: DateTime<Utc>, mode: WriteMode) -> Self {
        Self {
            principal,
            now,
            mode,
        }
    }

    /// Returns the writing principal.
    #[must_use]
    pub const fn principal(&self) -> &'a Principal {
        self.principal
    }

    /// Returns the server timestamp assigned to the write.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Returns the calendar date past-date rules compare against.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Returns the scope referenced tasks must fall within.
    #[must_use]
    pub fn task_scope(&self) -> ScopePredicate {
        resolve_scope(self.principal, OwnershipRule::DirectOwner)
    }

    pub(crate) fn checker(&self, has_existing: bool) -> Checker {
        let require_missing = !has_existing || self.mode != WriteMode::Patch;
        Checker::new(has_existing, require_missing, self.today())
    }
}

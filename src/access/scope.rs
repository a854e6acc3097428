//! Row-level scope predicates.

use super::{Principal, UserId};

/// How rows of an entity type tie back to an owning user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OwnershipRule {
    /// The row carries its own owning-user reference.
    DirectOwner,
    /// The row is owned through the task it references.
    ThroughTask,
    /// The row is visible to the member it names and to its team's owner.
    TeamMembership,
    /// The row is visible to the actor it names.
    Actor,
}

/// Filter restricting which rows a principal may read or mutate.
///
/// Stores evaluate the predicate; an excluded row behaves exactly like an
/// absent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePredicate {
    /// Every row of the entity type.
    Unrestricted,
    /// Only rows that `rule` ties back to `user`.
    Restricted {
        /// The user the rows must belong to.
        user: UserId,
        /// How a row is tied back to `user`.
        rule: OwnershipRule,
    },
}

impl ScopePredicate {
    /// Returns `true` for the unrestricted predicate.
    #[must_use]
    pub const fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Returns the user rows are restricted to, if any.
    #[must_use]
    pub const fn restricted_user(&self) -> Option<UserId> {
        match self {
            Self::Unrestricted => None,
            Self::Restricted { user, .. } => Some(*user),
        }
    }

    /// Returns `true` when a row owned by `owner` passes a direct-owner
    /// check.
    #[must_use]
    pub fn admits_owner(&self, owner: Option<UserId>) -> bool {
        match self.restricted_user() {
            None => true,
            Some(user) => owner == Some(user),
        }
    }
}

/// Computes the scope predicate for `principal` over rows governed by
/// `rule`.
///
/// Administrative principals see every row.
///
/// # Examples
///
/// ```
/// use taskledger::access::{OwnershipRule, Principal, ScopePredicate, UserId, resolve_scope};
///
/// let user = UserId::new();
/// let scope = resolve_scope(&Principal::user(user, "alice"), OwnershipRule::DirectOwner);
/// assert_eq!(
///     scope,
///     ScopePredicate::Restricted { user, rule: OwnershipRule::DirectOwner }
/// );
///
/// let admin = resolve_scope(&Principal::staff(UserId::new(), "ops"), OwnershipRule::ThroughTask);
/// assert!(admin.is_unrestricted());
/// ```
#[must_use]
pub fn resolve_scope(principal: &Principal, rule: OwnershipRule) -> ScopePredicate {
    if principal.is_admin() {
        return ScopePredicate::Unrestricted;
    }
    ScopePredicate::Restricted {
        user: principal.user_id(),
        rule,
    }
}

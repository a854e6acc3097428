//! Authenticated principal supplied by the identity collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use uuid::Uuid;

/// Identifier of a user account owned by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for UserId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The authenticated caller making a request.
///
/// Staff and superuser flags together form the administrative capability:
/// either one lifts row-level scoping.
///
/// # Examples
///
/// ```
/// use taskledger::access::{Principal, UserId};
///
/// let alice = Principal::user(UserId::new(), "alice");
/// assert!(!alice.is_admin());
///
/// let root = Principal::superuser(UserId::new(), "root");
/// assert!(root.is_admin());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    username: String,
    is_staff: bool,
    is_superuser: bool,
}

impl Principal {
    /// Creates a principal without administrative capability.
    #[must_use]
    pub fn user(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Creates a staff principal.
    #[must_use]
    pub fn staff(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            is_staff: true,
            ..Self::user(user_id, username)
        }
    }

    /// Creates a superuser principal.
    #[must_use]
    pub fn superuser(user_id: UserId, username: impl Into<String>) -> Self {
        Self {
            is_staff: true,
            is_superuser: true,
            ..Self::user(user_id, username)
        }
    }

    /// Returns the principal's user identifier.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the principal's username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns `true` for staff principals.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        self.is_staff
    }

    /// Returns `true` for superuser principals.
    #[must_use]
    pub const fn is_superuser(&self) -> bool {
        self.is_superuser
    }

    /// Returns `true` when the principal has administrative capability.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    /// Returns `true` when the principal may mutate a row owned by `owner`.
    #[must_use]
    pub fn can_act_for(&self, owner: Option<UserId>) -> bool {
        self.is_admin() || owner == Some(self.user_id)
    }
}

/// Per-request caller information threaded through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    principal: Principal,
    origin: Option<IpAddr>,
}

impl RequestContext {
    /// Creates a request context for `principal`.
    #[must_use]
    pub const fn new(principal: Principal) -> Self {
        Self {
            principal,
            origin: None,
        }
    }

    /// Sets the origin address of the request.
    #[must_use]
    pub fn with_origin(mut self, origin: Option<IpAddr>) -> Self {
        self.origin = origin;
        self
    }

    /// Returns the authenticated principal.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns the origin address, if known.
    #[must_use]
    pub const fn origin(&self) -> Option<IpAddr> {
        self.origin
    }
}

//! Caller identity and row-level access scoping.
//!
//! The identity collaborator authenticates callers and hands the core a
//! [`Principal`]. Everything the core reads or writes on behalf of that
//! principal is filtered through a [`ScopePredicate`] computed by
//! [`resolve_scope`].

mod principal;
mod scope;

pub use principal::{Principal, RequestContext, UserId};
pub use scope::{OwnershipRule, ScopePredicate, resolve_scope};

#[cfg(test)]
mod tests;

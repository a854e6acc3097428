//! Validation engine.
//!
//! Turns a client payload plus the stored pre-image into a normalized
//! entity, or into the complete set of field and cross-field errors.
//! Store-backed checks run through the [`Lookup`](crate::tracker::ports::Lookup)
//! handle of the write transaction.

mod context;
mod entities;
mod errors;
mod rules;

pub use context::{ValidationContext, WriteMode};
pub use entities::{Validate, toggle_completion};
pub use errors::{FieldErrors, Rejection};

//! Port contracts for the entity store.
//!
//! Ports define infrastructure-agnostic interfaces used by the validation
//! engine and the operation pipeline.

pub mod store;

pub use store::{
    EntityStore, ListQuery, Lookup, Page, StoreError, StoreResult, StoreTx, Table,
};

//! Adapter implementations for the entity store port.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryEntityStore;
pub use postgres::{PostgresEntityStore, StorePgPool};

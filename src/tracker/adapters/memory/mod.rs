//! In-memory adapters for the entity store.

mod store;
mod tables;

pub use store::InMemoryEntityStore;
pub use tables::{MemoryRow, MemoryTables};

//! In-memory entity store for tests and single-process embedding.

use super::MemoryTables;
use crate::tracker::ports::{EntityStore, StoreError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Thread-safe in-memory entity store with copy-on-write transactions.
///
/// Transactions are serialized by a single lock, which gives them
/// serializable isolation.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    state: Arc<Mutex<MemoryTables>>,
}

impl InMemoryEntityStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the committed tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Interrupted`] when the state lock is poisoned.
    pub fn snapshot(&self) -> Result<MemoryTables, StoreError> {
        let state = self
            .state
            .lock()
            .map_err(StoreError::interrupted)?;
        Ok(state.clone())
    }

    fn run_atomically<T, X, F>(&self, work: F) -> Result<T, X>
    where
        F: FnOnce(&mut MemoryTables) -> Result<T, X>,
        X: From<StoreError>,
    {
        let mut state = self
            .state
            .lock()
            .map_err(StoreError::interrupted)?;
        let mut working = state.clone();
        let outcome = work(&mut working)?;
        *state = working;
        Ok(outcome)
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    type Tx = MemoryTables;

    async fn transaction<T, X, F>(&self, work: F) -> Result<T, X>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, X> + Send + 'static,
        T: Send + 'static,
        X: From<StoreError> + Send + 'static,
    {
        self.run_atomically(work)
    }
}

//! `PostgreSQL` entity store.

use super::store_error;
use crate::tracker::ports::{EntityStore, StoreError};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error as DieselError;

/// `PostgreSQL` connection pool type shared by the store and the audit log.
pub type StorePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed entity store.
///
/// Each unit of work runs on a pooled connection inside a read-committed
/// transaction on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct PostgresEntityStore {
    pool: StorePgPool,
}

impl PostgresEntityStore {
    /// Creates a store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: StorePgPool) -> Self {
        Self { pool }
    }
}

enum TxFailure<X> {
    Work(X),
    Database(DieselError),
}

impl<X> From<DieselError> for TxFailure<X> {
    fn from(err: DieselError) -> Self {
        Self::Database(err)
    }
}

#[async_trait]
impl EntityStore for PostgresEntityStore {
    type Tx = PgConnection;

    async fn transaction<T, X, F>(&self, work: F) -> Result<T, X>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, X> + Send + 'static,
        T: Send + 'static,
        X: From<StoreError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let mut connection = pool
                .get()
                .map_err(|err| X::from(StoreError::persistence(err)))?;
            connection
                .build_transaction()
                .read_committed()
                .run(|tx| work(tx).map_err(TxFailure::Work))
                .map_err(|failure| match failure {
                    TxFailure::Work(err) => err,
                    TxFailure::Database(err) => X::from(store_error(err)),
                })
        })
        .await;
        outcome.unwrap_or_else(|err| Err(X::from(StoreError::interrupted(err))))
    }
}

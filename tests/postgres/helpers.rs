//! Shared helpers for `PostgreSQL` integration tests.

use super::cluster::{ManagedCluster, shared_cluster};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use eyre::WrapErr;
use taskledger::{
    access::{Principal, RequestContext, UserId},
    app::{PostgresLedger, build_pool, install_schema},
    config::ServiceConfig,
};
use uuid::Uuid;

/// Database holding the installed schema that test databases are cloned from.
pub const TEMPLATE_DB: &str = "taskledger_test_template";

/// A database dropped when the guard goes out of scope.
pub struct TemporaryDatabase {
    cluster: &'static ManagedCluster,
    name: String,
}

impl TemporaryDatabase {
    fn from_template(cluster: &'static ManagedCluster) -> eyre::Result<Self> {
        let name = format!("taskledger_test_{}", Uuid::new_v4().simple());
        cluster.create_from_template(&name, TEMPLATE_DB)?;
        Ok(Self { cluster, name })
    }

    /// Returns the connection URL for this database.
    #[must_use]
    pub fn url(&self) -> String {
        self.cluster.url(&self.name)
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        drop(self.cluster.drop_database(&self.name));
    }
}

/// A ledger over a fresh copy of the template database.
///
/// Field order matters: the ledger's pool closes before the database is
/// dropped.
pub struct PreparedLedger {
    /// Ledger under test.
    pub ledger: PostgresLedger,
    /// Backing database.
    pub database: TemporaryDatabase,
}

/// Starts the shared cluster if needed and returns a ledger over a new
/// database cloned from [`TEMPLATE_DB`].
///
/// # Errors
///
/// Returns an error if the cluster cannot start or the database cannot be
/// created.
pub async fn prepared_ledger() -> eyre::Result<PreparedLedger> {
    tokio::task::spawn_blocking(|| {
        let cluster = shared_cluster()?;
        cluster.ensure_template(TEMPLATE_DB, install_template)?;
        let database = TemporaryDatabase::from_template(cluster)?;
        let url = database.url();
        let config = ServiceConfig {
            database_url: Some(url.clone()),
            pool_max_size: 2,
            ..ServiceConfig::default()
        };
        let pool = build_pool(&url, config.pool_max_size).wrap_err("building the pool")?;
        Ok(PreparedLedger {
            ledger: PostgresLedger::with_pool(pool, &config),
            database,
        })
    })
    .await
    .wrap_err("setup task panicked")?
}

/// Opens a direct connection to the database behind `prepared`.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub fn connect(prepared: &PreparedLedger) -> eyre::Result<PgConnection> {
    PgConnection::establish(&prepared.database.url()).wrap_err("connecting to the test database")
}

fn install_template(url: &str) -> eyre::Result<()> {
    let mut connection =
        PgConnection::establish(url).wrap_err("connecting to the template database")?;
    install_schema(&mut connection).wrap_err("installing the schema")
}

/// Returns a context for a fresh regular user.
#[must_use]
pub fn user(name: &str) -> RequestContext {
    RequestContext::new(Principal::user(UserId::new(), name))
}

/// Returns a context for a fresh staff member.
#[must_use]
pub fn staff(name: &str) -> RequestContext {
    RequestContext::new(Principal::staff(UserId::new(), name))
}

/// Returns a context for a fresh superuser.
#[must_use]
pub fn superuser(name: &str) -> RequestContext {
    RequestContext::new(Principal::superuser(UserId::new(), name))
}

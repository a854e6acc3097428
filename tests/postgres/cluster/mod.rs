//! Embedded `PostgreSQL` cluster shared by the integration tests.
//!
//! The first caller starts the cluster; later callers reuse it. Unprivileged
//! runs host the server in process. Root runs delegate every lifecycle step
//! to the `pg_worker` binary, which drops to `nobody` before `initdb`.

mod worker;

use crate::test_helpers::EnvVarGuard;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use eyre::{WrapErr, eyre};
use pg_embedded_setup_unpriv::worker_process_test_api::{
    WorkerOperation, WorkerRequest, WorkerRequestArgs, run as run_worker_request,
};
use pg_embedded_setup_unpriv::{
    ExecutionPrivileges, TestBootstrapSettings, bootstrap_for_tests, detect_execution_privileges,
};
use postgresql_embedded::{PostgreSQL, Settings, Status};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::net::TcpListener;
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tokio::runtime::Runtime;

static SHARED_CLUSTER: OnceLock<Result<ManagedCluster, String>> = OnceLock::new();
static TEMPLATE_LOCK: Mutex<()> = Mutex::new(());

/// A running embedded cluster.
pub struct ManagedCluster {
    bootstrap: TestBootstrapSettings,
    env_vars: Vec<(String, Option<String>)>,
    // Owns the server when it runs in process.
    _in_process: Option<(Runtime, PostgreSQL)>,
}

/// Returns the shared cluster, starting it on first use.
///
/// Startup drives its own runtime, so call this from a blocking context.
///
/// # Errors
///
/// Returns an error when the cluster could not be started.
pub fn shared_cluster() -> eyre::Result<&'static ManagedCluster> {
    SHARED_CLUSTER
        .get_or_init(|| ManagedCluster::start().map_err(|err| format!("{err:#}")))
        .as_ref()
        .map_err(|err| eyre!("SKIP-TEST-CLUSTER: failed to start PostgreSQL: {err}"))
}

impl ManagedCluster {
    fn start() -> eyre::Result<Self> {
        let guard = EnvVarGuard::set_many(&bootstrap_env()?);
        let bootstrapped = bootstrap_for_tests();
        drop(guard);
        let mut bootstrap = bootstrapped.wrap_err("resolving cluster settings")?;
        read_password_file(&mut bootstrap.settings)?;
        let env_vars = bootstrap.environment.to_env();
        let mut cluster = Self {
            bootstrap,
            env_vars,
            _in_process: None,
        };
        match cluster.bootstrap.privileges {
            ExecutionPrivileges::Root => {
                cluster.run_worker(WorkerOperation::Setup, cluster.bootstrap.setup_timeout)?;
                cluster.run_worker(WorkerOperation::Start, cluster.bootstrap.start_timeout)?;
            }
            ExecutionPrivileges::Unprivileged => cluster.start_in_process()?,
        }
        read_port_from_pid(&mut cluster.bootstrap.settings)?;
        Ok(cluster)
    }

    fn start_in_process(&mut self) -> eyre::Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .wrap_err("building the cluster runtime")?;
        let guard = EnvVarGuard::set_many(&os_pairs(&self.env_vars));
        let mut postgres = PostgreSQL::new(self.bootstrap.settings.clone());
        let started = runtime.block_on(async {
            postgres.setup().await?;
            if !matches!(postgres.status(), Status::Started) {
                postgres.start().await?;
            }
            Ok::<(), postgresql_embedded::Error>(())
        });
        drop(guard);
        started.wrap_err("starting PostgreSQL in process")?;
        self.bootstrap.settings = postgres.settings().clone();
        self._in_process = Some((runtime, postgres));
        Ok(())
    }

    fn run_worker(&self, operation: WorkerOperation, timeout: Duration) -> eyre::Result<()> {
        let worker = self
            .bootstrap
            .worker_binary
            .as_ref()
            .ok_or_else(|| eyre!("no pg_worker binary configured for a root run"))?;
        let args = WorkerRequestArgs {
            worker: worker.as_path(),
            settings: &self.bootstrap.settings,
            env_vars: &self.env_vars,
            operation,
            timeout,
        };
        run_worker_request(&WorkerRequest::new(args)).wrap_err("running pg_worker")
    }

    /// Returns the connection URL for `database`.
    #[must_use]
    pub fn url(&self, database: &str) -> String {
        self.bootstrap.settings.url(database)
    }

    /// Creates `template` and runs `install` against its URL, unless the
    /// template already exists.
    ///
    /// # Errors
    ///
    /// Returns an error when the template cannot be created or `install`
    /// fails; a failed template is dropped again.
    pub fn ensure_template<F>(&self, template: &str, install: F) -> eyre::Result<()>
    where
        F: FnOnce(&str) -> eyre::Result<()>,
    {
        let _serialized = TEMPLATE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        if self.database_exists(template)? {
            return Ok(());
        }
        self.execute_admin(&format!("CREATE DATABASE {}", quote_identifier(template)))?;
        if let Err(err) = install(&self.url(template)) {
            self.drop_database(template)?;
            return Err(err);
        }
        Ok(())
    }

    /// Creates `name` as a copy of `template`.
    ///
    /// # Errors
    ///
    /// Returns an error when the statement fails.
    pub fn create_from_template(&self, name: &str, template: &str) -> eyre::Result<()> {
        self.execute_admin(&format!(
            "CREATE DATABASE {} TEMPLATE {}",
            quote_identifier(name),
            quote_identifier(template)
        ))
    }

    /// Drops `name`, disconnecting any remaining sessions.
    ///
    /// # Errors
    ///
    /// Returns an error when the statement fails.
    pub fn drop_database(&self, name: &str) -> eyre::Result<()> {
        self.execute_admin(&format!(
            "DROP DATABASE IF EXISTS {} WITH (FORCE)",
            quote_identifier(name)
        ))
    }

    fn admin_connection(&self) -> eyre::Result<PgConnection> {
        PgConnection::establish(&self.url("postgres")).wrap_err("connecting to the admin database")
    }

    fn execute_admin(&self, sql: &str) -> eyre::Result<()> {
        self.admin_connection()?
            .batch_execute(sql)
            .wrap_err_with(|| format!("running `{sql}`"))
    }

    fn database_exists(&self, name: &str) -> eyre::Result<bool> {
        #[derive(QueryableByName)]
        struct Exists {
            #[diesel(sql_type = diesel::sql_types::Bool)]
            present: bool,
        }

        let row = diesel::sql_query(
            "SELECT EXISTS (SELECT 1 FROM pg_database WHERE datname = $1) AS present",
        )
        .bind::<diesel::sql_types::Text, _>(name)
        .get_result::<Exists>(&mut self.admin_connection()?)
        .wrap_err("looking up the template database")?;
        Ok(row.present)
    }
}

fn bootstrap_env() -> eyre::Result<Vec<(OsString, Option<OsString>)>> {
    let mut changes = Vec::new();
    if std::env::var_os("PG_PORT").is_none() {
        let port = free_port()?;
        changes.push((OsString::from("PG_PORT"), Some(OsString::from(port.to_string()))));
    }
    if matches!(detect_execution_privileges(), ExecutionPrivileges::Root)
        && std::env::var_os("PG_EMBEDDED_WORKER").is_none()
    {
        let source = worker::locate()
            .ok_or_else(|| eyre!("pg_worker not found; build it or set PG_EMBEDDED_WORKER"))?;
        let staged = worker::prepare(
            &source,
            &format!("taskledger_pg_worker_{}", std::process::id()),
        )?;
        changes.push((
            OsString::from("PG_EMBEDDED_WORKER"),
            Some(OsString::from(staged.as_str())),
        ));
    }
    Ok(changes)
}

fn free_port() -> eyre::Result<u16> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).wrap_err("reserving a port")?;
    let address = listener.local_addr().wrap_err("reading the reserved port")?;
    Ok(address.port())
}

fn os_pairs(pairs: &[(String, Option<String>)]) -> Vec<(OsString, Option<OsString>)> {
    pairs
        .iter()
        .map(|(key, value)| (OsString::from(key), value.as_ref().map(OsString::from)))
        .collect()
}

fn open_parent(path: &Utf8Path) -> eyre::Result<(Dir, &str)> {
    let name = path
        .file_name()
        .ok_or_else(|| eyre!("{path} does not name a file"))?;
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .wrap_err_with(|| format!("opening {parent}"))?;
    Ok((dir, name))
}

fn read_password_file(settings: &mut Settings) -> eyre::Result<()> {
    let path = settings.password_file.to_string_lossy().into_owned();
    let (dir, name) = open_parent(Utf8Path::new(&path))?;
    match dir.read_to_string(name) {
        Ok(contents) => {
            let password = contents.trim_end();
            if !password.is_empty() {
                password.clone_into(&mut settings.password);
            }
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).wrap_err("reading the cluster password file"),
    }
}

// The fourth line of postmaster.pid holds the port the server bound.
fn read_port_from_pid(settings: &mut Settings) -> eyre::Result<()> {
    let data_dir = settings.data_dir.to_string_lossy().into_owned();
    let dir = Dir::open_ambient_dir(&data_dir, ambient_authority())
        .wrap_err("opening the cluster data directory")?;
    let contents = match dir.read_to_string("postmaster.pid") {
        Ok(contents) => contents,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
        Err(err) => return Err(err).wrap_err("reading postmaster.pid"),
    };
    if let Some(port) = contents
        .lines()
        .nth(3)
        .and_then(|line| line.trim().parse::<u16>().ok())
    {
        settings.port = port;
    }
    Ok(())
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

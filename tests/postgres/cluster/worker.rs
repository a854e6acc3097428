//! Finds the `pg_worker` binary and stages a copy `nobody` can execute.

use super::open_parent;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
#[cfg(unix)]
use cap_std::fs::{Permissions, PermissionsExt};
use cap_std::fs_utf8::Dir;
use eyre::WrapErr;

const WORKER_NAME: &str = "pg_worker";

/// Looks for the worker built alongside this test binary, then on `PATH`.
pub(super) fn locate() -> Option<Utf8PathBuf> {
    option_env!("CARGO_BIN_EXE_pg_worker")
        .map(Utf8PathBuf::from)
        .filter(|path| path.is_file())
        .or_else(beside_test_binary)
        .or_else(on_search_path)
}

fn beside_test_binary() -> Option<Utf8PathBuf> {
    let exe = Utf8PathBuf::try_from(std::env::current_exe().ok()?).ok()?;
    let candidate = exe.parent()?.parent()?.join(WORKER_NAME);
    candidate.is_file().then_some(candidate)
}

fn on_search_path() -> Option<Utf8PathBuf> {
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .filter_map(|dir| Utf8PathBuf::try_from(dir).ok())
        .map(|dir| dir.join(WORKER_NAME))
        .find(|candidate| candidate.is_file())
}

/// Copies `source` into `staging_name` under the temp directory next to a
/// wrapper script that re-executes it as `nobody` when invoked by root.
///
/// Returns the wrapper path.
pub(super) fn prepare(source: &Utf8Path, staging_name: &str) -> eyre::Result<Utf8PathBuf> {
    let temp = Utf8PathBuf::try_from(std::env::temp_dir()).wrap_err("temp dir is not UTF-8")?;
    let root =
        Dir::open_ambient_dir(&temp, ambient_authority()).wrap_err("opening the temp dir")?;
    root.create_dir_all(staging_name)
        .wrap_err("creating the worker staging dir")?;
    let staging = root
        .open_dir(staging_name)
        .wrap_err("opening the worker staging dir")?;
    let staged = temp.join(staging_name);

    let (source_dir, source_name) = open_parent(source)?;
    let binary = format!("{WORKER_NAME}.bin");
    source_dir
        .copy(source_name, &staging, &binary)
        .wrap_err("copying pg_worker")?;
    staging
        .write(WORKER_NAME, wrapper_script(&staged.join(&binary)))
        .wrap_err("writing the pg_worker wrapper")?;

    #[cfg(unix)]
    {
        root.set_permissions(staging_name, Permissions::from_mode(0o755))
            .wrap_err("opening the staging dir to nobody")?;
        for name in [WORKER_NAME, binary.as_str()] {
            staging
                .set_permissions(name, Permissions::from_mode(0o755))
                .wrap_err_with(|| format!("marking {name} executable"))?;
        }
    }
    Ok(staged.join(WORKER_NAME))
}

fn wrapper_script(binary: &Utf8Path) -> String {
    format!(
        concat!(
            "#!/bin/sh\n",
            "if [ \"$(id -u)\" -eq 0 ]; then\n",
            "  exec /usr/sbin/runuser -u nobody -- '{binary}' \"$@\"\n",
            "fi\n",
            "exec '{binary}' \"$@\"\n",
        ),
        binary = binary
    )
}

#[test]
fn staged_workers_wrap_an_executable_copy() {
    let temp = Utf8PathBuf::try_from(std::env::temp_dir()).expect("UTF-8 temp dir");
    let source_name = format!("taskledger_worker_source_{}", uuid::Uuid::new_v4().simple());
    Dir::open_ambient_dir(&temp, ambient_authority())
        .expect("temp dir")
        .write(&source_name, "#!/bin/sh\nexit 0\n")
        .expect("source worker written");

    let wrapper = prepare(&temp.join(&source_name), &format!("{source_name}_staged"))
        .expect("worker staged");

    let script = std::fs::read_to_string(wrapper.as_std_path()).expect("wrapper readable");
    let binary = wrapper.with_file_name("pg_worker.bin");
    assert!(binary.is_file(), "expected a copied worker at {binary}");
    assert!(script.contains(&format!("runuser -u nobody -- '{binary}'")));
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        for path in [&wrapper, &binary] {
            let mode = std::fs::metadata(path.as_std_path())
                .expect("staged file metadata")
                .permissions()
                .mode();
            assert_ne!(mode & 0o111, 0, "{path} is not executable: {mode:o}");
        }
    }
}

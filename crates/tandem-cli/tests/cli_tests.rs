//! CLI integration tests for tandem.

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use std::process::Command;
use tandem_lockfile::LockSnapshot;
use tandem_test_utils::fixtures::Fixtures;
use tandem_test_utils::mock_server::MockPyPi;
use tempfile::TempDir;

/// Get the tandem binary command, isolated from user configuration.
fn tandem(home: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("tandem"));
    cmd.current_dir(home)
        .env("TANDEM_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TANDEM_PYPI_URL")
        .env_remove("TANDEM_PLATFORM");
    cmd
}

fn write_lock(dir: &TempDir, name: &str, snapshot: &LockSnapshot) -> PathBuf {
    let path = dir.path().join(name);
    snapshot.write(&path).unwrap();
    path
}

// ========== Help and Version Tests ==========

#[test]
fn test_help_output() {
    let dir = TempDir::new().unwrap();
    tandem(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("list"));
}

#[test]
fn test_version_output() {
    let dir = TempDir::new().unwrap();
    tandem(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("tandem"));
}

// ========== List Tests ==========

#[test]
fn test_list_prints_table() {
    let dir = TempDir::new().unwrap();
    let mut snapshot = Fixtures::python_env();
    snapshot.pip_packages.extend([Fixtures::pip("six", "1.16.0")]);
    let lock = write_lock(&dir, "tandem.lock", &snapshot);

    tandem(dir.path())
        .arg("list")
        .arg(&lock)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Name"))
        .stdout(predicate::str::contains("h_1_cpython"))
        .stdout(predicate::str::is_match(r"(?m)^six\s+1\.16\.0\s+unknown\s+PyPi$").unwrap());
}

#[test]
fn test_list_empty_snapshot() {
    let dir = TempDir::new().unwrap();
    let lock = write_lock(&dir, "tandem.lock", &LockSnapshot::default());

    tandem(dir.path())
        .arg("list")
        .arg(&lock)
        .assert()
        .success()
        .stdout(predicate::str::contains("No packages locked."));
}

#[test]
fn test_list_missing_file() {
    let dir = TempDir::new().unwrap();
    tandem(dir.path())
        .args(["list", "missing.lock"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("E0501"))
        .stderr(predicate::str::contains("missing.lock"));
}

#[test]
fn test_list_rejects_unknown_lock_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tandem.lock");
    std::fs::write(&path, r#"{"lockVersion": "9.0.0", "platform": "emscripten-wasm32"}"#).unwrap();

    tandem(dir.path())
        .arg("list")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("E0601"));
}

// ========== Diff Tests ==========

#[test]
fn test_diff_nothing_changed() {
    let dir = TempDir::new().unwrap();
    let lock = write_lock(&dir, "a.lock", &Fixtures::python_env());

    tandem(dir.path())
        .arg("diff")
        .arg(&lock)
        .arg(&lock)
        .assert()
        .success()
        .stdout("All requested packages already installed.\n");
}

#[test]
fn test_diff_markers() {
    let dir = TempDir::new().unwrap();
    let old = Fixtures::snapshot(&[("python", "3.13.1", "h_0")], &[("six", "1.15.0")]);
    let new = Fixtures::snapshot(
        &[("python", "3.13.1", "h_0"), ("zlib", "1.3.1", "h_0")],
        &[("six", "1.16.0")],
    );
    let old = write_lock(&dir, "old.lock", &old);
    let new = write_lock(&dir, "new.lock", &new);

    tandem(dir.path())
        .args(["--no-ansi", "diff"])
        .arg(&old)
        .arg(&new)
        .assert()
        .success()
        .stdout(predicate::str::contains("~ six"))
        .stdout(predicate::str::contains("1.15.0 -> 1.16.0"))
        .stdout(predicate::str::contains("+ zlib"));
}

#[test]
fn test_diff_plan() {
    let dir = TempDir::new().unwrap();
    let old = Fixtures::snapshot(&[("python", "3.13.1", "h_0")], &[("six", "1.15.0")]);
    let new = Fixtures::snapshot(&[("python", "3.13.1", "h_0")], &[("six", "1.16.0")]);
    let old = write_lock(&dir, "old.lock", &old);
    let new = write_lock(&dir, "new.lock", &new);

    tandem(dir.path())
        .args(["diff", "--plan"])
        .arg(&old)
        .arg(&new)
        .assert()
        .success()
        .stdout("remove  pip   six-1.15.0-py3-none-any.whl\ninstall pip   six-1.16.0-py3-none-any.whl\n");
}

// ========== Resolve Tests ==========

#[test]
fn test_resolve_requires_specs() {
    let dir = TempDir::new().unwrap();
    tandem(dir.path()).arg("resolve").assert().failure();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resolve_against_mock_index() {
    let mock = MockPyPi::start().await;
    mock.register_project(
        "six",
        &[
            ("1.15.0", &["six-1.15.0-py2.py3-none-any.whl"]),
            ("1.16.0", &["six-1.16.0-py2.py3-none-any.whl"]),
        ],
        &[],
    )
    .await;
    mock.register_version("six", "1.15.0", &[]).await;

    let dir = TempDir::new().unwrap();
    let index = mock.index_url();
    let home = dir.path().to_path_buf();

    tokio::task::spawn_blocking(move || {
        tandem(&home)
            .env("TANDEM_PYPI_URL", index)
            .args(["resolve", "--python", "3.12", "--output", "out.lock", "six<1.16"])
            .assert()
            .success()
            .stderr(predicate::str::contains("Successfully installed six-1.15.0"));
    })
    .await
    .unwrap();

    let snapshot = LockSnapshot::read(dir.path().join("out.lock")).unwrap();
    let keys: Vec<&str> = snapshot.pip_packages.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["six-1.15.0-py2.py3-none-any.whl"]);
}

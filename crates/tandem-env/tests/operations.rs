//! Environment operations against a scripted solver and a mock index.

use assert_matches::assert_matches;
use async_trait::async_trait;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tandem_core::{Error, ErrorCode};
use tandem_env::{
    Ecosystem, Environment, EnvironmentSettings, EnvironmentSpec, PrimarySolver, RetryConfig,
    SolveRequest, SolvedRecord, SolverError,
};
use tandem_lockfile::{LockSnapshot, NOTHING_CHANGED};
use tandem_repository::{HttpClientConfig, PyPiClient, PyPiConfig};
use tandem_resolver::{NameMapping, NoteLevel};
use tandem_test_utils::fixtures::Fixtures;
use tandem_test_utils::mock_server::MockPyPi;

fn record(name: &str, version: &str, build: &str) -> SolvedRecord {
    SolvedRecord {
        filename: format!("{name}-{version}-{build}.tar.bz2"),
        name: name.to_string(),
        version: version.to_string(),
        build: build.to_string(),
        channel: "emscripten-forge-dev".to_string(),
        subdir: "emscripten-wasm32".to_string(),
        url: format!("https://prefix.dev/emscripten-forge-dev/emscripten-wasm32/{name}-{version}-{build}.tar.bz2"),
        hash: None,
        size: None,
    }
}

fn python_records() -> Vec<SolvedRecord> {
    vec![
        record("python", "3.13.1", "h_1_cpython"),
        record("pip", "24.3.1", "pyh145f28c_0"),
        record("libffi", "3.4.2", "h_0"),
    ]
}

/// Returns a fixed record set and remembers every request.
struct ScriptedSolver {
    records: Vec<SolvedRecord>,
    transient_failures: AtomicU32,
    requests: Mutex<Vec<SolveRequest>>,
}

impl ScriptedSolver {
    fn new(records: Vec<SolvedRecord>) -> Arc<Self> {
        Self::flaky(records, 0)
    }

    fn flaky(records: Vec<SolvedRecord>, failures: u32) -> Arc<Self> {
        Arc::new(Self {
            records,
            transient_failures: AtomicU32::new(failures),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn last_request(&self) -> SolveRequest {
        self.requests.lock().last().cloned().unwrap()
    }

    fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl PrimarySolver for ScriptedSolver {
    async fn solve(&self, request: &SolveRequest) -> Result<Vec<SolvedRecord>, SolverError> {
        self.requests.lock().push(request.clone());
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SolverError::transient("solver timed out"));
        }
        Ok(self.records.clone())
    }
}

fn settings() -> EnvironmentSettings {
    EnvironmentSettings {
        retry: RetryConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        },
        ..EnvironmentSettings::default()
    }
}

fn pypi(mock: &MockPyPi) -> Arc<PyPiClient> {
    let mut config = PyPiConfig::new(&mock.index_url()).unwrap();
    config.http_config = HttpClientConfig {
        max_retries: 0,
        rate_limit_per_host: 1000,
        ..HttpClientConfig::default()
    };
    Arc::new(PyPiClient::with_config(config).unwrap())
}

fn environment(
    solver: &Arc<ScriptedSolver>,
    mock: &MockPyPi,
    mapping: NameMapping,
) -> Environment<PyPiClient> {
    Environment::new(solver.clone(), pypi(mock), Arc::new(mapping), settings())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[tokio::test]
async fn create_solves_conda_then_pip() {
    let mock = MockPyPi::start().await;
    mock.register_project("six", &[("1.16.0", &["six-1.16.0-py2.py3-none-any.whl"])], &[])
        .await;
    let mut records = python_records();
    records.push(record("numpy", "2.2.0", "py313h_0"));
    let solver = ScriptedSolver::new(records);
    let env = environment(&solver, &mock, NameMapping::new());

    let spec = EnvironmentSpec {
        channels: strings(&["conda-forge"]),
        specs: strings(&["python=3.13", "numpy", "python=3.13"]),
        pip_specs: strings(&["six", "numpy"]),
    };
    let outcome = env.create(&spec).await.unwrap();

    let request = solver.last_request();
    assert_eq!(request.specs, strings(&["python=3.13", "numpy"]));
    assert_eq!(request.platforms, strings(&["noarch", "emscripten-wasm32"]));
    assert!(request.installed.is_empty());
    assert!(
        request
            .channels
            .contains(&"https://repo.prefix.dev/emscripten-forge-dev".to_string())
    );

    assert_eq!(outcome.lock.packages.len(), 4);
    let pip: Vec<&str> = outcome.lock.pip_packages.keys().map(String::as_str).collect();
    assert_eq!(pip, vec!["six-1.16.0-py2.py3-none-any.whl"]);

    let messages: Vec<&str> = outcome.notes.iter().map(|n| n.message.as_str()).collect();
    assert!(messages.contains(&"Requirement numpy already handled by conda/micromamba/mamba."));
    assert!(messages.contains(&"Successfully installed six-1.16.0"));

    assert!(outcome.plan.remove.is_empty());
    assert_eq!(outcome.plan.install.len(), 5);
    assert_eq!(outcome.plan.install.last().unwrap().ecosystem, Ecosystem::Pip);
    assert!(outcome.report.starts_with("Name"));
    outcome.lock.validate().unwrap();
}

#[tokio::test]
async fn create_with_pip_requires_python() {
    let mock = MockPyPi::start().await;
    let solver = ScriptedSolver::new(vec![record("zlib", "1.3.1", "h_0")]);
    let env = environment(&solver, &mock, NameMapping::new());

    let spec = EnvironmentSpec {
        channels: Vec::new(),
        specs: strings(&["zlib"]),
        pip_specs: strings(&["six"]),
    };
    let err = env.create(&spec).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1303);
    assert!(
        err.to_string()
            .contains("Cannot install pip dependencies without Python installed in the environment!")
    );
}

#[tokio::test]
async fn transient_solver_failures_are_retried() {
    let mock = MockPyPi::start().await;
    let solver = ScriptedSolver::flaky(python_records(), 2);
    let env = environment(&solver, &mock, NameMapping::new());

    let spec = EnvironmentSpec {
        specs: strings(&["python"]),
        ..EnvironmentSpec::default()
    };
    let outcome = env.create(&spec).await.unwrap();
    assert_eq!(solver.calls(), 3);
    assert_eq!(outcome.lock.packages.len(), 3);
}

#[tokio::test]
async fn exhausted_retries_fail_the_solve() {
    let mock = MockPyPi::start().await;
    let solver = ScriptedSolver::flaky(python_records(), 10);
    let env = environment(&solver, &mock, NameMapping::new());

    let spec = EnvironmentSpec {
        specs: strings(&["python"]),
        ..EnvironmentSpec::default()
    };
    let err = env.create(&spec).await.unwrap_err();
    assert_eq!(solver.calls(), 4);
    assert_matches!(err, Error::Resolution { .. });
}

#[tokio::test]
async fn install_drops_pip_packages_now_owned_by_conda() {
    let mock = MockPyPi::start().await;
    let mut records = python_records();
    records.push(record("pytorch", "2.5.1", "cpu_0"));
    let solver = ScriptedSolver::new(records);
    let env = environment(&solver, &mock, NameMapping::from_entries([("pytorch", "torch")]));

    let mut lock = Fixtures::python_env();
    lock.pip_packages.extend([Fixtures::pip("torch", "2.4.0"), Fixtures::pip("six", "1.16.0")]);

    let outcome = env
        .install(&strings(&["pytorch", "python"]), &[], &lock)
        .await
        .unwrap();

    let request = solver.last_request();
    assert_eq!(request.specs, strings(&["python", "pip", "libffi", "pytorch"]));
    assert_eq!(request.installed.len(), 3);
    assert!(request.installed.iter().any(|r| r.name == "python" && r.build == "h_1_cpython"));

    assert!(outcome.lock.pip_package("torch").is_none());
    assert!(outcome.lock.pip_package("six").is_some());
    assert!(outcome.lock.conda_package("pytorch").is_some());

    let report: Vec<&str> = outcome.report.lines().collect();
    assert!(report.iter().any(|l| l.starts_with("+ pytorch")));
    assert!(report.iter().any(|l| l.starts_with("- torch")));
}

#[tokio::test]
async fn reinstalling_reports_nothing_changed() {
    let mock = MockPyPi::start().await;
    let solver = ScriptedSolver::new(python_records());
    let env = environment(&solver, &mock, NameMapping::new());

    let lock = Fixtures::python_env();
    let outcome = env.install(&strings(&["python"]), &[], &lock).await.unwrap();
    assert_eq!(outcome.report, format!("{NOTHING_CHANGED}\n"));
    assert!(outcome.plan.is_empty());
}

#[tokio::test]
async fn remove_refuses_what_it_cannot_remove() {
    let mock = MockPyPi::start().await;
    let solver = ScriptedSolver::new(python_records());
    let env = environment(&solver, &mock, NameMapping::new());

    let mut lock = Fixtures::python_env();
    lock.specs = strings(&["python=3.13", "pip"]);
    lock.pip_packages.extend([Fixtures::pip("six", "1.16.0")]);

    let err = env.remove(&strings(&["libffi"]), &lock).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1304);
    assert_eq!(
        err.to_string(),
        "[E1304] Failure: libffi is a dependency of another installed package, cannot remove"
    );

    let err = env.remove(&strings(&["six"]), &lock).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1302);
    assert!(err.to_string().ends_with("Failure: six is handled by pip, cannot remove"));

    let err = env.remove(&strings(&["scipy"]), &lock).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1301);
    assert!(err.to_string().ends_with("Failure: scipy is not installed"));

    assert_eq!(solver.calls(), 0);
}

#[tokio::test]
async fn remove_resolves_without_the_spec() {
    let mock = MockPyPi::start().await;
    let solver = ScriptedSolver::new(vec![
        record("python", "3.13.1", "h_1_cpython"),
        record("libffi", "3.4.2", "h_0"),
    ]);
    let env = environment(&solver, &mock, NameMapping::new());

    let mut lock = Fixtures::python_env();
    lock.specs = strings(&["python=3.13", "pip>=24"]);

    let outcome = env.remove(&strings(&["pip"]), &lock).await.unwrap();
    assert_eq!(solver.last_request().specs, strings(&["python=3.13"]));
    assert_eq!(outcome.lock.specs, strings(&["python=3.13"]));
    assert!(outcome.lock.conda_package("pip").is_none());

    let removed: Vec<&str> = outcome.plan.remove.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(removed, vec!["pip"]);
    assert!(outcome.plan.install.is_empty());
}

#[tokio::test]
async fn pip_install_upgrades_seeded_packages() {
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
    let solver = ScriptedSolver::new(Vec::new());
    let env = environment(&solver, &mock, NameMapping::new());

    let mut lock = Fixtures::python_env();
    lock.pip_packages.extend([Fixtures::pip("six", "1.15.0")]);

    let outcome = env.pip_install(&strings(&["six>=1.16"]), &lock).await.unwrap();
    assert_eq!(solver.calls(), 0);
    assert_eq!(outcome.lock.pip_package("six").unwrap().1.version, "1.16.0");
    assert_eq!(outcome.lock.packages, lock.packages);

    let removed: Vec<&str> = outcome.plan.remove.iter().map(|p| p.version.as_str()).collect();
    let installed: Vec<&str> = outcome.plan.install.iter().map(|p| p.version.as_str()).collect();
    assert_eq!(removed, vec!["1.15.0"]);
    assert_eq!(installed, vec!["1.16.0"]);
}

#[tokio::test]
async fn pip_install_without_python_fails() {
    let mock = MockPyPi::start().await;
    let solver = ScriptedSolver::new(Vec::new());
    let env = environment(&solver, &mock, NameMapping::new());

    let err = env
        .pip_install(&strings(&["six"]), &LockSnapshot::default())
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::E1303);
}

#[tokio::test]
async fn pip_uninstall_skips_foreign_and_missing_packages() {
    let mock = MockPyPi::start().await;
    let solver = ScriptedSolver::new(Vec::new());
    let env = environment(&solver, &mock, NameMapping::new());

    let mut lock = Fixtures::python_env();
    lock.pip_packages.extend([Fixtures::pip("six", "1.16.0"), Fixtures::pip("attrs", "24.2.0")]);

    let outcome = env.pip_uninstall(&strings(&["python", "six", "requests"]), &lock);

    let notes: Vec<(NoteLevel, &str)> = outcome
        .notes
        .iter()
        .map(|n| (n.level, n.message.as_str()))
        .collect();
    assert_eq!(
        notes,
        vec![
            (NoteLevel::Warning, "WARNING: Skipping python as it is not installed with pip."),
            (NoteLevel::Info, "Successfully uninstalled six"),
            (NoteLevel::Warning, "WARNING: Skipping requests as it is not installed."),
        ]
    );
    assert!(outcome.lock.pip_package("six").is_none());
    assert!(outcome.lock.pip_package("attrs").is_some());
    assert_eq!(outcome.lock.packages, lock.packages);
    assert_eq!(outcome.plan.remove.len(), 1);
    assert_eq!(solver.calls(), 0);
}

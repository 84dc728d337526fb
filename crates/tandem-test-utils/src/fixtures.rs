//! Pre-built fixtures: lock snapshots and Python project descriptors.

use tandem_core::{Origin, Platform};
use tandem_lockfile::{CondaPackage, LockSnapshot, PackageHash, PipPackage};

/// Collection of pre-built test fixtures.
#[derive(Debug)]
pub struct Fixtures;

impl Fixtures {
    /// Filename of a pure wheel.
    #[must_use]
    pub fn wheel_name(name: &str, version: &str) -> String {
        format!("{}-{version}-py3-none-any.whl", name.replace('-', "_"))
    }

    /// A conda record and its snapshot key.
    #[must_use]
    pub fn conda(name: &str, version: &str, build: &str) -> (String, CondaPackage) {
        let mut pkg = CondaPackage::new(name, version, build).with_channel("emscripten-forge-dev");
        pkg.subdir = Some(Platform::EmscriptenWasm32.as_str().to_string());
        (format!("{name}-{version}-{build}.tar.bz2"), pkg)
    }

    /// A pip record for a pure wheel and its snapshot key.
    #[must_use]
    pub fn pip(name: &str, version: &str) -> (String, PipPackage) {
        let filename = Self::wheel_name(name, version);
        let pkg = PipPackage {
            name: name.to_string(),
            version: version.to_string(),
            url: format!("https://files.pythonhosted.org/packages/{filename}"),
            registry: Origin::Registry,
            hash: Some(PackageHash {
                md5: None,
                sha256: Some(format!("{:064x}", filename.len())),
            }),
            size: Some(2048),
        };
        (filename, pkg)
    }

    /// A snapshot with the given conda `(name, version, build)` and pip
    /// `(name, version)` packages.
    #[must_use]
    pub fn snapshot(conda: &[(&str, &str, &str)], pip: &[(&str, &str)]) -> LockSnapshot {
        let mut snapshot = LockSnapshot::new(Platform::EmscriptenWasm32);
        snapshot.specs = conda.iter().map(|(n, _, _)| (*n).to_string()).collect();
        snapshot.channels = vec!["https://repo.prefix.dev/emscripten-forge-dev".to_string()];
        snapshot.packages = conda.iter().map(|(n, v, b)| Self::conda(n, v, b)).collect();
        snapshot.pip_packages = pip.iter().map(|(n, v)| Self::pip(n, v)).collect();
        snapshot
    }

    /// A minimal Python environment: python, pip and their runtime.
    #[must_use]
    pub fn python_env() -> LockSnapshot {
        Self::snapshot(
            &[
                ("python", "3.13.1", "h_1_cpython"),
                ("pip", "24.3.1", "pyh145f28c_0"),
                ("libffi", "3.4.2", "h_0"),
            ],
            &[],
        )
    }

    /// `pyproject.toml` with a `[project]` table.
    #[must_use]
    pub fn pyproject(name: &str, version: Option<&str>, dependencies: &[&str]) -> String {
        let deps = dependencies
            .iter()
            .map(|d| format!("    \"{d}\","))
            .collect::<Vec<_>>()
            .join("\n");
        let version_line = version.map_or_else(
            || "dynamic = [\"version\"]".to_string(),
            |v| format!("version = \"{v}\""),
        );
        format!(
            "[build-system]\nrequires = [\"setuptools>=61\"]\nbuild-backend = \"setuptools.build_meta\"\n\n[project]\nname = \"{name}\"\n{version_line}\ndependencies = [\n{deps}\n]\n"
        )
    }

    /// `setup.cfg` with `[metadata]` and `[options]`.
    #[must_use]
    pub fn setup_cfg(name: &str, version: &str, install_requires: &[&str]) -> String {
        let requires = install_requires
            .iter()
            .map(|r| format!("    {r}"))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "[metadata]\nname = {name}\nversion = {version}\n\n[options]\npackages = find:\ninstall_requires =\n{requires}\n"
        )
    }
}

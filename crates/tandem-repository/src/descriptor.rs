//! Python project descriptor parsing.
//!
//! Reads the package name, version and dependency list out of
//! `pyproject.toml`, `setup.cfg` or a literal-only `setup.py`.

use configparser::ini::Ini;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

/// Descriptor files probed in a repository, in order.
pub const DESCRIPTOR_FILES: [&str; 3] = ["pyproject.toml", "setup.cfg", "setup.py"];

/// Metadata read from a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDescriptor {
    /// Declared name.
    pub name: String,
    /// Declared version; `None` when absent or dynamic.
    pub version: Option<String>,
    /// Dependency strings.
    pub requires: Vec<String>,
}

/// Parse a descriptor by file name.
///
/// Returns `None` when the file is malformed or declares no name.
#[must_use]
pub fn parse_descriptor(file: &str, content: &str) -> Option<ProjectDescriptor> {
    match file {
        "pyproject.toml" => parse_pyproject(content),
        "setup.cfg" => parse_setup_cfg(content),
        "setup.py" => parse_setup_py(content),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct PyProject {
    project: Option<ProjectTable>,
}

#[derive(Debug, Deserialize)]
struct ProjectTable {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Parse the `[project]` table of a `pyproject.toml`.
#[must_use]
pub fn parse_pyproject(content: &str) -> Option<ProjectDescriptor> {
    let document: PyProject = toml::from_str(content).ok()?;
    let project = document.project?;
    Some(ProjectDescriptor {
        name: project.name.filter(|n| !n.trim().is_empty())?,
        version: project.version,
        requires: project.dependencies,
    })
}

/// Parse `[metadata]` and `[options]` of a `setup.cfg`.
#[must_use]
pub fn parse_setup_cfg(content: &str) -> Option<ProjectDescriptor> {
    let mut ini = Ini::new_cs();
    ini.set_multiline(true);
    ini.read(content.to_string()).ok()?;

    let name = ini
        .get("metadata", "name")
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())?;
    let version = ini
        .get("metadata", "version")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.starts_with("attr:") && !v.starts_with("file:"));
    let requires = ini
        .get("options", "install_requires")
        .map(|deps| {
            deps.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(ProjectDescriptor {
        name,
        version,
        requires,
    })
}

static SETUP_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"\bname\s*=\s*["']([^"']+)["']"#).unwrap()
});

static SETUP_VERSION: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"\bversion\s*=\s*["']([^"']+)["']"#).unwrap()
});

static SETUP_REQUIRES: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?s)\binstall_requires\s*=\s*\[(.*?)\]").unwrap()
});

static QUOTED: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"["']([^"']+)["']"#).unwrap()
});

/// Extract literal `name=`, `version=` and `install_requires=[...]`
/// arguments from a `setup.py`.
#[must_use]
pub fn parse_setup_py(content: &str) -> Option<ProjectDescriptor> {
    let name = SETUP_NAME.captures(content)?.get(1)?.as_str().to_string();
    let version = SETUP_VERSION
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let requires = SETUP_REQUIRES
        .captures(content)
        .and_then(|c| c.get(1))
        .map(|list| {
            QUOTED
                .captures_iter(list.as_str())
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .collect()
        })
        .unwrap_or_default();

    Some(ProjectDescriptor {
        name,
        version,
        requires,
    })
}

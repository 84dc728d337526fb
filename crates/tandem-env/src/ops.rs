//! Environment operations.
//!
//! Every operation takes the current [`LockSnapshot`] by reference and
//! returns the next one inside an [`Outcome`]; nothing is written to disk
//! here. The conda solve always runs first, then the pip resolution is
//! seeded with whatever the conda solve now owns.

use crate::retry::{RetryConfig, solve_with_retry};
use crate::solver::{InstalledRef, PrimarySolver, SolveRequest, SolvedRecord};
use ahash::AHashSet;
use std::collections::BTreeMap;
use std::sync::Arc;
use tandem_config::{TandemConfig, format_channels};
use tandem_core::{Error, Platform, Result, RuntimeVersion, canonical_name, package_name_from_spec};
use tandem_lockfile::{
    CondaPackage, LockEntry, LockSnapshot, diff, environment_diff, packages_list,
};
use tandem_resolver::{
    ConstraintOptions, NameMapping, Note, PackageFetcher, RequirementSpec, Resolution,
    ResolutionState, Resolver, ResolverConfig, SourceFetcher,
};
use tracing::{debug, info};

const MISSING_PYTHON: &str =
    "Cannot install pip dependencies without Python installed in the environment!";

/// An environment description, already parsed from its source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSpec {
    /// Channel names or URLs.
    pub channels: Vec<String>,
    /// Conda match specs.
    pub specs: Vec<String>,
    /// Pip requirements.
    pub pip_specs: Vec<String>,
}

/// Settings shared by every operation.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentSettings {
    /// Target platform.
    pub platform: Platform,
    /// Take an sdist when no wheel fits.
    pub allow_source_fallback: bool,
    /// Accepted constraint forms.
    pub constraint_options: ConstraintOptions,
    /// Retry policy for the conda solve.
    pub retry: RetryConfig,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            platform: Platform::default(),
            allow_source_fallback: false,
            constraint_options: ConstraintOptions::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl EnvironmentSettings {
    /// Settings from a resolved configuration.
    #[must_use]
    pub fn from_config(config: &TandemConfig) -> Self {
        Self {
            platform: config.platform,
            allow_source_fallback: config.allow_source_fallback,
            constraint_options: ConstraintOptions {
                allow_not_equal: config.allow_not_equal,
            },
            retry: RetryConfig::new(config.solve_retries),
        }
    }
}

/// Which installer handles a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ecosystem {
    /// Installed from a conda channel.
    Conda,
    /// Installed from a wheel.
    Pip,
}

/// One artifact to remove or install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPackage {
    /// Snapshot key, the artifact filename.
    pub filename: String,
    /// Package name.
    pub name: String,
    /// Version.
    pub version: String,
    /// Installer responsible for it.
    pub ecosystem: Ecosystem,
}

/// Work for the installer: remove `remove`, then install `install`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Artifacts to remove, pip first.
    pub remove: Vec<PlannedPackage>,
    /// Artifacts to install, conda first.
    pub install: Vec<PlannedPackage>,
}

impl InstallPlan {
    /// Whether the environment is already up to date.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.install.is_empty()
    }
}

fn planned<T: LockEntry>(
    entries: &BTreeMap<String, T>,
    ecosystem: Ecosystem,
) -> impl Iterator<Item = PlannedPackage> + '_ {
    entries.iter().map(move |(filename, entry)| PlannedPackage {
        filename: filename.clone(),
        name: entry.name().to_string(),
        version: entry.version().to_string(),
        ecosystem,
    })
}

/// Turn the difference between two snapshots into installer work.
///
/// A changed package appears in both lists: its old artifact is removed
/// before the new one is installed.
#[must_use]
pub fn install_plan(old: &LockSnapshot, new: &LockSnapshot) -> InstallPlan {
    let changes = diff(old, new);
    InstallPlan {
        remove: planned(&changes.pip.removed, Ecosystem::Pip)
            .chain(planned(&changes.conda.removed, Ecosystem::Conda))
            .collect(),
        install: planned(&changes.conda.added, Ecosystem::Conda)
            .chain(planned(&changes.pip.added, Ecosystem::Pip))
            .collect(),
    }
}

/// Result of an environment operation.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// The next snapshot.
    pub lock: LockSnapshot,
    /// User-facing notes, in order.
    pub notes: Vec<Note>,
    /// Installer work to get from the previous snapshot to `lock`.
    pub plan: InstallPlan,
    /// Uncolored package table for a new environment, environment diff
    /// otherwise.
    pub report: String,
}

impl Outcome {
    fn new(previous: Option<&LockSnapshot>, lock: LockSnapshot, notes: Vec<Note>) -> Self {
        let (report, plan) = match previous {
            Some(old) => (environment_diff(old, &lock, false), install_plan(old, &lock)),
            None => (
                packages_list(&lock),
                install_plan(&LockSnapshot::new(lock.platform), &lock),
            ),
        };
        Self {
            lock,
            notes,
            plan,
            report,
        }
    }
}

fn merge_unique(existing: &[String], extra: &[String]) -> Vec<String> {
    let mut seen = AHashSet::new();
    existing
        .iter()
        .chain(extra)
        .filter(|item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

fn python_runtime(lock: &LockSnapshot) -> Result<RuntimeVersion> {
    let (_, python) = lock
        .conda_package("python")
        .ok_or_else(|| Error::missing_python(MISSING_PYTHON))?;
    RuntimeVersion::parse(&python.version).ok_or_else(|| {
        Error::missing_python(format!("cannot read Python version '{}'", python.version))
    })
}

/// An environment manager over a conda solver and a wheel registry.
pub struct Environment<F: PackageFetcher> {
    solver: Arc<dyn PrimarySolver>,
    fetcher: Arc<F>,
    source: Option<Arc<dyn SourceFetcher>>,
    mapping: Arc<NameMapping>,
    settings: EnvironmentSettings,
}

impl<F: PackageFetcher> std::fmt::Debug for Environment<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("settings", &self.settings)
            .field("source_control", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl<F: PackageFetcher> Environment<F> {
    /// Create an environment manager.
    ///
    /// `mapping` translates conda names to PyPI names when deciding which
    /// wheels the conda solve already provides.
    pub fn new(
        solver: Arc<dyn PrimarySolver>,
        fetcher: Arc<F>,
        mapping: Arc<NameMapping>,
        settings: EnvironmentSettings,
    ) -> Self {
        Self {
            solver,
            fetcher,
            source: None,
            mapping,
            settings,
        }
    }

    /// Enable source-control pip requirements.
    #[must_use]
    pub fn with_source_fetcher(mut self, source: Arc<dyn SourceFetcher>) -> Self {
        self.source = Some(source);
        self
    }

    /// Settings in use.
    #[must_use]
    pub const fn settings(&self) -> &EnvironmentSettings {
        &self.settings
    }

    /// Create a new environment from scratch.
    ///
    /// # Errors
    /// Fails when the conda solve fails, when pip requirements are given
    /// without `python` in the solved set, or when the pip resolution fails.
    pub async fn create(&self, spec: &EnvironmentSpec) -> Result<Outcome> {
        let mut lock = LockSnapshot::new(self.settings.platform);
        lock.specs = merge_unique(&spec.specs, &[]);
        lock.channels = format_channels(&spec.channels);
        lock.packages = self.solve_conda(&lock.specs, &lock.channels, None).await?;

        let mut notes = Vec::new();
        if !spec.pip_specs.is_empty() {
            let resolution = self.resolve_pip(&spec.pip_specs, &lock).await?;
            lock.set_pip_packages(resolution.packages.values());
            notes = resolution.notes;
        }
        Ok(Outcome::new(None, lock, notes))
    }

    /// Add conda specs and channels to an environment.
    ///
    /// Pip packages that the new solve provides through conda are dropped.
    ///
    /// # Errors
    /// Fails when the conda solve fails.
    pub async fn install(
        &self,
        specs: &[String],
        channels: &[String],
        lock: &LockSnapshot,
    ) -> Result<Outcome> {
        let mut next = lock.clone();
        next.channels = merge_unique(&lock.channels, &format_channels(channels));
        next.specs = merge_unique(&lock.specs, specs);
        info!("Specs: {}", next.specs.join(", "));
        info!("Channels: {}", next.channels.join(", "));

        next.packages = self.solve_conda(&next.specs, &next.channels, Some(lock)).await?;
        self.drop_conda_owned(&mut next);
        Ok(Outcome::new(Some(lock), next, Vec::new()))
    }

    /// Remove conda packages that were explicitly requested.
    ///
    /// # Errors
    /// Fails without solving when a name is only a dependency, is managed by
    /// pip, or is not installed. Otherwise fails when the conda solve fails.
    pub async fn remove(&self, names: &[String], lock: &LockSnapshot) -> Result<Outcome> {
        let requested: AHashSet<String> = lock
            .specs
            .iter()
            .filter_map(|s| package_name_from_spec(s))
            .map(canonical_name)
            .collect();

        for name in names {
            let installed = lock.conda_package(name).is_some();
            if installed && !requested.contains(&canonical_name(name)) {
                return Err(Error::required_dependency(
                    name.as_str(),
                    format!("Failure: {name} is a dependency of another installed package, cannot remove"),
                ));
            }
            if lock.pip_package(name).is_some() {
                return Err(Error::owned_elsewhere(
                    name.as_str(),
                    format!("Failure: {name} is handled by pip, cannot remove"),
                ));
            }
            if !installed {
                return Err(Error::not_installed(
                    name.as_str(),
                    format!("Failure: {name} is not installed"),
                ));
            }
        }

        let removing: AHashSet<String> = names.iter().map(|n| canonical_name(n)).collect();
        let mut next = lock.clone();
        next.specs.retain(|spec| {
            package_name_from_spec(spec).is_none_or(|n| !removing.contains(&canonical_name(n)))
        });
        next.packages = self.solve_conda(&next.specs, &next.channels, Some(lock)).await?;
        self.drop_conda_owned(&mut next);
        Ok(Outcome::new(Some(lock), next, Vec::new()))
    }

    /// Resolve pip requirements on top of an environment.
    ///
    /// # Errors
    /// Fails when `python` is not installed or the resolution fails.
    pub async fn pip_install(&self, specs: &[String], lock: &LockSnapshot) -> Result<Outcome> {
        let resolution = self.resolve_pip(specs, lock).await?;
        let mut next = lock.clone();
        next.set_pip_packages(resolution.packages.values());
        Ok(Outcome::new(Some(lock), next, resolution.notes))
    }

    /// Drop pip packages from an environment.
    ///
    /// Names installed through conda or not installed at all are skipped with
    /// a warning. Dependencies of the removed packages are kept.
    #[must_use]
    pub fn pip_uninstall(&self, names: &[String], lock: &LockSnapshot) -> Outcome {
        let mut next = lock.clone();
        let mut notes = Vec::with_capacity(names.len());
        for name in names {
            let note = if lock.conda_package(name).is_some() {
                Note::warning(
                    Some(name),
                    format!("WARNING: Skipping {name} as it is not installed with pip."),
                )
            } else if let Some((key, _)) = next.pip_package(name) {
                let key = key.to_string();
                next.pip_packages.remove(&key);
                Note::info(Some(name), format!("Successfully uninstalled {name}"))
            } else {
                Note::warning(
                    Some(name),
                    format!("WARNING: Skipping {name} as it is not installed."),
                )
            };
            note.emit();
            notes.push(note);
        }
        debug!(platform = %self.settings.platform, removed = lock.len() - next.len(), "pip uninstall done");
        Outcome::new(Some(lock), next, notes)
    }

    async fn solve_conda(
        &self,
        specs: &[String],
        channels: &[String],
        previous: Option<&LockSnapshot>,
    ) -> Result<BTreeMap<String, CondaPackage>> {
        if specs.is_empty() {
            return Ok(BTreeMap::new());
        }
        let request = SolveRequest {
            specs: specs.to_vec(),
            channels: channels.to_vec(),
            platforms: self.settings.platform.solve_subdirs(),
            installed: previous
                .map(|lock| {
                    lock.packages
                        .iter()
                        .map(|(filename, pkg)| InstalledRef::from_locked(filename, pkg))
                        .collect()
                })
                .unwrap_or_default(),
        };
        debug!(
            specs = request.specs.len(),
            installed = request.installed.len(),
            platforms = ?request.platforms,
            "solving conda environment"
        );
        let records = solve_with_retry(self.solver.as_ref(), &request, &self.settings.retry).await?;
        Ok(records.into_iter().map(SolvedRecord::into_conda).collect())
    }

    /// Names the conda packages of `lock` provide, under both their conda and
    /// PyPI spelling.
    fn conda_owned(&self, lock: &LockSnapshot) -> AHashSet<String> {
        lock.packages
            .values()
            .flat_map(|p| [canonical_name(&p.name), canonical_name(&self.mapping.secondary_name(&p.name))])
            .collect()
    }

    fn drop_conda_owned(&self, lock: &mut LockSnapshot) {
        let owned = self.conda_owned(lock);
        lock.pip_packages.retain(|_, pkg| {
            let keep = !owned.contains(&canonical_name(&pkg.name));
            if !keep {
                debug!(package = %pkg.name, "now provided by conda, dropping pip package");
            }
            keep
        });
    }

    async fn resolve_pip(&self, specs: &[String], lock: &LockSnapshot) -> Result<Resolution> {
        let runtime = python_runtime(lock)?;
        let roots = specs
            .iter()
            .map(|s| RequirementSpec::parse(s))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let config = ResolverConfig {
            runtime,
            platform: self.settings.platform,
            allow_source_fallback: self.settings.allow_source_fallback,
            constraint_options: self.settings.constraint_options,
        };
        let mut resolver = Resolver::new(Arc::clone(&self.fetcher), config);
        if let Some(source) = &self.source {
            resolver = resolver.with_source_fetcher(Arc::clone(source));
        }

        let state = ResolutionState::new(self.conda_owned(lock), lock.pip_resolved());
        Ok(resolver.resolve(&roots, state).await?)
    }
}

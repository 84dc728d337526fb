//! Transitive requirement resolution.
//!
//! The walk keeps an explicit stack of `(requirement, required)` pairs and a
//! single [`ResolutionState`]. Each visited package is recorded in the state
//! before its own dependencies are pushed, which makes the already-satisfied
//! check double as the cycle guard.
//!
//! Roots are `required`: a missing compatible artifact for a root is an
//! error, while for a transitive dependency it is a warning and the subtree
//! is skipped.

use crate::error::ResolveError;
use crate::fetcher::{FetchError, PackageFetcher, SourceFetcher};
use crate::requirement::{RequirementSource, RequirementSpec, SourceReference, dependency_applies};
use crate::selector::select_artifact;
use crate::state::{Note, ResolutionState};
use crate::version::{Constraint, ConstraintOptions, compare, select_best};
use ahash::AHashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tandem_core::{ArtifactRef, Origin, Platform, ResolvedPackage, RuntimeVersion, canonical_name};
use tracing::{debug, error, info};

/// Resolver statistics.
#[derive(Debug, Default)]
pub struct ResolverStats {
    /// Registry lookups performed.
    pub packages_fetched: AtomicU64,
    /// Versions seen across all lookups.
    pub versions_total: AtomicU64,
    /// Source-control lookups performed.
    pub sources_fetched: AtomicU64,
    /// Failed lookups.
    pub requests_failed: AtomicU64,
    /// Wall time of the last resolution (ms).
    pub resolve_time_ms: AtomicU64,
}

/// Resolver configuration.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Python runtime wheels must run on.
    pub runtime: RuntimeVersion,
    /// Target platform.
    pub platform: Platform,
    /// Take an sdist when no wheel fits.
    pub allow_source_fallback: bool,
    /// Accepted constraint forms.
    pub constraint_options: ConstraintOptions,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeVersion::new(3, 13, 0),
            platform: Platform::default(),
            allow_source_fallback: false,
            constraint_options: ConstraintOptions::default(),
        }
    }
}

/// Result of a resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Resolved wheels keyed by artifact filename.
    pub packages: BTreeMap<String, ResolvedPackage>,
    /// Notes produced while resolving, in order.
    pub notes: Vec<Note>,
    /// Resolution time.
    pub duration: Duration,
}

impl Resolution {
    /// Number of resolved packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Look up a package by name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ResolvedPackage> {
        let wanted = canonical_name(name);
        self.packages
            .values()
            .find(|p| canonical_name(&p.name) == wanted)
    }
}

/// Message for a release with no usable artifact.
#[must_use]
pub fn unavailable_message(package: &str, platform: Platform) -> String {
    if platform == Platform::EmscriptenWasm32 {
        format!(
            "Cannot install '{package}' from PyPI because it is a binary built package that is not compatible with WASM environments. \
             To resolve this issue, you can: \
             1) Try to install it from emscripten-forge instead: \"!mamba install {package}\" \
             2) If that doesn't work, it's probably that the package was not made WASM-compatible on emscripten-forge. \
             You can either request or contribute a new recipe for that package in https://github.com/emscripten-forge/recipes "
        )
    } else {
        format!("No wheel available for '{package}' for platform '{platform}'")
    }
}

/// Requirement resolver.
pub struct Resolver<F: PackageFetcher> {
    fetcher: Arc<F>,
    source: Option<Arc<dyn SourceFetcher>>,
    config: ResolverConfig,
    stats: Arc<ResolverStats>,
}

impl<F: PackageFetcher> std::fmt::Debug for Resolver<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .field("source_control", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl<F: PackageFetcher> Resolver<F> {
    /// Create a resolver over a registry fetcher.
    pub fn new(fetcher: Arc<F>, config: ResolverConfig) -> Self {
        Self {
            fetcher,
            source: None,
            config,
            stats: Arc::new(ResolverStats::default()),
        }
    }

    /// Enable source-control requirements.
    #[must_use]
    pub fn with_source_fetcher(mut self, source: Arc<dyn SourceFetcher>) -> Self {
        self.source = Some(source);
        self
    }

    /// Get resolver statistics.
    #[must_use]
    pub fn stats(&self) -> &ResolverStats {
        &self.stats
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `roots` on top of `state`.
    ///
    /// The returned packages are the full wheel set: what `state` already had
    /// installed, with upgrades replacing older versions, plus everything
    /// newly pulled in.
    ///
    /// # Errors
    /// Any failure aborts the whole resolution; no partial result is returned.
    pub async fn resolve(
        &self,
        roots: &[RequirementSpec],
        mut state: ResolutionState,
    ) -> Result<Resolution, ResolveError> {
        let start = Instant::now();
        let before: AHashMap<String, String> = state
            .iter()
            .map(|p| (canonical_name(&p.name), p.version.clone()))
            .collect();

        let mut stack: Vec<(RequirementSpec, bool)> =
            roots.iter().rev().map(|r| (r.clone(), true)).collect();

        while let Some((spec, required)) = stack.pop() {
            let children = match &spec.source {
                RequirementSource::SourceControl(reference) => {
                    self.visit_source(&spec, reference, &mut state).await?
                }
                RequirementSource::Registry => self.visit_registry(&spec, required, &mut state).await?,
            };
            stack.extend(children.into_iter().rev().map(|c| (c, false)));
        }

        let mut installed: Vec<String> = state
            .iter()
            .filter(|p| before.get(&canonical_name(&p.name)) != Some(&p.version))
            .map(ToString::to_string)
            .collect();
        if !installed.is_empty() {
            installed.sort();
            state.note_once(Note::info(
                None,
                format!("Successfully installed {}", installed.join(" ")),
            ));
        }

        let (resolved, notes) = state.into_parts();
        let packages: BTreeMap<String, ResolvedPackage> = resolved
            .into_iter()
            .map(|p| (p.filename().to_string(), p))
            .collect();

        let duration = start.elapsed();
        let total_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self.stats.resolve_time_ms.store(total_ms, Ordering::Relaxed);
        info!(
            total_ms,
            packages = packages.len(),
            fetched = self.stats.packages_fetched.load(Ordering::Relaxed),
            "resolution complete"
        );

        Ok(Resolution {
            packages,
            notes,
            duration,
        })
    }

    async fn visit_registry(
        &self,
        spec: &RequirementSpec,
        required: bool,
        state: &mut ResolutionState,
    ) -> Result<Vec<RequirementSpec>, ResolveError> {
        let name = spec.name.as_str();

        if state.is_owned_by_primary(name) {
            let message = if required {
                format!("Requirement {name} already handled by conda/micromamba/mamba.")
            } else {
                format!("Requirement {name} already satisfied.")
            };
            state.note_once(Note::info(Some(name), message));
            return Ok(Vec::new());
        }

        let constraint = spec
            .constraint
            .as_deref()
            .map(|c| Constraint::parse(c, self.config.constraint_options))
            .transpose()?;

        if let Some(existing) = state.resolved(name)
            && constraint
                .as_ref()
                .is_none_or(|c| c.satisfies_str(&existing.version))
        {
            let message = format!("Requirement {} already satisfied.", spec.display_spec());
            state.note_once(Note::info(Some(name), message));
            return Ok(Vec::new());
        }

        debug!(package = %name, constraint = ?spec.constraint, "fetching releases");
        self.stats.packages_fetched.fetch_add(1, Ordering::Relaxed);
        let releases = match self.fetcher.fetch_releases(name).await {
            Ok(releases) => releases,
            Err(FetchError::NotFound { .. }) => {
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                let err = ResolveError::PackageNotFound {
                    name: name.to_string(),
                    requirement: spec.display_spec(),
                };
                log_fatal(&err);
                return Err(err);
            }
            Err(e) => {
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                return Err(ResolveError::Fetch {
                    name: name.to_string(),
                    message: e.to_string(),
                });
            }
        };
        self.stats
            .versions_total
            .fetch_add(releases.candidates.len() as u64, Ordering::Relaxed);

        let Some(version) = select_best(releases.versions(), constraint.as_ref()) else {
            let mut available: Vec<String> = releases.versions().map(str::to_string).collect();
            available.sort_by(|a, b| compare(a, b));
            let constraint = spec.constraint.clone().unwrap_or_default();
            let err = ResolveError::ConstraintUnsatisfiable {
                name: name.to_string(),
                requirement: format!("{}{constraint}", releases.name),
                constraint,
                available,
            };
            log_fatal(&err);
            return Err(err);
        };

        let candidate = releases.candidate(version).ok_or_else(|| ResolveError::Fetch {
            name: name.to_string(),
            message: format!("release {version} disappeared from the metadata"),
        })?;

        let Some(selection) = select_artifact(
            candidate,
            self.config.runtime,
            self.config.platform,
            self.config.allow_source_fallback,
        ) else {
            let message = unavailable_message(name, self.config.platform);
            if required {
                error!(package = %name, "{message}");
                return Err(ResolveError::ArtifactUnavailable {
                    name: name.to_string(),
                    platform: self.config.platform.to_string(),
                    message,
                });
            }
            state.note_once(Note::warning(Some(name), message));
            return Ok(Vec::new());
        };

        let requires = self
            .fetcher
            .fetch_requires(name, version)
            .await
            .map_err(|e| {
                self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
                ResolveError::Fetch {
                    name: name.to_string(),
                    message: e.to_string(),
                }
            })?;

        let artifact = selection.artifact;
        let package = ResolvedPackage::new(
            releases.name.clone(),
            version,
            ArtifactRef {
                url: artifact.url.clone(),
                filename: artifact.filename.clone(),
                size: artifact.size,
                sha256: artifact.sha256.clone(),
            },
            Origin::Registry,
        );
        debug!(package = %name, version = %version, artifact = %artifact.filename, "selected");
        state.replace(package);

        Ok(child_requirements(&requires, &spec.extras))
    }

    async fn visit_source(
        &self,
        spec: &RequirementSpec,
        reference: &SourceReference,
        state: &mut ResolutionState,
    ) -> Result<Vec<RequirementSpec>, ResolveError> {
        let failure = |message: String| ResolveError::SourceControl {
            reference: reference.to_string(),
            message,
        };

        if self.config.platform.is_sandboxed() {
            return Err(failure(format!(
                "installing packages from GitHub is not supported on {}, they must be built from source",
                self.config.platform
            )));
        }
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| failure("no GitHub client configured".to_string()))?;

        self.stats.sources_fetched.fetch_add(1, Ordering::Relaxed);
        let metadata = source.fetch_source(reference).await.map_err(|e| {
            self.stats.requests_failed.fetch_add(1, Ordering::Relaxed);
            failure(e.to_string())
        })?;

        if !spec.name.is_empty() && canonical_name(&spec.name) != canonical_name(&metadata.name) {
            debug!(
                requested = %spec.name,
                declared = %metadata.name,
                "repository declares a different package name"
            );
        }

        let package = ResolvedPackage::new(
            metadata.name.clone(),
            metadata.version.clone(),
            ArtifactRef {
                url: metadata.url.clone(),
                filename: metadata.filename.clone(),
                size: None,
                sha256: None,
            },
            Origin::SourceControl,
        );
        info!(package = %metadata.name, version = %metadata.version, repository = %reference, "resolved from GitHub");
        state.replace(package);

        Ok(child_requirements(&metadata.requires, &spec.extras))
    }
}

fn log_fatal(err: &ResolveError) {
    error!(package = err.package().unwrap_or_default(), "ERROR: {err}");
    if let Some(hint) = err.hint() {
        error!(package = err.package().unwrap_or_default(), "ERROR: {hint}");
    }
}

/// Parse the dependency strings of a package, keeping those the requested
/// extras select. Children never inherit extras.
fn child_requirements(requires: &[String], extras: &[String]) -> Vec<RequirementSpec> {
    requires
        .iter()
        .filter_map(|raw| match RequirementSpec::parse(raw) {
            Ok(spec) => Some(spec),
            Err(e) => {
                debug!(requirement = %raw, error = %e, "skipping unparsable dependency");
                None
            }
        })
        .filter(|child| dependency_applies(child.marker.as_deref(), extras))
        .map(|mut child| {
            child.extras.clear();
            child
        })
        .collect()
}

//! Resolve command implementation.

use crate::output;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use tandem_config::ConfigLoader;
use tandem_core::{Error, Platform, RuntimeVersion};
use tandem_lockfile::{LockSnapshot, environment_diff};
use tandem_repository::{
    GitHubClient, GitHubConfig, HttpClientConfig, MappingClient, PyPiClient, PyPiConfig,
};
use tandem_resolver::{
    ConstraintOptions, NameMapping, NoteLevel, RequirementSpec, ResolutionState, Resolver,
    ResolverConfig,
};
use tracing::{debug, info};

/// Arguments for the resolve command.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Requirements, e.g. `requests>=2.31` or `git+https://github.com/owner/repo@v1.0`
    #[arg(required = true, value_name = "SPEC")]
    pub specs: Vec<String>,

    /// Target platform [default: configured platform]
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Option<Platform>,

    /// Python version wheels must run on [default: locked python]
    #[arg(long, value_name = "VERSION")]
    pub python: Option<RuntimeVersion>,

    /// Lock snapshot to resolve on top of
    #[arg(long, value_name = "FILE")]
    pub lock: Option<PathBuf>,

    /// Write the new snapshot to FILE instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

fn runtime_for(requested: Option<RuntimeVersion>, lock: &LockSnapshot) -> RuntimeVersion {
    requested
        .or_else(|| {
            lock.conda_package("python")
                .and_then(|(_, python)| RuntimeVersion::parse(&python.version))
        })
        .unwrap_or_else(|| ResolverConfig::default().runtime)
}

/// Run the resolve command.
pub async fn run(args: ResolveArgs, quiet: bool) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = ConfigLoader::new(&cwd)?.resolve()?;
    let platform = args.platform.unwrap_or(config.platform);

    let lock = match &args.lock {
        Some(path) => LockSnapshot::read(path).map_err(Error::from)?,
        None => LockSnapshot::new(platform),
    };
    let runtime = runtime_for(args.python, &lock);
    debug!(%platform, %runtime, locked = lock.len(), "resolving");

    let http = HttpClientConfig::from_settings(
        config.http.timeout_secs,
        config.http.connect_timeout_secs,
        config.http.max_retries,
        config.http.rate_limit_per_host,
    );
    let mut pypi_config = PyPiConfig::new(&config.pypi_url).map_err(Error::from)?;
    pypi_config.http_config = http.clone();
    let pypi = Arc::new(PyPiClient::with_config(pypi_config).map_err(Error::from)?);

    let github_config =
        GitHubConfig::new(&config.github_api_url, config.github_token.clone()).map_err(Error::from)?;
    let github = Arc::new(GitHubClient::with_config(github_config).map_err(Error::from)?);

    // Only a conda environment needs the name table.
    let mapping = NameMapping::new();
    if !lock.packages.is_empty() {
        let source = MappingClient::new(&config.mapping_url, http).map_err(Error::from)?;
        mapping.populate(&source).await;
    }
    let owned: Vec<String> = lock
        .packages
        .values()
        .flat_map(|p| [p.name.clone(), mapping.secondary_name(&p.name)])
        .collect();

    let roots = args
        .specs
        .iter()
        .map(|s| RequirementSpec::parse(s))
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)?;

    let resolver = Resolver::new(
        pypi,
        ResolverConfig {
            runtime,
            platform,
            allow_source_fallback: config.allow_source_fallback,
            constraint_options: ConstraintOptions {
                allow_not_equal: config.allow_not_equal,
            },
        },
    )
    .with_source_fetcher(github);

    let state = ResolutionState::new(owned, lock.pip_resolved());
    let resolution = resolver.resolve(&roots, state).await.map_err(Error::from)?;

    // Warnings already reach stderr through the log subscriber.
    if !quiet {
        for note in resolution.notes.iter().filter(|n| n.level == NoteLevel::Info) {
            output::note(note);
        }
    }

    let mut next = lock.clone();
    next.platform = platform;
    next.set_pip_packages(resolution.packages.values());
    next.validate().map_err(Error::from)?;

    match &args.output {
        Some(path) => {
            next.write(path).map_err(Error::from)?;
            info!(path = %path.display(), packages = next.pip_packages.len(), "lock snapshot written");
            if !quiet {
                eprint!("{}", environment_diff(&lock, &next, output::colors_enabled()));
            }
        }
        None => println!("{}", next.to_json().map_err(Error::from)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_test_utils::fixtures::Fixtures;

    #[test]
    fn runtime_prefers_flag_then_lock() {
        let lock = Fixtures::python_env();
        assert_eq!(
            runtime_for(Some(RuntimeVersion::new(3, 12, 0)), &lock),
            RuntimeVersion::new(3, 12, 0)
        );
        assert_eq!(runtime_for(None, &lock), RuntimeVersion::new(3, 13, 1));
        assert_eq!(
            runtime_for(None, &LockSnapshot::default()),
            ResolverConfig::default().runtime
        );
    }
}

//! Artifact selection for a chosen release.

use crate::fetcher::{Artifact, Candidate};
use crate::tags::{platform_tag_compatible, python_tags_compatible};
use tandem_core::{Platform, RuntimeVersion};

/// The artifact picked for a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
    /// Version of the release.
    pub version: &'a str,
    /// The chosen file.
    pub artifact: &'a Artifact,
}

/// Whether a wheel artifact can be installed for `runtime` on `platform`.
#[must_use]
pub fn wheel_compatible(artifact: &Artifact, runtime: RuntimeVersion, platform: Platform) -> bool {
    let Some(wheel) = &artifact.wheel else {
        return false;
    };
    wheel
        .platform_tags
        .iter()
        .any(|tag| platform_tag_compatible(tag, platform))
        && python_tags_compatible(&wheel.python_tags, &wheel.abi_tags, runtime)
}

/// Pick the first compatible wheel of `candidate`, in declaration order.
///
/// When no wheel fits and `allow_source_fallback` is set, the first source
/// distribution is taken instead, except on sandboxed targets which cannot
/// build anything.
#[must_use]
pub fn select_artifact(
    candidate: &Candidate,
    runtime: RuntimeVersion,
    platform: Platform,
    allow_source_fallback: bool,
) -> Option<Selection<'_>> {
    let wheel = candidate
        .artifacts
        .iter()
        .find(|a| wheel_compatible(a, runtime, platform));

    let artifact = wheel.or_else(|| {
        (allow_source_fallback && !platform.is_sandboxed())
            .then(|| candidate.artifacts.iter().find(|a| a.is_sdist()))
            .flatten()
    })?;

    Some(Selection {
        version: &candidate.version,
        artifact,
    })
}

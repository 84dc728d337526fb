//! Requirement strings.
//!
//! Accepted forms:
//!
//! ```text
//! name
//! name[extra1, extra2] >=1.0,<2.0 ; python_version >= "3.8"
//! git+https://github.com/owner/repo[.git][@ref]
//! name @ git+https://github.com/owner/repo@ref
//! ```

use crate::error::ResolveError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use tandem_core::canonical_name;

static REGISTRY_REQUIREMENT: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^([A-Za-z0-9][A-Za-z0-9._-]*)\s*(?:\[([^\]]*)\])?\s*(.*)$").unwrap()
});

static GITHUB_URL: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^git\+https://github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+?)(?:\.git)?(?:@([^#\s]+))?(?:#.*)?$")
        .unwrap()
});

static EXTRA_MARKER: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r#"extra\s*==\s*["']([^"']+)["']"#).unwrap()
});

/// A repository reference on GitHub.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceReference {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Branch, tag or commit; the default branch when absent.
    pub reference: Option<String>,
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(reference) = &self.reference {
            write!(f, "@{reference}")?;
        }
        Ok(())
    }
}

/// Where a requirement is resolved from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum RequirementSource {
    /// A package index, by name and version.
    #[default]
    Registry,
    /// A source-control repository.
    SourceControl(SourceReference),
}

/// A single declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequirementSpec {
    /// Package name as written. Empty for a source-control requirement whose
    /// name is only known after fetching its metadata.
    pub name: String,
    /// Constraint expression; `None` means any version.
    pub constraint: Option<String>,
    /// Requested extras.
    pub extras: Vec<String>,
    /// Environment marker text after `;`, verbatim.
    pub marker: Option<String>,
    /// Resolution source.
    pub source: RequirementSource,
}

impl RequirementSpec {
    /// A registry requirement without extras or marker.
    #[must_use]
    pub fn registry(name: impl Into<String>, constraint: Option<String>) -> Self {
        Self {
            name: name.into(),
            constraint,
            extras: Vec::new(),
            marker: None,
            source: RequirementSource::Registry,
        }
    }

    /// Parse a requirement string.
    ///
    /// # Errors
    /// Returns [`ResolveError::InvalidRequirement`] when no package name can
    /// be read, or for direct URLs other than GitHub repositories.
    pub fn parse(text: &str) -> Result<Self, ResolveError> {
        let trimmed = text.trim();
        let invalid = |message: &str| ResolveError::InvalidRequirement {
            requirement: trimmed.to_string(),
            message: message.to_string(),
        };

        let (body, marker) = match trimmed.split_once(';') {
            Some((body, marker)) => (body.trim(), Some(marker.trim().to_string())),
            None => (trimmed, None),
        };
        if body.is_empty() {
            return Err(invalid("missing package name"));
        }

        if body.starts_with("git+") {
            let source = parse_source_url(body).ok_or_else(|| invalid("unsupported source URL"))?;
            return Ok(Self {
                name: String::new(),
                constraint: None,
                extras: Vec::new(),
                marker,
                source,
            });
        }

        if let Some((name, url)) = body.split_once(" @ ") {
            let source = parse_source_url(url.trim())
                .ok_or_else(|| invalid("only git+https://github.com URLs are supported"))?;
            let mut spec = Self::parse(name)?;
            spec.marker = marker;
            spec.source = source;
            return Ok(spec);
        }

        let caps = REGISTRY_REQUIREMENT
            .captures(body)
            .ok_or_else(|| invalid("missing package name"))?;
        let name = caps.get(1).map_or("", |m| m.as_str()).trim_end_matches('.');
        let extras = caps
            .get(2)
            .map(|m| {
                m.as_str()
                    .split(',')
                    .map(str::trim)
                    .filter(|e| !e.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let rest = caps.get(3).map_or("", |m| m.as_str());
        let constraint = rest
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')')
            .trim();

        if constraint.starts_with('[') {
            return Err(invalid("unterminated extras"));
        }

        Ok(Self {
            name: name.to_string(),
            constraint: (!constraint.is_empty()).then(|| constraint.to_string()),
            extras,
            marker,
            source: RequirementSource::Registry,
        })
    }

    /// Canonical form of the name, used for lookups.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        canonical_name(&self.name)
    }

    /// Whether this requirement comes from source control.
    #[must_use]
    pub const fn is_source_control(&self) -> bool {
        matches!(self.source, RequirementSource::SourceControl(_))
    }

    /// Name followed by constraint, as shown in diagnostics.
    #[must_use]
    pub fn display_spec(&self) -> String {
        format!("{}{}", self.name, self.constraint.as_deref().unwrap_or(""))
    }
}

impl fmt::Display for RequirementSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            RequirementSource::SourceControl(reference) if self.name.is_empty() => {
                write!(f, "git+https://github.com/{reference}")
            }
            RequirementSource::SourceControl(reference) => {
                write!(f, "{} @ git+https://github.com/{reference}", self.name)
            }
            RequirementSource::Registry => {
                f.write_str(&self.name)?;
                if !self.extras.is_empty() {
                    write!(f, "[{}]", self.extras.join(","))?;
                }
                if let Some(constraint) = &self.constraint {
                    f.write_str(constraint)?;
                }
                Ok(())
            }
        }
    }
}

fn parse_source_url(url: &str) -> Option<RequirementSource> {
    let caps = GITHUB_URL.captures(url)?;
    Some(RequirementSource::SourceControl(SourceReference {
        owner: caps.get(1)?.as_str().to_string(),
        repo: caps.get(2)?.as_str().to_string(),
        reference: caps.get(3).map(|m| m.as_str().to_string()),
    }))
}

/// Whether a declared dependency should be followed given the extras
/// requested on its dependant.
///
/// A dependency without a marker is always followed. A dependency with a
/// marker is followed only when the marker names one of `extras` in an
/// `extra == "..."` clause.
#[must_use]
pub fn dependency_applies(marker: Option<&str>, extras: &[String]) -> bool {
    let Some(marker) = marker.map(str::trim).filter(|m| !m.is_empty()) else {
        return true;
    };
    if extras.is_empty() {
        return false;
    }
    EXTRA_MARKER.captures_iter(marker).any(|caps| {
        let named = canonical_name(&caps[1]);
        extras.iter().any(|e| canonical_name(e) == named)
    })
}

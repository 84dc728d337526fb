//! Package name helpers.

use once_cell::sync::Lazy;
use regex::Regex;

static SPEC_NAME: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^([a-zA-Z0-9_.-]+)").unwrap()
});

/// Canonical form of a package name used for lookups.
///
/// Names are compared case-insensitively and runs of `-`, `_` and `.` are
/// equivalent, so `Foo_Bar`, `foo.bar` and `foo--bar` all map to `foo-bar`.
#[must_use]
pub fn canonical_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !in_separator {
                out.push('-');
            }
            in_separator = true;
        } else {
            out.push(c.to_ascii_lowercase());
            in_separator = false;
        }
    }
    out
}

/// Leading package name of a spec such as `numpy>=1.26` or `python=3.11`.
#[must_use]
pub fn package_name_from_spec(spec: &str) -> Option<&str> {
    SPEC_NAME
        .captures(spec.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches('.'))
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_separators_and_case() {
        assert_eq!(canonical_name("Foo_Bar"), "foo-bar");
        assert_eq!(canonical_name("foo.bar"), "foo-bar");
        assert_eq!(canonical_name("foo--_bar"), "foo-bar");
        assert_eq!(canonical_name("python-dateutil"), "python-dateutil");
    }

    #[test]
    fn extracts_name_from_spec() {
        assert_eq!(package_name_from_spec("numpy>=1.26"), Some("numpy"));
        assert_eq!(package_name_from_spec("python=3.11"), Some("python"));
        assert_eq!(package_name_from_spec(" zope.interface ==6"), Some("zope.interface"));
        assert_eq!(package_name_from_spec("scikit-learn"), Some("scikit-learn"));
        assert_eq!(package_name_from_spec(">=1.0"), None);
    }
}

//! Snapshot reconciliation.
//!
//! Two snapshots are compared per ecosystem by package identity: name,
//! version and build discriminator. A package whose version or build changed
//! shows up twice, once as removed (old identity) and once as added (new
//! identity). Installers rely on this to remove stale artifacts before
//! installing their replacements.

use crate::types::{CondaPackage, LockSnapshot, PipPackage};
use ahash::AHashMap;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fmt;
use tandem_core::canonical_name;

/// A locked package as seen by the diff.
pub trait LockEntry: Clone + Send + Sync {
    /// Package name.
    fn name(&self) -> &str;

    /// Version.
    fn version(&self) -> &str;

    /// Build string, when the ecosystem has one.
    fn build(&self) -> Option<&str>;

    /// Channel or registry label.
    fn channel(&self) -> String;

    /// Render-ready view of the entry.
    fn view(&self) -> EntryView {
        EntryView {
            version: self.version().to_string(),
            build: self.build().filter(|b| !b.is_empty()).map(str::to_string),
            channel: self.channel(),
        }
    }
}

impl LockEntry for CondaPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn build(&self) -> Option<&str> {
        Some(&self.build)
    }

    fn channel(&self) -> String {
        self.channel.clone().unwrap_or_default()
    }
}

impl LockEntry for PipPackage {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn build(&self) -> Option<&str> {
        None
    }

    fn channel(&self) -> String {
        self.registry.to_string()
    }
}

/// Whether two entries denote the same installed artifact.
///
/// Without a build string the snapshot key (artifact filename) stands in
/// as the build discriminator.
fn same_identity<T: LockEntry>(old_key: &str, old: &T, new_key: &str, new: &T) -> bool {
    let discriminator = |key: &str, entry: &T| {
        entry
            .build()
            .filter(|b| !b.is_empty())
            .map_or_else(|| key.to_string(), str::to_string)
    };
    old.version() == new.version() && discriminator(old_key, old) == discriminator(new_key, new)
}

/// Added and removed entries of one ecosystem, keyed by snapshot key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcosystemDiff<T> {
    /// Entries with a new identity.
    pub added: BTreeMap<String, T>,
    /// Entries whose identity is gone.
    pub removed: BTreeMap<String, T>,
}

impl<T> Default for EcosystemDiff<T> {
    fn default() -> Self {
        Self {
            added: BTreeMap::new(),
            removed: BTreeMap::new(),
        }
    }
}

impl<T> EcosystemDiff<T> {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Diff one ecosystem's package maps.
#[must_use]
pub fn diff_entries<T: LockEntry>(
    old: &BTreeMap<String, T>,
    new: &BTreeMap<String, T>,
) -> EcosystemDiff<T> {
    let by_name = |map: &BTreeMap<String, T>| -> AHashMap<String, (String, T)> {
        map.iter()
            .map(|(k, p)| (canonical_name(p.name()), (k.clone(), p.clone())))
            .collect()
    };
    let old_by_name = by_name(old);
    let new_by_name = by_name(new);

    let changed = |key: &str, entry: &T, other: &AHashMap<String, (String, T)>| {
        !other
            .get(&canonical_name(entry.name()))
            .is_some_and(|(other_key, other_entry)| same_identity(key, entry, other_key, other_entry))
    };

    let removed = old
        .par_iter()
        .filter(|(key, entry)| changed(key, entry, &new_by_name))
        .map(|(key, entry)| (key.clone(), entry.clone()))
        .collect();
    let added = new
        .par_iter()
        .filter(|(key, entry)| changed(key, entry, &old_by_name))
        .map(|(key, entry)| (key.clone(), entry.clone()))
        .collect();

    EcosystemDiff { added, removed }
}

/// Per-ecosystem diff of two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotDiff {
    /// Conda packages.
    pub conda: EcosystemDiff<CondaPackage>,
    /// Pip packages.
    pub pip: EcosystemDiff<PipPackage>,
}

/// Compute the diff between two snapshots.
#[must_use]
pub fn diff(old: &LockSnapshot, new: &LockSnapshot) -> SnapshotDiff {
    let (conda, pip) = rayon::join(
        || diff_entries(&old.packages, &new.packages),
        || diff_entries(&old.pip_packages, &new.pip_packages),
    );
    SnapshotDiff { conda, pip }
}

/// Columns shown for one side of a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    /// Version.
    pub version: String,
    /// Build string.
    pub build: Option<String>,
    /// Channel or registry.
    pub channel: String,
}

/// Kind of a rendered change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Only in the new snapshot.
    Added,
    /// In both, with a different identity.
    Changed,
    /// Only in the old snapshot.
    Removed,
}

/// One package-level change, ecosystems merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageChange {
    /// Package name.
    pub name: String,
    /// Change kind.
    pub kind: ChangeKind,
    /// Old side.
    pub old: Option<EntryView>,
    /// New side.
    pub new: Option<EntryView>,
}

impl fmt::Display for PackageChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.old, &self.new) {
            (Some(old), Some(new)) => {
                write!(f, "~ {}: {} -> {}", self.name, old.version, new.version)
            }
            (None, Some(new)) => write!(f, "+ {}: {}", self.name, new.version),
            (Some(old), None) => write!(f, "- {}: {}", self.name, old.version),
            (None, None) => write!(f, "  {}", self.name),
        }
    }
}

impl SnapshotDiff {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conda.is_empty() && self.pip.is_empty()
    }

    /// Merge both ecosystems into name-level changes.
    ///
    /// Added and changed packages come first, sorted by name, then removed
    /// packages sorted by name. A package that moved between ecosystems is a
    /// single change.
    #[must_use]
    pub fn changes(&self) -> Vec<PackageChange> {
        let mut added: BTreeMap<String, (String, EntryView)> = BTreeMap::new();
        let mut removed: BTreeMap<String, (String, EntryView)> = BTreeMap::new();
        collect_views(&self.conda.added, &mut added);
        collect_views(&self.pip.added, &mut added);
        collect_views(&self.conda.removed, &mut removed);
        collect_views(&self.pip.removed, &mut removed);

        let mut changes: Vec<PackageChange> = added
            .iter()
            .map(|(key, (name, view))| match removed.get(key) {
                Some((_, old)) => PackageChange {
                    name: name.clone(),
                    kind: ChangeKind::Changed,
                    old: Some(old.clone()),
                    new: Some(view.clone()),
                },
                None => PackageChange {
                    name: name.clone(),
                    kind: ChangeKind::Added,
                    old: None,
                    new: Some(view.clone()),
                },
            })
            .collect();

        changes.extend(
            removed
                .into_iter()
                .filter(|(key, _)| !added.contains_key(key))
                .map(|(_, (name, view))| PackageChange {
                    name,
                    kind: ChangeKind::Removed,
                    old: Some(view),
                    new: None,
                }),
        );
        changes
    }

    /// One-line summary of the changes.
    #[must_use]
    pub fn summary(&self) -> String {
        let changes = self.changes();
        if changes.is_empty() {
            return "No changes".to_string();
        }
        let count = |kind: ChangeKind| changes.iter().filter(|c| c.kind == kind).count();
        [
            (count(ChangeKind::Added), "added"),
            (count(ChangeKind::Changed), "changed"),
            (count(ChangeKind::Removed), "removed"),
        ]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, label)| format!("{n} {label}"))
        .collect::<Vec<_>>()
        .join(", ")
    }
}

fn collect_views<T: LockEntry>(
    entries: &BTreeMap<String, T>,
    out: &mut BTreeMap<String, (String, EntryView)>,
) {
    for entry in entries.values() {
        out.insert(
            canonical_name(entry.name()),
            (entry.name().to_string(), entry.view()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tandem_core::Origin;

    fn pip(name: &str, version: &str) -> (String, PipPackage) {
        (
            format!("{name}-{version}-py3-none-any.whl"),
            PipPackage {
                name: name.to_string(),
                version: version.to_string(),
                url: format!("https://files/{name}-{version}-py3-none-any.whl"),
                registry: Origin::Registry,
                hash: None,
                size: None,
            },
        )
    }

    fn conda(name: &str, version: &str, build: &str) -> (String, CondaPackage) {
        (
            format!("{name}-{version}-{build}.conda"),
            CondaPackage::new(name, version, build).with_channel("conda-forge"),
        )
    }

    fn snapshot(conda_pkgs: &[(&str, &str, &str)], pip_pkgs: &[(&str, &str)]) -> LockSnapshot {
        let mut s = LockSnapshot::default();
        s.packages = conda_pkgs.iter().map(|(n, v, b)| conda(n, v, b)).collect();
        s.pip_packages = pip_pkgs.iter().map(|(n, v)| pip(n, v)).collect();
        s
    }

    #[test]
    fn identical_snapshots_have_no_diff() {
        let s = snapshot(&[("python", "3.13.1", "h_0")], &[("six", "1.16.0")]);
        let d = diff(&s, &s);
        assert!(d.is_empty());
        assert!(d.changes().is_empty());
        assert_eq!(d.summary(), "No changes");
    }

    #[test]
    fn version_change_counts_both_ways() {
        let old = snapshot(&[], &[("six", "1.15.0"), ("idna", "3.7")]);
        let new = snapshot(&[], &[("six", "1.16.0"), ("idna", "3.7")]);
        let d = diff(&old, &new);

        assert_eq!(d.pip.removed.keys().collect::<Vec<_>>(), vec!["six-1.15.0-py3-none-any.whl"]);
        assert_eq!(d.pip.added.keys().collect::<Vec<_>>(), vec!["six-1.16.0-py3-none-any.whl"]);
        assert!(d.conda.is_empty());

        let changes = d.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Changed);
        assert_eq!(changes[0].to_string(), "~ six: 1.15.0 -> 1.16.0");
    }

    #[test]
    fn build_change_is_an_identity_change() {
        let old = snapshot(&[("numpy", "2.0.0", "py313h_0")], &[]);
        let new = snapshot(&[("numpy", "2.0.0", "py313h_1")], &[]);
        let d = diff(&old, &new);
        assert_eq!(d.conda.added.len(), 1);
        assert_eq!(d.conda.removed.len(), 1);
    }

    #[test]
    fn move_between_ecosystems_is_one_change() {
        let old = snapshot(&[], &[("numpy", "1.26.4")]);
        let new = snapshot(&[("numpy", "2.0.0", "py313h_0")], &[]);
        let changes = diff(&old, &new).changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Changed);
        assert_eq!(changes[0].old.as_ref().unwrap().channel, "PyPi");
        assert_eq!(changes[0].new.as_ref().unwrap().channel, "conda-forge");
    }

    #[test]
    fn ordering_added_then_removed() {
        let old = snapshot(&[("zlib", "1.3", "h_0")], &[("attrs", "23.1.0")]);
        let new = snapshot(&[("bzip2", "1.0.8", "h_0")], &[("wheel", "0.43.0")]);
        let d = diff(&old, &new);
        let names: Vec<_> = d.changes().into_iter().map(|c| (c.name, c.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("bzip2".to_string(), ChangeKind::Added),
                ("wheel".to_string(), ChangeKind::Added),
                ("attrs".to_string(), ChangeKind::Removed),
                ("zlib".to_string(), ChangeKind::Removed),
            ]
        );
        assert_eq!(d.summary(), "2 added, 2 removed");
    }
}

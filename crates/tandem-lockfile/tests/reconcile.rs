//! Snapshot reconciliation properties.

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tandem_lockfile::{ChangeKind, LockSnapshot, NOTHING_CHANGED, diff, environment_diff};
use tandem_test_utils::fixtures::Fixtures;
use tandem_test_utils::proptest_strategies::snapshot_strategy;

proptest! {
    #[test]
    fn self_diff_is_empty(snapshot in snapshot_strategy()) {
        let d = diff(&snapshot, &snapshot);
        prop_assert!(d.is_empty());
        prop_assert_eq!(environment_diff(&snapshot, &snapshot, false), format!("{NOTHING_CHANGED}\n"));
    }

    #[test]
    fn diff_against_empty_adds_everything(snapshot in snapshot_strategy()) {
        let empty = LockSnapshot::default();
        let d = diff(&empty, &snapshot);
        prop_assert_eq!(d.conda.added.len(), snapshot.packages.len());
        prop_assert_eq!(d.pip.added.len(), snapshot.pip_packages.len());
        prop_assert!(d.conda.removed.is_empty() && d.pip.removed.is_empty());

        let back = diff(&snapshot, &empty);
        prop_assert_eq!(back.pip.removed.len(), snapshot.pip_packages.len());
    }
}

#[test]
fn single_upgrade_reports_both_identities() {
    let old = Fixtures::snapshot(
        &[("python", "3.13.1", "h_1_cpython")],
        &[("six", "1.15.0"), ("idna", "3.7")],
    );
    let new = Fixtures::snapshot(
        &[("python", "3.13.1", "h_1_cpython")],
        &[("six", "1.16.0"), ("idna", "3.7")],
    );

    let d = diff(&old, &new);
    assert_eq!(d.pip.added.len(), 1);
    assert_eq!(d.pip.removed.len(), 1);
    assert_eq!(d.pip.added.values().next().unwrap().version, "1.16.0");
    assert_eq!(d.pip.removed.values().next().unwrap().version, "1.15.0");

    let changes = d.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Changed);
}

#[test]
fn snapshot_file_diff() {
    let dir = tempfile::tempdir().unwrap();
    let old_path = dir.path().join("old.json");
    let new_path = dir.path().join("new.json");
    Fixtures::python_env().write(&old_path).unwrap();
    Fixtures::snapshot(&[("python", "3.13.1", "h_1_cpython")], &[("six", "1.16.0")])
        .write(&new_path)
        .unwrap();

    let old = LockSnapshot::read(&old_path).unwrap();
    let new = LockSnapshot::read(&new_path).unwrap();
    let rendered = environment_diff(&old, &new, false);
    assert!(rendered.contains("+ six"));
    assert!(rendered.contains("- pip"));
    assert!(rendered.contains("- libffi"));
    assert!(!rendered.contains("python "));
}

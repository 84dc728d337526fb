//! Proptest strategies for tandem types.

use crate::fixtures::Fixtures;
use proptest::prelude::*;
use tandem_lockfile::LockSnapshot;

/// Strategy for package names.
pub fn package_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{1,12}(-[a-z0-9]{1,6})?"
}

/// Strategy for plain release versions.
pub fn release_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(0u32..30, 1..=4).prop_map(|parts| {
        parts
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(".")
    })
}

/// Strategy for versions with optional pre-release and post-release tags.
pub fn version_strategy() -> impl Strategy<Value = String> {
    let suffix = prop_oneof![
        4 => Just(String::new()),
        1 => (1u32..5).prop_map(|n| format!("a{n}")),
        1 => (1u32..5).prop_map(|n| format!("b{n}")),
        1 => (1u32..5).prop_map(|n| format!("rc{n}")),
        1 => (1u32..5).prop_map(|n| format!(".post{n}")),
    ];
    (release_strategy(), suffix).prop_map(|(release, suffix)| format!("{release}{suffix}"))
}

/// Strategy for small snapshots with distinct names across ecosystems.
pub fn snapshot_strategy() -> impl Strategy<Value = LockSnapshot> {
    prop::collection::btree_map(package_name_strategy(), (release_strategy(), any::<bool>()), 0..8)
        .prop_map(|entries| {
            let mut conda = Vec::new();
            let mut pip = Vec::new();
            for (name, (version, is_conda)) in &entries {
                if *is_conda {
                    conda.push((name.clone(), version.clone()));
                } else {
                    pip.push((name.clone(), version.clone()));
                }
            }
            let conda: Vec<(&str, &str, &str)> = conda
                .iter()
                .map(|(n, v)| (n.as_str(), v.as_str(), "h_0"))
                .collect();
            let pip: Vec<(&str, &str)> = pip.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect();
            Fixtures::snapshot(&conda, &pip)
        })
}

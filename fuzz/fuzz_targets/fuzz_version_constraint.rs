#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use std::cmp::Ordering;
use tandem_resolver::{Constraint, ConstraintOptions, Version, compare, select_best};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    constraint: &'a str,
    versions: Vec<&'a str>,
    allow_not_equal: bool,
}

fuzz_target!(|input: Input<'_>| {
    // Ordering must be total and antisymmetric for any strings
    for a in &input.versions {
        assert_eq!(compare(a, a), Ordering::Equal);
        for b in &input.versions {
            assert_eq!(compare(a, b), compare(b, a).reverse(), "{a} vs {b}");
        }
        let _ = Version::parse(a).normalized();
    }

    let options = ConstraintOptions {
        allow_not_equal: input.allow_not_equal,
    };
    let Ok(constraint) = Constraint::parse(input.constraint, options) else {
        return;
    };
    let _ = constraint.to_string();

    for version in &input.versions {
        let _ = constraint.satisfies_str(version);
    }
    if let Some(best) = select_best(input.versions.iter().copied(), Some(&constraint)) {
        assert!(input.versions.contains(&best));
    }
});

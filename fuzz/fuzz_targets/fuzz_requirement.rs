#![no_main]

use libfuzzer_sys::fuzz_target;
use tandem_core::{canonical_name, package_name_from_spec};
use tandem_resolver::{RequirementSpec, dependency_applies};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(spec) = RequirementSpec::parse(text) {
        let _ = spec.display_spec();
        // Canonical names are idempotent
        let once = canonical_name(&spec.name);
        assert_eq!(canonical_name(&once), once);
    }

    let _ = dependency_applies(Some(text), &[]);
    let _ = dependency_applies(Some(text), &["test".to_string()]);
    let _ = package_name_from_spec(text);
});

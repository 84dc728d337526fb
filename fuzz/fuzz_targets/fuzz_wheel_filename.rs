#![no_main]

use libfuzzer_sys::fuzz_target;
use tandem_core::{Platform, RuntimeVersion};
use tandem_resolver::WheelFilename;
use tandem_resolver::tags::{platform_tag_compatible, python_tags_compatible};

fuzz_target!(|data: &[u8]| {
    let Ok(filename) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(wheel) = filename.parse::<WheelFilename>() else {
        return;
    };

    // Display reproduces a parseable name
    let rendered = wheel.to_string();
    assert!(rendered.parse::<WheelFilename>().is_ok(), "{rendered}");

    let runtime = RuntimeVersion::new(3, 13, 0);
    let _ = python_tags_compatible(&wheel.python_tags, &wheel.abi_tags, runtime);
    for platform in Platform::ALL {
        for tag in &wheel.platform_tags {
            let _ = platform_tag_compatible(tag, platform);
        }
    }
    let _ = wheel.is_pure();
});

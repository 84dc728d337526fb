//! Wheel tag compatibility.
//!
//! Each target platform maps to the set of wheel platform tags it can load.
//! Pure Python wheels (`any`) are accepted everywhere; the WebAssembly targets
//! accept nothing else.

use tandem_core::{Platform, RuntimeVersion};

const ANY: &str = "any";

/// Platform-specific wheel tags a target accepts, excluding `any`.
#[must_use]
pub const fn platform_tags(platform: Platform) -> &'static [&'static str] {
    match platform {
        Platform::Linux64 => &[
            "linux_x86_64",
            "manylinux1_x86_64",
            "manylinux2010_x86_64",
            "manylinux2014_x86_64",
            "manylinux_2_17_x86_64",
            "manylinux_2_24_x86_64",
            "manylinux_2_28_x86_64",
        ],
        Platform::Linux32 => &[
            "linux_i686",
            "manylinux1_i686",
            "manylinux2010_i686",
            "manylinux2014_i686",
        ],
        Platform::LinuxAarch64 => &[
            "linux_aarch64",
            "manylinux2014_aarch64",
            "manylinux_2_17_aarch64",
            "manylinux_2_24_aarch64",
            "manylinux_2_28_aarch64",
        ],
        Platform::LinuxArmv6l => &["linux_armv6l"],
        Platform::LinuxArmv7l => &["linux_armv7l"],
        Platform::LinuxPpc64le => &[
            "linux_ppc64le",
            "manylinux2014_ppc64le",
            "manylinux_2_17_ppc64le",
        ],
        Platform::LinuxPpc64 => &["linux_ppc64"],
        Platform::LinuxS390x => &["linux_s390x", "manylinux2014_s390x", "manylinux_2_17_s390x"],
        Platform::Osx64 => &[
            "macosx_10_6_x86_64",
            "macosx_10_9_x86_64",
            "macosx_10_12_x86_64",
            "macosx_10_13_x86_64",
            "macosx_10_14_x86_64",
            "macosx_10_15_x86_64",
            "macosx_11_0_x86_64",
            "macosx_12_0_x86_64",
        ],
        Platform::OsxArm64 => &[
            "macosx_11_0_arm64",
            "macosx_12_0_arm64",
            "macosx_13_0_arm64",
            "macosx_14_0_arm64",
        ],
        Platform::Win64 => &["win_amd64"],
        Platform::Win32 => &["win32"],
        Platform::WinArm64 => &["win_arm64"],
        Platform::EmscriptenWasm32 | Platform::WasiWasm32 | Platform::Noarch => &[],
    }
}

/// Every wheel platform tag a target accepts, `any` first.
#[must_use]
pub fn acceptable_platform_tags(platform: Platform) -> Vec<&'static str> {
    std::iter::once(ANY)
        .chain(platform_tags(platform).iter().copied())
        .collect()
}

/// Whether a single wheel platform tag is loadable on `platform`.
#[must_use]
pub fn platform_tag_compatible(tag: &str, platform: Platform) -> bool {
    tag == ANY || platform_tags(platform).contains(&tag)
}

/// Split `cp311` into (`cp`, `311`).
fn split_interpreter(tag: &str) -> (&str, &str) {
    let digits_at = tag.find(|c: char| c.is_ascii_digit()).unwrap_or(tag.len());
    tag.split_at(digits_at)
}

/// Whether one python tag runs on `runtime`.
///
/// `py` and `py3` match any runtime of that major; `py311` and `cp311` match
/// exactly 3.11; `cp3x` paired with the `abi3` ABI matches 3.x and newer.
/// Other interpreters never match.
#[must_use]
pub fn python_tag_compatible(python_tag: &str, abi_tag: &str, runtime: RuntimeVersion) -> bool {
    let (interpreter, digits) = split_interpreter(python_tag);
    if !matches!(interpreter, "py" | "cp") {
        return false;
    }
    if digits.is_empty() {
        return interpreter == "py";
    }

    let mut chars = digits.chars();
    let Some(major) = chars.next().and_then(|c| c.to_digit(10)) else {
        return false;
    };
    if major != runtime.major {
        return false;
    }
    let minor: &str = chars.as_str();
    if minor.is_empty() {
        return interpreter == "py";
    }
    let Ok(minor) = minor.parse::<u32>() else {
        return false;
    };

    if interpreter == "cp" && abi_tag == "abi3" {
        minor <= runtime.minor
    } else {
        minor == runtime.minor
    }
}

/// Whether any combination of the dot-separated python and abi tags runs on
/// `runtime`.
#[must_use]
pub fn python_tags_compatible<P, A>(python_tags: &[P], abi_tags: &[A], runtime: RuntimeVersion) -> bool
where
    P: AsRef<str>,
    A: AsRef<str>,
{
    python_tags.iter().any(|py| {
        abi_tags
            .iter()
            .any(|abi| python_tag_compatible(py.as_ref(), abi.as_ref(), runtime))
    })
}

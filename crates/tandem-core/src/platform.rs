//! Target platforms and runtime versions.
//!
//! Platform identifiers follow the conda subdir naming (`linux-64`, `osx-arm64`,
//! `emscripten-wasm32`, ...). They drive both the primary solve (as subdirs) and
//! wheel selection (as a table of acceptable wheel platform tags).

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    /// Linux on `x86_64`.
    #[serde(rename = "linux-64")]
    Linux64,
    /// Linux on i686.
    #[serde(rename = "linux-32")]
    Linux32,
    /// Linux on aarch64.
    #[serde(rename = "linux-aarch64")]
    LinuxAarch64,
    /// Linux on ARMv6.
    #[serde(rename = "linux-armv6l")]
    LinuxArmv6l,
    /// Linux on ARMv7.
    #[serde(rename = "linux-armv7l")]
    LinuxArmv7l,
    /// Linux on little-endian POWER.
    #[serde(rename = "linux-ppc64le")]
    LinuxPpc64le,
    /// Linux on big-endian POWER.
    #[serde(rename = "linux-ppc64")]
    LinuxPpc64,
    /// Linux on s390x.
    #[serde(rename = "linux-s390x")]
    LinuxS390x,
    /// macOS on Intel.
    #[serde(rename = "osx-64")]
    Osx64,
    /// macOS on Apple silicon.
    #[serde(rename = "osx-arm64")]
    OsxArm64,
    /// Windows on x64.
    #[serde(rename = "win-64")]
    Win64,
    /// Windows on x86.
    #[serde(rename = "win-32")]
    Win32,
    /// Windows on ARM64.
    #[serde(rename = "win-arm64")]
    WinArm64,
    /// Emscripten WebAssembly (browser kernels).
    #[default]
    #[serde(rename = "emscripten-wasm32")]
    EmscriptenWasm32,
    /// WASI WebAssembly.
    #[serde(rename = "wasi-wasm32")]
    WasiWasm32,
    /// Architecture independent packages.
    #[serde(rename = "noarch")]
    Noarch,
}

impl Platform {
    /// Every known platform.
    pub const ALL: [Self; 16] = [
        Self::Linux64,
        Self::Linux32,
        Self::LinuxAarch64,
        Self::LinuxArmv6l,
        Self::LinuxArmv7l,
        Self::LinuxPpc64le,
        Self::LinuxPpc64,
        Self::LinuxS390x,
        Self::Osx64,
        Self::OsxArm64,
        Self::Win64,
        Self::Win32,
        Self::WinArm64,
        Self::EmscriptenWasm32,
        Self::WasiWasm32,
        Self::Noarch,
    ];

    /// Subdir name of the platform.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Linux64 => "linux-64",
            Self::Linux32 => "linux-32",
            Self::LinuxAarch64 => "linux-aarch64",
            Self::LinuxArmv6l => "linux-armv6l",
            Self::LinuxArmv7l => "linux-armv7l",
            Self::LinuxPpc64le => "linux-ppc64le",
            Self::LinuxPpc64 => "linux-ppc64",
            Self::LinuxS390x => "linux-s390x",
            Self::Osx64 => "osx-64",
            Self::OsxArm64 => "osx-arm64",
            Self::Win64 => "win-64",
            Self::Win32 => "win-32",
            Self::WinArm64 => "win-arm64",
            Self::EmscriptenWasm32 => "emscripten-wasm32",
            Self::WasiWasm32 => "wasi-wasm32",
            Self::Noarch => "noarch",
        }
    }

    /// Whether the platform cannot build native code.
    ///
    /// Sandboxed platforms only accept pure wheels: no source distributions and
    /// no source-control installs.
    #[must_use]
    pub const fn is_sandboxed(&self) -> bool {
        matches!(self, Self::EmscriptenWasm32 | Self::WasiWasm32)
    }

    /// Subdirs requested from the primary solver for this target.
    #[must_use]
    pub fn solve_subdirs(&self) -> Vec<String> {
        if *self == Self::Noarch {
            return vec![Self::Noarch.as_str().to_string()];
        }
        vec![Self::Noarch.as_str().to_string(), self.as_str().to_string()]
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::unsupported_platform(format!("unknown platform '{s}'")))
    }
}

/// Version triple of the Python runtime wheels are selected for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RuntimeVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl RuntimeVersion {
    /// Create a runtime version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a version such as `3.13.1` or `3.12`.
    ///
    /// Non-numeric suffixes on a component (`0rc1`) are ignored. Returns `None`
    /// when the major component is missing.
    #[must_use]
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.trim().split('.').map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u32>().ok()
        });
        let major = parts.next().flatten()?;
        let minor = parts.next().flatten().unwrap_or(0);
        let patch = parts.next().flatten().unwrap_or(0);
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for RuntimeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for RuntimeVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            Error::config(
                format!("invalid Python version '{s}'"),
                Some("python".to_string()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("linux-64", Platform::Linux64)]
    #[test_case("osx-arm64", Platform::OsxArm64)]
    #[test_case("Win-64", Platform::Win64)]
    #[test_case(" emscripten-wasm32 ", Platform::EmscriptenWasm32)]
    fn parses_platform(input: &str, expected: Platform) {
        assert_eq!(input.parse::<Platform>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_platform() {
        let err = "linux-mips".parse::<Platform>().unwrap_err();
        assert!(err.to_string().contains("linux-mips"));
    }

    #[test]
    fn display_round_trips_for_all() {
        for platform in Platform::ALL {
            assert_eq!(platform.to_string().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn sandboxed_platforms() {
        assert!(Platform::EmscriptenWasm32.is_sandboxed());
        assert!(Platform::WasiWasm32.is_sandboxed());
        assert!(!Platform::Linux64.is_sandboxed());
        assert_eq!(Platform::default(), Platform::EmscriptenWasm32);
    }

    #[test]
    fn solve_subdirs_include_noarch() {
        assert_eq!(Platform::Linux64.solve_subdirs(), vec!["noarch", "linux-64"]);
        assert_eq!(Platform::Noarch.solve_subdirs(), vec!["noarch"]);
    }

    #[test]
    fn serde_uses_subdir_names() {
        let json = sonic_rs::to_string(&Platform::OsxArm64).unwrap();
        assert_eq!(json, "\"osx-arm64\"");
    }

    #[test_case("3.11.4", RuntimeVersion::new(3, 11, 4))]
    #[test_case("3.12", RuntimeVersion::new(3, 12, 0))]
    #[test_case("3.13.0rc1", RuntimeVersion::new(3, 13, 0))]
    fn parses_runtime_version(input: &str, expected: RuntimeVersion) {
        assert_eq!(RuntimeVersion::parse(input), Some(expected));
    }

    #[test]
    fn runtime_version_requires_major() {
        assert_eq!(RuntimeVersion::parse(""), None);
        assert!("abc".parse::<RuntimeVersion>().is_err());
    }
}

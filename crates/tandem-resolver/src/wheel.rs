//! Wheel filename parsing.
//!
//! `{distribution}-{version}(-{build tag})?-{python tag}-{abi tag}-{platform tag}.whl`
//! where the python, abi and platform tags may each be a dot-separated set.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Components of a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WheelFilename {
    /// Distribution name as written.
    pub distribution: String,
    /// Version as written.
    pub version: String,
    /// Optional build tag.
    pub build_tag: Option<String>,
    /// Python tags, e.g. `py2`, `py3`, `cp311`.
    pub python_tags: Vec<String>,
    /// ABI tags, e.g. `none`, `abi3`, `cp311`.
    pub abi_tags: Vec<String>,
    /// Platform tags, e.g. `any`, `manylinux_2_17_x86_64`.
    pub platform_tags: Vec<String>,
}

/// Error parsing a wheel filename.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WheelFilenameError {
    /// The filename does not follow the wheel naming convention.
    #[error("The wheel filename \"{0}\" is invalid: {1}")]
    InvalidWheelFileName(String, String),
}

fn split_tags(tag: &str) -> Vec<String> {
    tag.split('.').map(str::to_string).collect()
}

impl WheelFilename {
    /// Whether the wheel is pure Python (platform tag `any`).
    #[must_use]
    pub fn is_pure(&self) -> bool {
        self.platform_tags.iter().any(|t| t == "any")
    }
}

impl FromStr for WheelFilename {
    type Err = WheelFilenameError;

    fn from_str(filename: &str) -> Result<Self, Self::Err> {
        let invalid =
            |reason: &str| WheelFilenameError::InvalidWheelFileName(filename.to_string(), reason.to_string());

        let stem = filename
            .strip_suffix(".whl")
            .ok_or_else(|| invalid("Must end with .whl"))?;

        // Five parts, or six when a build tag sits between version and python tag.
        let parts: Vec<&str> = stem.split('-').collect();
        let (distribution, version, build_tag, python, abi, platform) = match parts.as_slice() {
            [d, v, py, abi, plat] => (*d, *v, None, *py, *abi, *plat),
            [d, v, build, py, abi, plat] => {
                if !build.starts_with(|c: char| c.is_ascii_digit()) {
                    return Err(invalid("Build tag must start with a digit"));
                }
                (*d, *v, Some((*build).to_string()), *py, *abi, *plat)
            }
            _ => return Err(invalid("Must have 5 or 6 components")),
        };

        if [distribution, version, python, abi, platform]
            .iter()
            .any(|part| part.is_empty())
        {
            return Err(invalid("Components must not be empty"));
        }

        Ok(Self {
            distribution: distribution.to_string(),
            version: version.to_string(),
            build_tag,
            python_tags: split_tags(python),
            abi_tags: split_tags(abi),
            platform_tags: split_tags(platform),
        })
    }
}

impl fmt::Display for WheelFilename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.distribution, self.version)?;
        if let Some(build) = &self.build_tag {
            write!(f, "-{build}")?;
        }
        write!(
            f,
            "-{}-{}-{}.whl",
            self.python_tags.join("."),
            self.abi_tags.join("."),
            self.platform_tags.join(".")
        )
    }
}

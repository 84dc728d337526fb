//! Human-readable package tables.

use crate::diff::{ChangeKind, EntryView, LockEntry, PackageChange, diff};
use crate::types::LockSnapshot;
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Width of every table column.
pub const COLUMN_WIDTH: usize = 30;

/// Message printed when a diff is empty.
pub const NOTHING_CHANGED: &str = "All requested packages already installed.";

const UNKNOWN_BUILD: &str = "unknown";

fn row(cells: [&str; 4]) -> String {
    let mut line = String::new();
    for cell in cells {
        let _ = write!(line, "{cell:<COLUMN_WIDTH$}");
    }
    line.trim_end().to_string()
}

fn rule() -> String {
    "─".repeat(4 * COLUMN_WIDTH)
}

/// Table of every locked package, both ecosystems merged and sorted by name.
///
/// Returns an empty string for an empty snapshot.
#[must_use]
pub fn packages_list(snapshot: &LockSnapshot) -> String {
    let mut rows: Vec<(String, EntryView)> = snapshot
        .packages
        .values()
        .map(|p| (p.name.clone(), p.view()))
        .chain(snapshot.pip_packages.values().map(|p| (p.name.clone(), p.view())))
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    rows.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));

    let mut out = String::new();
    out.push_str(&row(["Name", "Version", "Build", "Channel"]));
    out.push('\n');
    out.push_str(&rule());
    out.push('\n');
    for (name, view) in rows {
        out.push_str(&row([
            &name,
            &view.version,
            view.build.as_deref().unwrap_or(UNKNOWN_BUILD),
            &view.channel,
        ]));
        out.push('\n');
    }
    out
}

fn build_of(view: &EntryView) -> &str {
    view.build.as_deref().unwrap_or(UNKNOWN_BUILD)
}

fn change_line(change: &PackageChange, color: bool) -> String {
    let (marker, version, build, channel) = match (&change.old, &change.new) {
        (Some(old), Some(new)) => (
            "~",
            format!("{} -> {}", old.version, new.version),
            format!("{} -> {}", build_of(old), build_of(new)),
            if old.channel == new.channel {
                new.channel.clone()
            } else {
                format!("{} -> {}", old.channel, new.channel)
            },
        ),
        (None, Some(view)) | (Some(view), None) => {
            let marker = if change.kind == ChangeKind::Removed { "-" } else { "+" };
            (
                marker,
                view.version.clone(),
                build_of(view).to_string(),
                view.channel.clone(),
            )
        }
        (None, None) => (" ", String::new(), String::new(), String::new()),
    };

    let head = format!("{marker} {:<COLUMN_WIDTH$}", change.name);
    let head = if color {
        match change.kind {
            ChangeKind::Added => head.green().to_string(),
            ChangeKind::Changed => head.yellow().to_string(),
            ChangeKind::Removed => head.red().to_string(),
        }
    } else {
        head
    };
    format!("{head}{}", row([&version, &build, &channel, ""]))
        .trim_end()
        .to_string()
}

/// Render what changed between two snapshots.
///
/// `+` marks new packages, `~ old -> new` changed ones and `-` removed ones.
#[must_use]
pub fn environment_diff(old: &LockSnapshot, new: &LockSnapshot, color: bool) -> String {
    let changes = diff(old, new).changes();
    if changes.is_empty() {
        return format!("{NOTHING_CHANGED}\n");
    }

    let mut out = String::new();
    out.push_str(&format!("  {}", row(["Name", "Version", "Build", "Channel"])));
    out.push('\n');
    out.push_str(&rule());
    out.push('\n');
    for change in &changes {
        out.push_str(&change_line(change, color));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CondaPackage, PipPackage};
    use pretty_assertions::assert_eq;
    use tandem_core::Origin;

    fn base() -> LockSnapshot {
        let mut s = LockSnapshot::default();
        s.packages.insert(
            "python-3.13.1-h_0.tar.bz2".into(),
            CondaPackage::new("python", "3.13.1", "h_0").with_channel("emscripten-forge-dev"),
        );
        s
    }

    fn with_six(mut s: LockSnapshot, version: &str) -> LockSnapshot {
        s.pip_packages.insert(
            format!("six-{version}-py2.py3-none-any.whl"),
            PipPackage {
                name: "six".into(),
                version: version.into(),
                url: "https://files/six.whl".into(),
                registry: Origin::Registry,
                hash: None,
                size: None,
            },
        );
        s
    }

    #[test]
    fn list_columns() {
        let listing = packages_list(&with_six(base(), "1.16.0"));
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(&format!("{:<30}{:<30}", "Name", "Version")));
        assert_eq!(lines[1].chars().count(), 120);
        assert_eq!(
            lines[2],
            format!("{:<30}{:<30}{:<30}{}", "python", "3.13.1", "h_0", "emscripten-forge-dev")
        );
        assert_eq!(
            lines[3],
            format!("{:<30}{:<30}{:<30}{}", "six", "1.16.0", "unknown", "PyPi")
        );
        assert_eq!(packages_list(&LockSnapshot::default()), "");
    }

    #[test]
    fn unchanged_environment() {
        let s = with_six(base(), "1.16.0");
        assert_eq!(environment_diff(&s, &s, false), format!("{NOTHING_CHANGED}\n"));
    }

    #[test]
    fn diff_markers() {
        let old = with_six(base(), "1.15.0");
        let mut new = with_six(base(), "1.16.0");
        new.packages.insert(
            "zlib-1.3.1-h_0.tar.bz2".into(),
            CondaPackage::new("zlib", "1.3.1", "h_0").with_channel("emscripten-forge-dev"),
        );
        new.packages.remove("python-3.13.1-h_0.tar.bz2");

        let rendered = environment_diff(&old, &new, false);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[2],
            format!("~ {:<30}{:<30}{:<30}{}", "six", "1.15.0 -> 1.16.0", "unknown -> unknown", "PyPi")
        );
        assert!(lines[3].starts_with("+ zlib"));
        assert!(lines[4].starts_with("- python"));
    }
}

//! Working set of a resolver run.

use ahash::{AHashMap, AHashSet};
use std::fmt;
use tandem_core::{ResolvedPackage, canonical_name};
use tracing::{info, warn};

/// Severity of a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteLevel {
    /// Informational.
    Info,
    /// Non-fatal problem.
    Warning,
}

/// A user-facing message produced during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Note {
    /// Severity.
    pub level: NoteLevel,
    /// Package the note is about, when there is one.
    pub package: Option<String>,
    /// Message text.
    pub message: String,
}

impl Note {
    /// Informational note.
    #[must_use]
    pub fn info(package: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: NoteLevel::Info,
            package: package.map(str::to_string),
            message: message.into(),
        }
    }

    /// Warning note.
    #[must_use]
    pub fn warning(package: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            level: NoteLevel::Warning,
            package: package.map(str::to_string),
            message: message.into(),
        }
    }

    /// Emit the note as a tracing event.
    pub fn emit(&self) {
        let package = self.package.as_deref().unwrap_or_default();
        match self.level {
            NoteLevel::Info => info!(package, "{}", self.message),
            NoteLevel::Warning => warn!(package, "{}", self.message),
        }
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Mutable state threaded through one resolution.
///
/// All lookups use canonical package names.
#[derive(Debug, Default)]
pub struct ResolutionState {
    resolved: AHashMap<String, ResolvedPackage>,
    owned_by_primary: AHashSet<String>,
    reported: AHashSet<(NoteLevel, String)>,
    notes: Vec<Note>,
}

impl ResolutionState {
    /// Create a state.
    ///
    /// `owned_by_primary` names packages the conda solve already provides.
    /// `installed` seeds the resolved map with previously installed wheels.
    pub fn new<I, S>(owned_by_primary: I, installed: impl IntoIterator<Item = ResolvedPackage>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            resolved: installed
                .into_iter()
                .map(|pkg| (canonical_name(&pkg.name), pkg))
                .collect(),
            owned_by_primary: owned_by_primary
                .into_iter()
                .map(|name| canonical_name(name.as_ref()))
                .collect(),
            reported: AHashSet::new(),
            notes: Vec::new(),
        }
    }

    /// Whether the conda solve provides `name`.
    #[must_use]
    pub fn is_owned_by_primary(&self, name: &str) -> bool {
        self.owned_by_primary.contains(&canonical_name(name))
    }

    /// The current resolution of `name`, if any.
    #[must_use]
    pub fn resolved(&self, name: &str) -> Option<&ResolvedPackage> {
        self.resolved.get(&canonical_name(name))
    }

    /// Every resolved package, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.resolved.values()
    }

    /// Replace any previous resolution of the same package.
    pub fn replace(&mut self, package: ResolvedPackage) -> Option<ResolvedPackage> {
        self.resolved.insert(canonical_name(&package.name), package)
    }

    /// Record a note unless an identical one was already recorded.
    ///
    /// Returns `true` when the note is new.
    pub fn note_once(&mut self, note: Note) -> bool {
        if !self.reported.insert((note.level, note.message.clone())) {
            return false;
        }
        note.emit();
        self.notes.push(note);
        true
    }

    /// Notes recorded so far, in order.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Number of resolved packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    /// Whether nothing is resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }

    /// Consume the state.
    #[must_use]
    pub fn into_parts(self) -> (Vec<ResolvedPackage>, Vec<Note>) {
        (self.resolved.into_values().collect(), self.notes)
    }
}

//! Terminal output helpers.
//!
//! Colors follow `--no-ansi`, `NO_COLOR` and whether stdout is a terminal.

use owo_colors::OwoColorize;
use std::io::{IsTerminal, stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use tandem_config::ConfigError;
use tandem_resolver::{Note, NoteLevel};

static COLOR_ENABLED: AtomicBool = AtomicBool::new(false);

/// Initialize output settings from the environment and flags.
pub fn init(no_ansi: bool) {
    let colors = !no_ansi && stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    COLOR_ENABLED.store(colors, Ordering::Relaxed);
}

/// Check if colors are enabled
pub fn colors_enabled() -> bool {
    COLOR_ENABLED.load(Ordering::Relaxed)
}

/// Print a success message
pub fn success(text: &str) {
    if colors_enabled() {
        println!("{} {text}", "✓".green());
    } else {
        println!("✓ {text}");
    }
}

/// Print an error message
pub fn error(text: &str) {
    if colors_enabled() {
        eprintln!("{}", text.red());
    } else {
        eprintln!("{text}");
    }
}

/// Print a resolution note to stderr.
pub fn note(note: &Note) {
    match note.level {
        NoteLevel::Info => eprintln!("{}", note.message),
        NoteLevel::Warning if colors_enabled() => eprintln!("{}", note.message.yellow()),
        NoteLevel::Warning => eprintln!("{}", note.message),
    }
}

/// Print a failed command's error with whatever detail its type carries.
pub fn report(err: anyhow::Error) {
    if let Some(core) = err.downcast_ref::<tandem_core::Error>() {
        error(&core.display_with_suggestions());
        return;
    }
    match err.downcast::<ConfigError>() {
        Ok(config) => eprintln!("{:?}", miette::Report::new(config)),
        Err(other) => error(&format!("{other:#}")),
    }
}

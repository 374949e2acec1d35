//! Color theming for CLI output.
//!
//! Respects `NO_COLOR` environment variable and TTY detection.

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::style::Stylize;

/// Global flag for whether colors are enabled.
static COLORS_ENABLED: AtomicBool = AtomicBool::new(false);

/// Initialize color support detection.
/// Call this once at startup before any themed output.
pub fn init() {
    let enabled = std::env::var("NO_COLOR").is_err() && std::io::stdout().is_terminal();
    COLORS_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Check if colors are currently enabled.
fn colors_enabled() -> bool {
    COLORS_ENABLED.load(Ordering::Relaxed)
}

// ─── Semantic Functions ─────────────────────────────────────────────────────

/// Format text as an error (red).
pub fn error(text: &str) -> String {
    if colors_enabled() {
        text.red().to_string()
    } else {
        text.to_string()
    }
}

/// Format text as a warning (yellow).
pub fn warning(text: &str) -> String {
    if colors_enabled() {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

/// Format text as success (green).
pub fn success(text: &str) -> String {
    if colors_enabled() {
        text.green().to_string()
    } else {
        text.to_string()
    }
}

/// Format text as info (cyan).
pub fn info(text: &str) -> String {
    if colors_enabled() {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

// ─── Data Display Functions ────────────────────────────────────────────────

/// Format a label name (yellow).
pub fn label(text: &str) -> String {
    if colors_enabled() {
        text.yellow().to_string()
    } else {
        text.to_string()
    }
}

/// Format a count or id (cyan).
pub fn meta(text: &str) -> String {
    if colors_enabled() {
        text.cyan().to_string()
    } else {
        text.to_string()
    }
}

// ─── Chrome Functions ───────────────────────────────────────────────────────

/// Format text as dim/secondary (dark grey).
pub fn dim(text: &str) -> String {
    if colors_enabled() {
        text.dark_grey().to_string()
    } else {
        text.to_string()
    }
}

/// Format text as a header (bold white).
pub fn header(text: &str) -> String {
    if colors_enabled() {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

//! User-facing terminal messages
//!
//! Internal diagnostics go through `log`; these helpers are for messages a
//! user is meant to read, without timestamps or log-level noise.

use owo_colors::OwoColorize;

/// Print a warning to stderr with a colored prefix
pub fn warn(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

/// Print an error to stderr with a colored prefix
///
/// # Example
/// ```ignore
/// output::error("no index found, run 'fathom build' first");
/// ```
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}

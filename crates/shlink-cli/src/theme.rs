//! Terminal styling for command output.

use colored::Colorize;

/// Output styles shared by the subcommands.
pub(crate) struct Theme;

impl Theme {
    /// Section title.
    pub(crate) fn header(text: &str) -> String {
        text.bold().cyan().to_string()
    }

    /// Something the user asked for happened.
    pub(crate) fn success(text: &str) -> String {
        format!("{} {text}", "✓".green().bold())
    }

    /// The server said no, as expected in a walkthrough.
    pub(crate) fn refused(text: &str) -> String {
        format!("{} {text}", "✗".red().bold())
    }

    /// Needs the user's attention before continuing.
    pub(crate) fn warning(text: &str) -> String {
        format!("{} {}", "!".yellow().bold(), text.yellow())
    }

    pub(crate) fn info(text: &str) -> String {
        format!("{} {text}", "·".blue())
    }

    /// Secondary detail.
    pub(crate) fn dimmed(text: &str) -> String {
        text.dimmed().to_string()
    }

    /// An aligned `label: value` line.
    pub(crate) fn field(label: &str, value: impl std::fmt::Display) -> String {
        format!("  {:<20} {value}", format!("{label}:").bold())
    }

    /// Closing rule under a walkthrough.
    pub(crate) fn separator() -> String {
        "─".repeat(60).dimmed().to_string()
    }
}

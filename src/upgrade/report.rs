//! User-facing progress and failure messages.
//!
//! The orchestrator never writes to the terminal directly. Everything the user
//! sees goes through a [`Reporter`], so tests can capture the messages and
//! `--quiet` can silence them.

use colored::Colorize;

/// Severity of a reported message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Normal progress
    Info,
    /// Something went wrong but the operation continues
    Warning,
    /// The operation failed
    Error,
}

/// Sink for line-oriented user messages.
pub trait Reporter {
    /// Emit one message.
    fn report(&self, severity: Severity, message: &str);

    /// Emit an informational message.
    fn info(&self, message: &str) {
        self.report(Severity::Info, message);
    }

    /// Emit a warning.
    fn warn(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    /// Emit an error.
    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }
}

/// Colored terminal output. Info goes to stdout, warnings and errors to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    /// Create a reporter. A quiet reporter only prints errors.
    #[must_use]
    pub const fn new(quiet: bool) -> Self {
        Self {
            quiet,
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Info if !self.quiet => println!("{message}"),
            Severity::Warning if !self.quiet => eprintln!("{}", message.yellow()),
            Severity::Error => eprintln!("{}", message.red()),
            _ => {}
        }
    }
}

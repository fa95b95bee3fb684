//! Error handling for Sandman
//!
//! This module provides the error taxonomy of the self-update subsystem and the
//! user-friendly rendering used at the process boundary. It follows two rules:
//! 1. **Strongly-typed errors** for the failure classes callers branch on
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Classes
//!
//! - [`SandmanError::Filesystem`]: an unwritable directory or executable, or a missing
//!   or unreadable backup. Always fatal to the current command.
//! - [`SandmanError::NoRollbackAvailable`]: rollback requested without any backup. Fatal.
//! - [`SandmanError::UnsupportedVersion`], [`SandmanError::DownloadFailed`] and
//!   [`SandmanError::ArchiveValidation`]: recoverable conditions. The orchestrator
//!   reports them and converts them into exit status `1` instead of returning them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sandman::core::{SandmanError, user_friendly_error};
//!
//! let error = SandmanError::NoRollbackAvailable {
//!     dir: "/home/me/.sandman".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use crate::upgrade::verification::ArchiveError;
use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for Sandman operations.
#[derive(Error, Debug)]
pub enum SandmanError {
    /// A path required by the operation is not usable.
    ///
    /// Raised before any network or file mutation when the download directory or
    /// the live executable cannot be written, and during rollback when the backup
    /// directory is not writable or the selected backup is missing or unreadable.
    #[error("Sandman {operation} failed: {reason}")]
    Filesystem {
        /// The command that hit the failure ("update" or "rollback")
        operation: String,
        /// Human-readable condition naming the offending path
        reason: String,
        /// The offending path
        path: String,
    },

    /// A content identifier was requested that is not the current latest build.
    #[error("You can not update to a specific SHA-1 ({version}) as those builds are not available for download")]
    UnsupportedVersion {
        /// The requested 40-character identifier
        version: String,
    },

    /// The staged artifact was not present after the fetch.
    #[error("The download of the new sandman version failed for an unexpected reason ({url})")]
    DownloadFailed {
        /// The artifact URL that was fetched
        url: String,
    },

    /// The candidate file is not a valid executable archive.
    #[error("Invalid executable archive: {0}")]
    ArchiveValidation(#[from] ArchiveError),

    /// A published checksum does not match the downloaded artifact.
    #[error("Checksum mismatch for '{name}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Artifact name
        name: String,
        /// Published digest
        expected: String,
        /// Digest of the staged file
        actual: String,
    },

    /// Rollback was requested but the rollback directory holds no backup.
    #[error("Sandman rollback failed: no installation to roll back to in \"{dir}\"")]
    NoRollbackAvailable {
        /// The rollback directory that was scanned
        dir: String,
    },

    /// A network request failed.
    #[error("Network error: {operation}")]
    Network {
        /// What was being fetched
        operation: String,
        /// Underlying failure
        reason: String,
    },

    /// The server answered that the requested resource does not exist.
    #[error("Not found: {url}")]
    NotFound {
        /// The URL that was requested
        url: String,
    },

    /// Wrapped TOML parse error.
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Anything else.
    #[error("{message}")]
    Other {
        /// The message
        message: String,
    },
}

impl SandmanError {
    /// Build a [`SandmanError::Filesystem`] for the given command and path.
    pub fn filesystem(
        operation: impl Into<String>,
        reason: impl Into<String>,
        path: &std::path::Path,
    ) -> Self {
        Self::Filesystem {
            operation: operation.into(),
            reason: reason.into(),
            path: path.display().to_string(),
        }
    }
}

/// Error wrapper adding a suggestion and details for display in the terminal.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: SandmanError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: SandmanError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with suggestions where we know some.
///
/// Errors that are not a [`SandmanError`] keep their full cause chain in the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let error = match error.downcast::<SandmanError>() {
        Ok(sandman_error) => return create_error_context(sandman_error),
        Err(error) => error,
    };

    if let Some(io_error) = error.downcast_ref::<std::io::Error>()
        && io_error.kind() == std::io::ErrorKind::PermissionDenied
    {
        return ErrorContext::new(SandmanError::Other {
            message: error.to_string(),
        })
        .with_suggestion(
            "Try running with elevated permissions (sudo/Administrator) or check file ownership",
        )
        .with_details("Sandman needs write access to its own executable and backup directory");
    }

    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(SandmanError::Other {
        message,
    })
}

fn create_error_context(error: SandmanError) -> ErrorContext {
    match &error {
        SandmanError::Filesystem {
            path, ..
        } => {
            let details = format!("Sandman must be able to write to {path} to replace itself");
            ErrorContext::new(error)
                .with_suggestion(match cfg!(windows) {
                    true => "Run as Administrator or check file permissions in File Explorer",
                    false => "Use 'sudo' or check file permissions with 'ls -la'",
                })
                .with_details(details)
        }
        SandmanError::NoRollbackAvailable {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Backups are written by 'sandman self-update'; run an update first")
            .with_details(
                "Rollback restores the newest '*-old.bin' file from the Sandman home directory",
            ),
        SandmanError::Network {
            reason, ..
        } => {
            let details = format!("The distribution server could not be reached: {reason}");
            ErrorContext::new(error)
                .with_suggestion("Check your internet connection and try again")
                .with_details(details)
        }
        SandmanError::TomlError(_) => ErrorContext::new(error)
            .with_suggestion("Check the TOML syntax in ~/.sandman/config.toml")
            .with_details("Configuration errors are usually caused by missing quotes or bad types"),
        _ => ErrorContext::new(error),
    }
}

//! Core types for Sandman
//!
//! This module holds the error taxonomy shared by the CLI and the self-update
//! subsystem, along with the user-friendly rendering used by `main`.
//!
//! - [`SandmanError`] - strongly-typed failure classes
//! - [`ErrorContext`] - error plus suggestion and details for terminal display
//! - [`user_friendly_error`] - converts an [`anyhow::Error`] into an [`ErrorContext`]

pub mod error;

pub use error::{ErrorContext, SandmanError, user_friendly_error};

//! Sandman - a command-line tool that keeps itself up to date.
//!
//! The library backs the `sandman` binary. Its one substantial subsystem is
//! self-update: downloading another build of the executable, validating it,
//! backing up the running build and swapping the new one into place, plus
//! rolling back to the newest backup.
//!
//! # Modules
//!
//! - [`cli`]: clap command definitions and logging setup
//! - [`config`]: the global `~/.sandman/config.toml`
//! - [`core`]: error types and user-facing error rendering
//! - [`upgrade`]: the self-update and rollback machinery
//! - [`utils`]: file-system helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use sandman::cli::Cli;
//! use clap::Parser;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cli = Cli::parse_from(["sandman", "self-update", "--rollback"]);
//! let code = cli.execute().await?;
//! std::process::exit(code);
//! # }
//! ```

// Core functionality modules
pub mod cli;
pub mod config;
pub mod core;

// Self-update
pub mod upgrade;

// Supporting modules
pub mod utils;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

//! Self-update and rollback for the Sandman executable.
//!
//! `sandman self-update` replaces the running executable with another build
//! from the distribution server, keeping a timestamped backup of the build it
//! replaced. `sandman self-update --rollback` puts the most recent backup back.
//!
//! # Architecture Overview
//!
//! - **[`SelfUpdater`]**: the orchestrator behind both commands
//! - **[`install::install_artifact`]**: the validate-then-rename swap shared by update and rollback
//! - **[`backup::BackupStore`]**: naming, listing and cleanup of backups in the rollback directory
//! - **[`remote`]**: distribution server layout and the [`remote::Fetcher`] seam
//! - **[`verification`]**: executable-header validation and checksum verification
//! - **[`report`]**: the [`report::Reporter`] seam for user-facing messages
//! - **[`version`]**: version identifiers and release metadata of the running build
//! - **[`config::UpgradeConfig`]**: the `[upgrade]` configuration table
//!
//! ## Update Process Flow
//!
//! ```text
//! 1. Preconditions
//!    ├── Staging directory (executable dir, else cache dir) is writable
//!    └── Executable is writable
//!
//! 2. Version Resolution
//!    ├── Fetch /version from the distribution server
//!    ├── Refuse content identifiers other than the latest
//!    └── Stop when the target is the running version
//!
//! 3. Download
//!    ├── Fetch the build into <stem>-temp next to the executable
//!    └── Verify <artifact>.sha256 when published
//!
//! 4. Swap
//!    ├── Validate the staged build
//!    ├── Copy the live executable to the rollback directory
//!    └── Rename the staged build over the live executable
//! ```
//!
//! # Safety Mechanisms
//!
//! - The live executable is never opened for writing. It is only ever replaced
//!   by a rename, so it always holds either the old or the new build.
//! - A staged build is validated before anything else happens to the live path.
//! - Backups are best-effort: a failed backup is reported but never blocks the
//!   update.
//!
//! # Usage Patterns
//!
//! ```bash
//! sandman self-update                   # Update to the latest build
//! sandman self-update 1.4.0             # Update to a tagged build
//! sandman self-update --clean-backups   # Update and drop older backups
//! sandman self-update --rollback        # Restore the most recent backup
//! ```

pub mod backup;
pub mod config;
pub mod install;
pub mod remote;
pub mod report;
/// The update and rollback orchestrator.
pub mod self_updater;
pub mod verification;
pub mod version;


pub use self_updater::{SelfUpdater, UpdateOptions, UpdateOutcome};
pub use verification::ChecksumVerifier;

//! Configuration management for Sandman.
//!
//! Sandman has a single, user-wide configuration file. See [`global`] for its
//! location, format and environment overrides. The `[upgrade]` table is
//! described by [`UpgradeConfig`](crate::upgrade::config::UpgradeConfig).

pub mod global;

pub use global::GlobalConfig;

//! Integration test suite for Sandman
//!
//! These tests drive the real `sandman` binary (and the library's HTTP stack)
//! against temp-directory installations and a local `mockito` distribution
//! server. Nothing touches the executable under test.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **self_update**: `sandman self-update` end to end through the CLI
//! - **rollback**: `sandman self-update --rollback` through the CLI
//! - **http_update**: `SelfUpdater` with the real `HttpFetcher`

mod common;

mod http_update;
mod rollback;
mod self_update;

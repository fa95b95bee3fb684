//! Cross-platform utilities and helpers
//!
//! # Modules
//!
//! - [`fs`] - Access checks, best-effort side operations and executable permissions

pub mod fs;

pub use fs::{best_effort, ensure_dir, is_readable, is_writable};

//! Validation of candidate executables before they are swapped in.
//!
//! Two independent checks guard the swap:
//!
//! - [`ArchiveValidator`]: structural validation of the candidate file. The update
//!   and rollback paths both run it inside
//!   [`install_artifact`](crate::upgrade::install::install_artifact). A rejected
//!   candidate never reaches the live path.
//! - [`ChecksumVerifier`]: SHA-256 verification against a digest published next to
//!   the artifact on the distribution server.
//!
//! Structural failures are reported as [`ArchiveError`], which the install step
//! catches and turns into a rejection. Any other I/O failure surfaces as
//! [`ValidateError::Io`] and aborts the operation.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

/// A candidate file is not a usable executable archive.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    /// The candidate file does not exist.
    #[error("file does not exist")]
    Missing,

    /// The candidate file has no content.
    #[error("file is empty")]
    Empty,

    /// The header announces a format but the file is shorter than that header.
    #[error("{format} header truncated ({len} bytes)")]
    Truncated {
        /// Detected format
        format: &'static str,
        /// Actual file length
        len: u64,
    },

    /// The leading bytes match no known executable format.
    #[error("unrecognized executable format (magic {magic})")]
    UnrecognizedFormat {
        /// Hex of the leading bytes
        magic: String,
    },
}

/// Outcome of a failed validation.
#[derive(Error, Debug)]
pub enum ValidateError {
    /// The file is not a valid executable archive. Recoverable.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Reading the file failed for another reason. Not recoverable.
    #[error("Failed to read candidate: {0}")]
    Io(#[from] io::Error),
}

/// Structural validation of a candidate executable.
pub trait ArchiveValidator {
    /// Check that `path` holds a structurally valid executable archive.
    fn validate(&self, path: &Path) -> Result<(), ValidateError>;
}

/// Validates native executables by their header.
///
/// Accepted formats: ELF, Mach-O (32/64-bit, either byte order), universal Mach-O,
/// PE/COFF and `#!` scripts. For binary formats the file must be at least as long
/// as the fixed header of that format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecutableValidator;

struct Format {
    name: &'static str,
    magic: &'static [u8],
    min_len: u64,
}

const FORMATS: &[Format] = &[
    Format {
        name: "ELF",
        magic: b"\x7fELF",
        min_len: 52,
    },
    Format {
        name: "Mach-O",
        magic: &[0xfe, 0xed, 0xfa, 0xce],
        min_len: 28,
    },
    Format {
        name: "Mach-O",
        magic: &[0xfe, 0xed, 0xfa, 0xcf],
        min_len: 32,
    },
    Format {
        name: "Mach-O",
        magic: &[0xce, 0xfa, 0xed, 0xfe],
        min_len: 28,
    },
    Format {
        name: "Mach-O",
        magic: &[0xcf, 0xfa, 0xed, 0xfe],
        min_len: 32,
    },
    Format {
        name: "universal Mach-O",
        magic: &[0xca, 0xfe, 0xba, 0xbe],
        min_len: 8,
    },
    Format {
        name: "PE",
        magic: b"MZ",
        min_len: 64,
    },
    Format {
        name: "script",
        magic: b"#!",
        min_len: 3,
    },
];

impl ArchiveValidator for ExecutableValidator {
    fn validate(&self, path: &Path) -> Result<(), ValidateError> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ArchiveError::Missing.into());
            }
            Err(e) => return Err(e.into()),
        };

        let len = file.metadata()?.len();
        if len == 0 {
            return Err(ArchiveError::Empty.into());
        }

        let mut header = [0u8; 4];
        let mut read = 0;
        while read < header.len() {
            match file.read(&mut header[read..])? {
                0 => break,
                n => read += n,
            }
        }
        let header = &header[..read];

        let Some(format) = FORMATS.iter().find(|f| header.starts_with(f.magic)) else {
            return Err(ArchiveError::UnrecognizedFormat {
                magic: hex::encode(header),
            }
            .into());
        };

        if len < format.min_len {
            return Err(ArchiveError::Truncated {
                format: format.name,
                len,
            }
            .into());
        }

        debug!("Validated {} executable {:?} ({} bytes)", format.name, path, len);
        Ok(())
    }
}

/// SHA-256 verification of downloaded artifacts.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Compute the hex SHA-256 of a file.
    pub async fn compute_sha256(file_path: &Path) -> Result<String> {
        debug!("Computing SHA256 checksum for: {:?}", file_path);

        let contents = tokio::fs::read(file_path)
            .await
            .with_context(|| format!("Failed to read file: {file_path:?}"))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Extract the digest for `artifact_name` from a checksum document.
    ///
    /// Accepts `sha256sum` output (`<digest>  <name>`, optionally `*<name>` for
    /// binary mode) and a bare digest on its own line. An optional `sha256:`
    /// prefix on the digest is stripped.
    #[must_use]
    pub fn parse_checksum(content: &str, artifact_name: &str) -> Option<String> {
        for line in content.lines() {
            let parts: Vec<&str> = line.split_whitespace().collect();
            let digest = match parts.as_slice() {
                [digest] => *digest,
                [digest, name] => {
                    let name = name.trim_start_matches('*');
                    if name == artifact_name || name.ends_with(&format!("/{artifact_name}")) {
                        *digest
                    } else {
                        continue;
                    }
                }
                _ => continue,
            };

            let digest = digest.trim_start_matches("sha256:");
            if digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Some(digest.to_lowercase());
            }
        }

        None
    }

    /// Compare a file's digest with `expected`, case-insensitively.
    ///
    /// Returns the actual digest on mismatch so callers can report it.
    pub async fn verify(file_path: &Path, expected: &str) -> Result<Result<(), String>> {
        info!("Verifying checksum for: {:?}", file_path);

        let actual = Self::compute_sha256(file_path).await?;
        if actual.eq_ignore_ascii_case(expected.trim_start_matches("sha256:")) {
            info!("Checksum verification successful");
            Ok(Ok(()))
        } else {
            warn!("Checksum mismatch: expected {}, got {}", expected, actual);
            Ok(Err(actual))
        }
    }
}

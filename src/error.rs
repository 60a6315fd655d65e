//! Error types for Skitter.
//!
//! Uses `thiserror` for ergonomic error definitions. Module-level errors
//! (`TargetError`, `PortError`) fold into the four scan-level categories of
//! [`ScanError`] so callers can branch on the category alone.

use crate::types::{PortError, TargetError};
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scanning operations.
///
/// Per-port outcomes (open, closed, filtered) are never errors; only the
/// conditions below abort a scan.
#[derive(Error, Debug)]
pub enum ScanError {
    /// Malformed or missing target/port specification.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Name lookup failed or returned no addresses.
    #[error("failed to resolve '{target}': {reason}")]
    ResolutionFailed { target: String, reason: String },

    /// Recognized syntax that is intentionally unimplemented.
    #[error("{0} are not yet supported")]
    NotSupported(String),

    /// The runtime could not run further concurrent tasks.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),
}

impl ScanError {
    /// Whether this error was caused by user input rather than the environment.
    pub fn is_argument_error(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::NotSupported(_))
    }
}

impl From<TargetError> for ScanError {
    fn from(err: TargetError) -> Self {
        match err {
            TargetError::RangeNotSupported(_) => {
                Self::NotSupported("IP range definitions".to_string())
            }
            TargetError::DnsResolutionFailed(target, reason) => {
                Self::ResolutionFailed { target, reason }
            }
            TargetError::NoAddressesFound(target) => Self::ResolutionFailed {
                target,
                reason: "no addresses returned".to_string(),
            },
            other => Self::InvalidArgument(other.to_string()),
        }
    }
}

impl From<PortError> for ScanError {
    fn from(err: PortError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Errors raised while locating or reading the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

//! Application settings and paths.
//!
//! Optional defaults live in `settings.json` under the XDG config directory
//! (`~/.config/skitter` on Linux). Command-line flags override them.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::Protocol;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/skitter)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the configuration directory. Nothing is created on disk.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "skitter", "skitter")
            .ok_or(ConfigError::DirectoryNotFound)?;
        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Defaults applied when a flag is not given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Maximum concurrently scanned hosts, 0 for unbounded.
    pub cap: usize,
    /// Maximum concurrent probes per host, 0 for unbounded.
    pub port_cap: usize,
    /// Per-probe timeout in milliseconds.
    pub timeout_ms: u64,
    /// Default protocol.
    pub protocol: Protocol,
    /// Default port specification.
    pub ports: String,
    /// Report closed and filtered ports by default.
    pub verbose: bool,
    /// Default output format ("plain", "json" or "csv").
    pub output_format: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            cap: 0,
            port_cap: 0,
            timeout_ms: 250,
            protocol: Protocol::Tcp,
            ports: "80".to_string(),
            verbose: false,
            output_format: "plain".to_string(),
        }
    }
}

impl AppSettings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields the built-in defaults; an explicitly
    /// requested file must exist.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let file = match Paths::discover() {
                    Ok(paths) => paths.settings_file(),
                    Err(e) => {
                        debug!(error = %e, "no config directory, using defaults");
                        return Ok(Self::default());
                    }
                };
                match Self::load_from(&file) {
                    Err(ConfigError::ReadFailed { .. }) if !file.exists() => Ok(Self::default()),
                    other => other,
                }
            }
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| read_failed(path, e))?;
        let settings =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }
}

fn read_failed(path: &Path, err: io::Error) -> ConfigError {
    ConfigError::ReadFailed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.cap, 0);
        assert_eq!(settings.timeout_ms, 250);
        assert_eq!(settings.protocol, Protocol::Tcp);
        assert_eq!(settings.ports, "80");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"cap": 16, "protocol": "udp"}}"#).unwrap();

        let settings = AppSettings::load(Some(file.path())).unwrap();
        assert_eq!(settings.cap, 16);
        assert_eq!(settings.protocol, Protocol::Udp);
        assert_eq!(settings.timeout_ms, 250);
        assert_eq!(settings.ports, "80");
    }

    #[test]
    fn test_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "cap = 16").unwrap();

        let err = AppSettings::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFormat(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppSettings::load(Some(dir.path().join("absent.json").as_path())).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFailed { .. }));
    }

    #[test]
    fn test_settings_serialization() {
        let settings = AppSettings::default();
        let json = serde_json::to_string(&settings).unwrap();
        let parsed: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, settings);
    }
}

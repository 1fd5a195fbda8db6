//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$CLAIMLEDGER_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/claimledger/config.toml`
//! 3. `~/.claimledger/config.toml`
//!
//! A missing file is not an error; defaults are used.
//!
//! # Defaults
//!
//! - output: `claims.json`
//! - mode: `0644`
//! - storage provider: `os`, no root
//!
//! # Example
//!
//! ```no_run
//! use claimledger::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("writing claims to {}", config.output_path().display());
//! println!("mode {:o}", config.file_mode());
//! ```

pub mod schema;

pub use schema::{parse_mode, ClaimsConfig, StorageConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::storage::DEFAULT_PROVIDER;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "CLAIMLEDGER_CONFIG";

/// Default output file for persisted claims.
pub const DEFAULT_OUTPUT: &str = "claims.json";

/// Default permission bits for persisted claims.
pub const DEFAULT_MODE: u32 = 0o644;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Loaded configuration with defaults applied through accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Raw configuration as parsed; validated before it is stored
    claims: ClaimsConfig,
    /// Path the configuration was loaded from (if any)
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Wrap an already-built configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration fails validation.
    pub fn new(claims: ClaimsConfig) -> Result<Self, ConfigError> {
        claims.validate()?;
        Ok(Self {
            claims,
            loaded_from: None,
        })
    }

    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!("no claims config found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let claims: ClaimsConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        claims.validate()?;
        tracing::debug!(path = %path.display(), "loaded claims config");

        Ok(Self {
            claims,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Find the first config file that exists.
    fn locate() -> Option<PathBuf> {
        // 1. Check $CLAIMLEDGER_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/claimledger/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("claimledger/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.claimledger/config.toml
        dirs::home_dir()
            .map(|home| home.join(".claimledger/config.toml"))
            .filter(|path| path.exists())
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Get the validated configuration as parsed.
    pub fn claims(&self) -> &ClaimsConfig {
        &self.claims
    }

    /// Get the output path for persisted claims.
    ///
    /// Defaults to `claims.json` if not configured.
    pub fn output_path(&self) -> &Path {
        self.claims
            .output
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_OUTPUT))
    }

    /// Get the permission bits for persisted claims.
    ///
    /// Defaults to `0o644` if not configured. The mode string was checked
    /// when the config was built, so parsing cannot fail here.
    pub fn file_mode(&self) -> u32 {
        self.claims
            .mode
            .as_deref()
            .and_then(|m| parse_mode(m).ok())
            .unwrap_or(DEFAULT_MODE)
    }

    /// Get the storage provider name.
    ///
    /// Defaults to "os" if not configured.
    pub fn storage_provider(&self) -> &str {
        self.claims
            .storage
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or(DEFAULT_PROVIDER)
    }

    /// Get the storage root directory, if configured.
    pub fn storage_root(&self) -> Option<&Path> {
        self.claims
            .storage
            .as_ref()
            .and_then(|s| s.root.as_deref())
    }

    /// Get the path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

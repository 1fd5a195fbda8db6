//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing: the file mode must be an
//! octal permission value and the storage provider must be known.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::storage::valid_provider_names;

/// Claims ledger configuration.
///
/// # Example
///
/// ```toml
/// output = "claims.json"
/// mode = "0640"
///
/// [storage]
/// provider = "os"
/// root = "/var/lib/myapp"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ClaimsConfig {
    /// Where persisted claims are written (relative to the storage root)
    pub output: Option<PathBuf>,

    /// File permission bits as octal text, e.g. "0644"
    pub mode: Option<String>,

    /// Storage settings
    pub storage: Option<StorageConfig>,
}

impl ClaimsConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(output) = &self.output {
            if output.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "output cannot be empty".to_string(),
                ));
            }
        }

        if let Some(mode) = &self.mode {
            parse_mode(mode)?;
        }

        if let Some(storage) = &self.storage {
            storage.validate()?;
        }

        Ok(())
    }
}

/// Storage backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Filesystem provider: "os" or "memory"
    pub provider: Option<String>,

    /// Base directory all writes resolve under
    pub root: Option<PathBuf>,
}

impl StorageConfig {
    /// Validate the storage settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            let valid = valid_provider_names();
            if !valid.contains(&provider.as_str()) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid storage provider '{}', must be one of: {}",
                    provider,
                    valid.join(", ")
                )));
            }
        }
        Ok(())
    }
}

/// Parse octal permission text such as `"0644"`, `"644"` or `"0o644"`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the text is not octal or the
/// value has bits outside `0o777`.
pub fn parse_mode(text: &str) -> Result<u32, ConfigError> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix("0o").unwrap_or(trimmed);

    let mode = u32::from_str_radix(digits, 8).map_err(|_| {
        ConfigError::InvalidValue(format!("invalid file mode '{}': expected octal", text))
    })?;

    if mode > 0o777 {
        return Err(ConfigError::InvalidValue(format!(
            "invalid file mode '{}': must be at most 0777",
            text
        )));
    }

    Ok(mode)
}

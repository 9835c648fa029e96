//! Configuration loading
//!
//! A single TOML file with one table per component. Every field has a
//! default, so an absent file or an empty table is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use wastewatch_core::{DashboardConfig, WorkflowConfig};
use wastewatch_ledger::LedgerConfig;
use wastewatch_storage::StorageConfig;
use wastewatch_verify::VerificationConfig;

/// Environment variable naming the node URL.
pub(crate) const ENV_RPC_URL: &str = "WASTEWATCH_RPC_URL";
/// Environment variable naming the storage account.
pub(crate) const ENV_CLOUD_NAME: &str = "WASTEWATCH_CLOUD_NAME";
/// Environment variable naming the unsigned upload preset.
pub(crate) const ENV_UPLOAD_PRESET: &str = "WASTEWATCH_UPLOAD_PRESET";

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    /// File could not be read
    #[error("cannot read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// File is not valid TOML for this schema
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct WastewatchConfig {
    /// `[storage]`
    pub(crate) storage: StorageConfig,
    /// `[verification]`
    pub(crate) verification: VerificationConfig,
    /// `[ledger]`
    pub(crate) ledger: LedgerConfig,
    /// `[dashboard]`
    pub(crate) dashboard: DashboardConfig,
    /// `[workflow]`
    pub(crate) workflow: WorkflowConfig,
}

impl WastewatchConfig {
    /// Load from `path` (or defaults), then apply environment overrides.
    ///
    /// Verification bypass follows the `bypass-verification` build feature
    /// only; a `[workflow]` key cannot change it.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub(crate) fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from environment-style lookups.
    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_RPC_URL).filter(|v| !v.is_empty()) {
            self.ledger.rpc_url = Some(url);
        }
        if let Some(name) = lookup(ENV_CLOUD_NAME).filter(|v| !v.is_empty()) {
            self.storage.cloud_name = name;
        }
        if let Some(preset) = lookup(ENV_UPLOAD_PRESET).filter(|v| !v.is_empty()) {
            self.storage.upload_preset = preset;
        }
    }
}

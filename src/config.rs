//! TOML configuration for the document chat client.
//!
//! ```toml
//! [backend]
//! base_url = "http://localhost:8004"
//! request_timeout_secs = 60   # optional; unset means wait indefinitely
//!
//! [storage]
//! dir = "~/.local/share/docchat"
//!
//! [labels]
//! all_groups = "全部"
//! unassigned = "未分组"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8004".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
        }
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docchat")
}

/// Group labels shared with the backend.
///
/// `all_groups` is the synthetic "no filter" entry that heads every group
/// list; `unassigned` is what the backend stores for documents that were
/// never grouped.
#[derive(Debug, Deserialize, Clone)]
pub struct LabelsConfig {
    #[serde(default = "default_all_groups")]
    pub all_groups: String,
    #[serde(default = "default_unassigned")]
    pub unassigned: String,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            all_groups: default_all_groups(),
            unassigned: default_unassigned(),
        }
    }
}

fn default_all_groups() -> String {
    crate::models::ALL_GROUPS.to_string()
}
fn default_unassigned() -> String {
    crate::models::UNASSIGNED.to_string()
}

impl Config {
    /// Configuration used when no config file is present.
    pub fn minimal() -> Self {
        Self {
            backend: BackendConfig::default(),
            storage: StorageConfig::default(),
            labels: LabelsConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load the config file if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

pub fn validate(config: &Config) -> Result<()> {
    let base = config.backend.base_url.trim();
    if base.is_empty() {
        anyhow::bail!("backend.base_url must not be empty");
    }
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!(
            "backend.base_url must start with http:// or https://, got '{}'",
            base
        );
    }

    if config.backend.request_timeout_secs == Some(0) {
        anyhow::bail!("backend.request_timeout_secs must be > 0 when set");
    }

    if config.labels.all_groups.trim().is_empty() {
        anyhow::bail!("labels.all_groups must not be empty");
    }

    Ok(())
}

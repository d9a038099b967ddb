use anyhow::{Context, Result};
use preflight::CheckSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("nodeops"))
}

// ============================================================================
// Settings
// ============================================================================

/// Tool settings (`~/.config/nodeops/settings.toml`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the persisted topology and deploy state
    #[serde(default = "default_ha_dir")]
    pub ha_dir: String,
    #[serde(default)]
    pub ssh: SshSettings,
    #[serde(default)]
    pub deploy: DeploySettings,
    #[serde(default)]
    pub checks: CheckSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshSettings {
    #[serde(default = "default_ssh_user")]
    pub user: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub key_file: Option<String>,
    #[serde(default = "default_ssh_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploySettings {
    /// Cluster control tool invoked after a topology change
    #[serde(default = "default_deploy_command")]
    pub command: String,
}

fn default_ha_dir() -> String {
    "~/.nodeops/ha".to_string()
}

fn default_ssh_user() -> String {
    "ubuntu".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_ssh_timeout() -> u64 {
    30
}

fn default_deploy_command() -> String {
    "cluster-ctl".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ha_dir: default_ha_dir(),
            ssh: SshSettings::default(),
            deploy: DeploySettings::default(),
            checks: CheckSettings::default(),
        }
    }
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            user: default_ssh_user(),
            port: default_ssh_port(),
            key_file: None,
            timeout_secs: default_ssh_timeout(),
        }
    }
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            command: default_deploy_command(),
        }
    }
}

impl Settings {
    /// Default settings file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(config_dir()?.join("settings.toml"))
    }

    /// Load settings from `path` (or the default location).
    ///
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            log::debug!("Settings file {} does not exist, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Invalid settings in {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Get expanded HA directory path
    pub fn ha_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.ha_dir);
        PathBuf::from(expanded.as_ref())
    }

    /// Path of the persisted topology document
    pub fn topology_path(&self) -> PathBuf {
        self.ha_path().join("config.toml")
    }
}

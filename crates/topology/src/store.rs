//! Persistence of the topology document
//!
//! The document is always read and written whole. There is no partial
//! update format.

use crate::error::{Error, Result};
use crate::types::TopologyDescription;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Load/save access to the persisted topology
pub trait TopologyStore {
    /// Whether persisted state exists at all
    fn exists(&self) -> bool;

    /// Load and verify the persisted topology
    fn load(&self) -> Result<TopologyDescription>;

    /// Replace the persisted topology
    fn save(&self, topology: &TopologyDescription) -> Result<()>;

    /// Where the topology lives, for messages
    fn location(&self) -> String;
}

/// TOML document on disk
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    keep_backup: bool,
}

impl FileStore {
    /// Store backed by `path`, keeping a backup of each replaced document
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keep_backup: true,
        }
    }

    /// Disable backups of replaced documents
    pub fn without_backup(mut self) -> Self {
        self.keep_backup = false;
        self
    }

    /// Path of the persisted document
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(format!(".{stamp}.bak"));
        self.path.with_file_name(name)
    }
}

impl TopologyStore for FileStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn load(&self) -> Result<TopologyDescription> {
        let content = fs::read_to_string(&self.path).map_err(|source| Error::Access {
            path: self.path.clone(),
            source,
        })?;
        let topology = parse(&content).map_err(|e| {
            Error::config(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        log::debug!("Loaded topology from {}", self.path.display());
        Ok(topology)
    }

    fn save(&self, topology: &TopologyDescription) -> Result<()> {
        let content = render(topology)?;

        if self.keep_backup && self.path.is_file() {
            let backup = self.backup_path();
            fs::copy(&self.path, &backup).map_err(|source| Error::Access {
                path: backup.clone(),
                source,
            })?;
            log::debug!("Backed up previous topology to {}", backup.display());
        }

        fs::write(&self.path, content).map_err(|source| Error::Access {
            path: self.path.clone(),
            source,
        })?;
        log::debug!("Saved topology to {}", self.path.display());
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Parse and verify a TOML topology document
pub fn parse(content: &str) -> Result<TopologyDescription> {
    let topology: TopologyDescription =
        toml::from_str(content).map_err(|e| Error::config(e.to_string()))?;
    topology.check_consistency()?;
    Ok(topology)
}

/// Render a topology as a TOML document
pub fn render(topology: &TopologyDescription) -> Result<String> {
    toml::to_string_pretty(topology)
        .map_err(|e| Error::config(format!("failed to serialize topology: {e}")))
}

//! Composition root: wires settings to the production collaborators

use anyhow::{Context as _, Result};
use preflight::{CheckRegistry, RunContext};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use topology::{FileStore, TopologyDescription, TopologyStore};

use crate::Context;
use crate::checks;
use crate::config::Settings;
use crate::deploy::ClusterCtlTrigger;
use crate::ssh::SshClient;

pub struct App {
    pub settings: Settings,
    pub store: FileStore,
    pub ssh: Arc<SshClient>,
    pub trigger: ClusterCtlTrigger,
}

impl App {
    /// Load settings and build the collaborators, applying CLI overrides
    pub fn new(ctx: &Context) -> Result<Self> {
        let mut settings = Settings::load(ctx.settings_path.as_deref())?;
        if let Some(ha_dir) = &ctx.ha_dir {
            settings.ha_dir.clone_from(ha_dir);
        }
        Ok(Self::from_settings(settings))
    }

    pub fn from_settings(settings: Settings) -> Self {
        let store = FileStore::new(settings.topology_path());
        let ssh = Arc::new(SshClient::new(&settings.ssh));
        let trigger = ClusterCtlTrigger::new(&settings.deploy.command, settings.ha_path());
        Self {
            settings,
            store,
            ssh,
            trigger,
        }
    }

    pub fn topology_path(&self) -> PathBuf {
        self.store.path().to_path_buf()
    }

    /// Load the persisted topology
    pub fn load_topology(&self) -> Result<TopologyDescription> {
        self.store
            .load()
            .with_context(|| format!("Could not load topology from {}", self.store.location()))
    }

    /// Registry of built-in checks using this app's SSH client
    pub fn registry(&self) -> CheckRegistry {
        checks::registry(
            self.ssh.clone(),
            self.ssh.clone(),
            Duration::from_secs(self.settings.ssh.timeout_secs),
        )
    }

    /// Context for a verification batch over `topology`
    pub fn run_context(&self, topology: TopologyDescription) -> RunContext {
        RunContext::new(topology, self.settings.checks.clone())
    }
}

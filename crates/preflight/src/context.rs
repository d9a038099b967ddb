//! Run context and provider traits
//!
//! These traits allow check capabilities to reach cluster nodes without the
//! crate depending on a specific transport.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::process::Output;
use topology::TopologyDescription;

/// Remote command execution on a member node
///
/// Implement this trait to provide SSH (or any other) access to nodes.
pub trait RemoteExecutor: Send + Sync {
    /// Run a shell command on `address`
    fn run(&self, address: &str, command: &str) -> Result<CommandOutput>;

    /// Run a command and capture stdout, failing on a non-zero exit
    fn run_capture(&self, address: &str, command: &str) -> Result<String> {
        let output = self.run(address, command)?;
        if !output.success {
            anyhow::bail!("Command failed on {address}: {}", output.stderr_str().trim());
        }
        Ok(output.stdout_str())
    }
}

/// Output from a remote command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub success: bool,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: output.stdout,
            stderr: output.stderr,
            success: output.status.success(),
        }
    }
}

impl CommandOutput {
    /// Get stdout as a string
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    /// Get stderr as a string
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Backup destination the backup checks verify
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BackupTarget {
    S3 {
        bucket: String,
        #[serde(default)]
        region: Option<String>,
    },
    Nfs {
        mount_location: String,
    },
}

/// Check-specific settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckSettings {
    /// Load balancer FQDN clients use to reach the cluster
    #[serde(default)]
    pub fqdn: Option<String>,
    /// TCP ports every node must accept
    #[serde(default)]
    pub firewall_ports: Vec<u16>,
    /// Service account that must exist on every node
    #[serde(default = "default_system_user")]
    pub system_user: String,
    #[serde(default)]
    pub backup: Option<BackupTarget>,
}

fn default_system_user() -> String {
    "hab".to_string()
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            fqdn: None,
            firewall_ports: Vec::new(),
            system_user: default_system_user(),
            backup: None,
        }
    }
}

/// Shared input for every check in a batch
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub topology: TopologyDescription,
    pub settings: CheckSettings,
}

impl RunContext {
    /// Create a context for a topology with the given settings
    pub fn new(topology: TopologyDescription, settings: CheckSettings) -> Self {
        Self { topology, settings }
    }
}

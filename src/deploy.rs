//! Deployment trigger
//!
//! The deploy tool runs in the background; its success or failure is
//! reported in its own log, not observed here.

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::runner;

/// Hands a persisted topology to the external deploy tool
pub trait DeployTrigger {
    /// Start `action`, passing the tool's own auto-confirm flag when asked
    fn trigger(&self, action: &str, auto_confirm: bool) -> Result<()>;
}

/// Runs the cluster control tool from the HA directory
#[derive(Debug, Clone)]
pub struct ClusterCtlTrigger {
    command: String,
    ha_dir: PathBuf,
}

impl ClusterCtlTrigger {
    pub fn new(command: impl Into<String>, ha_dir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            ha_dir: ha_dir.into(),
        }
    }

    /// Where the tool's output goes
    pub fn log_path(&self) -> PathBuf {
        self.ha_dir.join("deploy.log")
    }
}

impl DeployTrigger for ClusterCtlTrigger {
    fn trigger(&self, action: &str, auto_confirm: bool) -> Result<()> {
        let mut args = vec![action];
        if auto_confirm {
            args.push("-y");
        }
        let child = runner::spawn_logged(&self.command, &args, &self.ha_dir, &self.log_path())
            .with_context(|| format!("Failed to start {} {action}", self.command))?;
        log::info!(
            "started {} {} (pid {}), output in {}",
            self.command,
            args.join(" "),
            child.id(),
            self.log_path().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_runs_in_background_and_logs() {
        let dir = tempfile::TempDir::new().unwrap();
        let trigger = ClusterCtlTrigger::new("echo", dir.path());

        trigger.trigger("deploy", true).unwrap();

        let log = trigger.log_path();
        let mut content = String::new();
        for _ in 0..50 {
            content = std::fs::read_to_string(&log).unwrap_or_default();
            if !content.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        assert_eq!(content.trim(), "deploy -y");
    }

    #[test]
    fn test_trigger_missing_tool() {
        let dir = tempfile::TempDir::new().unwrap();
        let trigger = ClusterCtlTrigger::new("no-such-cluster-ctl-binary", dir.path());
        assert!(trigger.trigger("deploy", false).is_err());
    }
}

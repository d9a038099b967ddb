//! SSH access to cluster nodes
//!
//! Wraps the system `ssh` binary. Authentication is key-based and
//! non-interactive; connection timeouts are enforced by ssh itself.

use anyhow::Result;
use preflight::{CommandOutput, RemoteExecutor};
use std::path::PathBuf;
use topology::ReachabilityProbe;

use crate::config::SshSettings;
use crate::runner;

/// Command used to prove SSH access and passwordless sudo
pub const PROBE_COMMAND: &str = "sudo echo 1";

/// Non-interactive SSH client for one user/key pair
#[derive(Debug, Clone)]
pub struct SshClient {
    user: String,
    port: u16,
    key_file: Option<PathBuf>,
    timeout_secs: u64,
}

impl SshClient {
    pub fn new(settings: &SshSettings) -> Self {
        Self {
            user: settings.user.clone(),
            port: settings.port,
            key_file: settings
                .key_file
                .as_deref()
                .map(|k| PathBuf::from(shellexpand::tilde(k).as_ref())),
            timeout_secs: settings.timeout_secs,
        }
    }

    /// Arguments for `ssh` to run `command` on `address`
    fn args(&self, address: &str, command: &str) -> Vec<String> {
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.timeout_secs),
            "-p".to_string(),
            self.port.to_string(),
        ];
        if let Some(key) = &self.key_file {
            args.push("-i".to_string());
            args.push(key.display().to_string());
        }
        args.push(format!("{}@{}", self.user, address));
        args.push(command.to_string());
        args
    }
}

impl RemoteExecutor for SshClient {
    fn run(&self, address: &str, command: &str) -> Result<CommandOutput> {
        let args = self.args(address, command);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        Ok(runner::run_output("ssh", &args)?.into())
    }
}

impl ReachabilityProbe for SshClient {
    fn probe(&self, address: &str) -> topology::Result<()> {
        let output = RemoteExecutor::run(self, address, PROBE_COMMAND).map_err(|e| {
            topology::Error::Connectivity {
                address: address.to_string(),
                message: format!("{e:#}"),
            }
        })?;
        if !output.success {
            return Err(topology::Error::Connectivity {
                address: address.to_string(),
                message: output.stderr_str().trim().to_string(),
            });
        }
        log::debug!("{address} is reachable as {}", self.user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_with_key() {
        let client = SshClient::new(&SshSettings {
            user: "ops".into(),
            port: 2222,
            key_file: Some("/keys/id_ed25519".into()),
            timeout_secs: 5,
        });
        let args = client.args("10.0.0.1", PROBE_COMMAND);
        assert!(args.contains(&"ConnectTimeout=5".to_string()));
        assert!(args.windows(2).any(|w| w == ["-p", "2222"]));
        assert!(args.windows(2).any(|w| w == ["-i", "/keys/id_ed25519"]));
        assert_eq!(args[args.len() - 2], "ops@10.0.0.1");
        assert_eq!(args[args.len() - 1], "sudo echo 1");
    }

    #[test]
    fn test_args_without_key() {
        let client = SshClient::new(&SshSettings::default());
        let args = client.args("10.0.0.1", "true");
        assert!(!args.contains(&"-i".to_string()));
    }
}

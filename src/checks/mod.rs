//! Built-in check capabilities
//!
//! Every identifier in the classification table without a built-in here
//! simply resolves to nothing and is skipped by the orchestrator.

mod backup;
mod certificate;
mod firewall;
mod fqdn;
mod hardware;
mod reachability;
mod system_user;

pub use backup::NfsBackupCheck;
pub use certificate::CertificateCheck;
pub use firewall::FirewallCheck;
pub use fqdn::FqdnCheck;
pub use hardware::HardwareResourceCountCheck;
pub use reachability::SshUserAccessCheck;
pub use system_user::SystemUserCheck;

use preflight::{CheckRegistry, RemoteExecutor, ids};
use std::sync::Arc;
use std::time::Duration;
use topology::ReachabilityProbe;

/// Build the registry of built-in checks
pub fn registry(
    probe: Arc<dyn ReachabilityProbe>,
    executor: Arc<dyn RemoteExecutor>,
    connect_timeout: Duration,
) -> CheckRegistry {
    CheckRegistry::new()
        .with(ids::HARDWARE_RESOURCE_COUNT, Box::new(HardwareResourceCountCheck))
        .with(ids::CERTIFICATE, Box::new(CertificateCheck))
        .with(ids::SSH_USER_ACCESS, Box::new(SshUserAccessCheck::new(probe)))
        .with(ids::FQDN, Box::new(FqdnCheck))
        .with(ids::FIREWALL, Box::new(FirewallCheck::new(connect_timeout)))
        .with(ids::NFS_BACKUP_CONFIG, Box::new(NfsBackupCheck::new(executor.clone())))
        .with(ids::SYSTEM_USER, Box::new(SystemUserCheck::new(executor)))
}

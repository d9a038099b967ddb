//! Check trait for batch verification
//!
//! A Check is an opaque capability registered under a fixed identifier.
//! It returns one result per address it verified.

use crate::context::RunContext;
use crate::types::ApiResult;
use anyhow::Result;
use std::collections::BTreeMap;

/// Results of one check, keyed by node address.
///
/// Coordinator checks with nothing node-specific to report use
/// [`LOCAL_ADDRESS`](crate::types::LOCAL_ADDRESS) as the single key.
pub type CheckOutput = BTreeMap<String, ApiResult>;

/// Identifiers of the known check kinds
pub mod ids {
    pub const HARDWARE_RESOURCE_COUNT: &str = "hardware-resource-count";
    pub const CERTIFICATE: &str = "certificate";
    pub const SSH_USER_ACCESS: &str = "ssh-user-access";
    pub const SYSTEM_RESOURCES: &str = "system-resources";
    pub const SOFTWARE_VERSIONS: &str = "software-versions";
    pub const SYSTEM_USER: &str = "system-user";
    pub const S3_BACKUP_CONFIG: &str = "s3-backup-config";
    pub const FQDN: &str = "fqdn";
    pub const FIREWALL: &str = "firewall";
    pub const EXTERNAL_OPENSEARCH: &str = "external-opensearch";
    pub const OPENSEARCH_S3_BUCKET_ACCESS: &str = "opensearch-s3-bucket-access";
    pub const EXTERNAL_POSTGRESQL: &str = "external-postgresql";
    pub const NFS_BACKUP_CONFIG: &str = "nfs-backup-config";
}

/// Core trait for check capabilities
///
/// # Example
///
/// ```ignore
/// use preflight::{ApiResult, Check, CheckOutput, RunContext, LOCAL_ADDRESS};
///
/// struct AlwaysPasses;
///
/// impl Check for AlwaysPasses {
///     fn run(&self, _ctx: &RunContext) -> anyhow::Result<CheckOutput> {
///         let mut out = CheckOutput::new();
///         out.insert(LOCAL_ADDRESS.into(), ApiResult::pass("always", "ok"));
///         Ok(out)
///     }
/// }
/// ```
pub trait Check: Send + Sync {
    /// Run the check against the cluster.
    ///
    /// Per-node failures belong in the returned results. An `Err` means the
    /// check could not run at all.
    fn run(&self, ctx: &RunContext) -> Result<CheckOutput>;

    /// Short human-readable description
    fn description(&self) -> &'static str {
        ""
    }
}

/// A boxed check for type-erased storage
pub type BoxedCheck = Box<dyn Check>;

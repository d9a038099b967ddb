use anyhow::Result;
use preflight::{
    ApiResult, BackupTarget, Check, CheckOutput, LOCAL_ADDRESS, RemoteExecutor, RunContext, ids,
};
use rayon::prelude::*;
use std::sync::Arc;

/// Verifies that the NFS backup location is mounted on every node
pub struct NfsBackupCheck {
    executor: Arc<dyn RemoteExecutor>,
}

impl NfsBackupCheck {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }
}

impl Check for NfsBackupCheck {
    fn run(&self, ctx: &RunContext) -> Result<CheckOutput> {
        let mount = match &ctx.settings.backup {
            Some(BackupTarget::Nfs { mount_location }) => mount_location,
            other => {
                let reason = match other {
                    Some(BackupTarget::S3 { bucket, .. }) => format!("backups go to s3 bucket {bucket}"),
                    _ => "no backup location configured".to_string(),
                };
                let mut output = CheckOutput::new();
                output.insert(
                    LOCAL_ADDRESS.to_string(),
                    ApiResult::skipped(ids::NFS_BACKUP_CONFIG, reason),
                );
                return Ok(output);
            }
        };
        let command = format!("mountpoint -q '{mount}'");

        let output = ctx
            .topology
            .all_addresses()
            .into_par_iter()
            .map(|address| {
                let result = match self.executor.run(&address, &command) {
                    Ok(out) if out.success => {
                        ApiResult::pass(ids::NFS_BACKUP_CONFIG, format!("{mount} is mounted"))
                    }
                    Ok(_) => ApiResult::fail(
                        ids::NFS_BACKUP_CONFIG,
                        format!("{mount} is not a mount point on {address}"),
                    ),
                    Err(e) => ApiResult::fail(ids::NFS_BACKUP_CONFIG, format!("{e:#}")),
                };
                (address, result)
            })
            .collect();
        Ok(output)
    }

    fn description(&self) -> &'static str {
        "NFS backup mount on every node"
    }
}

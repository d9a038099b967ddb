use anyhow::Result;
use preflight::{ApiResult, Check, CheckOutput, RunContext, ids};
use rayon::prelude::*;
use std::sync::Arc;
use topology::ReachabilityProbe;

/// Verifies SSH access with passwordless sudo on every node
pub struct SshUserAccessCheck {
    probe: Arc<dyn ReachabilityProbe>,
}

impl SshUserAccessCheck {
    pub fn new(probe: Arc<dyn ReachabilityProbe>) -> Self {
        Self { probe }
    }
}

impl Check for SshUserAccessCheck {
    fn run(&self, ctx: &RunContext) -> Result<CheckOutput> {
        let output = ctx
            .topology
            .all_addresses()
            .into_par_iter()
            .map(|address| {
                let result = match self.probe.probe(&address) {
                    Ok(()) => ApiResult::pass(ids::SSH_USER_ACCESS, "SSH connection succeeded"),
                    Err(e) => ApiResult::fail(ids::SSH_USER_ACCESS, e.to_string()),
                };
                (address, result)
            })
            .collect();
        Ok(output)
    }

    fn description(&self) -> &'static str {
        "SSH access and sudo on every node"
    }
}

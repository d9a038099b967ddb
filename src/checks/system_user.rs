use anyhow::Result;
use preflight::{ApiResult, Check, CheckOutput, RemoteExecutor, RunContext, ids};
use rayon::prelude::*;
use std::sync::Arc;

/// Verifies that the service account exists on every node
pub struct SystemUserCheck {
    executor: Arc<dyn RemoteExecutor>,
}

impl SystemUserCheck {
    pub fn new(executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { executor }
    }
}

impl Check for SystemUserCheck {
    fn run(&self, ctx: &RunContext) -> Result<CheckOutput> {
        let user = &ctx.settings.system_user;
        let command = format!("id -u {user}");

        let output = ctx
            .topology
            .all_addresses()
            .into_par_iter()
            .map(|address| {
                let result = match self.executor.run_capture(&address, &command) {
                    Ok(uid) => ApiResult::pass(
                        ids::SYSTEM_USER,
                        format!("user {user} exists (uid {})", uid.trim()),
                    ),
                    Err(e) => ApiResult::fail(ids::SYSTEM_USER, format!("user {user}: {e:#}")),
                };
                (address, result)
            })
            .collect();
        Ok(output)
    }

    fn description(&self) -> &'static str {
        "Service account on every node"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::fakes::FakeNodes;
    use preflight::CheckSettings;
    use topology::{RoleGroup, TopologyDescription};

    fn topology() -> TopologyDescription {
        TopologyDescription {
            control_plane: RoleGroup::with_addresses(["10.0.0.1"]),
            search: RoleGroup::with_addresses(["10.0.0.5"]),
            ..Default::default()
        }
    }

    #[test]
    fn test_user_present() {
        let check = SystemUserCheck::new(Arc::new(FakeNodes {
            down: vec!["10.0.0.5".into()],
        }));
        let output = check
            .run(&RunContext::new(topology(), CheckSettings::default()))
            .unwrap();
        assert_eq!(output["10.0.0.1"].message, "user hab exists (uid 42)");
        assert!(!output["10.0.0.5"].passed);
    }

    #[test]
    fn test_user_missing() {
        let check = SystemUserCheck::new(Arc::new(FakeNodes::default()));
        let settings = CheckSettings {
            system_user: "nobody-here".into(),
            ..Default::default()
        };
        let output = check.run(&RunContext::new(topology(), settings)).unwrap();
        assert!(output.values().all(|r| !r.passed));
        assert!(output["10.0.0.1"].message.contains("no such user"));
    }
}

use anyhow::Result;
use preflight::{ApiResult, Check, CheckOutput, LOCAL_ADDRESS, RunContext, ids};
use serde_json::json;
use std::net::ToSocketAddrs;

/// Resolves the load balancer FQDN from the coordinating host
pub struct FqdnCheck;

impl Check for FqdnCheck {
    fn run(&self, ctx: &RunContext) -> Result<CheckOutput> {
        let result = match ctx.settings.fqdn.as_deref() {
            None | Some("") => ApiResult::skipped(ids::FQDN, "no FQDN configured"),
            Some(fqdn) => match (fqdn, 443).to_socket_addrs() {
                Ok(addrs) => {
                    let resolved: Vec<String> = addrs.map(|a| a.ip().to_string()).collect();
                    if resolved.is_empty() {
                        ApiResult::fail(ids::FQDN, format!("{fqdn} resolved to no address"))
                    } else {
                        ApiResult::pass(ids::FQDN, format!("{fqdn} is resolvable"))
                            .with_details(json!({ "addresses": resolved }))
                    }
                }
                Err(e) => ApiResult::fail(ids::FQDN, format!("cannot resolve {fqdn}: {e}")),
            },
        };

        let mut output = CheckOutput::new();
        output.insert(LOCAL_ADDRESS.to_string(), result);
        Ok(output)
    }

    fn description(&self) -> &'static str {
        "Load balancer FQDN resolution"
    }
}

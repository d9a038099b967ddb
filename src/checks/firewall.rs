use anyhow::Result;
use preflight::{ApiResult, Check, CheckOutput, LOCAL_ADDRESS, RunContext, ids};
use rayon::prelude::*;
use serde_json::json;
use std::net::{IpAddr, SocketAddr, TcpStream};
use std::time::Duration;

/// Verifies that every node accepts TCP connections on the configured ports
pub struct FirewallCheck {
    timeout: Duration,
}

impl FirewallCheck {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Ports on `address` that refused or timed out
    fn closed_ports(&self, address: &str, ports: &[u16]) -> Result<Vec<u16>> {
        let ip: IpAddr = address.parse()?;
        Ok(ports
            .iter()
            .copied()
            .filter(|port| {
                let target = SocketAddr::new(ip, *port);
                match TcpStream::connect_timeout(&target, self.timeout) {
                    Ok(_) => false,
                    Err(e) => {
                        log::debug!("{target}: {e}");
                        true
                    }
                }
            })
            .collect())
    }
}

impl Check for FirewallCheck {
    fn run(&self, ctx: &RunContext) -> Result<CheckOutput> {
        let ports = &ctx.settings.firewall_ports;
        if ports.is_empty() {
            let mut output = CheckOutput::new();
            output.insert(
                LOCAL_ADDRESS.to_string(),
                ApiResult::skipped(ids::FIREWALL, "no firewall ports configured"),
            );
            return Ok(output);
        }

        let output = ctx
            .topology
            .all_addresses()
            .into_par_iter()
            .map(|address| {
                let result = match self.closed_ports(&address, ports) {
                    Ok(closed) if closed.is_empty() => {
                        ApiResult::pass(ids::FIREWALL, format!("{} port(s) reachable", ports.len()))
                    }
                    Ok(closed) => {
                        let list: Vec<String> = closed.iter().map(u16::to_string).collect();
                        ApiResult::fail(
                            ids::FIREWALL,
                            format!("port(s) {} not reachable on {address}", list.join(", ")),
                        )
                        .with_details(json!({ "closed_ports": closed }))
                    }
                    Err(e) => ApiResult::fail(ids::FIREWALL, format!("invalid address {address}: {e}")),
                };
                (address, result)
            })
            .collect();
        Ok(output)
    }

    fn description(&self) -> &'static str {
        "TCP ports open on every node"
    }
}

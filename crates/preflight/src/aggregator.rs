//! Result aggregation - turns per-address results into a batch report

use crate::orchestrator::BatchResults;
use crate::types::{BATCH_STATUS_SUCCESS, BatchCheckResponse, NodeReport};
use topology::TopologyDescription;

/// Build the final response.
///
/// Node reports follow address order. Each node is classified by the first
/// role listing its address; addresses outside the topology (such as the
/// coordinator sentinel) get an empty role.
pub fn build_report(results: BatchResults, topology: &TopologyDescription) -> BatchCheckResponse {
    let result = results
        .into_iter()
        .map(|(ip, tests)| {
            let roles = topology.roles_of(&ip);
            if roles.len() > 1 {
                log::warn!(
                    "{ip} is configured for {} roles; reporting it as {}",
                    roles.len(),
                    roles[0]
                );
            }
            let node_type = roles.first().map(|r| r.as_str()).unwrap_or_default();
            NodeReport {
                node_type: node_type.to_string(),
                ip,
                tests,
            }
        })
        .collect();

    BatchCheckResponse {
        status: BATCH_STATUS_SUCCESS.to_string(),
        result,
    }
}

//! Validation of proposed membership changes
//!
//! Validation is exhaustive: every check runs for every proposed address so
//! a single invocation reports every defect at once.

use crate::error::Result;
use crate::types::{ProposedAddresses, Role, TopologyDescription};
use std::net::IpAddr;

/// Live connectivity test against a candidate node.
///
/// Implementations open a secured remote-execution channel to `address` and
/// run a trivial privileged command. Timeouts and retries belong to the
/// implementation.
pub trait ReachabilityProbe: Send + Sync {
    /// Probe a single address, returning a connectivity error on failure
    fn probe(&self, address: &str) -> Result<()>;
}

/// Message emitted for a data-tier role when the database is external
pub fn frozen_data_tier_message(action: &str) -> String {
    format!(
        "Cannot {action} Search or Database nodes if the external database mode is \
         managed-cloud or self-managed. Set external_database to \"none\" to {action} data-tier nodes"
    )
}

/// Check an address for IP syntax
pub fn is_valid_address(address: &str) -> bool {
    address.parse::<IpAddr>().is_ok()
}

/// Validates proposed addresses against the topology and a probe
pub struct TopologyValidator<'a> {
    probe: &'a dyn ReachabilityProbe,
}

impl<'a> TopologyValidator<'a> {
    /// Create a validator using the given probe
    pub fn new(probe: &'a dyn ReachabilityProbe) -> Self {
        Self { probe }
    }

    /// Validate addresses to be added.
    ///
    /// Returns every error found, in role order then input order. An empty
    /// list means the request may be applied.
    pub fn validate(
        &self,
        proposed: &ProposedAddresses,
        topology: &TopologyDescription,
    ) -> Vec<String> {
        let mut errors = Vec::new();
        for (role, addresses) in proposed.iter() {
            if role.is_data_tier() && topology.is_data_tier_frozen() {
                errors.push(frozen_data_tier_message("add"));
                continue;
            }
            errors.extend(self.validate_role(role, addresses, topology));
        }
        errors.extend(proposed_for_several_roles(proposed));
        errors
    }

    fn validate_role(
        &self,
        role: Role,
        addresses: &[String],
        topology: &TopologyDescription,
    ) -> Vec<String> {
        let name = role.display_name();
        let mut errors = Vec::new();
        for address in addresses {
            if topology.contains_address(address) {
                errors.push(format!(
                    "{name} IP {address} is already configured for a node. Please use a different private IP."
                ));
            }
            if !is_valid_address(address) {
                errors.push(format!("Incorrect {name} IP address format for IP {address}"));
            }
            if let Err(e) = self.probe.probe(address) {
                log::debug!("probe for {address} failed: {e}");
                errors.push(format!("{name} IP address {address} is unreachable"));
            }
        }
        errors
    }
}

/// One error per address requested for more than one role
fn proposed_for_several_roles(proposed: &ProposedAddresses) -> Vec<String> {
    let mut seen: Vec<(&str, Vec<Role>)> = Vec::new();
    for (role, addresses) in proposed.iter() {
        for address in addresses {
            match seen.iter_mut().find(|(a, _)| *a == address.as_str()) {
                Some((_, roles)) if !roles.contains(&role) => roles.push(role),
                Some(_) => {}
                None => seen.push((address.as_str(), vec![role])),
            }
        }
    }
    seen.into_iter()
        .filter(|(_, roles)| roles.len() > 1)
        .map(|(address, roles)| {
            let names: Vec<&str> = roles.iter().map(Role::display_name).collect();
            format!(
                "IP {address} is proposed for more than one role ({}). Please use a different private IP for each role.",
                names.join(", ")
            )
        })
        .collect()
}

/// Validate addresses to be removed.
///
/// No probe is needed: the nodes are being taken out of the cluster.
pub fn validate_removal(proposed: &ProposedAddresses, topology: &TopologyDescription) -> Vec<String> {
    let mut errors = Vec::new();
    for (role, addresses) in proposed.iter() {
        if role.is_data_tier() && topology.is_data_tier_frozen() {
            errors.push(frozen_data_tier_message("remove"));
            continue;
        }
        let group = topology.group(role);
        let name = role.display_name();
        for address in addresses {
            if !group.contains(address) {
                errors.push(format!("{name} IP {address} is not part of the cluster"));
            }
        }
        let remaining = group
            .addresses
            .iter()
            .filter(|a| !addresses.contains(*a))
            .count();
        if remaining == 0 {
            errors.push(format!("Cannot remove every {name} node"));
        }
    }
    errors
}

//! In-memory mutation of role groups
//!
//! Mutations keep `instance_count == len(addresses) == len(certs_by_address)`
//! for every group they touch. They are atomic per group only: a failure on
//! one role leaves groups mutated earlier as they are, and callers discard
//! the whole working copy on any failure.

use crate::error::{Error, Result};
use crate::types::{CertMetadata, ProposedAddresses, Role, RoleGroup, TopologyDescription};

/// Append new addresses to a group.
///
/// Fails without touching the group if any address is already listed, or
/// appears twice in `addresses`.
pub fn apply_new_addresses(group: &mut RoleGroup, role: Role, addresses: &[String]) -> Result<()> {
    for (i, address) in addresses.iter().enumerate() {
        if group.contains(address) || group.certs_by_address.contains_key(address) {
            return Err(Error::config(format!(
                "{} address {address} is already configured",
                role.display_name()
            )));
        }
        if addresses[..i].contains(address) {
            return Err(Error::config(format!(
                "{} address {address} was given more than once",
                role.display_name()
            )));
        }
    }

    for address in addresses {
        group.addresses.push(address.clone());
        group
            .certs_by_address
            .insert(address.clone(), CertMetadata::placeholder());
    }
    group.instance_count += addresses.len();
    log::debug!(
        "{role}: added {} node(s), instance count now {}",
        addresses.len(),
        group.instance_count
    );
    Ok(())
}

/// Remove addresses from a group.
///
/// Fails without touching the group if any address is not listed.
pub fn remove_addresses(group: &mut RoleGroup, role: Role, addresses: &[String]) -> Result<()> {
    if let Some(missing) = addresses.iter().find(|a| !group.contains(a)) {
        return Err(Error::config(format!(
            "{} address {missing} is not configured",
            role.display_name()
        )));
    }

    let before = group.addresses.len();
    group.addresses.retain(|a| !addresses.contains(a));
    for address in addresses {
        group.certs_by_address.remove(address);
    }
    group.instance_count -= before - group.addresses.len();
    log::debug!(
        "{role}: removed {} node(s), instance count now {}",
        before - group.addresses.len(),
        group.instance_count
    );
    Ok(())
}

/// Apply every role of a request, in role order.
///
/// Stops at the first failing role; earlier roles stay mutated.
pub fn apply_all(topology: &mut TopologyDescription, proposed: &ProposedAddresses) -> Result<()> {
    for (role, addresses) in proposed.iter() {
        apply_new_addresses(topology.group_mut(role), role, addresses).map_err(|e| {
            Error::config(format!(
                "error modifying {} instance count: {e}",
                role.display_name()
            ))
        })?;
    }
    Ok(())
}

/// Remove every role of a request, in role order.
pub fn remove_all(topology: &mut TopologyDescription, proposed: &ProposedAddresses) -> Result<()> {
    for (role, addresses) in proposed.iter() {
        remove_addresses(topology.group_mut(role), role, addresses).map_err(|e| {
            Error::config(format!(
                "error modifying {} instance count: {e}",
                role.display_name()
            ))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addrs(list: &[&str]) -> Vec<String> {
        list.iter().map(|a| (*a).to_string()).collect()
    }

    fn topology() -> TopologyDescription {
        TopologyDescription {
            control_plane: RoleGroup::with_addresses(["10.0.0.1"]),
            gateway: RoleGroup::with_addresses(["10.0.1.1"]),
            ..Default::default()
        }
    }

    #[test]
    fn test_apply_appends_and_keeps_invariant() {
        let mut group = RoleGroup::with_addresses(["10.0.0.1"]);
        apply_new_addresses(&mut group, Role::ControlPlane, &addrs(&["10.0.0.2", "10.0.0.3"]))
            .unwrap();

        assert_eq!(group.addresses, addrs(&["10.0.0.1", "10.0.0.2", "10.0.0.3"]));
        assert_eq!(group.instance_count, 3);
        assert!(group.certs_by_address["10.0.0.3"].is_placeholder());
        assert!(group.check_consistency(Role::ControlPlane).is_ok());
    }

    #[test]
    fn test_apply_twice_fails_on_same_copy() {
        let mut topo = topology();
        let proposed = ProposedAddresses::new().with(Role::Gateway, &["10.0.1.2"]);

        apply_all(&mut topo, &proposed).unwrap();
        let snapshot = topo.clone();
        let err = apply_all(&mut topo, &proposed).unwrap_err();

        assert!(err.to_string().contains("already configured"));
        assert_eq!(topo, snapshot);
        assert!(topo.check_consistency().is_ok());
    }

    #[test]
    fn test_apply_deterministic_on_independent_copies() {
        let original = topology();
        let proposed = ProposedAddresses::new()
            .with(Role::ControlPlane, &["10.0.0.5", "10.0.0.4"])
            .with(Role::Search, &["10.0.2.1"]);

        let mut a = original.clone();
        let mut b = original.clone();
        apply_all(&mut a, &proposed).unwrap();
        apply_all(&mut b, &proposed).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, original);
        assert_eq!(a.search.instance_count, 1);
    }

    #[test]
    fn test_apply_rejects_repeated_input() {
        let mut group = RoleGroup::default();
        let err = apply_new_addresses(&mut group, Role::Database, &addrs(&["10.0.3.1", "10.0.3.1"]))
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
        assert_eq!(group, RoleGroup::default());
    }

    #[test]
    fn test_apply_all_is_not_atomic_across_roles() {
        let mut topo = topology();
        let proposed = ProposedAddresses::new()
            .with(Role::ControlPlane, &["10.0.0.9"])
            .with(Role::Gateway, &["10.0.1.1"]);

        assert!(apply_all(&mut topo, &proposed).is_err());
        assert_eq!(topo.control_plane.instance_count, 2);
        assert_eq!(topo.gateway.instance_count, 1);
        assert!(topo.check_consistency().is_ok());
    }

    #[test]
    fn test_remove_keeps_invariant() {
        let mut group = RoleGroup::with_addresses(["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        remove_addresses(&mut group, Role::ControlPlane, &addrs(&["10.0.0.2"])).unwrap();

        assert_eq!(group.addresses, addrs(&["10.0.0.1", "10.0.0.3"]));
        assert_eq!(group.instance_count, 2);
        assert!(!group.certs_by_address.contains_key("10.0.0.2"));
        assert!(group.check_consistency(Role::ControlPlane).is_ok());
    }

    #[test]
    fn test_remove_unknown_fails_untouched() {
        let mut group = RoleGroup::with_addresses(["10.0.0.1"]);
        let before = group.clone();
        assert!(remove_addresses(&mut group, Role::Gateway, &addrs(&["10.0.0.1", "10.9.9.9"])).is_err());
        assert_eq!(group, before);
    }
}

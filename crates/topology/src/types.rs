//! Core types for the cluster topology model

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the four fixed node roles.
///
/// Declaration order is the canonical role order used for lookups,
/// validation and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Control-plane nodes (UI, API, coordination)
    ControlPlane,
    /// Application-gateway nodes
    Gateway,
    /// Data tier A: search cluster
    Search,
    /// Data tier B: relational database cluster
    Database,
}

impl Role {
    /// All roles in canonical order
    pub const ALL: [Role; 4] = [Role::ControlPlane, Role::Gateway, Role::Search, Role::Database];

    /// Machine-readable tag, as used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ControlPlane => "control-plane",
            Self::Gateway => "gateway",
            Self::Search => "search",
            Self::Database => "database",
        }
    }

    /// Human-readable name used in messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::ControlPlane => "Control-Plane",
            Self::Gateway => "Gateway",
            Self::Search => "Search",
            Self::Database => "Database",
        }
    }

    /// Whether this role belongs to the data tier
    pub fn is_data_tier(&self) -> bool {
        matches!(self, Self::Search | Self::Database)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the data tier is hosted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExternalDatabaseMode {
    /// Data tier runs on cluster nodes
    #[default]
    #[serde(alias = "")]
    None,
    /// Managed cloud database service
    #[serde(alias = "aws")]
    ManagedCloud,
    /// Customer-operated external database
    SelfManaged,
}

impl ExternalDatabaseMode {
    /// Whether data-tier role groups are externally managed and frozen
    pub fn is_external(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// How the cluster nodes were provisioned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    /// Nodes are pre-existing machines listed by address
    #[default]
    ExistingNodes,
    /// Nodes are provisioned by a cloud provider
    CloudProvisioned,
}

/// Certificate metadata for a single node.
///
/// An entry with every field empty is a placeholder: the deploy tool
/// generates certificates for it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_dn: Option<String>,
}

impl CertMetadata {
    /// Placeholder entry for a newly added node
    pub fn placeholder() -> Self {
        Self::default()
    }

    /// Check if this is a placeholder entry
    pub fn is_placeholder(&self) -> bool {
        self.public_key.is_none() && self.private_key.is_none() && self.node_dn.is_none()
    }
}

/// Members and per-role configuration of one role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGroup {
    #[serde(default)]
    pub instance_count: usize,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default)]
    pub certs_by_address: BTreeMap<String, CertMetadata>,
}

impl RoleGroup {
    /// Build a consistent group with placeholder certificates
    pub fn with_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let addresses: Vec<String> = addresses.into_iter().map(Into::into).collect();
        let certs_by_address = addresses
            .iter()
            .map(|a| (a.clone(), CertMetadata::placeholder()))
            .collect();
        Self {
            instance_count: addresses.len(),
            addresses,
            certs_by_address,
        }
    }

    /// Check if the group lists an address
    pub fn contains(&self, address: &str) -> bool {
        self.addresses.iter().any(|a| a == address)
    }

    /// Verify `instance_count == len(addresses) == len(certs_by_address)`
    /// and that the certificate keys match the address list.
    pub fn check_consistency(&self, role: Role) -> Result<()> {
        let name = role.display_name();
        if self.instance_count != self.addresses.len() {
            return Err(Error::config(format!(
                "{name} instance count {} does not match {} configured addresses",
                self.instance_count,
                self.addresses.len()
            )));
        }
        if self.certs_by_address.len() != self.addresses.len() {
            return Err(Error::config(format!(
                "{name} has {} certificate entries for {} addresses",
                self.certs_by_address.len(),
                self.addresses.len()
            )));
        }
        for (i, address) in self.addresses.iter().enumerate() {
            if self.addresses[..i].contains(address) {
                return Err(Error::config(format!(
                    "{name} address {address} is listed more than once"
                )));
            }
            if !self.certs_by_address.contains_key(address) {
                return Err(Error::config(format!(
                    "{name} address {address} has no certificate entry"
                )));
            }
        }
        Ok(())
    }
}

/// The full declarative record of cluster membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescription {
    #[serde(default)]
    pub deployment_mode: DeploymentMode,
    #[serde(default)]
    pub external_database: ExternalDatabaseMode,
    #[serde(default)]
    pub control_plane: RoleGroup,
    #[serde(default)]
    pub gateway: RoleGroup,
    #[serde(default)]
    pub search: RoleGroup,
    #[serde(default)]
    pub database: RoleGroup,
}

impl TopologyDescription {
    /// Get the group for a role
    pub fn group(&self, role: Role) -> &RoleGroup {
        match role {
            Role::ControlPlane => &self.control_plane,
            Role::Gateway => &self.gateway,
            Role::Search => &self.search,
            Role::Database => &self.database,
        }
    }

    /// Get the group for a role, mutably
    pub fn group_mut(&mut self, role: Role) -> &mut RoleGroup {
        match role {
            Role::ControlPlane => &mut self.control_plane,
            Role::Gateway => &mut self.gateway,
            Role::Search => &mut self.search,
            Role::Database => &mut self.database,
        }
    }

    /// Classify an address: first matching role in canonical order
    pub fn role_of(&self, address: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| self.group(*r).contains(address))
    }

    /// Every role listing this address
    pub fn roles_of(&self, address: &str) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.group(*r).contains(address))
            .collect()
    }

    /// Check if any role lists this address
    pub fn contains_address(&self, address: &str) -> bool {
        self.role_of(address).is_some()
    }

    /// All member addresses in role order, without repeats
    pub fn all_addresses(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for role in Role::ALL {
            for address in &self.group(role).addresses {
                if !out.contains(address) {
                    out.push(address.clone());
                }
            }
        }
        out
    }

    /// Addresses listed under more than one role
    pub fn cross_role_duplicates(&self) -> Vec<(String, Vec<Role>)> {
        self.all_addresses()
            .into_iter()
            .filter_map(|a| {
                let roles = self.roles_of(&a);
                (roles.len() > 1).then_some((a, roles))
            })
            .collect()
    }

    /// Whether no more addresses may be added to data-tier roles
    pub fn is_data_tier_frozen(&self) -> bool {
        self.external_database.is_external()
    }

    /// Verify the per-role invariants.
    ///
    /// Cross-role duplicates are logged, not rejected.
    pub fn check_consistency(&self) -> Result<()> {
        for role in Role::ALL {
            self.group(role).check_consistency(role)?;
        }
        for (address, roles) in self.cross_role_duplicates() {
            let names: Vec<&str> = roles.iter().map(Role::as_str).collect();
            log::warn!(
                "address {address} is configured for several roles ({}); treating it as {}",
                names.join(", "),
                roles[0]
            );
        }
        Ok(())
    }
}

/// Addresses requested for each role, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposedAddresses {
    by_role: BTreeMap<Role, Vec<String>>,
}

impl ProposedAddresses {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the addresses for a role; empty lists are dropped
    pub fn set(&mut self, role: Role, addresses: Vec<String>) {
        if addresses.is_empty() {
            self.by_role.remove(&role);
        } else {
            self.by_role.insert(role, addresses);
        }
    }

    /// Set the addresses for a role from a comma-separated list
    pub fn set_csv(&mut self, role: Role, csv: &str) {
        self.set(role, split_csv(csv));
    }

    /// Builder-style variant of [`set`](Self::set)
    pub fn with(mut self, role: Role, addresses: &[&str]) -> Self {
        self.set(role, addresses.iter().map(|a| (*a).to_string()).collect());
        self
    }

    /// Addresses for a role (empty if none were requested)
    pub fn get(&self, role: Role) -> &[String] {
        self.by_role.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if no role has any address
    pub fn is_empty(&self) -> bool {
        self.by_role.is_empty()
    }

    /// Roles with a non-empty list, in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Role, &[String])> {
        self.by_role.iter().map(|(r, a)| (*r, a.as_slice()))
    }

    /// Total number of requested addresses
    pub fn len(&self) -> usize {
        self.by_role.values().map(Vec::len).sum()
    }
}

/// Split a comma-separated address list, trimming blanks
pub fn split_csv(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

//! # Topology
//!
//! Declarative model of a multi-role cluster and the operations that evolve it.
//!
//! ## Core Concepts
//!
//! - **TopologyDescription**: four role groups plus the external database mode
//! - **RoleGroup**: instance count, ordered addresses and certificate metadata
//! - **TopologyValidator**: exhaustive validation of proposed addresses
//! - **Mutation**: append/remove addresses while keeping counts consistent
//! - **TopologyStore**: whole-document persistence
//!
//! ## Example
//!
//! ```ignore
//! use topology::{FileStore, ProposedAddresses, Role, TopologyStore, TopologyValidator};
//!
//! let store = FileStore::new("/hab/ha/config.toml");
//! let current = store.load()?;
//!
//! let proposed = ProposedAddresses::new().with(Role::Gateway, &["10.0.1.7"]);
//! let errors = TopologyValidator::new(&probe).validate(&proposed, &current);
//! if errors.is_empty() {
//!     let mut next = current.clone();
//!     topology::apply_all(&mut next, &proposed)?;
//!     store.save(&next)?;
//! }
//! ```
//!
//! The reachability probe is a trait ([`ReachabilityProbe`]) so the crate has
//! no dependency on any particular SSH implementation.

pub mod error;
pub mod mutate;
pub mod store;
pub mod types;
pub mod validate;

pub use error::{Error, ErrorCategory, Result};
pub use mutate::{apply_all, apply_new_addresses, remove_addresses, remove_all};
pub use store::{FileStore, TopologyStore};
pub use types::{
    CertMetadata, DeploymentMode, ExternalDatabaseMode, ProposedAddresses, Role, RoleGroup,
    TopologyDescription, split_csv,
};
pub use validate::{ReachabilityProbe, TopologyValidator, is_valid_address, validate_removal};

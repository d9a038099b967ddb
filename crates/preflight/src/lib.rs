//! # Preflight
//!
//! Batch verification of cluster nodes.
//!
//! ## Core Concepts
//!
//! - **Check**: an opaque capability registered under a fixed identifier
//! - **CheckRegistry**: identifier → capability table built at startup
//! - **BatchOrchestrator**: runs coordinator checks concurrently and per-node
//!   checks sequentially, keeping results in requested order
//! - **build_report**: classifies each node and produces the batch response
//!
//! ## Example
//!
//! ```ignore
//! use preflight::{BatchOrchestrator, CheckRegistry, RunContext, build_report};
//!
//! let registry = CheckRegistry::new().with("fqdn", Box::new(FqdnCheck));
//! let ctx = RunContext::new(topology.clone(), settings);
//!
//! let results = BatchOrchestrator::new(&registry).run_batch(&requested, &ctx);
//! let response = build_report(results, &ctx.topology);
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```
//!
//! ## Provider Traits
//!
//! - [`RemoteExecutor`]: runs commands on member nodes for checks that need it

pub mod aggregator;
pub mod check;
pub mod context;
pub mod orchestrator;
pub mod registry;
pub mod types;

pub use aggregator::build_report;
pub use check::{BoxedCheck, Check, CheckOutput, ids};
pub use context::{BackupTarget, CheckSettings, CommandOutput, RemoteExecutor, RunContext};
pub use orchestrator::{BatchOrchestrator, BatchResults, COORDINATOR_CHECKS, PER_NODE_CHECKS, classify};
pub use registry::CheckRegistry;
pub use types::{
    ApiResult, BATCH_STATUS_SUCCESS, BatchCheckResponse, BatchSummary, CheckClass, CheckStatus,
    LOCAL_ADDRESS, NodeReport,
};

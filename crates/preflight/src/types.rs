//! Core types for batch verification

use serde::{Deserialize, Serialize};

/// Sentinel address for results produced on the coordinating host
pub const LOCAL_ADDRESS: &str = "local";

/// Overall batch status. Check failures never change it.
pub const BATCH_STATUS_SUCCESS: &str = "SUCCESS";

/// Where a check runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckClass {
    /// Once, from the coordinating host
    Coordinator,
    /// Against every member node
    PerNode,
}

/// Status of a single check on a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckStatus {
    Success,
    Failed,
    Skipped,
}

/// One check's outcome for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResult {
    pub check: String,
    pub passed: bool,
    pub status: CheckStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl ApiResult {
    /// Passing result
    pub fn pass(check: &str, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            passed: true,
            status: CheckStatus::Success,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    /// Failing result
    pub fn fail(check: &str, message: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            passed: false,
            status: CheckStatus::Failed,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    /// Result for a check that had nothing to verify
    pub fn skipped(check: &str, reason: impl Into<String>) -> Self {
        Self {
            check: check.to_string(),
            passed: false,
            status: CheckStatus::Skipped,
            message: reason.into(),
            details: serde_json::Value::Null,
        }
    }

    /// Attach an opaque payload
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Report for one node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeReport {
    pub ip: String,
    pub node_type: String,
    pub tests: Vec<ApiResult>,
}

/// Final output of a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCheckResponse {
    pub status: String,
    pub result: Vec<NodeReport>,
}

/// Counts of check outcomes across a response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    /// Total number of results
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Check if nothing failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl BatchCheckResponse {
    /// Tally every test in the response
    pub fn summary(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();
        for test in self.result.iter().flat_map(|n| n.tests.iter()) {
            match test.status {
                CheckStatus::Success => summary.passed += 1,
                CheckStatus::Failed => summary.failed += 1,
                CheckStatus::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

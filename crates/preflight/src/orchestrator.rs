//! Batch orchestrator - runs requested checks and collects per-node results
//!
//! Coordinator checks run concurrently, one scoped thread per check. Per-node checks
//! run one after another; each of them already fans out to every node, so
//! running them in parallel here would multiply outbound connections.
//!
//! Results are stored under `(address, requested index)` and projected into
//! per-address sequences once every task has reported, so the output order
//! follows the request and never the completion order.

use crate::check::{Check, CheckOutput, ids};
use crate::context::RunContext;
use crate::registry::CheckRegistry;
use crate::types::{ApiResult, CheckClass, LOCAL_ADDRESS};
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc;
use std::thread;

/// Checks run once from the coordinating host
pub const COORDINATOR_CHECKS: &[&str] = &[
    ids::HARDWARE_RESOURCE_COUNT,
    ids::CERTIFICATE,
    ids::SSH_USER_ACCESS,
    ids::S3_BACKUP_CONFIG,
    ids::FQDN,
    ids::FIREWALL,
    ids::EXTERNAL_OPENSEARCH,
    ids::OPENSEARCH_S3_BUCKET_ACCESS,
    ids::EXTERNAL_POSTGRESQL,
    ids::NFS_BACKUP_CONFIG,
];

/// Checks that target every member node
pub const PER_NODE_CHECKS: &[&str] = &[
    ids::SYSTEM_RESOURCES,
    ids::SOFTWARE_VERSIONS,
    ids::SYSTEM_USER,
];

/// Classify a check identifier
pub fn classify(id: &str) -> Option<CheckClass> {
    if COORDINATOR_CHECKS.contains(&id) {
        Some(CheckClass::Coordinator)
    } else if PER_NODE_CHECKS.contains(&id) {
        Some(CheckClass::PerNode)
    } else {
        None
    }
}

/// Per-address results, each sequence in requested check order
pub type BatchResults = BTreeMap<String, Vec<ApiResult>>;

/// A resolved, classified check awaiting dispatch
struct PlannedCheck<'r> {
    index: usize,
    id: String,
    class: CheckClass,
    check: &'r dyn Check,
}

/// Runs batches of checks from a registry
pub struct BatchOrchestrator<'r> {
    registry: &'r CheckRegistry,
}

impl<'r> BatchOrchestrator<'r> {
    /// Create an orchestrator over a registry
    pub fn new(registry: &'r CheckRegistry) -> Self {
        Self { registry }
    }

    /// Run every requested check exactly once.
    ///
    /// Unknown and duplicate identifiers are dropped before dispatch.
    pub fn run_batch(&self, check_ids: &[String], ctx: &RunContext) -> BatchResults {
        let planned = self.plan(check_ids);
        let (coordinator, per_node): (Vec<_>, Vec<_>) = planned
            .iter()
            .partition(|p| p.class == CheckClass::Coordinator);

        let mut slots: BTreeMap<(String, usize), ApiResult> = BTreeMap::new();

        if !coordinator.is_empty() {
            log::debug!("dispatching {} coordinator check(s)", coordinator.len());
            for (index, output) in run_concurrently(&coordinator, ctx) {
                collect(&mut slots, index, output);
            }
        }

        for planned in per_node {
            log::debug!("running per-node check {}", planned.id);
            let output = run_guarded(planned, ctx);
            collect(&mut slots, planned.index, output);
        }

        project(slots)
    }

    fn plan(&self, check_ids: &[String]) -> Vec<PlannedCheck<'r>> {
        let mut planned: Vec<PlannedCheck<'r>> = Vec::new();
        for (index, id) in check_ids.iter().enumerate() {
            if planned.iter().any(|p| &p.id == id) {
                log::debug!("check {id} requested more than once; running it once");
                continue;
            }
            let Some(check) = self.registry.resolve(id) else {
                log::warn!("unknown check {id}; skipping");
                continue;
            };
            let Some(class) = classify(id) else {
                log::warn!("check {id} has no dispatch class; skipping");
                continue;
            };
            planned.push(PlannedCheck {
                index,
                id: id.clone(),
                class,
                check,
            });
        }
        planned
    }
}

/// Run coordinator checks on one scoped thread each.
///
/// Each task sends exactly once on a channel bounded to the number of
/// checks, and the channel is drained exactly that many times. The threads
/// are not rayon workers, so parallel iterators inside a check run on the
/// global pool.
fn run_concurrently(checks: &[&PlannedCheck<'_>], ctx: &RunContext) -> Vec<(usize, CheckOutput)> {
    let (tx, rx) = mpsc::sync_channel::<(usize, CheckOutput)>(checks.len());

    thread::scope(|scope| {
        for planned in checks {
            let task_tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("check-{}", planned.id))
                .spawn_scoped(scope, move || {
                    let output = run_guarded(planned, ctx);
                    if task_tx.send((planned.index, output)).is_err() {
                        log::error!("result channel closed before {} reported", planned.id);
                    }
                });
            if let Err(e) = spawned {
                log::warn!("failed to start a thread for {} ({e}); running it inline", planned.id);
                let _ = tx.send((planned.index, run_guarded(planned, ctx)));
            }
        }
    });
    drop(tx);

    (0..checks.len()).filter_map(|_| rx.recv().ok()).collect()
}

/// Run a check, turning errors and panics into a failed result
fn run_guarded(planned: &PlannedCheck<'_>, ctx: &RunContext) -> CheckOutput {
    let outcome = catch_unwind(AssertUnwindSafe(|| planned.check.run(ctx)));
    let failure = match outcome {
        Ok(Ok(output)) => return output,
        Ok(Err(e)) => format!("{} check failed: {e:#}", planned.id),
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            format!("{} check panicked: {detail}", planned.id)
        }
    };
    log::warn!("{failure}");
    let mut output = CheckOutput::new();
    output.insert(LOCAL_ADDRESS.to_string(), ApiResult::fail(&planned.id, failure));
    output
}

fn collect(slots: &mut BTreeMap<(String, usize), ApiResult>, index: usize, output: CheckOutput) {
    for (address, result) in output {
        slots.insert((address, index), result);
    }
}

/// Group slots by address; BTreeMap ordering sorts each group by index
fn project(slots: BTreeMap<(String, usize), ApiResult>) -> BatchResults {
    let mut results = BatchResults::new();
    for ((address, _), result) in slots {
        results.entry(address).or_default().push(result);
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Reports a pass for each configured address after a delay
    struct TimedCheck {
        id: &'static str,
        delay_ms: u64,
        addresses: Vec<&'static str>,
        finished: Option<&'static Mutex<Vec<&'static str>>>,
    }

    impl TimedCheck {
        fn new(id: &'static str, delay_ms: u64, addresses: &[&'static str]) -> Self {
            Self {
                id,
                delay_ms,
                addresses: addresses.to_vec(),
                finished: None,
            }
        }
    }

    impl Check for TimedCheck {
        fn run(&self, _ctx: &RunContext) -> anyhow::Result<CheckOutput> {
            std::thread::sleep(Duration::from_millis(self.delay_ms));
            if let Some(finished) = self.finished {
                finished.lock().unwrap().push(self.id);
            }
            Ok(self
                .addresses
                .iter()
                .map(|a| ((*a).to_string(), ApiResult::pass(self.id, "ok")))
                .collect())
        }
    }

    struct FailingCheck;

    impl Check for FailingCheck {
        fn run(&self, _ctx: &RunContext) -> anyhow::Result<CheckOutput> {
            anyhow::bail!("backend unavailable")
        }
    }

    struct PanickingCheck;

    impl Check for PanickingCheck {
        fn run(&self, _ctx: &RunContext) -> anyhow::Result<CheckOutput> {
            panic!("boom")
        }
    }

    fn request(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    fn check_names(results: &BatchResults, address: &str) -> Vec<String> {
        results[address].iter().map(|r| r.check.clone()).collect()
    }

    #[test]
    fn test_classification_is_exclusive() {
        for id in COORDINATOR_CHECKS {
            assert!(!PER_NODE_CHECKS.contains(id));
            assert_eq!(classify(id), Some(CheckClass::Coordinator));
        }
        assert_eq!(classify(ids::SYSTEM_USER), Some(CheckClass::PerNode));
        assert_eq!(classify("bogus"), None);
    }

    #[test]
    fn test_order_follows_request_not_completion() {
        static FINISHED: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
        let mut firewall = TimedCheck::new(ids::FIREWALL, 150, &["10.0.0.1", "10.0.0.2"]);
        firewall.finished = Some(&FINISHED);
        let mut fqdn = TimedCheck::new(ids::FQDN, 0, &["10.0.0.1", "10.0.0.2"]);
        fqdn.finished = Some(&FINISHED);

        let registry = CheckRegistry::new()
            .with(ids::FIREWALL, Box::new(firewall))
            .with(ids::FQDN, Box::new(fqdn));

        let results = BatchOrchestrator::new(&registry)
            .run_batch(&request(&[ids::FIREWALL, ids::FQDN]), &RunContext::default());

        assert_eq!(*FINISHED.lock().unwrap(), vec![ids::FQDN, ids::FIREWALL]);
        for address in ["10.0.0.1", "10.0.0.2"] {
            assert_eq!(check_names(&results, address), vec![ids::FIREWALL, ids::FQDN]);
        }
    }

    #[test]
    fn test_order_with_mixed_classes() {
        let registry = CheckRegistry::new()
            .with(ids::SYSTEM_USER, Box::new(TimedCheck::new(ids::SYSTEM_USER, 0, &["10.0.0.1"])))
            .with(ids::CERTIFICATE, Box::new(TimedCheck::new(ids::CERTIFICATE, 30, &["10.0.0.1"])))
            .with(ids::FQDN, Box::new(TimedCheck::new(ids::FQDN, 0, &["10.0.0.1"])));

        let results = BatchOrchestrator::new(&registry).run_batch(
            &request(&[ids::SYSTEM_USER, ids::CERTIFICATE, ids::FQDN]),
            &RunContext::default(),
        );

        assert_eq!(
            check_names(&results, "10.0.0.1"),
            vec![ids::SYSTEM_USER, ids::CERTIFICATE, ids::FQDN]
        );
    }

    #[test]
    fn test_unknown_check_is_dropped() {
        let registry = CheckRegistry::new()
            .with(ids::FQDN, Box::new(TimedCheck::new(ids::FQDN, 0, &[LOCAL_ADDRESS])));

        let results = BatchOrchestrator::new(&registry).run_batch(
            &request(&["not-a-check", ids::FQDN, ids::SOFTWARE_VERSIONS]),
            &RunContext::default(),
        );

        assert_eq!(results.len(), 1);
        assert_eq!(check_names(&results, LOCAL_ADDRESS), vec![ids::FQDN]);
    }

    #[test]
    fn test_registered_but_unclassified_is_dropped() {
        let registry = CheckRegistry::new()
            .with("custom", Box::new(TimedCheck::new("custom", 0, &[LOCAL_ADDRESS])));
        let results = BatchOrchestrator::new(&registry)
            .run_batch(&request(&["custom"]), &RunContext::default());
        assert!(results.is_empty());
    }

    #[test]
    fn test_each_check_runs_once() {
        let registry = CheckRegistry::new()
            .with(ids::FQDN, Box::new(TimedCheck::new(ids::FQDN, 0, &[LOCAL_ADDRESS])));

        let results = BatchOrchestrator::new(&registry)
            .run_batch(&request(&[ids::FQDN, ids::FQDN]), &RunContext::default());

        assert_eq!(results[LOCAL_ADDRESS].len(), 1);
    }

    #[test]
    fn test_failures_become_results() {
        let registry = CheckRegistry::new()
            .with(ids::FIREWALL, Box::new(FailingCheck))
            .with(ids::CERTIFICATE, Box::new(PanickingCheck))
            .with(ids::FQDN, Box::new(TimedCheck::new(ids::FQDN, 10, &[LOCAL_ADDRESS])));

        let results = BatchOrchestrator::new(&registry).run_batch(
            &request(&[ids::FIREWALL, ids::CERTIFICATE, ids::FQDN]),
            &RunContext::default(),
        );

        let local = &results[LOCAL_ADDRESS];
        assert_eq!(local.len(), 3);
        assert!(!local[0].passed);
        assert!(local[0].message.contains("backend unavailable"));
        assert!(!local[1].passed);
        assert!(local[1].message.contains("boom"));
        assert!(local[2].passed);
    }

    #[test]
    fn test_partial_addresses_keep_only_their_checks() {
        let registry = CheckRegistry::new()
            .with(ids::FIREWALL, Box::new(TimedCheck::new(ids::FIREWALL, 0, &["10.0.0.1", "10.0.0.2"])))
            .with(ids::FQDN, Box::new(TimedCheck::new(ids::FQDN, 0, &["10.0.0.2"])));

        let results = BatchOrchestrator::new(&registry)
            .run_batch(&request(&[ids::FQDN, ids::FIREWALL]), &RunContext::default());

        assert_eq!(check_names(&results, "10.0.0.1"), vec![ids::FIREWALL]);
        assert_eq!(check_names(&results, "10.0.0.2"), vec![ids::FQDN, ids::FIREWALL]);
    }

    /// Reports the size of the rayon pool it runs under
    struct PoolSizeCheck {
        seen: &'static Mutex<Vec<usize>>,
    }

    impl Check for PoolSizeCheck {
        fn run(&self, _ctx: &RunContext) -> anyhow::Result<CheckOutput> {
            self.seen.lock().unwrap().push(rayon::current_num_threads());
            let addresses = ["10.0.0.1", "10.0.0.2", "10.0.0.3", "10.0.0.4"];
            Ok(addresses
                .par_iter()
                .map(|a| {
                    std::thread::sleep(Duration::from_millis(20));
                    ((*a).to_string(), ApiResult::pass(ids::FIREWALL, "ok"))
                })
                .collect())
        }
    }

    #[test]
    fn test_nested_fan_out_uses_global_pool() {
        static SEEN: Mutex<Vec<usize>> = Mutex::new(Vec::new());
        let registry = CheckRegistry::new()
            .with(ids::FIREWALL, Box::new(PoolSizeCheck { seen: &SEEN }));

        let results = BatchOrchestrator::new(&registry)
            .run_batch(&request(&[ids::FIREWALL]), &RunContext::default());

        assert_eq!(results.len(), 4);
        assert_eq!(*SEEN.lock().unwrap(), vec![rayon::current_num_threads()]);
    }

    #[test]
    fn test_empty_request() {
        let registry = CheckRegistry::new();
        assert!(BatchOrchestrator::new(&registry)
            .run_batch(&[], &RunContext::default())
            .is_empty());
    }
}

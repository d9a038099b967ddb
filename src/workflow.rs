//! Add/remove node workflows
//!
//! ```text
//! Idle → Validating → Mutating → AwaitingConfirmation → Persisting → TriggeringDeploy → Done
//! ```
//!
//! Any failure or a declined confirmation returns the workflow to `Idle`
//! without touching the persisted topology. Confirmation is skipped when
//! auto-accept is set.

use anyhow::Result;
use topology::{
    DeploymentMode, Error, ProposedAddresses, ReachabilityProbe, TopologyDescription,
    TopologyStore, TopologyValidator, apply_all, remove_all, validate_removal,
};

use crate::deploy::DeployTrigger;

/// Action passed to the deploy tool after a topology change
pub const DEPLOY_ACTION: &str = "deploy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Validating,
    Mutating,
    AwaitingConfirmation,
    Persisting,
    TriggeringDeploy,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Remove,
}

impl ChangeKind {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Add => "added",
            Self::Remove => "removed",
        }
    }
}

/// A validated change awaiting confirmation
pub struct ChangePlan<'a> {
    pub kind: ChangeKind,
    pub proposed: &'a ProposedAddresses,
    pub current: &'a TopologyDescription,
    pub next: &'a TopologyDescription,
}

/// Confirmation callback for a pending change
pub trait Confirm {
    fn confirm(&self, plan: &ChangePlan<'_>) -> Result<bool>;
}

/// Always confirms
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _plan: &ChangePlan<'_>) -> Result<bool> {
        Ok(true)
    }
}

/// Always declines
pub struct AutoDecline;

impl Confirm for AutoDecline {
    fn confirm(&self, _plan: &ChangePlan<'_>) -> Result<bool> {
        Ok(false)
    }
}

/// How a workflow run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Topology saved and deployment started
    Deployed,
    /// The operator declined; nothing was changed
    Declined,
}

/// Drives one membership change from request to deployment
pub struct NodeWorkflow<'a> {
    store: &'a dyn TopologyStore,
    probe: &'a dyn ReachabilityProbe,
    trigger: &'a dyn DeployTrigger,
    confirm: &'a dyn Confirm,
    auto_accept: bool,
    state: WorkflowState,
}

impl<'a> NodeWorkflow<'a> {
    pub fn new(
        store: &'a dyn TopologyStore,
        probe: &'a dyn ReachabilityProbe,
        trigger: &'a dyn DeployTrigger,
        confirm: &'a dyn Confirm,
    ) -> Self {
        Self {
            store,
            probe,
            trigger,
            confirm,
            auto_accept: false,
            state: WorkflowState::Idle,
        }
    }

    /// Skip the confirmation step
    pub fn auto_accept(mut self, yes: bool) -> Self {
        self.auto_accept = yes;
        self
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    /// Add the proposed addresses to the cluster
    pub fn add(&mut self, proposed: &ProposedAddresses) -> Result<Outcome> {
        self.execute(ChangeKind::Add, proposed)
    }

    /// Remove the proposed addresses from the cluster
    pub fn remove(&mut self, proposed: &ProposedAddresses) -> Result<Outcome> {
        self.execute(ChangeKind::Remove, proposed)
    }

    fn enter(&mut self, state: WorkflowState) {
        log::debug!("workflow: {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn execute(&mut self, kind: ChangeKind, proposed: &ProposedAddresses) -> Result<Outcome> {
        let outcome = self.drive(kind, proposed);
        if !matches!(outcome, Ok(Outcome::Deployed)) {
            self.enter(WorkflowState::Idle);
        }
        outcome
    }

    fn drive(&mut self, kind: ChangeKind, proposed: &ProposedAddresses) -> Result<Outcome> {
        if proposed.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "at least one node address is required to {}",
                kind.verb()
            ))
            .into());
        }

        let current = self.store.load()?;
        if current.deployment_mode != DeploymentMode::ExistingNodes {
            return Err(Error::config(format!(
                "nodes can only be {} in existing-nodes deployments. Please check {}",
                kind.past_tense(),
                self.store.location()
            ))
            .into());
        }

        self.enter(WorkflowState::Validating);
        let errors = match kind {
            ChangeKind::Add => TopologyValidator::new(self.probe).validate(proposed, &current),
            ChangeKind::Remove => validate_removal(proposed, &current),
        };
        if let Some(err) = Error::validation(errors) {
            for message in err.messages() {
                log::debug!("validation: {message}");
            }
            return Err(err.into());
        }

        self.enter(WorkflowState::Mutating);
        let mut next = current.clone();
        match kind {
            ChangeKind::Add => apply_all(&mut next, proposed)?,
            ChangeKind::Remove => remove_all(&mut next, proposed)?,
        }

        if !self.auto_accept {
            self.enter(WorkflowState::AwaitingConfirmation);
            let plan = ChangePlan {
                kind,
                proposed,
                current: &current,
                next: &next,
            };
            if !self.confirm.confirm(&plan)? {
                log::info!("{} declined; topology unchanged", kind.verb());
                return Ok(Outcome::Declined);
            }
        }

        self.enter(WorkflowState::Persisting);
        self.store.save(&next)?;
        log::info!(
            "saved topology with {} {} request(s) to {}",
            proposed.len(),
            kind.verb(),
            self.store.location()
        );

        self.enter(WorkflowState::TriggeringDeploy);
        self.trigger.trigger(DEPLOY_ACTION, true)?;

        self.enter(WorkflowState::Done);
        Ok(Outcome::Deployed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::sync::Mutex;
    use topology::{ExternalDatabaseMode, Role, RoleGroup};

    struct MemoryStore {
        topology: Option<TopologyDescription>,
        saved: RefCell<Vec<TopologyDescription>>,
    }

    impl MemoryStore {
        fn new(topology: TopologyDescription) -> Self {
            Self {
                topology: Some(topology),
                saved: RefCell::new(Vec::new()),
            }
        }
    }

    impl TopologyStore for MemoryStore {
        fn exists(&self) -> bool {
            self.topology.is_some()
        }

        fn load(&self) -> topology::Result<TopologyDescription> {
            self.topology.clone().ok_or_else(|| Error::Access {
                path: "config.toml".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }

        fn save(&self, topology: &TopologyDescription) -> topology::Result<()> {
            self.saved.borrow_mut().push(topology.clone());
            Ok(())
        }

        fn location(&self) -> String {
            "memory".into()
        }
    }

    #[derive(Default)]
    struct FakeProbe {
        unreachable: Vec<String>,
        probed: Mutex<Vec<String>>,
    }

    impl ReachabilityProbe for FakeProbe {
        fn probe(&self, address: &str) -> topology::Result<()> {
            self.probed.lock().unwrap().push(address.to_string());
            if self.unreachable.iter().any(|a| a == address) {
                return Err(Error::Connectivity {
                    address: address.into(),
                    message: "timeout".into(),
                });
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeTrigger {
        calls: RefCell<Vec<(String, bool)>>,
    }

    impl DeployTrigger for FakeTrigger {
        fn trigger(&self, action: &str, auto_confirm: bool) -> Result<()> {
            self.calls.borrow_mut().push((action.to_string(), auto_confirm));
            Ok(())
        }
    }

    /// Counts prompts and answers with `answer`
    struct CountingConfirm {
        answer: bool,
        asked: Cell<usize>,
    }

    impl Confirm for CountingConfirm {
        fn confirm(&self, plan: &ChangePlan<'_>) -> Result<bool> {
            self.asked.set(self.asked.get() + 1);
            assert_ne!(plan.current, plan.next);
            Ok(self.answer)
        }
    }

    fn cluster() -> TopologyDescription {
        TopologyDescription {
            control_plane: RoleGroup::with_addresses(["10.0.0.1"]),
            gateway: RoleGroup::with_addresses(["10.0.0.2"]),
            search: RoleGroup::with_addresses(["10.0.0.3"]),
            database: RoleGroup::with_addresses(["10.0.0.4"]),
            ..Default::default()
        }
    }

    fn topology_error(err: &anyhow::Error) -> &Error {
        err.downcast_ref::<Error>().unwrap()
    }

    #[test]
    fn test_add_saves_and_deploys() {
        let store = MemoryStore::new(cluster());
        let probe = FakeProbe::default();
        let trigger = FakeTrigger::default();
        let confirm = CountingConfirm {
            answer: true,
            asked: Cell::new(0),
        };
        let mut workflow = NodeWorkflow::new(&store, &probe, &trigger, &confirm);

        let proposed = ProposedAddresses::new().with(Role::Gateway, &["10.0.0.9"]);
        assert_eq!(workflow.add(&proposed).unwrap(), Outcome::Deployed);
        assert_eq!(workflow.state(), WorkflowState::Done);

        let saved = store.saved.borrow();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].gateway.instance_count, 2);
        assert_eq!(saved[0].gateway.addresses, vec!["10.0.0.2", "10.0.0.9"]);
        assert_eq!(confirm.asked.get(), 1);
        assert_eq!(*trigger.calls.borrow(), vec![("deploy".to_string(), true)]);
    }

    #[test]
    fn test_declined_leaves_everything_untouched() {
        let store = MemoryStore::new(cluster());
        let probe = FakeProbe::default();
        let trigger = FakeTrigger::default();
        let mut workflow = NodeWorkflow::new(&store, &probe, &trigger, &AutoDecline);

        let proposed = ProposedAddresses::new().with(Role::ControlPlane, &["10.0.0.8"]);
        assert_eq!(workflow.add(&proposed).unwrap(), Outcome::Declined);
        assert_eq!(workflow.state(), WorkflowState::Idle);
        assert!(store.saved.borrow().is_empty());
        assert!(trigger.calls.borrow().is_empty());
    }

    #[test]
    fn test_auto_accept_skips_prompt() {
        let store = MemoryStore::new(cluster());
        let probe = FakeProbe::default();
        let trigger = FakeTrigger::default();
        let confirm = CountingConfirm {
            answer: false,
            asked: Cell::new(0),
        };
        let mut workflow =
            NodeWorkflow::new(&store, &probe, &trigger, &confirm).auto_accept(true);

        let proposed = ProposedAddresses::new().with(Role::Search, &["10.0.0.10"]);
        assert_eq!(workflow.add(&proposed).unwrap(), Outcome::Deployed);
        assert_eq!(confirm.asked.get(), 0);
        assert_eq!(store.saved.borrow().len(), 1);
    }

    #[test]
    fn test_validation_failure_reports_every_error() {
        let store = MemoryStore::new(cluster());
        let probe = FakeProbe {
            unreachable: vec!["10.0.0.11".into()],
            ..Default::default()
        };
        let trigger = FakeTrigger::default();
        let mut workflow = NodeWorkflow::new(&store, &probe, &trigger, &AutoConfirm);

        let proposed = ProposedAddresses::new().with(Role::Gateway, &["10.0.0.1", "10.0.0.11"]);
        let err = workflow.add(&proposed).unwrap_err();

        let messages = topology_error(&err).messages();
        assert_eq!(
            messages,
            vec![
                "Gateway IP 10.0.0.1 is already configured for a node. Please use a different private IP.",
                "Gateway IP address 10.0.0.11 is unreachable",
            ]
        );
        assert_eq!(*probe.probed.lock().unwrap(), vec!["10.0.0.1", "10.0.0.11"]);
        assert_eq!(workflow.state(), WorkflowState::Idle);
        assert!(store.saved.borrow().is_empty());
    }

    #[test]
    fn test_frozen_data_tier_has_no_side_effects() {
        let mut topology = cluster();
        topology.external_database = ExternalDatabaseMode::SelfManaged;
        let store = MemoryStore::new(topology);
        let probe = FakeProbe::default();
        let trigger = FakeTrigger::default();
        let mut workflow = NodeWorkflow::new(&store, &probe, &trigger, &AutoConfirm);

        let proposed = ProposedAddresses::new().with(Role::Database, &["10.0.0.12"]);
        let err = workflow.add(&proposed).unwrap_err();

        assert!(matches!(topology_error(&err), Error::Validation { .. }));
        assert!(probe.probed.lock().unwrap().is_empty());
        assert!(store.saved.borrow().is_empty());
        assert!(trigger.calls.borrow().is_empty());
    }

    #[test]
    fn test_preconditions() {
        let probe = FakeProbe::default();
        let trigger = FakeTrigger::default();

        let store = MemoryStore::new(cluster());
        let mut workflow = NodeWorkflow::new(&store, &probe, &trigger, &AutoConfirm);
        let err = workflow.add(&ProposedAddresses::new()).unwrap_err();
        assert!(matches!(topology_error(&err), Error::InvalidArgument(_)));

        let missing = MemoryStore {
            topology: None,
            saved: RefCell::new(Vec::new()),
        };
        let mut workflow = NodeWorkflow::new(&missing, &probe, &trigger, &AutoConfirm);
        let proposed = ProposedAddresses::new().with(Role::Gateway, &["10.0.0.9"]);
        let err = workflow.add(&proposed).unwrap_err();
        assert!(matches!(topology_error(&err), Error::Access { .. }));

        let mut topology = cluster();
        topology.deployment_mode = DeploymentMode::CloudProvisioned;
        let cloud = MemoryStore::new(topology);
        let mut workflow = NodeWorkflow::new(&cloud, &probe, &trigger, &AutoConfirm);
        let err = workflow.add(&proposed).unwrap_err();
        assert!(matches!(topology_error(&err), Error::Config { .. }));
        assert!(err.to_string().ends_with("Please check memory"));
        assert!(probe.probed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_node() {
        let mut topology = cluster();
        topology.gateway = RoleGroup::with_addresses(["10.0.0.2", "10.0.0.5"]);
        let store = MemoryStore::new(topology);
        let probe = FakeProbe::default();
        let trigger = FakeTrigger::default();
        let mut workflow =
            NodeWorkflow::new(&store, &probe, &trigger, &AutoDecline).auto_accept(true);

        let proposed = ProposedAddresses::new().with(Role::Gateway, &["10.0.0.2"]);
        assert_eq!(workflow.remove(&proposed).unwrap(), Outcome::Deployed);

        let saved = store.saved.borrow();
        assert_eq!(saved[0].gateway.addresses, vec!["10.0.0.5"]);
        assert_eq!(saved[0].gateway.instance_count, 1);
        assert!(!saved[0].gateway.certs_by_address.contains_key("10.0.0.2"));
        assert!(probe.probed.lock().unwrap().is_empty());
    }

    #[test]
    fn test_remove_last_node_rejected() {
        let store = MemoryStore::new(cluster());
        let probe = FakeProbe::default();
        let trigger = FakeTrigger::default();
        let mut workflow = NodeWorkflow::new(&store, &probe, &trigger, &AutoConfirm);

        let proposed = ProposedAddresses::new().with(Role::ControlPlane, &["10.0.0.1"]);
        let err = workflow.remove(&proposed).unwrap_err();
        assert_eq!(
            topology_error(&err).messages(),
            vec!["Cannot remove every Control-Plane node"]
        );
    }
}

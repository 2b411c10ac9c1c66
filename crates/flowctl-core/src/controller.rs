//! The control-plane façade. The controller owns the topology, the flow
//! registry, and the per-switch flow tables, and exposes the engine's
//! public operations. Everything runs synchronously; an embedding host
//! that wants concurrency serializes mutating calls behind a single
//! writer lock and hands readers the owned records returned here.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rustc_hash::FxHashMap;

use crate::flowtable::{FlowTableEntry, FlowTables};
use crate::recovery::{FailureRecoveryCoordinator, RecoveryOutcome};
use crate::routing::{PathPlanner, RouteError};
use crate::snapshot::Snapshot;
use crate::topology::{Topology, TopologyError};
use crate::types::{Flow, FlowId, FlowStatus, Link, TrafficClass};
use crate::utilization::UtilizationTracker;

#[derive(Debug)]
pub struct Controller {
    topology: Topology,
    planner: PathPlanner,
    utilization: UtilizationTracker,
    flows: FxHashMap<FlowId, Flow>,
    tables: FlowTables,
    // Ids are handed out monotonically and never reused, even when an
    // install fails.
    next_flow_id: FlowId,
    rng: StdRng,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Seeded variant pinning the best-effort path choices, for
    /// reproducible runs and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            topology: Topology::new(),
            planner: PathPlanner::default(),
            utilization: UtilizationTracker::default(),
            flows: FxHashMap::default(),
            tables: FlowTables::default(),
            next_flow_id: FlowId::ONE,
            rng,
        }
    }

    delegate::delegate! {
        to self.topology {
            /// Adds a switch. Returns false if it already existed.
            pub fn add_node(&mut self, name: &str) -> bool;

            /// Removes a switch and its incident links. Flows that used it
            /// are not recovered; only `handle_link_failure` triggers
            /// recovery.
            pub fn remove_node(&mut self, name: &str) -> Result<(), TopologyError>;

            /// Adds (or re-adds, resetting) a link.
            pub fn add_link(&mut self, u: &str, v: &str, weight: f64) -> Result<(), TopologyError>;

            /// Removes a link without any flow side effects.
            pub fn remove_link(&mut self, u: &str, v: &str) -> Result<Link, TopologyError>;

            /// Brings a failed link back. Rerouted flows stay where they
            /// are; nothing re-optimizes implicitly.
            pub fn restore_link(&mut self, u: &str, v: &str) -> Result<(), TopologyError>;
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn tables(&self) -> &FlowTables {
        &self.tables
    }

    pub fn flows(&self) -> impl Iterator<Item = &Flow> + '_ {
        self.flows.values()
    }

    /// Registers a new flow and installs its forwarding state: ranked
    /// candidates, policy-selected primary, a disjoint backup for critical
    /// flows, utilization, and flow-table entries.
    ///
    /// When no path exists the flow is still registered, parked in
    /// `Dropped` state with an empty primary, and the error carries the
    /// assigned id: loud, but not fatal.
    pub fn install_flow(
        &mut self,
        src: &str,
        dst: &str,
        class: TrafficClass,
        critical: bool,
    ) -> Result<FlowId, ControllerError> {
        let id = self.next_flow_id;
        self.next_flow_id += FlowId::ONE;
        let mut flow = Flow {
            id,
            src: src.to_owned(),
            dst: dst.to_owned(),
            class,
            critical,
            primary: None,
            backup: None,
            status: FlowStatus::Dropped,
        };
        match self.planner.compute_candidates(&self.topology, src, dst) {
            Ok(candidates) => {
                let primary =
                    self.planner
                        .select_primary(&self.topology, &candidates, class, &mut self.rng);
                // Only critical flows carry a standby path.
                flow.backup = critical
                    .then(|| self.planner.select_backup(&self.topology, &primary, src, dst))
                    .flatten();
                self.utilization.charge(&mut self.topology, &primary);
                flow.primary = Some(primary);
                flow.status = FlowStatus::Installed;
                self.tables.rebuild(&flow);
                log::info!("flow {id} installed: {src} -> {dst} ({class})");
                self.flows.insert(id, flow);
                Ok(id)
            }
            Err(RouteError::NoPathFound { .. }) => {
                self.flows.insert(id, flow);
                log::warn!("flow {id}: no path from {src} to {dst}");
                Err(ControllerError::NoPathFound {
                    flow: id,
                    src: src.to_owned(),
                    dst: dst.to_owned(),
                })
            }
        }
    }

    /// Marks the link failed, then drives every affected flow through
    /// reroute-or-drop in ascending id order. Flows whose primary does not
    /// cross the failed link are left untouched.
    pub fn handle_link_failure(
        &mut self,
        u: &str,
        v: &str,
    ) -> Result<RecoveryReport, ControllerError> {
        self.topology.fail_link(u, v)?;
        log::info!("link {u} <-> {v} failed");
        let mut ids: Vec<FlowId> = self.flows.keys().copied().collect();
        ids.sort_unstable();
        let mut report = RecoveryReport::default();
        let mut coordinator = FailureRecoveryCoordinator {
            topology: &mut self.topology,
            tables: &mut self.tables,
            planner: &self.planner,
            utilization: &self.utilization,
            rng: &mut self.rng,
        };
        for id in ids {
            let flow = self.flows.get_mut(&id).expect("id collected above");
            if !FailureRecoveryCoordinator::is_affected(flow, u, v) {
                continue;
            }
            let outcome = coordinator.recover(flow);
            report.affected.push((id, outcome));
        }
        Ok(report)
    }

    /// An owned snapshot of a flow and its switch-keyed entries. Querying
    /// twice without an intervening mutation yields identical results.
    pub fn query_flow(&self, id: FlowId) -> Result<FlowRoutes, ControllerError> {
        let flow = self
            .flows
            .get(&id)
            .ok_or(ControllerError::FlowNotFound(id))?;
        Ok(FlowRoutes {
            flow: flow.clone(),
            tables: self.tables.for_flow(id),
        })
    }

    /// A read-only view for the renderer: the available subgraph (failed
    /// links excluded, utilization included) plus every registered flow.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.topology, &self.flows)
    }
}

/// What `query_flow` returns: the flow record and its forwarding entries.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct FlowRoutes {
    pub flow: Flow,
    pub tables: BTreeMap<String, Vec<FlowTableEntry>>,
}

/// Per-flow outcomes of one failure event, in ascending flow-id order.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RecoveryReport {
    pub affected: Vec<(FlowId, RecoveryOutcome)>,
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    /// The flow was registered anyway, dropped with an empty primary.
    #[error("flow {flow}: no path from {src} to {dst}")]
    NoPathFound {
        flow: FlowId,
        src: String,
        dst: String,
    },

    #[error("flow {0} not found")]
    FlowNotFound(FlowId),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

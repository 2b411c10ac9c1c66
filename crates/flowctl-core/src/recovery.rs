//! Reroute-or-drop handling for link-failure events.

use std::fmt;

use rand::rngs::StdRng;

use crate::flowtable::FlowTables;
use crate::routing::PathPlanner;
use crate::topology::Topology;
use crate::types::{Flow, FlowStatus};
use crate::utilization::UtilizationTracker;

/// How a single affected flow came out of a failure event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RecoveryOutcome {
    /// The precomputed disjoint backup was promoted to primary.
    BackupPromoted,
    /// A fresh primary was computed over the remaining topology.
    Rerouted,
    /// No route remains; the flow is parked with an empty primary.
    Dropped,
}

impl fmt::Display for RecoveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BackupPromoted => "backup promoted",
            Self::Rerouted => "rerouted",
            Self::Dropped => "dropped",
        })
    }
}

/// Drives affected flows through the reroute-or-drop procedure for one
/// failure event, borrowing the controller's state for its duration.
#[derive(Debug)]
pub(crate) struct FailureRecoveryCoordinator<'a> {
    pub(crate) topology: &'a mut Topology,
    pub(crate) tables: &'a mut FlowTables,
    pub(crate) planner: &'a PathPlanner,
    pub(crate) utilization: &'a UtilizationTracker,
    pub(crate) rng: &'a mut StdRng,
}

impl FailureRecoveryCoordinator<'_> {
    /// Whether the failed link appears, in either orientation, in the
    /// flow's active primary path. Unaffected flows must be left alone.
    pub(crate) fn is_affected(flow: &Flow, u: &str, v: &str) -> bool {
        flow.primary.as_ref().map_or(false, |p| p.contains_edge(u, v))
    }

    /// PRECONDITION: `is_affected` held for `flow`, so it has a primary.
    ///
    /// The old path's utilization is released only once the replacement
    /// (or the drop decision) is settled, so a mid-procedure failure never
    /// leaves the counters half-updated.
    pub(crate) fn recover(&mut self, flow: &mut Flow) -> RecoveryOutcome {
        let old = flow.primary.take().expect("affected flow has a primary");

        // A backup that itself crosses a failed or removed link is useless;
        // discard it before deciding.
        if flow
            .backup
            .as_ref()
            .map_or(false, |b| !self.topology.path_available(b))
        {
            flow.backup = None;
        }

        if let Some(backup) = flow.backup.take() {
            self.utilization.release(self.topology, &old);
            self.utilization.charge(self.topology, &backup);
            flow.primary = Some(backup);
            self.tables.rebuild(flow);
            log::info!("flow {}: backup promoted to primary", flow.id);
            return RecoveryOutcome::BackupPromoted;
        }

        match self
            .planner
            .compute_candidates(self.topology, &flow.src, &flow.dst)
        {
            Ok(candidates) => {
                let next =
                    self.planner
                        .select_primary(self.topology, &candidates, flow.class, self.rng);
                self.utilization.release(self.topology, &old);
                self.utilization.charge(self.topology, &next);
                flow.primary = Some(next);
                self.tables.rebuild(flow);
                log::info!("flow {}: rerouted", flow.id);
                RecoveryOutcome::Rerouted
            }
            Err(_) => {
                self.utilization.release(self.topology, &old);
                flow.status = FlowStatus::Dropped;
                self.tables.rebuild(flow);
                log::warn!("flow {}: no route left, dropped", flow.id);
                RecoveryOutcome::Dropped
            }
        }
    }
}

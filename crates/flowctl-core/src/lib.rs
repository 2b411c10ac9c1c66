#![warn(unreachable_pub, missing_debug_implementations)]

//! The core flowctl library. This crate implements the control plane of a
//! software-defined network: it computes and installs forwarding paths for
//! traffic flows over a weighted switch topology, tracks per-link load, and
//! reroutes affected flows when a link fails. The main entry point is the
//! [`Controller`].

#[macro_use]
mod ident;

pub mod constants;

mod controller;
mod flowtable;
mod recovery;
mod routing;
mod snapshot;
mod spec;
mod topology;
mod types;
mod utilization;

#[cfg(test)]
pub(crate) mod testing;

pub use controller::{Controller, ControllerError, FlowRoutes, RecoveryReport};
pub use flowtable::{Action, FlowTableEntry, FlowTables, MatchKey};
pub use recovery::RecoveryOutcome;
pub use routing::{PathPlanner, RouteError};
pub use snapshot::{LinkView, Snapshot};
pub use spec::{FlowSpec, LinkSpec, Spec, SpecError};
pub use topology::{Topology, TopologyError};
pub use types::{Flow, FlowId, FlowStatus, Link, Node, Path, TrafficClass};
pub use utilization::UtilizationTracker;

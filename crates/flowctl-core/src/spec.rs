//! Declarative bootstrap specifications: a set of nodes, links, and flows
//! that is validated and loaded into a fresh controller in one step. The
//! CLI reads these from JSON files.

use rustc_hash::FxHashSet;

use crate::controller::Controller;
use crate::topology::TopologyError;
use crate::types::TrafficClass;

/// A bootstrap specification.
#[derive(Debug, Clone, PartialEq, typed_builder::TypedBuilder, serde::Serialize, serde::Deserialize)]
pub struct Spec {
    /// Topology nodes.
    pub nodes: Vec<String>,
    /// Topology links.
    pub links: Vec<LinkSpec>,
    /// Flows installed once the topology is up.
    #[builder(default)]
    #[serde(default)]
    pub flows: Vec<FlowSpec>,
}

#[derive(Debug, Clone, PartialEq, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct LinkSpec {
    pub a: String,
    pub b: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct FlowSpec {
    pub src: String,
    pub dst: String,
    #[serde(default)]
    pub class: TrafficClass,
    #[serde(default)]
    pub critical: bool,
}

impl Spec {
    /// Validates the specification.
    ///
    /// Correctness properties:
    ///
    /// - Every link weight must be positive.
    /// - Every link endpoint and flow endpoint must be a declared node.
    pub fn validate(&self) -> Result<(), SpecError> {
        let declared: FxHashSet<&str> = self.nodes.iter().map(String::as_str).collect();
        for link in &self.links {
            if link.weight <= 0.0 {
                return Err(SpecError::NonPositiveWeight {
                    a: link.a.clone(),
                    b: link.b.clone(),
                });
            }
            // The topology would create missing endpoints on the fly, but a
            // spec naming an undeclared node is almost surely a typo.
            for end in [&link.a, &link.b] {
                if !declared.contains(end.as_str()) {
                    return Err(SpecError::UndeclaredNode(end.clone()));
                }
            }
        }
        for flow in &self.flows {
            if !declared.contains(flow.src.as_str()) {
                return Err(SpecError::UnknownFlowSrc {
                    src: flow.src.clone(),
                });
            }
            if !declared.contains(flow.dst.as_str()) {
                return Err(SpecError::UnknownFlowDst {
                    dst: flow.dst.clone(),
                });
            }
        }
        Ok(())
    }

    /// Validates the spec and loads it into `controller`. Flows with no
    /// path are registered dropped, exactly as `install_flow` leaves them;
    /// that is not a build failure.
    pub fn build(self, mut controller: Controller) -> Result<Controller, SpecError> {
        self.validate()?;
        for node in &self.nodes {
            controller.add_node(node);
        }
        for LinkSpec { a, b, weight } in &self.links {
            controller.add_link(a, b, *weight)?;
        }
        for FlowSpec {
            src,
            dst,
            class,
            critical,
        } in &self.flows
        {
            if let Err(err) = controller.install_flow(src, dst, *class, *critical) {
                log::warn!("spec flow parked: {err}");
            }
        }
        Ok(controller)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("link {a} <-> {b} must have a positive weight")]
    NonPositiveWeight { a: String, b: String },

    #[error("node {0} is not declared")]
    UndeclaredNode(String),

    #[error("flow has an unknown source ({src})")]
    UnknownFlowSrc { src: String },

    #[error("flow has an unknown destination ({dst})")]
    UnknownFlowDst { dst: String },

    #[error("invalid topology")]
    InvalidTopology(#[from] TopologyError),
}

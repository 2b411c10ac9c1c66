//! The mutable switch topology: an undirected weighted graph whose links
//! carry a failed flag and a utilization counter.

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::stable_graph::StableUnGraph;
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

use crate::types::{Link, Node, Path};

/// The control plane's view of the physical network. Stable graph indices
/// are used so removing a node never shifts the others; all public lookups
/// go by node name.
#[derive(Debug, Default)]
pub struct Topology {
    graph: StableUnGraph<Node, Link>,
    names: FxHashMap<String, NodeIndex>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a switch. Returns false (and changes nothing) if it already
    /// exists.
    pub fn add_node(&mut self, name: &str) -> bool {
        if self.names.contains_key(name) {
            return false;
        }
        let idx = self.graph.add_node(Node::new(name));
        self.names.insert(name.to_owned(), idx);
        true
    }

    /// Removes a switch and every link incident to it.
    pub fn remove_node(&mut self, name: &str) -> Result<(), TopologyError> {
        let idx = self
            .names
            .remove(name)
            .ok_or_else(|| TopologyError::NodeNotFound(name.to_owned()))?;
        self.graph.remove_node(idx);
        Ok(())
    }

    /// Adds a link. Missing endpoints are created on the fly; re-adding an
    /// existing link resets its weight, utilization, and failed flag.
    pub fn add_link(&mut self, u: &str, v: &str, weight: f64) -> Result<(), TopologyError> {
        if u == v {
            return Err(TopologyError::SelfLoop(u.to_owned()));
        }
        self.add_node(u);
        self.add_node(v);
        let (a, b) = (self.names[u], self.names[v]);
        match self.graph.find_edge(a, b) {
            Some(e) => self.graph[e] = Link::new(weight),
            None => {
                self.graph.add_edge(a, b, Link::new(weight));
            }
        }
        Ok(())
    }

    /// Removes a link, returning its last attributes.
    pub fn remove_link(&mut self, u: &str, v: &str) -> Result<Link, TopologyError> {
        let e = self.find_link(u, v)?;
        // The index came from find_link, so the edge is present.
        Ok(self.graph.remove_edge(e).expect("edge exists"))
    }

    /// Marks a link failed. Failed links stay in the graph but are skipped
    /// by all path computation until restored.
    pub fn fail_link(&mut self, u: &str, v: &str) -> Result<(), TopologyError> {
        let e = self.find_link(u, v)?;
        self.graph[e].failed = true;
        Ok(())
    }

    pub fn restore_link(&mut self, u: &str, v: &str) -> Result<(), TopologyError> {
        let e = self.find_link(u, v)?;
        self.graph[e].failed = false;
        Ok(())
    }

    pub fn contains_node(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn link(&self, u: &str, v: &str) -> Option<&Link> {
        let a = self.names.get(u)?;
        let b = self.names.get(v)?;
        let e = self.graph.find_edge(*a, *b)?;
        Some(&self.graph[e])
    }

    pub(crate) fn link_mut(&mut self, u: &str, v: &str) -> Option<&mut Link> {
        let a = self.names.get(u)?;
        let b = self.names.get(v)?;
        let e = self.graph.find_edge(*a, *b)?;
        Some(&mut self.graph[e])
    }

    pub fn nr_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn nr_links(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.graph.node_weights()
    }

    /// All links with their endpoints, failed ones included.
    pub fn links(&self) -> impl Iterator<Item = (&Node, &Node, &Link)> + '_ {
        self.graph.edge_indices().map(|e| {
            // Indices straight out of edge_indices are live.
            let (a, b) = self.graph.edge_endpoints(e).expect("live edge index");
            (&self.graph[a], &self.graph[b], &self.graph[e])
        })
    }

    pub(crate) fn index_of(&self, name: &str) -> Option<NodeIndex> {
        self.names.get(name).copied()
    }

    pub(crate) fn node(&self, idx: NodeIndex) -> &Node {
        &self.graph[idx]
    }

    pub(crate) fn edge_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub(crate) fn link_weight(&self, e: EdgeIndex) -> f64 {
        self.graph[e].weight
    }

    /// Non-failed links incident to `n`, as (edge, neighbor, attributes).
    /// This is the "available subgraph" view: traversals skip failed links
    /// here instead of materializing a filtered copy per query.
    pub(crate) fn available_edges(
        &self,
        n: NodeIndex,
    ) -> impl Iterator<Item = (EdgeIndex, NodeIndex, &Link)> + '_ {
        self.graph.edges(n).filter(|e| !e.weight().failed).map(move |e| {
            let other = if e.source() == n { e.target() } else { e.source() };
            (e.id(), other, e.weight())
        })
    }

    pub(crate) fn find_link(&self, u: &str, v: &str) -> Result<EdgeIndex, TopologyError> {
        let a = self
            .names
            .get(u)
            .ok_or_else(|| TopologyError::NodeNotFound(u.to_owned()))?;
        let b = self
            .names
            .get(v)
            .ok_or_else(|| TopologyError::NodeNotFound(v.to_owned()))?;
        self.graph.find_edge(*a, *b).ok_or_else(|| TopologyError::LinkNotFound {
            u: u.to_owned(),
            v: v.to_owned(),
        })
    }

    /// Total weight of a path over this topology. Links the path references
    /// but the topology no longer has contribute nothing.
    pub(crate) fn path_weight(&self, path: &Path) -> f64 {
        path.edges()
            .filter_map(|(u, v)| self.link(u, v))
            .map(|l| l.weight)
            .sum()
    }

    /// Summed utilization along a path, for the video policy.
    pub(crate) fn path_utilization(&self, path: &Path) -> u64 {
        path.edges()
            .filter_map(|(u, v)| self.link(u, v))
            .map(|l| u64::from(l.utilization))
            .sum()
    }

    /// Whether every link of `path` exists and is not failed.
    pub(crate) fn path_available(&self, path: &Path) -> bool {
        !path.is_empty()
            && path
                .edges()
                .all(|(u, v)| self.link(u, v).map_or(false, |l| !l.failed))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("node {0} does not exist")]
    NodeNotFound(String),

    #[error("no link between {u} and {v}")]
    LinkNotFound { u: String, v: String },

    #[error("node {0} cannot link to itself")]
    SelfLoop(String),
}

//! Read-only views handed to presentation layers.

use rustc_hash::FxHashMap;

use crate::topology::Topology;
use crate::types::{Flow, FlowId};

/// One available (non-failed) link with its current load. Endpoints are
/// normalized so `a <= b`.
#[derive(Debug, Clone, PartialEq, derive_new::new, serde::Serialize)]
pub struct LinkView {
    pub a: String,
    pub b: String,
    pub weight: f64,
    pub utilization: u32,
}

/// A point-in-time view of the available subgraph and the flow registry.
/// Consumers must tolerate an empty graph, and a flow's recorded path can
/// reference links removed since installation.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Snapshot {
    pub nodes: Vec<String>,
    pub links: Vec<LinkView>,
    pub flows: Vec<Flow>,
}

impl Snapshot {
    pub(crate) fn capture(topo: &Topology, flows: &FxHashMap<FlowId, Flow>) -> Self {
        let mut nodes: Vec<String> = topo.nodes().map(|n| n.name.clone()).collect();
        nodes.sort_unstable();
        let mut links: Vec<LinkView> = topo
            .links()
            .filter(|(_, _, link)| !link.failed)
            .map(|(a, b, link)| {
                let (a, b) = if a.name <= b.name { (a, b) } else { (b, a) };
                LinkView::new(a.name.clone(), b.name.clone(), link.weight, link.utilization)
            })
            .collect();
        links.sort_unstable_by(|x, y| (&x.a, &x.b).cmp(&(&y.a, &y.b)));
        let mut flows: Vec<Flow> = flows.values().cloned().collect();
        flows.sort_unstable_by_key(|f| f.id);
        Self { nodes, links, flows }
    }

    /// Whether the snapshot still contains a link between `u` and `v`.
    pub fn has_link(&self, u: &str, v: &str) -> bool {
        self.links
            .iter()
            .any(|l| (l.a == u && l.b == v) || (l.a == v && l.b == u))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn capture_excludes_failed_links() {
        let mut topo = testing::triangle_topology();
        topo.fail_link("A", "C").unwrap();
        let snap = Snapshot::capture(&topo, &FxHashMap::default());
        assert_eq!(snap.nodes, vec!["A", "B", "C"]);
        assert_eq!(snap.links.len(), 2);
        assert!(!snap.has_link("A", "C"));
        assert!(snap.has_link("A", "B"));
    }

    #[test]
    fn has_link_ignores_orientation() {
        let snap = Snapshot::capture(&testing::line_topology(), &FxHashMap::default());
        assert!(snap.has_link("B", "A"));
    }

    #[test]
    fn empty_topology_captures_cleanly() {
        let snap = Snapshot::capture(&Topology::new(), &FxHashMap::default());
        assert!(snap.nodes.is_empty());
        assert!(snap.links.is_empty());
        assert!(snap.flows.is_empty());
    }
}

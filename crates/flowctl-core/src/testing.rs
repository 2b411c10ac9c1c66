use crate::topology::Topology;

/// A -- B -- C chain, unit weights.
pub(crate) fn line_topology() -> Topology {
    let mut topo = Topology::new();
    topo.add_link("A", "B", 1.0).unwrap();
    topo.add_link("B", "C", 1.0).unwrap();
    topo
}

/// The chain plus a direct A -- C link of weight 5.
pub(crate) fn triangle_topology() -> Topology {
    let mut topo = line_topology();
    topo.add_link("A", "C", 5.0).unwrap();
    topo
}

/// Two equal-cost two-hop routes between A and D.
pub(crate) fn diamond_topology() -> Topology {
    let mut topo = Topology::new();
    topo.add_link("A", "B", 1.0).unwrap();
    topo.add_link("B", "D", 1.0).unwrap();
    topo.add_link("A", "C", 1.0).unwrap();
    topo.add_link("C", "D", 1.0).unwrap();
    topo
}

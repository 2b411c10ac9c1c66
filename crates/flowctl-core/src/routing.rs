//! Path computation: ranked loopless candidates (Yen's algorithm over a
//! deterministic Dijkstra), per-class primary selection, and edge-disjoint
//! backup paths.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};

use ordered_float::OrderedFloat;
use petgraph::graph::{EdgeIndex, NodeIndex};
use rand::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::constants::DEFAULT_CANDIDATES;
use crate::topology::Topology;
use crate::types::{Path, TrafficClass};

/// Ranks candidate paths over the available subgraph and applies the
/// per-class selection policy.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    k: usize,
}

impl Default for PathPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_CANDIDATES)
    }
}

impl PathPlanner {
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    /// Up to `k` loopless paths from `src` to `dst` by ascending total
    /// weight, computed over non-failed links only. Equal-weight paths are
    /// ordered lexicographically by node sequence, so identical inputs
    /// always rank identically.
    pub fn compute_candidates(
        &self,
        topo: &Topology,
        src: &str,
        dst: &str,
    ) -> Result<Vec<Path>, RouteError> {
        let no_path = || RouteError::NoPathFound {
            src: src.to_owned(),
            dst: dst.to_owned(),
        };
        let (src_idx, dst_idx) = topo
            .index_of(src)
            .zip(topo.index_of(dst))
            .ok_or_else(no_path)?;

        let no_edges = FxHashSet::default();
        let no_nodes = FxHashSet::default();
        let first =
            shortest_path(topo, src_idx, dst_idx, &no_edges, &no_nodes).ok_or_else(no_path)?;
        let mut shortest = vec![first];
        let mut candidates: BTreeSet<(OrderedFloat<f64>, Vec<NodeIndex>)> = BTreeSet::new();

        // Yen's algorithm: spur off every prefix of the last accepted path,
        // banning the links that accepted paths already take out of that
        // prefix so each spur yields a genuinely new path.
        while shortest.len() < self.k {
            let prev = shortest.last().expect("at least one accepted path").clone();
            for i in 0..prev.len() - 1 {
                let spur_node = prev[i];
                let root = &prev[..=i];
                let mut banned_edges = FxHashSet::default();
                for p in &shortest {
                    if p.len() > i + 1 && p[..=i] == *root {
                        if let Some(e) = topo.edge_between(p[i], p[i + 1]) {
                            banned_edges.insert(e);
                        }
                    }
                }
                // Root nodes other than the spur stay banned to keep spur
                // paths loopless.
                let banned_nodes: FxHashSet<NodeIndex> = root[..i].iter().copied().collect();
                if let Some(spur) =
                    shortest_path(topo, spur_node, dst_idx, &banned_edges, &banned_nodes)
                {
                    let mut total = root.to_vec();
                    total.extend_from_slice(&spur[1..]);
                    let cost = cost_of(topo, &total);
                    candidates.insert((cost, total));
                }
            }
            let mut next = None;
            while let Some((_, nodes)) = candidates.pop_first() {
                if !shortest.contains(&nodes) {
                    next = Some(nodes);
                    break;
                }
            }
            match next {
                Some(nodes) => shortest.push(nodes),
                None => break,
            }
        }

        let mut paths: Vec<Path> = shortest.iter().map(|nodes| to_path(topo, nodes)).collect();
        paths.sort_by(|a, b| {
            OrderedFloat(topo.path_weight(a))
                .cmp(&OrderedFloat(topo.path_weight(b)))
                .then_with(|| a.hops().cmp(b.hops()))
        });
        Ok(paths)
    }

    /// Applies the per-class policy to a non-empty, ranked candidate set.
    ///
    /// Video minimizes summed link utilization, voice minimizes total
    /// weight (the latency proxy), and best-effort spreads load by picking
    /// uniformly at random. Every choice is confined to `candidates`.
    pub fn select_primary<R: Rng>(
        &self,
        topo: &Topology,
        candidates: &[Path],
        class: TrafficClass,
        rng: &mut R,
    ) -> Path {
        debug_assert!(!candidates.is_empty());
        match class {
            TrafficClass::Video => candidates
                .iter()
                .enumerate()
                .min_by_key(|(i, p)| {
                    (
                        topo.path_utilization(p),
                        OrderedFloat(topo.path_weight(p)),
                        *i,
                    )
                })
                .map(|(_, p)| p.clone())
                .expect("non-empty candidate set"),
            TrafficClass::Voice => candidates
                .iter()
                .enumerate()
                .min_by_key(|(i, p)| (OrderedFloat(topo.path_weight(p)), *i))
                .map(|(_, p)| p.clone())
                .expect("non-empty candidate set"),
            TrafficClass::BestEffort => candidates
                .choose(rng)
                .expect("non-empty candidate set")
                .clone(),
        }
    }

    /// The shortest path from `src` to `dst` that shares no link with
    /// `primary`. `None` when no such path exists; a missing backup is a
    /// degraded state, not an error.
    pub fn select_backup(
        &self,
        topo: &Topology,
        primary: &Path,
        src: &str,
        dst: &str,
    ) -> Option<Path> {
        let (src_idx, dst_idx) = topo.index_of(src).zip(topo.index_of(dst))?;
        let banned: FxHashSet<EdgeIndex> = primary
            .edges()
            .filter_map(|(u, v)| topo.find_link(u, v).ok())
            .collect();
        shortest_path(topo, src_idx, dst_idx, &banned, &FxHashSet::default())
            .map(|nodes| to_path(topo, &nodes))
    }
}

/// Dijkstra over the available subgraph, honoring ban sets for Yen spur
/// computation and backup disjointness. Heap entries order by (cost, node
/// name) so equal-cost frontiers pop in a stable order.
fn shortest_path(
    topo: &Topology,
    src: NodeIndex,
    dst: NodeIndex,
    banned_edges: &FxHashSet<EdgeIndex>,
    banned_nodes: &FxHashSet<NodeIndex>,
) -> Option<Vec<NodeIndex>> {
    if banned_nodes.contains(&src) {
        return None;
    }
    let mut dist: FxHashMap<NodeIndex, f64> = FxHashMap::default();
    let mut prev: FxHashMap<NodeIndex, NodeIndex> = FxHashMap::default();
    let mut heap = BinaryHeap::new();
    dist.insert(src, 0.0);
    heap.push(Reverse((OrderedFloat(0.0), topo.node(src).name.clone(), src)));

    while let Some(Reverse((OrderedFloat(cost), _, n))) = heap.pop() {
        match dist.get(&n) {
            Some(&d) if cost > d => continue, // stale heap entry
            _ => {}
        }
        if n == dst {
            break;
        }
        for (e, next, link) in topo.available_edges(n) {
            if banned_edges.contains(&e) || banned_nodes.contains(&next) {
                continue;
            }
            let next_cost = cost + link.weight;
            let better = match dist.get(&next) {
                None => true,
                Some(&d) => next_cost < d,
            };
            if better {
                dist.insert(next, next_cost);
                prev.insert(next, n);
                heap.push(Reverse((
                    OrderedFloat(next_cost),
                    topo.node(next).name.clone(),
                    next,
                )));
            }
        }
    }

    if !dist.contains_key(&dst) {
        return None;
    }
    let mut nodes = vec![dst];
    let mut cur = dst;
    while cur != src {
        cur = *prev.get(&cur)?;
        nodes.push(cur);
    }
    nodes.reverse();
    Some(nodes)
}

fn cost_of(topo: &Topology, nodes: &[NodeIndex]) -> OrderedFloat<f64> {
    let mut total = 0.0;
    for pair in nodes.windows(2) {
        if let Some(e) = topo.edge_between(pair[0], pair[1]) {
            total += topo.link_weight(e);
        }
    }
    OrderedFloat(total)
}

fn to_path(topo: &Topology, nodes: &[NodeIndex]) -> Path {
    nodes.iter().map(|&idx| topo.node(idx).name.clone()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// `src` and `dst` are disconnected in the available subgraph, or one
    /// of them does not exist.
    #[error("no path from {src} to {dst} in the available topology")]
    NoPathFound { src: String, dst: String },
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::testing;

    fn names(paths: &[Path]) -> Vec<Vec<String>> {
        paths.iter().map(|p| p.hops().to_vec()).collect()
    }

    #[test]
    fn candidates_rank_by_weight() -> anyhow::Result<()> {
        let topo = testing::triangle_topology();
        let planner = PathPlanner::default();
        let paths = planner
            .compute_candidates(&topo, "A", "C")
            .context("no candidates")?;
        insta::assert_yaml_snapshot!(names(&paths), @r###"
        ---
        - - A
          - B
          - C
        - - A
          - C
        "###);
        Ok(())
    }

    #[test]
    fn equal_cost_paths_rank_lexicographically() -> anyhow::Result<()> {
        let topo = testing::diamond_topology();
        let planner = PathPlanner::default();
        let paths = planner
            .compute_candidates(&topo, "A", "D")
            .context("no candidates")?;
        assert_eq!(
            names(&paths),
            vec![vec!["A", "B", "D"], vec!["A", "C", "D"]]
        );
        Ok(())
    }

    #[test]
    fn repeated_calls_rank_identically() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology();
        topo.add_link("A", "D", 5.0).unwrap();
        let planner = PathPlanner::default();
        let first = planner.compute_candidates(&topo, "A", "D")?;
        let second = planner.compute_candidates(&topo, "A", "D")?;
        assert_eq!(first, second);
        assert_eq!(
            names(&first),
            vec![vec!["A", "B", "D"], vec!["A", "C", "D"], vec!["A", "D"]]
        );
        Ok(())
    }

    #[test]
    fn k_caps_the_candidate_count() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology();
        topo.add_link("A", "D", 5.0).unwrap();
        let planner = PathPlanner::new(2);
        let paths = planner.compute_candidates(&topo, "A", "D")?;
        assert_eq!(paths.len(), 2);
        Ok(())
    }

    #[test]
    fn failed_links_are_excluded() -> anyhow::Result<()> {
        let mut topo = testing::triangle_topology();
        topo.fail_link("A", "B").unwrap();
        let planner = PathPlanner::default();
        let paths = planner.compute_candidates(&topo, "A", "C")?;
        assert_eq!(names(&paths), vec![vec!["A", "C"]]);
        Ok(())
    }

    #[test]
    fn unknown_endpoint_fails() {
        let topo = testing::triangle_topology();
        let planner = PathPlanner::default();
        let res = planner.compute_candidates(&topo, "A", "Z");
        assert!(matches!(res, Err(RouteError::NoPathFound { .. })));
    }

    #[test]
    fn disconnected_endpoints_fail() {
        let mut topo = testing::triangle_topology();
        topo.add_node("X");
        let planner = PathPlanner::default();
        let res = planner.compute_candidates(&topo, "A", "X");
        assert!(matches!(res, Err(RouteError::NoPathFound { .. })));
    }

    #[test]
    fn voice_takes_the_lightest_path() -> anyhow::Result<()> {
        let topo = testing::triangle_topology();
        let planner = PathPlanner::default();
        let candidates = planner.compute_candidates(&topo, "A", "C")?;
        let mut rng = StdRng::seed_from_u64(0);
        let primary = planner.select_primary(&topo, &candidates, TrafficClass::Voice, &mut rng);
        assert_eq!(primary, ["A", "B", "C"].into_iter().collect());
        Ok(())
    }

    #[test]
    fn video_avoids_loaded_links() -> anyhow::Result<()> {
        let mut topo = testing::diamond_topology();
        topo.link_mut("A", "B").unwrap().utilization = 30;
        let planner = PathPlanner::default();
        let candidates = planner.compute_candidates(&topo, "A", "D")?;
        let mut rng = StdRng::seed_from_u64(0);
        let primary = planner.select_primary(&topo, &candidates, TrafficClass::Video, &mut rng);
        assert_eq!(primary, ["A", "C", "D"].into_iter().collect());
        Ok(())
    }

    #[test]
    fn besteffort_stays_within_candidates() -> anyhow::Result<()> {
        let topo = testing::diamond_topology();
        let planner = PathPlanner::default();
        let candidates = planner.compute_candidates(&topo, "A", "D")?;
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let pick =
                planner.select_primary(&topo, &candidates, TrafficClass::BestEffort, &mut rng);
            assert!(candidates.contains(&pick));
        }
        Ok(())
    }

    #[test]
    fn backup_is_edge_disjoint() -> anyhow::Result<()> {
        let topo = testing::triangle_topology();
        let planner = PathPlanner::default();
        let primary: Path = ["A", "B", "C"].into_iter().collect();
        let backup = planner
            .select_backup(&topo, &primary, "A", "C")
            .context("expected a backup")?;
        assert_eq!(backup, ["A", "C"].into_iter().collect());
        for (u, v) in backup.edges() {
            assert!(!primary.contains_edge(u, v));
        }
        Ok(())
    }

    #[test]
    fn backup_is_absent_without_a_disjoint_route() {
        let topo = testing::line_topology();
        let planner = PathPlanner::default();
        let primary: Path = ["A", "B", "C"].into_iter().collect();
        assert_eq!(planner.select_backup(&topo, &primary, "A", "C"), None);
    }
}

//! Per-link load accounting.

use crate::constants::UTILIZATION_UNIT;
use crate::topology::Topology;
use crate::types::Path;

/// Applies the fixed utilization unit along paths as they become active
/// and inactive. Callers pair exactly one `charge` with exactly one
/// eventual `release` per active path per flow, which keeps every link's
/// counter at unit times the number of active paths traversing it.
#[derive(Debug, Clone)]
pub struct UtilizationTracker {
    unit: u32,
}

impl Default for UtilizationTracker {
    fn default() -> Self {
        Self::new(UTILIZATION_UNIT)
    }
}

impl UtilizationTracker {
    pub fn new(unit: u32) -> Self {
        Self { unit }
    }

    /// Marks `path` active on every link it traverses.
    pub fn charge(&self, topo: &mut Topology, path: &Path) {
        self.apply(topo, path, true);
    }

    /// Reverses a previous [`charge`](Self::charge), clamped at zero.
    pub fn release(&self, topo: &mut Topology, path: &Path) {
        self.apply(topo, path, false);
    }

    fn apply(&self, topo: &mut Topology, path: &Path, up: bool) {
        for (u, v) in path.edges() {
            // A link can be removed between activation and release; skip it.
            let Some(link) = topo.link_mut(u, v) else { continue };
            link.utilization = if up {
                link.utilization.saturating_add(self.unit)
            } else {
                link.utilization.saturating_sub(self.unit)
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn line_path() -> Path {
        ["A", "B", "C"].into_iter().collect()
    }

    #[test]
    fn charge_and_release_are_symmetric() {
        let mut topo = testing::line_topology();
        let tracker = UtilizationTracker::default();
        tracker.charge(&mut topo, &line_path());
        assert_eq!(topo.link("A", "B").unwrap().utilization, UTILIZATION_UNIT);
        assert_eq!(topo.link("B", "C").unwrap().utilization, UTILIZATION_UNIT);
        tracker.release(&mut topo, &line_path());
        assert_eq!(topo.link("A", "B").unwrap().utilization, 0);
        assert_eq!(topo.link("B", "C").unwrap().utilization, 0);
    }

    #[test]
    fn release_clamps_at_zero() {
        let mut topo = testing::line_topology();
        let tracker = UtilizationTracker::default();
        tracker.release(&mut topo, &line_path());
        assert_eq!(topo.link("A", "B").unwrap().utilization, 0);
    }

    #[test]
    fn overlapping_paths_accumulate() {
        let mut topo = testing::line_topology();
        let tracker = UtilizationTracker::default();
        tracker.charge(&mut topo, &line_path());
        tracker.charge(&mut topo, &["A", "B"].into_iter().collect());
        assert_eq!(
            topo.link("A", "B").unwrap().utilization,
            2 * UTILIZATION_UNIT
        );
        assert_eq!(topo.link("B", "C").unwrap().utilization, UTILIZATION_UNIT);
    }

    #[test]
    fn missing_links_are_skipped() {
        let mut topo = testing::line_topology();
        topo.remove_link("B", "C").unwrap();
        let tracker = UtilizationTracker::default();
        tracker.charge(&mut topo, &line_path());
        assert_eq!(topo.link("A", "B").unwrap().utilization, UTILIZATION_UNIT);
    }
}

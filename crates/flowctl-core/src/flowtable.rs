//! Per-switch forwarding state synthesized from active flow paths.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::constants::{BACKUP_PRIO_STEP, PRIO_CRITICAL, PRIO_NORMAL};
use crate::types::{Flow, FlowId, Path, TrafficClass};

/// Forwarding match fields. Matches are distinguished by this tuple, not
/// by their position in a switch's table.
#[derive(Debug, Clone, PartialEq, Eq, derive_new::new, serde::Serialize, serde::Deserialize)]
pub struct MatchKey {
    pub src: String,
    pub dst: String,
    pub class: TrafficClass,
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.src, self.dst, self.class)
    }
}

/// Forwarding action installed at a switch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Action {
    /// Forward matching traffic to the named neighbor.
    Forward(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward(next_hop) => write!(f, "forward({next_hop})"),
        }
    }
}

/// One match/action rule at one switch.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FlowTableEntry {
    /// Owning flow. Two flows can share a match tuple, so replacement on
    /// reroute goes by this id rather than by match.
    pub flow: FlowId,
    pub match_key: MatchKey,
    pub action: Action,
    pub priority: u8,
}

/// Switch-keyed forwarding entries. Order within a switch is cosmetic.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct FlowTables {
    inner: FxHashMap<String, Vec<FlowTableEntry>>,
}

impl FlowTables {
    /// Replaces the flow's entries wholesale: old rules are discarded
    /// first, so no stale forwarding state survives a reroute or a drop.
    pub(crate) fn rebuild(&mut self, flow: &Flow) {
        self.inner.retain(|_, entries| {
            entries.retain(|e| e.flow != flow.id);
            !entries.is_empty()
        });
        let base = if flow.critical { PRIO_CRITICAL } else { PRIO_NORMAL };
        if let Some(path) = &flow.primary {
            self.emit(flow, path, base);
        }
        if let Some(path) = &flow.backup {
            // Standby rules live in their own priority layer below the
            // flow's active ones.
            self.emit(flow, path, base - BACKUP_PRIO_STEP);
        }
    }

    fn emit(&mut self, flow: &Flow, path: &Path, priority: u8) {
        for (u, v) in path.edges() {
            self.inner.entry(u.to_owned()).or_default().push(FlowTableEntry {
                flow: flow.id,
                match_key: MatchKey::new(flow.src.clone(), flow.dst.clone(), flow.class),
                action: Action::Forward(v.to_owned()),
                priority,
            });
        }
    }

    /// The flow's entries grouped by switch, in stable switch order.
    pub fn for_flow(&self, id: FlowId) -> BTreeMap<String, Vec<FlowTableEntry>> {
        let mut out = BTreeMap::new();
        for (switch, entries) in &self.inner {
            let owned: Vec<_> = entries.iter().filter(|e| e.flow == id).cloned().collect();
            if !owned.is_empty() {
                out.insert(switch.clone(), owned);
            }
        }
        out
    }

    pub fn entries_at(&self, switch: &str) -> &[FlowTableEntry] {
        self.inner.get(switch).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nr_entries(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FlowStatus;

    fn critical_flow() -> Flow {
        Flow {
            id: FlowId::ONE,
            src: "A".to_owned(),
            dst: "C".to_owned(),
            class: TrafficClass::Voice,
            critical: true,
            primary: Some(["A", "B", "C"].into_iter().collect()),
            backup: Some(["A", "C"].into_iter().collect()),
            status: FlowStatus::Installed,
        }
    }

    #[test]
    fn rebuild_emits_one_entry_per_upstream_switch() {
        let mut tables = FlowTables::default();
        tables.rebuild(&critical_flow());
        // A carries the first primary hop and the backup hop; B the second
        // primary hop.
        assert_eq!(tables.entries_at("A").len(), 2);
        assert_eq!(tables.entries_at("B").len(), 1);
        assert_eq!(tables.entries_at("C").len(), 0);
        assert_eq!(tables.nr_entries(), 3);
    }

    #[test]
    fn priorities_separate_primary_and_backup_layers() {
        let mut tables = FlowTables::default();
        tables.rebuild(&critical_flow());
        let at_a = tables.entries_at("A");
        let primary = at_a
            .iter()
            .find(|e| e.action == Action::Forward("B".to_owned()))
            .unwrap();
        let backup = at_a
            .iter()
            .find(|e| e.action == Action::Forward("C".to_owned()))
            .unwrap();
        assert_eq!(primary.priority, PRIO_CRITICAL);
        assert_eq!(backup.priority, PRIO_CRITICAL - BACKUP_PRIO_STEP);
    }

    #[test]
    fn noncritical_flows_rank_below_critical_ones() {
        let mut tables = FlowTables::default();
        let mut flow = critical_flow();
        flow.critical = false;
        flow.backup = None;
        tables.rebuild(&flow);
        assert!(tables
            .entries_at("A")
            .iter()
            .all(|e| e.priority == PRIO_NORMAL));
    }

    #[test]
    fn rebuild_replaces_stale_entries() {
        let mut tables = FlowTables::default();
        let mut flow = critical_flow();
        tables.rebuild(&flow);
        flow.primary = Some(["A", "C"].into_iter().collect());
        flow.backup = None;
        tables.rebuild(&flow);
        assert_eq!(tables.nr_entries(), 1);
        assert!(tables
            .entries_at("A")
            .iter()
            .all(|e| e.action == Action::Forward("C".to_owned())));
        assert_eq!(tables.entries_at("B").len(), 0);
    }

    #[test]
    fn rebuild_of_a_dropped_flow_clears_its_entries() {
        let mut tables = FlowTables::default();
        let mut flow = critical_flow();
        tables.rebuild(&flow);
        flow.primary = None;
        flow.backup = None;
        flow.status = FlowStatus::Dropped;
        tables.rebuild(&flow);
        assert_eq!(tables.nr_entries(), 0);
        assert!(tables.for_flow(flow.id).is_empty());
    }

    #[test]
    fn entries_are_isolated_per_flow() {
        let mut tables = FlowTables::default();
        let first = critical_flow();
        let mut second = critical_flow();
        second.id = FlowId::new(2);
        tables.rebuild(&first);
        tables.rebuild(&second);
        let mut gone = first.clone();
        gone.primary = None;
        gone.backup = None;
        tables.rebuild(&gone);
        assert!(tables.for_flow(first.id).is_empty());
        assert_eq!(tables.for_flow(second.id).len(), 2);
    }
}

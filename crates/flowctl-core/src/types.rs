//! Core data types: nodes, links, traffic classes, paths, and flows.

use std::fmt;

use itertools::Itertools;

identifier!(FlowId, u64);

/// A switch in the topology. Nodes carry no state beyond their name.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    pub name: String,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Attributes of an undirected link. The endpoints live in the topology
/// graph; a failed link is excluded from all path computation until
/// restored.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Link {
    /// Positive cost/delay proxy.
    pub weight: f64,
    /// Advisory load counter, floor 0.
    pub utilization: u32,
    pub failed: bool,
}

impl Link {
    pub fn new(weight: f64) -> Self {
        Self {
            weight,
            utilization: 0,
            failed: false,
        }
    }
}

/// Traffic classes, each with its own path-selection policy. The set is
/// closed so a new class extends the policy dispatch at compile time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficClass {
    Video,
    Voice,
    #[default]
    BestEffort,
}

impl TrafficClass {
    /// Parses a class name. Unrecognized names fall back to best-effort.
    pub fn from_name(name: &str) -> Self {
        match name {
            "video" => Self::Video,
            "voice" => Self::Voice,
            _ => Self::BestEffort,
        }
    }
}

impl fmt::Display for TrafficClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Video => "video",
            Self::Voice => "voice",
            Self::BestEffort => "besteffort",
        };
        f.write_str(name)
    }
}

/// An ordered sequence of node names. Paths are held by value so they stay
/// readable even after the topology they were computed on has changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Path {
    hops: Vec<String>,
}

impl Path {
    pub fn new(hops: Vec<String>) -> Self {
        Self { hops }
    }

    pub fn hops(&self) -> &[String] {
        &self.hops
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Consecutive node pairs along the path. A path with fewer than two
    /// hops has no edges.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.hops
            .iter()
            .tuple_windows()
            .map(|(u, v)| (u.as_str(), v.as_str()))
    }

    /// Whether the path traverses the link between `u` and `v`, in either
    /// orientation.
    pub fn contains_edge(&self, u: &str, v: &str) -> bool {
        self.edges().any(|(a, b)| (a == u && b == v) || (a == v && b == u))
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            hops: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hops.join(" -> "))
    }
}

/// Installed flows have a non-empty primary path. Dropped flows are parked
/// with an empty one until a caller explicitly asks for recomputation;
/// nothing retries them in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FlowStatus {
    Installed,
    Dropped,
}

impl fmt::Display for FlowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Installed => "installed",
            Self::Dropped => "dropped",
        })
    }
}

/// A single src -> dst traffic demand.
///
/// If `backup` is present, its edge set is disjoint from `primary`'s.
/// Non-critical flows never carry a backup.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Flow {
    pub id: FlowId,
    pub src: String,
    pub dst: String,
    pub class: TrafficClass,
    pub critical: bool,
    pub primary: Option<Path>,
    pub backup: Option<Path>,
    pub status: FlowStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_edges_are_consecutive_pairs() {
        let path: Path = ["A", "B", "C"].into_iter().collect();
        let edges: Vec<_> = path.edges().collect();
        assert_eq!(edges, vec![("A", "B"), ("B", "C")]);
    }

    #[test]
    fn contains_edge_ignores_orientation() {
        let path: Path = ["A", "B", "C"].into_iter().collect();
        assert!(path.contains_edge("A", "B"));
        assert!(path.contains_edge("B", "A"));
        assert!(path.contains_edge("C", "B"));
        assert!(!path.contains_edge("A", "C"));
    }

    #[test]
    fn single_hop_path_has_no_edges() {
        let path: Path = ["A"].into_iter().collect();
        assert_eq!(path.edges().count(), 0);
    }

    #[test]
    fn unknown_class_falls_back_to_besteffort() {
        assert_eq!(TrafficClass::from_name("video"), TrafficClass::Video);
        assert_eq!(TrafficClass::from_name("voice"), TrafficClass::Voice);
        assert_eq!(TrafficClass::from_name("bulk"), TrafficClass::BestEffort);
    }

    #[test]
    fn path_displays_as_arrow_chain() {
        let path: Path = ["A", "B", "C"].into_iter().collect();
        assert_eq!(path.to_string(), "A -> B -> C");
    }

    #[test]
    fn flow_id_parses_from_str() {
        assert_eq!("3".parse::<FlowId>().unwrap(), FlowId::new(3));
    }
}

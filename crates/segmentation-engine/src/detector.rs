use crate::topology::{Level, TopologyModel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest level gap a link may span by default.
pub const DEFAULT_THRESHOLD: u32 = 1;

/// Zone-adjacency rule: a link may connect zones at most `threshold`
/// levels apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyPolicy {
    pub threshold: u32,
}

impl Default for AdjacencyPolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl AdjacencyPolicy {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn allows(&self, source_level: Level, target_level: Level) -> bool {
        source_level.abs_diff(target_level) <= self.threshold
    }
}

/// Which way a violating link points across the zone hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// From a more exposed zone into a more critical one
    Inbound,
    /// From a more critical zone out to a more exposed one
    Outbound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub source: String,
    pub target: String,
    pub source_level: Level,
    pub target_level: Level,
    pub gap: u32,
}

impl Violation {
    pub fn direction(&self) -> Direction {
        if self.source_level > self.target_level {
            Direction::Inbound
        } else {
            Direction::Outbound
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.target)
    }
}

/// Every edge whose endpoint levels differ by more than `threshold`, in
/// edge insertion order. Unknown endpoints count as level 1.
pub fn find_violations(model: &TopologyModel, threshold: u32) -> Vec<Violation> {
    let policy = AdjacencyPolicy::new(threshold);
    model
        .edges()
        .filter_map(|edge| {
            let source_level = model.level(&edge.source);
            let target_level = model.level(&edge.target);
            if policy.allows(source_level, target_level) {
                None
            } else {
                Some(Violation {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    source_level,
                    target_level,
                    gap: source_level.abs_diff(target_level),
                })
            }
        })
        .collect()
}

/// Detector bound to one adjacency policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViolationDetector {
    policy: AdjacencyPolicy,
}

impl ViolationDetector {
    pub fn new(policy: AdjacencyPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AdjacencyPolicy {
        self.policy
    }

    pub fn detect(&self, model: &TopologyModel) -> Vec<Violation> {
        find_violations(model, self.policy.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::Attributes;
    use crate::topology::NodeAttrs;

    fn chain() -> TopologyModel {
        let mut model = TopologyModel::new();
        model.add_node("corp", NodeAttrs::new(4, "corporate"));
        model.add_node("dmz", NodeAttrs::new(3, "dmz"));
        model.add_node("plc", NodeAttrs::new(1, "plc"));
        model.add_edge("corp", "dmz", Attributes::new());
        model.add_edge("corp", "plc", Attributes::new());
        model.add_edge("plc", "dmz", Attributes::new());
        model
    }

    #[test]
    fn test_find_violations_in_edge_order() {
        let violations = find_violations(&chain(), 1);
        let names: Vec<String> = violations.iter().map(|v| v.to_string()).collect();

        assert_eq!(names, vec!["corp->plc", "plc->dmz"]);
        assert_eq!(violations[0].gap, 3);
        assert_eq!(violations[0].direction(), Direction::Inbound);
        assert_eq!(violations[1].direction(), Direction::Outbound);
    }

    #[test]
    fn test_threshold_relaxes() {
        let model = chain();
        assert_eq!(find_violations(&model, 2).len(), 1);
        assert!(find_violations(&model, 3).is_empty());
    }

    #[test]
    fn test_empty_model() {
        assert!(find_violations(&TopologyModel::new(), 0).is_empty());
    }

    #[test]
    fn test_detector_uses_policy() {
        let detector = ViolationDetector::new(AdjacencyPolicy::new(2));
        let violations = detector.detect(&chain());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].source, "corp");
        assert!(AdjacencyPolicy::default().allows(2, 1));
    }
}

use crate::detector::Violation;
use crate::topology::TopologyModel;
use std::collections::HashSet;
use tracing::warn;

pub const MAX_SCORE: f64 = 100.0;
pub const MIN_SCORE: f64 = 0.0;
/// Scores are reported to one decimal.
const SCORE_STEP: f64 = 0.1;
/// Score of a topology with no edges: nothing was segmented.
pub const EMPTY_TOPOLOGY_SCORE: f64 = 0.0;

/// Turns a topology and its violations into a grade in `[0, 100]`.
pub trait SegmentationScorer {
    fn name(&self) -> &str;
    fn score(&self, model: &TopologyModel, violations: &[Violation]) -> f64;
}

/// Share of edges that respect the adjacency policy, as a percentage
/// rounded to one decimal.
///
/// Only violations naming an actual edge of the model count, each pair
/// once. Isolated nodes carry no weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompliantEdgeRatio;

impl SegmentationScorer for CompliantEdgeRatio {
    fn name(&self) -> &str {
        "compliant_edge_ratio"
    }

    fn score(&self, model: &TopologyModel, violations: &[Violation]) -> f64 {
        let total = model.edge_count();
        if total == 0 {
            return EMPTY_TOPOLOGY_SCORE;
        }

        let violating: HashSet<(&str, &str)> = violations
            .iter()
            .map(|v| (v.source.as_str(), v.target.as_str()))
            .filter(|(s, t)| model.contains_edge(s, t))
            .collect();

        let compliant = total - violating.len();
        let raw = MAX_SCORE * compliant as f64 / total as f64;
        let mut score = (raw * 10.0).round() / 10.0;

        // Rounding must not hide a violation, nor a single compliant edge.
        if !violating.is_empty() {
            score = score.min(MAX_SCORE - SCORE_STEP);
        }
        if compliant > 0 {
            score = score.max(MIN_SCORE + SCORE_STEP);
        }
        score.clamp(MIN_SCORE, MAX_SCORE)
    }
}

/// Stand-in used when no scoring helper is installed. Always awards the
/// minimum.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableScorer;

impl SegmentationScorer for UnavailableScorer {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn score(&self, _model: &TopologyModel, _violations: &[Violation]) -> f64 {
        warn!("Segmentation scorer not available, awarding minimum score");
        MIN_SCORE
    }
}

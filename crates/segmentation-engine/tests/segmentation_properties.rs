//! Property tests for ingestion, detection and scoring.

use proptest::prelude::*;
use zonegraph_core::{find_violations, CompliantEdgeRatio, EdgeRow, SegmentationScorer, TopologyBuilder};

fn row_strategy() -> impl Strategy<Value = EdgeRow> {
    (
        prop::option::of("[a-e]"),
        prop::option::of("[a-e]"),
        prop::option::of(prop_oneof!["[1-6]", Just("x".to_string()), Just(String::new())]),
        prop::option::of(prop_oneof!["[1-6]", Just("2.0".to_string())]),
    )
        .prop_map(|(source, target, source_level, target_level)| EdgeRow {
            source,
            target,
            source_level,
            target_level,
            ..Default::default()
        })
}

proptest! {
    #[test]
    fn edges_bounded_and_endpoints_present(rows in prop::collection::vec(row_strategy(), 0..40)) {
        let model = TopologyBuilder::new().build_from_rows(&rows).model;
        prop_assert!(model.edge_count() <= rows.len());
        for edge in model.edges() {
            prop_assert!(model.contains_node(&edge.source));
            prop_assert!(model.contains_node(&edge.target));
        }
    }

    #[test]
    fn detection_is_deterministic(rows in prop::collection::vec(row_strategy(), 0..40), threshold in 0u32..5) {
        let model = TopologyBuilder::new().build_from_rows(&rows).model;
        prop_assert_eq!(find_violations(&model, threshold), find_violations(&model, threshold));
    }

    #[test]
    fn raising_threshold_never_adds_violations(rows in prop::collection::vec(row_strategy(), 0..40), threshold in 0u32..5) {
        let model = TopologyBuilder::new().build_from_rows(&rows).model;
        prop_assert!(find_violations(&model, threshold + 1).len() <= find_violations(&model, threshold).len());
    }

    #[test]
    fn repeated_rows_collapse(row in row_strategy(), copies in 1usize..5) {
        let rows = vec![row.clone(); copies];
        let model = TopologyBuilder::new().build_from_rows(&rows).model;
        let expected = usize::from(row.source.is_some() && row.target.is_some());
        prop_assert_eq!(model.edge_count(), expected);
    }

    #[test]
    fn score_stays_in_range(rows in prop::collection::vec(row_strategy(), 0..40), threshold in 0u32..5) {
        let model = TopologyBuilder::new().build_from_rows(&rows).model;
        let violations = find_violations(&model, threshold);
        let score = CompliantEdgeRatio.score(&model, &violations);
        prop_assert!((0.0..=100.0).contains(&score));
        if model.edge_count() > 0 && violations.is_empty() {
            prop_assert_eq!(score, 100.0);
        }
        if model.edge_count() > 0 && violations.len() == model.edge_count() {
            prop_assert_eq!(score, 0.0);
        }
        if !violations.is_empty() {
            prop_assert!(score < 100.0);
        }
    }
}

//! Segmentation graph analysis engine for OT/ICS training exercises.
//!
//! A session ingests a network topology (generated sample or uploaded CSV),
//! the detector flags links that cross more security zones than the
//! adjacency policy allows, and the scorer turns that into a 0-100 grade.
//!
//! Levels use Purdue-style numbering: 1 is the most critical tier (field
//! devices and process control), higher numbers are progressively more
//! exposed (corporate, internet-facing).

pub mod properties {
    use serde::{Deserialize, Serialize};
    use std::fmt;

    /// Passthrough attribute carried on an edge. Parsed from extra CSV
    /// columns, never interpreted by the engine.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Value {
        Bool(bool),
        Int(i64),
        Float(f64),
        String(String),
    }

    impl Value {
        /// Infer the narrowest value type for a raw table cell.
        pub fn parse_cell(raw: &str) -> Self {
            let trimmed = raw.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Value::Int(i);
            }
            if let Ok(f) = trimmed.parse::<f64>() {
                if f.is_finite() {
                    return Value::Float(f);
                }
            }
            match trimmed.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(trimmed.to_string()),
            }
        }
    }

    impl fmt::Display for Value {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Value::Bool(b) => write!(f, "{}", b),
                Value::Int(i) => write!(f, "{}", i),
                Value::Float(x) => write!(f, "{}", x),
                Value::String(s) => f.write_str(s),
            }
        }
    }

    /// Edge attribute table, kept in column order.
    pub type Attributes = indexmap::IndexMap<String, Value>;

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_cell_types() {
            assert_eq!(Value::parse_cell(" 502 "), Value::Int(502));
            assert_eq!(Value::parse_cell("0.5"), Value::Float(0.5));
            assert_eq!(Value::parse_cell("TRUE"), Value::Bool(true));
            assert_eq!(Value::parse_cell("modbus"), Value::String("modbus".to_string()));
            assert_eq!(Value::parse_cell("NaN"), Value::String("NaN".to_string()));
        }
    }
}

pub mod config;
pub mod detector;
pub mod error;
pub mod ingest;
pub mod layout;
pub mod progress;
pub mod render;
pub mod scorer;
pub mod session;
pub mod telemetry;
pub mod topology;

pub use config::EngineConfig;
pub use detector::{find_violations, AdjacencyPolicy, Violation, ViolationDetector};
pub use error::{Result, SegmentationError};
pub use ingest::{EdgeRow, IngestReport, IngestWarning, Ingested, TopologyBuilder};
pub use layout::{LayoutProjector, Point};
pub use scorer::{CompliantEdgeRatio, SegmentationScorer, EMPTY_TOPOLOGY_SCORE};
pub use session::{Evaluation, SegmentationExercise, SessionContext, UserContext};
pub use topology::{Level, LevelOrigin, NodeAttrs, TopologyModel};

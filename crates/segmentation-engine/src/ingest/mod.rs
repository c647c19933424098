use crate::error::Result;
use crate::properties::Attributes;
use crate::topology::{Level, TopologyModel, DEFAULT_SOURCE_LEVEL, DEFAULT_TARGET_LEVEL};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

pub mod extractor;
pub mod sample;

use extractor::{CsvExtractor, Extractor};
use sample::{ReferencePlant, SampleSource};

/// One tabular input row. Cells are kept raw; the builder decides what is
/// usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeRow {
    /// 1-based line in the source document, 0 when not from a file
    #[serde(default)]
    pub line: u64,
    pub source: Option<String>,
    pub target: Option<String>,
    #[serde(default)]
    pub source_level: Option<String>,
    #[serde(default)]
    pub target_level: Option<String>,
    #[serde(default)]
    pub source_role: Option<String>,
    #[serde(default)]
    pub target_role: Option<String>,
    #[serde(default)]
    pub extra: Attributes,
}

impl EdgeRow {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            target: Some(target.into()),
            ..Default::default()
        }
    }

    pub fn with_levels(mut self, source_level: impl ToString, target_level: impl ToString) -> Self {
        self.source_level = Some(source_level.to_string());
        self.target_level = Some(target_level.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestWarning {
    MalformedRow { line: u64, missing: Vec<String> },
    SampleUnavailable { reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub edges_inserted: usize,
    pub duplicate_edges: usize,
    /// Level cells that were present but not a usable level
    pub ignored_levels: usize,
    pub warnings: Vec<IngestWarning>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// A built topology together with what happened while building it.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub model: TopologyModel,
    pub report: IngestReport,
}

/// Parse a level cell. Accepts integers and integral floats (`"3.0"`) of at
/// least 1; anything else is treated as absent.
pub fn parse_level(raw: &str) -> Option<Level> {
    let trimmed = raw.trim();
    if let Ok(level) = trimmed.parse::<i64>() {
        return Level::try_from(level).ok().filter(|l| *l >= 1);
    }
    let value = trimmed.parse::<f64>().ok()?;
    if value.is_finite() && value.fract() == 0.0 && value >= 1.0 && value <= Level::MAX as f64 {
        Some(value as Level)
    } else {
        None
    }
}

fn present(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Builds topology models from the sample capability or tabular rows.
pub struct TopologyBuilder {
    sample_source: Box<dyn SampleSource>,
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::with_sample_source(Box::new(ReferencePlant::new()))
    }

    pub fn with_sample_source(sample_source: Box<dyn SampleSource>) -> Self {
        Self { sample_source }
    }

    pub fn sample_source(&self) -> &dyn SampleSource {
        self.sample_source.as_ref()
    }

    /// Generate the sample network. If the sample capability fails the
    /// result is an empty model with a `SampleUnavailable` warning.
    pub fn build_sample(&self) -> Ingested {
        match self.sample_source.generate() {
            Ok(model) => {
                info!(
                    source = self.sample_source.name(),
                    nodes = model.node_count(),
                    edges = model.edge_count(),
                    "Generated sample network"
                );
                let report = IngestReport {
                    edges_inserted: model.edge_count(),
                    ..Default::default()
                };
                Ingested { model, report }
            }
            Err(e) => {
                warn!(source = self.sample_source.name(), error = %e, "Sample network not available");
                Ingested {
                    model: TopologyModel::new(),
                    report: IngestReport {
                        warnings: vec![IngestWarning::SampleUnavailable {
                            reason: e.to_string(),
                        }],
                        ..Default::default()
                    },
                }
            }
        }
    }

    /// Build a model from rows in order.
    ///
    /// Rows without a source or target are skipped and reported. An endpoint
    /// without an explicit level takes the default for its role in the
    /// current row (source 2, target 1); explicit levels overwrite, last
    /// write wins, and are never replaced by a later default.
    pub fn build_from_rows(&self, rows: &[EdgeRow]) -> Ingested {
        let mut model = TopologyModel::new();
        let mut report = IngestReport::default();

        for row in rows {
            report.rows_read += 1;

            let (source, target) = match (present(&row.source), present(&row.target)) {
                (Some(s), Some(t)) => (s, t),
                (s, t) => {
                    let mut missing = Vec::new();
                    if s.is_none() {
                        missing.push("source".to_string());
                    }
                    if t.is_none() {
                        missing.push("target".to_string());
                    }
                    warn!(line = row.line, ?missing, "Skipping malformed row");
                    report.rows_skipped += 1;
                    report.warnings.push(IngestWarning::MalformedRow {
                        line: row.line,
                        missing,
                    });
                    continue;
                }
            };

            model.apply_default_level(source, DEFAULT_SOURCE_LEVEL);
            model.apply_default_level(target, DEFAULT_TARGET_LEVEL);

            for (id, cell, column) in [
                (source, &row.source_level, "source_level"),
                (target, &row.target_level, "target_level"),
            ] {
                let Some(raw) = present(cell) else { continue };
                match parse_level(raw) {
                    Some(level) => model.set_level(id, level),
                    None => {
                        debug!(line = row.line, column, value = raw, "Ignoring non-numeric level");
                        report.ignored_levels += 1;
                    }
                }
            }

            if let Some(role) = present(&row.source_role) {
                model.set_role(source, role);
            }
            if let Some(role) = present(&row.target_role) {
                model.set_role(target, role);
            }

            if model.add_edge(source, target, row.extra.clone()) {
                report.edges_inserted += 1;
            } else {
                report.duplicate_edges += 1;
            }
        }

        info!(
            rows = report.rows_read,
            skipped = report.rows_skipped,
            nodes = model.node_count(),
            edges = model.edge_count(),
            "Built topology from rows"
        );

        Ingested { model, report }
    }

    /// Parse fully materialized CSV content and build from its rows.
    pub fn build_from_csv(&self, content: &[u8], delimiter: u8) -> Result<Ingested> {
        let rows = CsvExtractor::with_delimiter(delimiter).extract(content)?;
        Ok(self.build_from_rows(&rows))
    }
}

/// Read a CSV file from disk and build a topology from it.
pub fn load_csv_file(builder: &TopologyBuilder, path: &Path, delimiter: u8) -> anyhow::Result<Ingested> {
    let content = fs::read(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    builder
        .build_from_csv(&content, delimiter)
        .with_context(|| format!("Failed to parse topology CSV: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::find_violations;
    use crate::ingest::sample::UnavailableSample;
    use crate::topology::LevelOrigin;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("3"), Some(3));
        assert_eq!(parse_level(" 2.0 "), Some(2));
        assert_eq!(parse_level("2.5"), None);
        assert_eq!(parse_level("0"), None);
        assert_eq!(parse_level("-1"), None);
        assert_eq!(parse_level("high"), None);
        assert_eq!(parse_level("nan"), None);
    }

    #[test]
    fn test_default_level_policy() {
        let ingested = TopologyBuilder::new().build_from_rows(&[EdgeRow::new("ws", "plc")]);
        let model = ingested.model;

        assert_eq!(model.level("ws"), DEFAULT_SOURCE_LEVEL);
        assert_eq!(model.level("plc"), DEFAULT_TARGET_LEVEL);
        assert_eq!(model.node("ws").map(|n| n.level_origin), Some(LevelOrigin::Defaulted));
    }

    #[test]
    fn test_default_does_not_override_existing_node() {
        let rows = vec![EdgeRow::new("hmi", "plc").with_levels(2, 1), EdgeRow::new("plc", "io")];
        let model = TopologyBuilder::new().build_from_rows(&rows).model;

        // plc was created with an explicit level before it showed up as a source.
        assert_eq!(model.level("plc"), 1);
        assert_eq!(model.level("io"), DEFAULT_TARGET_LEVEL);
    }

    #[test]
    fn test_role_default_replaces_earlier_default() {
        let mut first = EdgeRow::new("Y", "V");
        first.target_level = Some("4".to_string());
        let mut second = EdgeRow::new("W", "Y");
        second.source_level = Some("3".to_string());

        let model = TopologyBuilder::new().build_from_rows(&[first, second]).model;

        // Y was only defaulted as a source, so its target role in the second row applies.
        assert_eq!(model.level("Y"), DEFAULT_TARGET_LEVEL);
        assert_eq!(model.node("Y").map(|n| n.level_origin), Some(LevelOrigin::Defaulted));
        assert_eq!(model.level("V"), 4);
        let found: Vec<String> = find_violations(&model, 1).iter().map(|v| v.to_string()).collect();
        assert_eq!(found, vec!["Y->V", "W->Y"]);
    }

    #[test]
    fn test_missing_target_column_skips_every_row() -> Result<()> {
        let ingested = TopologyBuilder::new().build_from_csv(b"source,port\na,502\nb,503\n", b',')?;

        assert!(ingested.model.is_empty());
        assert_eq!(ingested.report.rows_read, 2);
        assert_eq!(ingested.report.rows_skipped, 2);
        assert_eq!(ingested.report.edges_inserted, 0);
        assert_eq!(
            ingested.report.warnings,
            vec![
                IngestWarning::MalformedRow {
                    line: 2,
                    missing: vec!["target".to_string()]
                },
                IngestWarning::MalformedRow {
                    line: 3,
                    missing: vec!["target".to_string()]
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn test_non_numeric_levels_ignored() {
        let rows = vec![EdgeRow::new("a", "b").with_levels("high", "3")];
        let ingested = TopologyBuilder::new().build_from_rows(&rows);

        assert_eq!(ingested.model.level("a"), DEFAULT_SOURCE_LEVEL);
        assert_eq!(ingested.model.level("b"), 3);
        assert_eq!(ingested.report.ignored_levels, 1);
        assert!(ingested.report.is_clean());
    }

    #[test]
    fn test_roles_last_write_wins() {
        let mut first = EdgeRow::new("x", "y");
        first.source_role = Some("HMI".to_string());
        let mut second = EdgeRow::new("x", "z");
        second.source_role = Some("Engineering".to_string());

        let model = TopologyBuilder::new().build_from_rows(&[first, second]).model;
        assert_eq!(model.node("x").map(|n| n.role.as_str()), Some("Engineering"));
    }

    #[test]
    fn test_blank_ids_are_malformed() {
        let rows = vec![EdgeRow::new("  ", "b")];
        let ingested = TopologyBuilder::new().build_from_rows(&rows);

        assert!(ingested.model.is_empty());
        assert_eq!(
            ingested.report.warnings,
            vec![IngestWarning::MalformedRow {
                line: 0,
                missing: vec!["source".to_string()]
            }]
        );
    }

    #[test]
    fn test_unavailable_sample_falls_back_to_empty() {
        let builder = TopologyBuilder::with_sample_source(Box::new(UnavailableSample::new("no helper")));
        let ingested = builder.build_sample();

        assert!(ingested.model.is_empty());
        assert!(matches!(
            ingested.report.warnings.as_slice(),
            [IngestWarning::SampleUnavailable { .. }]
        ));
    }

    #[test]
    fn test_build_from_csv() -> Result<()> {
        let content = "source,target,source_level,target_level\nA,B,1,2\nB,C,2,4\n";
        let ingested = TopologyBuilder::new().build_from_csv(content.as_bytes(), b',')?;
        assert_eq!(ingested.model.edge_count(), 2);
        assert_eq!(ingested.model.level("C"), 4);
        Ok(())
    }
}

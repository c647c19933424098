//! Session-scoped state and the exercise that drives the engine.

use crate::config::EngineConfig;
use crate::detector::{AdjacencyPolicy, Violation, ViolationDetector};
use crate::error::{Result, SegmentationError};
use crate::ingest::sample::ReferencePlant;
use crate::ingest::{IngestReport, Ingested, TopologyBuilder};
use crate::layout::LayoutProjector;
use crate::progress::{ProgressRecord, ProgressSink};
use crate::render::RenderScene;
use crate::scorer::{CompliantEdgeRatio, SegmentationScorer};
use crate::topology::{Level, TopologyModel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: i64,
    pub username: String,
}

impl UserContext {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        Self {
            user_id,
            username: username.into(),
        }
    }
}

/// Per-login state. Owned by exactly one session, never shared.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: Uuid,
    pub user: UserContext,
    pub topology: Option<TopologyModel>,
    pub last_ingest: Option<IngestReport>,
}

impl SessionContext {
    pub fn new(user: UserContext) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            topology: None,
            last_ingest: None,
        }
    }

    fn install(&mut self, ingested: Ingested) {
        self.topology = Some(ingested.model);
        self.last_ingest = Some(ingested.report);
    }
}

/// Result of grading the session's current topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub threshold: u32,
    pub node_count: usize,
    pub edge_count: usize,
    pub isolated_nodes: Vec<String>,
    pub violations: Vec<Violation>,
    pub score: f64,
    pub level_histogram: BTreeMap<Level, usize>,
}

/// Wires builder, detector, scorer and layout for one exercise. Strategies
/// are fixed at construction.
pub struct SegmentationExercise {
    config: EngineConfig,
    builder: TopologyBuilder,
    detector: ViolationDetector,
    scorer: Box<dyn SegmentationScorer>,
    projector: LayoutProjector,
}

impl SegmentationExercise {
    pub fn new(config: EngineConfig) -> Self {
        let sample = ReferencePlant::new().with_extra_links(config.sample_extra_links, config.sample_seed);
        Self::with_strategies(
            config,
            TopologyBuilder::with_sample_source(Box::new(sample)),
            Box::new(CompliantEdgeRatio),
        )
    }

    pub fn with_strategies(
        config: EngineConfig,
        builder: TopologyBuilder,
        scorer: Box<dyn SegmentationScorer>,
    ) -> Self {
        let detector = ViolationDetector::new(AdjacencyPolicy::new(config.threshold));
        let projector = LayoutProjector::new(config.layout_seed, config.layout_iterations);
        Self {
            config,
            builder,
            detector,
            scorer,
            projector,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the session topology with a freshly generated sample.
    pub fn generate_sample<'s>(&self, session: &'s mut SessionContext) -> &'s IngestReport {
        let ingested = self.builder.build_sample();
        session.install(ingested);
        info!(session = %session.id, user = %session.user.username, "Loaded sample topology");
        session.last_ingest.get_or_insert_with(IngestReport::default)
    }

    /// Replace the session topology with one built from uploaded CSV. On a
    /// parse failure the previous topology stays in place.
    pub fn upload_csv<'s>(&self, session: &'s mut SessionContext, content: &[u8]) -> Result<&'s IngestReport> {
        let ingested = match self.builder.build_from_csv(content, self.config.delimiter_byte()) {
            Ok(ingested) => ingested,
            Err(e) => {
                warn!(session = %session.id, error = %e, "Rejected topology upload");
                return Err(e);
            }
        };
        session.install(ingested);
        info!(session = %session.id, user = %session.user.username, "Loaded uploaded topology");
        Ok(session.last_ingest.get_or_insert_with(IngestReport::default))
    }

    /// Grade a topology. Pure: safe to call repeatedly for what-if runs.
    pub fn evaluate_model(&self, model: &TopologyModel) -> Evaluation {
        let violations = self.detector.detect(model);
        let score = self.scorer.score(model, &violations);
        Evaluation {
            threshold: self.detector.policy().threshold,
            node_count: model.node_count(),
            edge_count: model.edge_count(),
            isolated_nodes: model.isolated_nodes(),
            violations,
            score,
            level_histogram: model.level_histogram(),
        }
    }

    /// Grade the session topology. A session without one grades as the
    /// empty topology.
    pub fn evaluate(&self, session: &SessionContext) -> Evaluation {
        let empty = TopologyModel::new();
        let model = session.topology.as_ref().unwrap_or(&empty);
        let evaluation = self.evaluate_model(model);
        info!(
            session = %session.id,
            scorer = self.scorer.name(),
            violations = evaluation.violations.len(),
            score = evaluation.score,
            "Evaluated segmentation"
        );
        evaluation
    }

    pub fn scene(&self, session: &SessionContext) -> RenderScene {
        match &session.topology {
            Some(model) => RenderScene::build(model, &self.detector.detect(model), &self.projector),
            None => RenderScene::default(),
        }
    }

    /// Score the session and hand the record to the progress store.
    pub fn submit(&self, session: &SessionContext, sink: &mut dyn ProgressSink) -> Result<ProgressRecord> {
        let evaluation = self.evaluate(session);
        let record = ProgressRecord::new(session.user.user_id, self.config.module_id.clone(), evaluation.score);
        if let Err(e) = sink.record(&record) {
            warn!(session = %session.id, error = %e, "Progress store failed");
            return Err(match e {
                SegmentationError::Progress(msg) => SegmentationError::Progress(msg),
                other => SegmentationError::Progress(other.to_string()),
            });
        }
        Ok(record)
    }
}

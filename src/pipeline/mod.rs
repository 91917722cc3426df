//! One scheduled run of the drift pipeline
//!
//! Stages execute in dependency order, each consuming the typed result of
//! the one before it: fetch populations, embed, derive the band, detect,
//! evaluate the trend, then either stop quietly or synthesize samples and
//! trigger retraining. Served live queries are archived at the end of every
//! run regardless of branch.

pub mod retrain;

use crate::config::Config;
use crate::drift::{DriftDetector, DriftReport, SimilarityBand, ThresholdEngine};
use crate::embedding::{BatchFetcher, EmbeddingClient, EmbeddingService};
use crate::errors::Result;
use crate::history::{DriftHistory, JsonFileHistory};
use crate::queries::{JsonFileQueryStore, QueryStore};
use crate::retrieval::{QdrantRetriever, Retriever};
use crate::retry::RetryPolicy;
use crate::storage::{ArtifactStore, LocalArtifactStore};
use crate::synthesis::{GenerationClient, GenerationConfig, Generator, SampleSynthesizer};
use crate::telemetry::{PipelineEvent, TelemetryCollector};
use crate::trend::{CooldownState, FileStateStore, StageOutcome, StateStore, TrendAnalyzer};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub use retrain::{LoggingRetrainTrigger, MemoryRetrainHook, RetrainHook, WebhookRetrainTrigger};

/// Every external seam the pipeline depends on
pub struct Collaborators {
    pub embedder: Arc<dyn EmbeddingService>,
    pub queries: Arc<dyn QueryStore>,
    pub history: Arc<dyn DriftHistory>,
    pub state: Arc<dyn StateStore>,
    pub retriever: Arc<dyn Retriever>,
    pub generator: Arc<dyn Generator>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub retrain: Arc<dyn RetrainHook>,
}

/// Terminal branch of a run
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// No trend; nothing was synthesized or triggered
    Stopped,
    /// Samples were synthesized, uploaded, and retraining was triggered
    Retrained { samples: usize, artifact: String },
}

/// Summary of one completed run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub band: SimilarityBand,
    pub drift_events: usize,
    pub events_in_window: usize,
    pub outcome: RunOutcome,
    pub archived_queries: usize,
}

/// Drift pipeline: wires the stages over injected collaborators
pub struct DriftPipeline {
    config: Config,
    collaborators: Collaborators,
    telemetry: TelemetryCollector,
}

impl DriftPipeline {
    /// Create a pipeline over explicit collaborators
    pub fn new(config: Config, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Create a pipeline with the production collaborators from config
    pub fn from_config(config: Config) -> Result<Self> {
        let services = &config.services;
        let policy = RetryPolicy::new();

        let embedder: Arc<dyn EmbeddingService> = Arc::new(EmbeddingClient::new(
            &services.embedding_url,
            &services.embedding_model,
            config.detection.embedding_dim,
        )?);

        let retriever: Arc<dyn Retriever> = Arc::new(QdrantRetriever::new(
            &services.qdrant_url,
            embedder.clone(),
            policy.clone(),
            &services.qdrant_collection,
            config.synthesis.top_k,
        )?);

        let generator: Arc<dyn Generator> = Arc::new(GenerationClient::new(
            &services.generation_url,
            &services.generation_model,
            GenerationConfig {
                max_output_tokens: config.synthesis.max_output_tokens,
                temperature: config.synthesis.temperature,
            },
        )?);

        let retrain: Arc<dyn RetrainHook> = match &services.retrain_webhook {
            Some(url) => Arc::new(WebhookRetrainTrigger::new(url)?),
            None => Arc::new(LoggingRetrainTrigger),
        };

        let paths = &config.paths;
        let collaborators = Collaborators {
            embedder,
            queries: Arc::new(JsonFileQueryStore::new(
                paths.train_queries_file.clone(),
                paths.live_queries_file.clone(),
                paths.archive_file.clone(),
            )),
            history: Arc::new(JsonFileHistory::new(paths.history_file.clone())?),
            state: Arc::new(FileStateStore::new(paths.state_file.clone())?),
            retriever,
            generator,
            artifacts: Arc::new(LocalArtifactStore::new(paths.artifact_store_dir.clone())?),
            retrain,
        };

        Ok(Self::new(config, collaborators))
    }

    /// Telemetry collected so far
    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    /// Execute one full run
    pub async fn run(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let run_time = Utc::now();
        info!(%run_id, "Starting drift pipeline run");

        let (band, detection, stage) = self.run_detection(run_time).await?;
        if stage == StageOutcome::Stop {
            let archived = self.collaborators.queries.archive_live_queries().await?;
            self.telemetry
                .record(PipelineEvent::QueriesArchived { count: archived });
            return Ok(RunReport {
                run_id,
                started_at: run_time,
                band,
                drift_events: detection.events.len(),
                events_in_window: 0,
                outcome: RunOutcome::Stopped,
                archived_queries: archived,
            });
        }

        let cooldown = self.collaborators.state.load().await?;
        let analyzer = TrendAnalyzer::new(
            self.config.trend.window_days,
            self.config.trend.min_events,
        );
        let trend = analyzer
            .analyze(self.collaborators.history.as_ref(), &cooldown, run_time)
            .await?;
        self.telemetry.record(PipelineEvent::TrendEvaluated {
            in_window: trend.events_in_window,
            escalated: matches!(trend.outcome, StageOutcome::Escalate(_)),
        });

        let outcome = match trend.outcome {
            StageOutcome::Escalate(queries) => self.run_escalation(&queries).await?,
            StageOutcome::Stop | StageOutcome::Continue => {
                info!("Run ended without escalation");
                RunOutcome::Stopped
            }
        };

        let archived = self.collaborators.queries.archive_live_queries().await?;
        self.telemetry
            .record(PipelineEvent::QueriesArchived { count: archived });

        info!(%run_id, ?outcome, "Drift pipeline run complete");
        Ok(RunReport {
            run_id,
            started_at: run_time,
            band,
            drift_events: detection.events.len(),
            events_in_window: trend.events_in_window,
            outcome,
            archived_queries: archived,
        })
    }

    /// Execute only the detection stages: embed, derive the band, classify,
    /// and record any drift events.
    pub async fn detect_only(&self) -> Result<(SimilarityBand, DriftReport)> {
        let (band, report, _) = self.run_detection(Utc::now()).await?;
        Ok((band, report))
    }

    /// Detection stage: always hands control to the trend analyzer; the
    /// stage runner honors Stop from any stage.
    async fn run_detection(
        &self,
        run_time: DateTime<Utc>,
    ) -> Result<(SimilarityBand, DriftReport, StageOutcome)> {
        let detection = &self.config.detection;
        let fetcher = BatchFetcher::new(
            self.collaborators.embedder.clone(),
            RetryPolicy::new(),
            detection.batch_size,
            &detection.embedding_task,
        );

        let train_queries = self.collaborators.queries.train_queries().await?;
        let live_queries = self.collaborators.queries.live_queries().await?;

        info!("Getting train embeddings");
        let train_embeddings = fetcher.fetch(&train_queries).await?;
        self.telemetry.record(PipelineEvent::EmbeddingsFetched {
            population: "train".to_string(),
            count: train_embeddings.len(),
        });

        info!("Getting live embeddings");
        let live_embeddings = fetcher.fetch(&live_queries).await?;
        self.telemetry.record(PipelineEvent::EmbeddingsFetched {
            population: "live".to_string(),
            count: live_embeddings.len(),
        });

        let engine = ThresholdEngine::new(
            detection.batch_size,
            detection.upper_factor,
            detection.lower_factor,
        );
        let band = engine.derive(&train_embeddings)?;
        self.telemetry.record(PipelineEvent::BandDerived {
            upper: band.upper_threshold,
            lower: band.lower_threshold,
        });

        let detector = DriftDetector::new(band);
        let report = detector.detect(&live_queries, &live_embeddings, &train_embeddings, run_time);
        self.telemetry.record(PipelineEvent::DriftDetected {
            count: report.events.len(),
        });

        if report.any_drift() {
            self.collaborators.history.append(&report.events).await?;
        }

        Ok((band, report, StageOutcome::Continue))
    }

    async fn run_escalation(&self, queries: &[String]) -> Result<RunOutcome> {
        let synthesizer = SampleSynthesizer::new(
            self.collaborators.retriever.clone(),
            self.collaborators.generator.clone(),
            RetryPolicy::new(),
            self.config.synthesis.sample_quota,
        );

        let samples = synthesizer.synthesize(queries).await?;
        self.telemetry.record(PipelineEvent::SamplesGenerated {
            count: samples.len(),
        });

        let artifact_path = &self.config.paths.artifact_file;
        SampleSynthesizer::write_artifact(&samples, artifact_path)?;

        let remote_id = self.collaborators.artifacts.upload(artifact_path).await?;
        self.telemetry.record(PipelineEvent::ArtifactUploaded {
            remote_id: remote_id.clone(),
        });

        self.collaborators.retrain.trigger().await?;
        self.collaborators
            .state
            .save(CooldownState {
                last_trigger_at: Some(Utc::now()),
            })
            .await?;
        self.telemetry.record(PipelineEvent::RetrainTriggered);

        Ok(RunOutcome::Retrained {
            samples: samples.len(),
            artifact: remote_id,
        })
    }
}

//! Run telemetry for the drift pipeline
//!
//! Collects per-stage events during a run and aggregates them into a
//! summary the CLI prints when the run finishes.

use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    EmbeddingsFetched {
        population: String,
        count: usize,
    },
    BandDerived {
        upper: f32,
        lower: f32,
    },
    DriftDetected {
        count: usize,
    },
    TrendEvaluated {
        in_window: usize,
        escalated: bool,
    },
    SamplesGenerated {
        count: usize,
    },
    ArtifactUploaded {
        remote_id: String,
    },
    RetrainTriggered,
    QueriesArchived {
        count: usize,
    },
}

/// Aggregated run statistics
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub embeddings_fetched: usize,
    pub drift_events: usize,
    pub window_events: usize,
    pub escalated: bool,
    pub samples_generated: usize,
    pub retrain_triggered: bool,
    pub queries_archived: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<PipelineEvent>>>,
    stats: Arc<Mutex<RunStats>>,
    start_time: Instant,
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(RunStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: PipelineEvent) {
        {
            let mut stats = self.stats.lock().unwrap();
            match &event {
                PipelineEvent::EmbeddingsFetched { count, .. } => {
                    stats.embeddings_fetched += count;
                }
                PipelineEvent::DriftDetected { count } => {
                    stats.drift_events = *count;
                }
                PipelineEvent::TrendEvaluated {
                    in_window,
                    escalated,
                } => {
                    stats.window_events = *in_window;
                    stats.escalated = *escalated;
                }
                PipelineEvent::SamplesGenerated { count } => {
                    stats.samples_generated = *count;
                }
                PipelineEvent::RetrainTriggered => {
                    stats.retrain_triggered = true;
                }
                PipelineEvent::QueriesArchived { count } => {
                    stats.queries_archived = *count;
                }
                PipelineEvent::BandDerived { .. } | PipelineEvent::ArtifactUploaded { .. } => {}
            }
        }

        self.events.lock().unwrap().push(event);
    }

    /// Current aggregated stats
    pub fn stats(&self) -> RunStats {
        self.stats.lock().unwrap().clone()
    }

    /// All recorded events
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Elapsed wall time since collector creation
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

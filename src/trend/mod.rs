//! Multi-run trend aggregation over the drift history
//!
//! A single drift event is noise; a repeat inside the rolling window is a
//! pattern worth retraining on. The window never reaches back past the last
//! retraining trigger, so one emerging topic cannot fire twice.

pub mod state;

use crate::errors::Result;
use crate::history::DriftHistory;
use chrono::{DateTime, Duration, Utc};
use tracing::info;

pub use state::{CooldownState, FileStateStore, MemoryStateStore, StateStore};

/// Branch selected after a pipeline stage
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutcome {
    /// Proceed to the next stage
    Continue,
    /// End the run quietly; nothing to act on
    Stop,
    /// Escalate these queries to sample synthesis
    Escalate(Vec<String>),
}

/// Result of one trend evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct TrendReport {
    /// Start of the evaluated window
    pub window_start: DateTime<Utc>,
    /// Qualifying events found in the window
    pub events_in_window: usize,
    /// Branch selected for the rest of the run
    pub outcome: StageOutcome,
}

/// Rolling-window trend analyzer
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    window_days: i64,
    min_events: usize,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(7, 2)
    }
}

impl TrendAnalyzer {
    /// Create an analyzer with the given window length and escalation bar
    pub fn new(window_days: i64, min_events: usize) -> Self {
        Self {
            window_days,
            min_events,
        }
    }

    /// Window start for this run: the later of the cooldown floor and
    /// `now - window_days`
    pub fn window_start(&self, state: &CooldownState, now: DateTime<Utc>) -> DateTime<Utc> {
        let rolling_floor = now - Duration::days(self.window_days);
        state.window_floor().max(rolling_floor)
    }

    /// Evaluate the window and decide whether to escalate.
    ///
    /// Escalation returns the distinct drifted queries in first-appearance
    /// order. The cooldown state is not updated here; that happens only
    /// when the retrain trigger actually fires.
    pub async fn analyze(
        &self,
        history: &dyn DriftHistory,
        state: &CooldownState,
        now: DateTime<Utc>,
    ) -> Result<TrendReport> {
        let window_start = self.window_start(state, now);
        let events = history.events_since(window_start).await?;

        info!(
            count = events.len(),
            window_start = %window_start,
            "Fetched drift events in window"
        );

        if events.len() < self.min_events {
            info!("No data drift trend detected");
            return Ok(TrendReport {
                window_start,
                events_in_window: events.len(),
                outcome: StageOutcome::Stop,
            });
        }

        let mut queries = Vec::new();
        for event in &events {
            if !queries.contains(&event.query) {
                queries.push(event.query.clone());
            }
        }

        info!(queries = queries.len(), "Data drift trend detected, escalating");
        Ok(TrendReport {
            window_start,
            events_in_window: events.len(),
            outcome: StageOutcome::Escalate(queries),
        })
    }
}

//! Append-only drift event log with windowed retrieval
//!
//! Events are never mutated or deleted by the pipeline; archival is an
//! external concern. The file-backed store keeps the whole log as one JSON
//! document, matching how the rest of the durable state is persisted.

use crate::errors::{DriftError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// One detected drift occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftEvent {
    /// The live query that drifted
    pub query: String,
    /// Its minimum similarity against the train set
    pub similarity: f32,
    /// When the detecting run observed it
    pub timestamp: DateTime<Utc>,
}

/// Append-only drift history seam
#[async_trait]
pub trait DriftHistory: Send + Sync {
    /// Append a batch of events in one write
    async fn append(&self, events: &[DriftEvent]) -> Result<()>;

    /// All events strictly after the given instant
    async fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<DriftEvent>>;
}

/// JSON-file drift history log
pub struct JsonFileHistory {
    path: PathBuf,
}

impl JsonFileHistory {
    /// Create a history log at the given path
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    fn read_all(&self) -> Result<Vec<DriftEvent>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        let events: Vec<DriftEvent> = serde_json::from_str(&contents)
            .map_err(|e| DriftError::HistoryError(format!("Corrupt history file: {}", e)))?;
        Ok(events)
    }

    fn write_all(&self, events: &[DriftEvent]) -> Result<()> {
        let json = serde_json::to_string_pretty(events)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[async_trait]
impl DriftHistory for JsonFileHistory {
    async fn append(&self, events: &[DriftEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }
        let mut all = self.read_all()?;
        all.extend_from_slice(events);
        self.write_all(&all)
    }

    async fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<DriftEvent>> {
        let all = self.read_all()?;
        Ok(all.into_iter().filter(|e| e.timestamp > since).collect())
    }
}

/// In-memory drift history for tests and embedded use
#[derive(Default)]
pub struct MemoryHistory {
    events: Mutex<Vec<DriftEvent>>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events
    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DriftHistory for MemoryHistory {
    async fn append(&self, events: &[DriftEvent]) -> Result<()> {
        self.events.lock().unwrap().extend_from_slice(events);
        Ok(())
    }

    async fn events_since(&self, since: DateTime<Utc>) -> Result<Vec<DriftEvent>> {
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.timestamp > since)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn create_test_history() -> (JsonFileHistory, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("drift_history.json");
        let history = JsonFileHistory::new(path).unwrap();
        (history, temp_dir)
    }

    fn event(query: &str, similarity: f32, at: DateTime<Utc>) -> DriftEvent {
        DriftEvent {
            query: query.to_string(),
            similarity,
            timestamp: at,
        }
    }

    #[tokio::test]
    async fn test_roundtrip() {
        let (history, _temp) = create_test_history();
        let now = Utc::now();

        let written = event("which ml course is best?", 0.31, now);
        history.append(std::slice::from_ref(&written)).await.unwrap();

        let read = history
            .events_since(now - Duration::days(1))
            .await
            .unwrap();

        assert_eq!(read.len(), 1);
        assert_eq!(read[0].query, written.query);
        assert!((read[0].similarity - written.similarity).abs() < 1e-6);
        assert_eq!(read[0].timestamp, written.timestamp);
    }

    #[tokio::test]
    async fn test_window_is_strictly_after() {
        let (history, _temp) = create_test_history();
        let now = Utc::now();

        history
            .append(&[event("boundary", 0.3, now), event("inside", 0.3, now + Duration::seconds(1))])
            .await
            .unwrap();

        let read = history.events_since(now).await.unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].query, "inside");
    }

    #[tokio::test]
    async fn test_append_accumulates() {
        let (history, _temp) = create_test_history();
        let now = Utc::now();

        history.append(&[event("a", 0.3, now)]).await.unwrap();
        history.append(&[event("b", 0.35, now)]).await.unwrap();

        let read = history
            .events_since(now - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(read.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_append_does_not_touch_file() {
        let (history, _temp) = create_test_history();
        history.append(&[]).await.unwrap();
        assert!(!history.path.exists());
    }

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let (history, _temp) = create_test_history();
        let read = history.events_since(Utc::now()).await.unwrap();
        assert!(read.is_empty());
    }

    #[tokio::test]
    async fn test_memory_history() {
        let history = MemoryHistory::new();
        let now = Utc::now();

        history.append(&[event("a", 0.3, now)]).await.unwrap();
        assert_eq!(history.len(), 1);

        let read = history
            .events_since(now - Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(read.len(), 1);
    }
}

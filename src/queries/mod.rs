//! Query populations: historical train queries and recent live queries
//!
//! Both populations are deduplicated on read while preserving first
//! appearance order. After every run, served live queries are archived so
//! the next run sees only queries that arrived since.

use crate::errors::{DriftError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

/// Query-population seam
#[async_trait]
pub trait QueryStore: Send + Sync {
    /// The labeled-good training population, unique, in stored order
    async fn train_queries(&self) -> Result<Vec<String>>;

    /// The recent live population, unique, in stored order
    async fn live_queries(&self) -> Result<Vec<String>>;

    /// Move live queries to the archive; returns how many were moved
    async fn archive_live_queries(&self) -> Result<usize>;
}

fn dedupe(queries: Vec<String>) -> Vec<String> {
    let mut seen = Vec::new();
    for q in queries {
        if !seen.contains(&q) {
            seen.push(q);
        }
    }
    seen
}

/// JSON-file query store: each population is one JSON array of strings
pub struct JsonFileQueryStore {
    train_path: PathBuf,
    live_path: PathBuf,
    archive_path: PathBuf,
}

impl JsonFileQueryStore {
    pub fn new(train_path: PathBuf, live_path: PathBuf, archive_path: PathBuf) -> Self {
        Self {
            train_path,
            live_path,
            archive_path,
        }
    }

    fn read_list(path: &PathBuf) -> Result<Vec<String>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let contents = fs::read_to_string(path)?;
        let queries: Vec<String> = serde_json::from_str(&contents)
            .map_err(|e| DriftError::Generic(format!("Corrupt query file {}: {}", path.display(), e)))?;
        Ok(queries)
    }

    fn write_list(path: &PathBuf, queries: &[String]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(queries)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[async_trait]
impl QueryStore for JsonFileQueryStore {
    async fn train_queries(&self) -> Result<Vec<String>> {
        let queries = dedupe(Self::read_list(&self.train_path)?);
        info!(count = queries.len(), "Found unique train questions");
        Ok(queries)
    }

    async fn live_queries(&self) -> Result<Vec<String>> {
        let queries = dedupe(Self::read_list(&self.live_path)?);
        info!(count = queries.len(), "Found unique live questions");
        Ok(queries)
    }

    async fn archive_live_queries(&self) -> Result<usize> {
        let live = Self::read_list(&self.live_path)?;
        if live.is_empty() {
            return Ok(0);
        }

        let mut archive = Self::read_list(&self.archive_path)?;
        let moved = live.len();
        archive.extend(live);

        Self::write_list(&self.archive_path, &archive)?;
        Self::write_list(&self.live_path, &[])?;

        info!(moved, "Archived live queries");
        Ok(moved)
    }
}

/// In-memory query store for tests and embedded use
#[derive(Default)]
pub struct MemoryQueryStore {
    train: Vec<String>,
    live: Mutex<Vec<String>>,
    archive: Mutex<Vec<String>>,
}

impl MemoryQueryStore {
    pub fn new(train: Vec<String>, live: Vec<String>) -> Self {
        Self {
            train,
            live: Mutex::new(live),
            archive: Mutex::new(Vec::new()),
        }
    }

    /// Queries archived so far
    pub fn archived(&self) -> Vec<String> {
        self.archive.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryStore for MemoryQueryStore {
    async fn train_queries(&self) -> Result<Vec<String>> {
        Ok(dedupe(self.train.clone()))
    }

    async fn live_queries(&self) -> Result<Vec<String>> {
        Ok(dedupe(self.live.lock().unwrap().clone()))
    }

    async fn archive_live_queries(&self) -> Result<usize> {
        let mut live = self.live.lock().unwrap();
        let moved = live.len();
        self.archive.lock().unwrap().extend(live.drain(..));
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (JsonFileQueryStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = JsonFileQueryStore::new(
            temp.path().join("train.json"),
            temp.path().join("live.json"),
            temp.path().join("archive.json"),
        );
        (store, temp)
    }

    #[tokio::test]
    async fn test_missing_files_read_empty() {
        let (store, _temp) = create_test_store();
        assert!(store.train_queries().await.unwrap().is_empty());
        assert!(store.live_queries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_collapsed_in_order() {
        let (store, _temp) = create_test_store();
        JsonFileQueryStore::write_list(
            &store.train_path,
            &["b".to_string(), "a".to_string(), "b".to_string()],
        )
        .unwrap();

        let queries = store.train_queries().await.unwrap();
        assert_eq!(queries, vec!["b".to_string(), "a".to_string()]);
    }

    #[tokio::test]
    async fn test_archive_moves_and_clears() {
        let (store, _temp) = create_test_store();
        JsonFileQueryStore::write_list(&store.live_path, &["q1".to_string(), "q2".to_string()])
            .unwrap();

        let moved = store.archive_live_queries().await.unwrap();
        assert_eq!(moved, 2);
        assert!(store.live_queries().await.unwrap().is_empty());

        let archived = JsonFileQueryStore::read_list(&store.archive_path).unwrap();
        assert_eq!(archived, vec!["q1".to_string(), "q2".to_string()]);
    }

    #[tokio::test]
    async fn test_archive_appends_to_existing() {
        let (store, _temp) = create_test_store();
        JsonFileQueryStore::write_list(&store.archive_path, &["old".to_string()]).unwrap();
        JsonFileQueryStore::write_list(&store.live_path, &["new".to_string()]).unwrap();

        store.archive_live_queries().await.unwrap();
        let archived = JsonFileQueryStore::read_list(&store.archive_path).unwrap();
        assert_eq!(archived, vec!["old".to_string(), "new".to_string()]);
    }

    #[tokio::test]
    async fn test_archive_empty_live_is_noop() {
        let (store, _temp) = create_test_store();
        assert_eq!(store.archive_live_queries().await.unwrap(), 0);
        assert!(!store.archive_path.exists());
    }

    #[tokio::test]
    async fn test_memory_store_archive() {
        let store = MemoryQueryStore::new(
            vec!["t".to_string()],
            vec!["l1".to_string(), "l2".to_string()],
        );
        assert_eq!(store.archive_live_queries().await.unwrap(), 2);
        assert!(store.live_queries().await.unwrap().is_empty());
        assert_eq!(store.archived(), vec!["l1".to_string(), "l2".to_string()]);
    }
}

//! Cooldown state: when retraining last fired
//!
//! Kept as an explicit record behind an injected store rather than a
//! process-wide variable. Read by the trend analyzer, written only by the
//! retrain trigger.

use crate::errors::{DriftError, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Persisted cooldown record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CooldownState {
    /// Last time the retraining workflow was triggered; absent = never
    pub last_trigger_at: Option<DateTime<Utc>>,
}

impl CooldownState {
    /// The window floor this state imposes: the trigger time, or epoch
    pub fn window_floor(&self) -> DateTime<Utc> {
        self.last_trigger_at
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap())
    }
}

/// Durable cooldown-state seam
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the current state; absent state is the default (never triggered)
    async fn load(&self) -> Result<CooldownState>;

    /// Persist the state
    async fn save(&self, state: CooldownState) -> Result<()>;
}

/// JSON-file state store
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }
}

#[async_trait]
impl StateStore for FileStateStore {
    async fn load(&self) -> Result<CooldownState> {
        if !self.path.exists() {
            return Ok(CooldownState::default());
        }
        let contents = fs::read_to_string(&self.path)?;
        let state: CooldownState = serde_json::from_str(&contents)
            .map_err(|e| DriftError::Generic(format!("Corrupt state file: {}", e)))?;
        Ok(state)
    }

    async fn save(&self, state: CooldownState) -> Result<()> {
        let json = serde_json::to_string_pretty(&state)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory state store for tests and embedded use
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<CooldownState>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_last_trigger(at: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(CooldownState {
                last_trigger_at: Some(at),
            }),
        }
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn load(&self) -> Result<CooldownState> {
        Ok(*self.state.lock().unwrap())
    }

    async fn save(&self, state: CooldownState) -> Result<()> {
        *self.state.lock().unwrap() = state;
        Ok(())
    }
}

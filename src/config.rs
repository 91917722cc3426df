use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub services: ServicesConfig,
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Remote collaborator endpoints and model names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    /// Embedding service base URL
    pub embedding_url: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Generation service base URL
    pub generation_url: String,
    /// Generation model name
    pub generation_model: String,
    /// Qdrant endpoint for grounding retrieval
    pub qdrant_url: String,
    /// Qdrant collection holding course content embeddings
    pub qdrant_collection: String,
    /// Retraining workflow webhook (optional; absent = log only)
    pub retrain_webhook: Option<String>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            embedding_url: "http://127.0.0.1:8090".to_string(),
            embedding_model: "text-embedding-005".to_string(),
            generation_url: "http://127.0.0.1:8091".to_string(),
            generation_model: "gemini-1.5-flash-002".to_string(),
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_collection: "course_content".to_string(),
            retrain_webhook: None,
        }
    }
}

/// Drift-detection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Embedding request batch size
    pub batch_size: usize,
    /// Task label sent with embedding requests
    pub embedding_task: String,
    /// Expected embedding width
    pub embedding_dim: usize,
    /// Upper band factor: upper = min_sim - min_sim * upper_factor
    pub upper_factor: f32,
    /// Lower band factor: lower = min_sim - min_sim * lower_factor
    pub lower_factor: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            batch_size: 4,
            embedding_task: "CLUSTERING".to_string(),
            embedding_dim: 768,
            upper_factor: 0.1,
            lower_factor: 0.6,
        }
    }
}

/// Trend-analysis window and escalation bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendConfig {
    /// Rolling window length in days
    pub window_days: i64,
    /// Minimum in-window drift events required to escalate
    pub min_events: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_days: 7,
            min_events: 2,
        }
    }
}

/// Sample-synthesis bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Maximum training samples per run
    pub sample_quota: usize,
    /// Vector-search hits per escalated query
    pub top_k: usize,
    /// Generation cap in tokens
    pub max_output_tokens: u32,
    /// Generation temperature
    pub temperature: f32,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_quota: 50,
            top_k: 5,
            max_output_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Local file locations for durable state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Append-only drift history log
    pub history_file: PathBuf,
    /// Cooldown state record
    pub state_file: PathBuf,
    /// Train query population
    pub train_queries_file: PathBuf,
    /// Live (unlabeled) query population
    pub live_queries_file: PathBuf,
    /// Archived live queries
    pub archive_file: PathBuf,
    /// Generated training-sample artifact
    pub artifact_file: PathBuf,
    /// Artifact upload target directory
    pub artifact_store_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".driftwatch");

        Self {
            history_file: base.join("drift_history.json"),
            state_file: base.join("state.json"),
            train_queries_file: base.join("train_queries.json"),
            live_queries_file: base.join("live_queries.json"),
            archive_file: base.join("archived_queries.json"),
            artifact_file: base.join("tmp").join("llm_train_data.json"),
            artifact_store_dir: base.join("artifacts"),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if !config_path.exists() {
            let config = Config::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &PathBuf) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(config_path, toml_string)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .context("Could not determine home directory")?;

        Ok(home.join(".driftwatch").join("config.toml"))
    }

    /// Validate structural constraints before a run
    pub fn validate(&self) -> crate::errors::Result<()> {
        use crate::errors::DriftError;

        if self.detection.batch_size == 0 {
            return Err(DriftError::ConfigError(
                "detection.batch_size must be at least 1".to_string(),
            ));
        }
        if self.detection.lower_factor <= self.detection.upper_factor {
            return Err(DriftError::ConfigError(format!(
                "detection.lower_factor ({}) must exceed detection.upper_factor ({})",
                self.detection.lower_factor, self.detection.upper_factor
            )));
        }
        if self.trend.window_days <= 0 {
            return Err(DriftError::ConfigError(
                "trend.window_days must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

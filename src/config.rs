//! Configuration for a node analysis run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShardStatError};

/// Default number of documents visited per segment when sampling.
pub const DEFAULT_SAMPLE_SIZE: u64 = 10_000;

/// Stored-field sampling settings.
///
/// When disabled, every live document of every segment is visited and the
/// stored-field byte counts are exact. When enabled, only the first
/// `sample_size` live documents of each segment are visited and the observed
/// bytes are extrapolated to the whole segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Whether sampled measurement is enabled.
    pub enabled: bool,

    /// Maximum number of live documents visited per segment.
    pub sample_size: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            enabled: false,
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

impl SamplingConfig {
    /// Exact measurement: every live document is visited.
    pub fn exact() -> Self {
        SamplingConfig::default()
    }

    /// Sampled measurement with the given per-segment sample size.
    pub fn sampled(sample_size: u64) -> Self {
        SamplingConfig {
            enabled: true,
            sample_size,
        }
    }

    /// The per-segment document limit, if any.
    pub fn limit(&self) -> Option<u64> {
        self.enabled.then_some(self.sample_size)
    }
}

/// Configuration for analyzing one node.
///
/// Every field has a default, so a configuration file only needs to name the
/// settings it changes:
///
/// ```
/// use shardstat::config::AnalysisConfig;
///
/// let config: AnalysisConfig =
///     serde_json::from_str(r#"{ "sampling": { "enabled": true, "sample_size": 250 } }"#).unwrap();
/// assert_eq!(config.sampling.limit(), Some(250));
/// assert_eq!(config.shard_number, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Stored-field sampling.
    pub sampling: SamplingConfig,

    /// Capture one representative stored value per field per group.
    pub include_sample_docs: bool,

    /// Fields whose samples are rendered as UTF-8 text (full source documents).
    pub source_fields: Vec<String>,

    /// Maximum number of characters kept from a rendered sample.
    pub sample_max_chars: usize,

    /// Shard number whose directories are analyzed under each index directory.
    pub shard_number: u32,

    /// Suffix the state directory name must end with.
    pub state_dir_suffix: String,

    /// Name of the indices directory, a sibling of the state directory.
    pub indices_dir_name: String,

    /// Stored field of the state index that carries the encoded metadata record.
    pub metadata_field: String,

    /// Process groups and shards on a thread pool.
    pub parallel: bool,

    /// Worker threads for parallel mode (defaults to the number of CPUs).
    pub threads: Option<usize>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            sampling: SamplingConfig::default(),
            include_sample_docs: false,
            source_fields: vec!["_source".to_string()],
            sample_max_chars: 1024,
            shard_number: 0,
            state_dir_suffix: "_state".to_string(),
            indices_dir_name: "indices".to_string(),
            metadata_field: "data".to_string(),
            parallel: false,
            threads: None,
        }
    }
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ShardStatError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make a run meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.sampling.enabled && self.sampling.sample_size == 0 {
            return Err(ShardStatError::config("sample size must be greater than zero"));
        }
        if self.threads == Some(0) {
            return Err(ShardStatError::config("thread count must be greater than zero"));
        }
        if self.state_dir_suffix.is_empty() {
            return Err(ShardStatError::config("state directory suffix must not be empty"));
        }
        Ok(())
    }

    /// Whether samples of this field are rendered as text.
    pub fn is_source_field(&self, field: &str) -> bool {
        self.source_fields.iter().any(|f| f == field)
    }

    /// Number of worker threads for parallel mode.
    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get).max(1)
    }
}

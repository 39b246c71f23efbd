//! Command line argument parsing for the shardstat CLI using clap.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::error::Result;

/// shardstat - which indices exist on a search node and which fields consume its disk
#[derive(Parser, Debug, Clone)]
#[command(name = "shardstat")]
#[command(about = "Disk usage analysis for search engine nodes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["index_directory", "segment_store"])
))]
pub struct ShardStatArgs {
    /// Node state directory (must end with `_state`)
    #[arg(short = 'd', long, value_name = "STATE_DIR", env = "SHARDSTAT_INDEX_DIRECTORY")]
    pub index_directory: Option<PathBuf>,

    /// Analyze a single segment store instead of a whole node
    #[arg(long, value_name = "PATH")]
    pub segment_store: Option<PathBuf>,

    /// Sample stored fields instead of reading every document
    #[arg(short = 's', long)]
    pub sample: bool,

    /// Documents sampled per segment [default: 10000]
    #[arg(short = 'n', long, value_name = "N")]
    pub samples: Option<u64>,

    /// Include one sample value per field in the report
    #[arg(long)]
    pub doc: bool,

    /// Configuration file (JSON); flags override its settings
    #[arg(short = 'c', long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Measure groups and shards in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Worker threads for --parallel (default: number of CPUs)
    #[arg(long, value_name = "N")]
    pub threads: Option<usize>,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Verbosity (-v for progress, -vv for details)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,
}

impl ShardStatArgs {
    /// Get the effective verbosity level (0=quiet, 1=normal, 2=verbose, 3+=debug)
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }

    /// Build the analysis configuration: the config file (or defaults)
    /// overridden by the flags that were given.
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };

        if self.sample {
            config.sampling.enabled = true;
        }
        if let Some(samples) = self.samples {
            config.sampling.sample_size = samples;
        }
        if self.doc {
            config.include_sample_docs = true;
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

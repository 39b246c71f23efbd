//! # shardstat
//!
//! Disk usage analysis for search engine nodes.
//!
//! ## Features
//!
//! - Recovers index names from a node's metadata state directory
//! - Groups time-partitioned indices into logical datasets
//! - Per-field storage composition: stored payload vs. term dictionary bytes
//! - Exact or sampled stored-field measurement
//! - Sequential or parallel processing with identical results
//! - Human-readable and JSON reports

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod grouping;
pub mod loader;
pub mod metadata;
pub mod report;
pub mod segment;
pub mod stats;
pub mod storage;
pub mod util;

pub mod prelude {
    pub use crate::analyzer::NodeAnalyzer;
    pub use crate::config::{AnalysisConfig, SamplingConfig};
    pub use crate::error::{Result, ShardStatError};
    pub use crate::report::{FieldReport, GroupReport, NodeReport};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

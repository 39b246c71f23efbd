//! Error types for shardstat.
//!
//! All fallible operations return [`ShardStatError`]. Only two variants stop a
//! run ([`ShardStatError::InputShape`] and [`ShardStatError::EmptyResult`]);
//! everything else is absorbed by the component that detects it, logged, and
//! turned into a partial result.
//!
//! # Examples
//!
//! ```
//! use shardstat::error::{Result, ShardStatError};
//!
//! fn check(path: &str) -> Result<()> {
//!     if !path.ends_with("_state") {
//!         return Err(ShardStatError::input_shape(format!("{path} is not a state directory")));
//!     }
//!     Ok(())
//! }
//!
//! let err = check("/var/lib/search/nodes/0").unwrap_err();
//! assert!(err.is_fatal());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for shardstat operations.
#[derive(Error, Debug)]
pub enum ShardStatError {
    /// I/O errors (file operations, directory walks, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The metadata path does not look like a node state directory.
    #[error("Input error: {0}")]
    InputShape(String),

    /// Decoding produced nothing to report on.
    #[error("Empty result: {0}")]
    EmptyResult(String),

    /// Failure reading metadata records from the state directory.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Failure opening or reading a shard's segment store.
    #[error("Shard I/O error: {0}")]
    ShardIo(String),

    /// Malformed or unsupported segment data.
    #[error("Segment error: {0}")]
    Segment(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Metadata codec errors
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ShardStatError.
pub type Result<T> = std::result::Result<T, ShardStatError>;

impl ShardStatError {
    /// Create a new input shape error.
    pub fn input_shape<S: Into<String>>(msg: S) -> Self {
        ShardStatError::InputShape(msg.into())
    }

    /// Create a new empty result error.
    pub fn empty_result<S: Into<String>>(msg: S) -> Self {
        ShardStatError::EmptyResult(msg.into())
    }

    /// Create a new decode error.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        ShardStatError::Decode(msg.into())
    }

    /// Create a new shard I/O error.
    pub fn shard_io<S: Into<String>>(msg: S) -> Self {
        ShardStatError::ShardIo(msg.into())
    }

    /// Create a new segment error.
    pub fn segment<S: Into<String>>(msg: S) -> Self {
        ShardStatError::Segment(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        ShardStatError::Storage(msg.into())
    }

    /// Create a new metadata error.
    pub fn metadata<S: Into<String>>(msg: S) -> Self {
        ShardStatError::Metadata(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ShardStatError::Config(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        ShardStatError::Other(msg.into())
    }

    /// Whether this error must halt the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ShardStatError::InputShape(_) | ShardStatError::EmptyResult(_)
        )
    }
}

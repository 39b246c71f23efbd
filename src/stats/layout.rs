//! On-disk layout of a node.

use std::path::{Path, PathBuf};

use crate::config::AnalysisConfig;
use crate::error::{Result, ShardStatError};
use crate::stats::shard::ShardDescriptor;

/// Where a node keeps its state and its index data.
///
/// ```text
/// <node>/
///   _state/                  metadata records
///   indices/
///     <directory id>/
///       <shard>/index        segment store
///       <shard>/translog     write-ahead log
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLayout {
    state_dir: PathBuf,
    indices_dir: PathBuf,
    shard_number: u32,
}

impl NodeLayout {
    /// Derive the layout from the state directory path.
    ///
    /// Fails with [`ShardStatError::InputShape`] when the directory name does
    /// not end with the configured state suffix, compared case-insensitively.
    pub fn resolve(state_dir: &Path, config: &AnalysisConfig) -> Result<Self> {
        let file_name = state_dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if !file_name
            .to_lowercase()
            .ends_with(&config.state_dir_suffix.to_lowercase())
        {
            return Err(ShardStatError::input_shape(format!(
                "{} does not end with {}",
                state_dir.display(),
                config.state_dir_suffix
            )));
        }

        let parent = state_dir
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        Ok(NodeLayout {
            state_dir: state_dir.to_path_buf(),
            indices_dir: parent.join(&config.indices_dir_name),
            shard_number: config.shard_number,
        })
    }

    /// The metadata state directory.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// The directory holding one subdirectory per directory identifier.
    pub fn indices_dir(&self) -> &Path {
        &self.indices_dir
    }

    /// Shard number analyzed under every index directory.
    pub fn shard_number(&self) -> u32 {
        self.shard_number
    }

    /// Segment store path of an index.
    pub fn index_path(&self, directory_id: &str) -> PathBuf {
        self.shard_dir(directory_id).join("index")
    }

    /// Write-ahead log path of an index.
    pub fn translog_path(&self, directory_id: &str) -> PathBuf {
        self.shard_dir(directory_id).join("translog")
    }

    fn shard_dir(&self, directory_id: &str) -> PathBuf {
        self.indices_dir
            .join(directory_id)
            .join(self.shard_number.to_string())
    }

    /// Describe the analyzed shard of an index.
    pub fn shard(&self, name: &str, directory_id: &str) -> ShardDescriptor {
        ShardDescriptor::new(
            name,
            directory_id,
            self.index_path(directory_id),
            self.translog_path(directory_id),
        )
    }
}

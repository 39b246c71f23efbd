//! Storage abstraction trait and common types.

use std::io::{Read, Write};

use crate::error::{Result, ShardStatError};

/// A trait for storage backends that can store and retrieve segment files.
///
/// File names are flat: a storage instance represents exactly one segment
/// store directory.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a file for reading.
    ///
    /// The file must exist, or this returns [`StorageError::FileNotFound`].
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Get the size of a file in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;

    /// Rename a file, replacing any existing file with the new name.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;

    /// Read a whole file into memory.
    fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        let mut input = self.open_input(name)?;
        let mut buffer = Vec::with_capacity(input.size()? as usize);
        input.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Get the size of the input stream.
    fn size(&self) -> Result<u64>;
}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush and sync the output to storage.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Close the output stream, making its contents visible.
    fn close(&mut self) -> Result<()>;
}

// Implement StorageOutput for Box<dyn StorageOutput> to allow trait objects
impl StorageOutput for Box<dyn StorageOutput> {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.as_mut().flush_and_sync()
    }

    fn close(&mut self) -> Result<()> {
        self.as_mut().close()
    }
}

// Implement StorageInput for Box<dyn StorageInput> to allow trait objects
impl StorageInput for Box<dyn StorageInput> {
    fn size(&self) -> Result<u64> {
        self.as_ref().size()
    }
}

/// Configuration for storage backends.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Buffer size for I/O operations.
    pub buffer_size: usize,

    /// Whether to sync writes immediately.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            buffer_size: 65536, // 64KB buffer for better I/O performance
            sync_writes: false,
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// File not found.
    FileNotFound(String),

    /// The storage directory does not exist.
    DirectoryNotFound(String),

    /// I/O error.
    IoError(String),

    /// Write attempted on a read-only storage.
    ReadOnly(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::DirectoryNotFound(path) => write!(f, "Directory not found: {path}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
            StorageError::ReadOnly(name) => write!(f, "Storage is read-only: {name}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for ShardStatError {
    fn from(err: StorageError) -> Self {
        ShardStatError::storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();

        assert_eq!(config.buffer_size, 65536);
        assert!(!config.sync_writes);
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::FileNotFound("segments.json".to_string());
        assert_eq!(err.to_string(), "File not found: segments.json");

        let err = StorageError::DirectoryNotFound("/data/indices/abc/0/index".to_string());
        assert_eq!(
            err.to_string(),
            "Directory not found: /data/indices/abc/0/index"
        );

        let err = StorageError::ReadOnly("segment_00000001.fdt".to_string());
        assert_eq!(err.to_string(), "Storage is read-only: segment_00000001.fdt");

        let converted: ShardStatError = StorageError::IoError("disk gone".to_string()).into();
        assert_eq!(converted.to_string(), "Storage error: I/O error: disk gone");
    }
}

//! File-based storage implementation.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, ShardStatError};
use crate::storage::traits::{Storage, StorageConfig, StorageError, StorageInput, StorageOutput};

/// A file-based storage implementation over one segment store directory.
#[derive(Debug)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Storage configuration.
    config: StorageConfig,
    /// Whether writes are rejected.
    read_only: bool,
}

impl FileStorage {
    /// Create a writable file storage, creating the directory if needed.
    pub fn new<P: AsRef<Path>>(directory: P, config: StorageConfig) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        if !directory.exists() {
            std::fs::create_dir_all(&directory)
                .map_err(|e| ShardStatError::storage(format!("Failed to create directory: {e}")))?;
        }

        Self::verify_directory(&directory)?;

        Ok(FileStorage {
            directory,
            config,
            read_only: false,
        })
    }

    /// Open an existing directory read-only.
    ///
    /// Fails with [`StorageError::DirectoryNotFound`] instead of creating the
    /// directory, so analysis never leaves traces on the node.
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        if !directory.exists() {
            return Err(StorageError::DirectoryNotFound(directory.display().to_string()).into());
        }

        Self::verify_directory(&directory)?;

        Ok(FileStorage {
            directory,
            config: StorageConfig::default(),
            read_only: true,
        })
    }

    fn verify_directory(directory: &Path) -> Result<()> {
        if !directory.is_dir() {
            return Err(ShardStatError::storage(format!(
                "Path is not a directory: {}",
                directory.display()
            )));
        }
        Ok(())
    }

    /// Get the full path for a file name.
    fn file_path(&self, name: &str) -> PathBuf {
        self.directory.join(name)
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        if self.read_only {
            Err(StorageError::ReadOnly(name.to_string()).into())
        } else {
            Ok(())
        }
    }

    fn map_open_error(name: &str, e: std::io::Error) -> StorageError {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::FileNotFound(name.to_string())
        } else {
            StorageError::IoError(e.to_string())
        }
    }
}

impl Storage for FileStorage {
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>> {
        let path = self.file_path(name);
        let file = File::open(&path).map_err(|e| Self::map_open_error(name, e))?;

        Ok(Box::new(FileInput::new(file, self.config.buffer_size)?))
    }

    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>> {
        self.check_writable(name)?;

        let path = self.file_path(name);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        Ok(Box::new(FileOutput::new(
            file,
            self.config.buffer_size,
            self.config.sync_writes,
        )))
    }

    fn file_exists(&self, name: &str) -> bool {
        self.file_path(name).is_file()
    }

    fn file_size(&self, name: &str) -> Result<u64> {
        let path = self.file_path(name);
        let metadata = path.metadata().map_err(|e| Self::map_open_error(name, e))?;

        Ok(metadata.len())
    }

    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.check_writable(new_name)?;

        let old_path = self.file_path(old_name);
        let new_path = self.file_path(new_name);

        std::fs::rename(&old_path, &new_path)
            .map_err(|e| StorageError::IoError(format!("Failed to rename file: {e}")))?;

        Ok(())
    }
}

/// A file input implementation.
#[derive(Debug)]
pub struct FileInput {
    reader: BufReader<File>,
    size: u64,
}

impl FileInput {
    fn new(file: File, buffer_size: usize) -> Result<Self> {
        let metadata = file
            .metadata()
            .map_err(|e| ShardStatError::storage(format!("Failed to get file metadata: {e}")))?;

        let size = metadata.len();
        let reader = BufReader::with_capacity(buffer_size, file);

        Ok(FileInput { reader, size })
    }
}

impl Read for FileInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl StorageInput for FileInput {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }
}

/// A file output implementation.
#[derive(Debug)]
pub struct FileOutput {
    writer: BufWriter<File>,
    sync_writes: bool,
}

impl FileOutput {
    fn new(file: File, buffer_size: usize, sync_writes: bool) -> Self {
        FileOutput {
            writer: BufWriter::with_capacity(buffer_size, file),
            sync_writes,
        }
    }
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes_written = self.writer.write(buf)?;

        if self.sync_writes {
            self.writer.flush()?;
        }

        Ok(bytes_written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| ShardStatError::storage(format!("Failed to flush: {e}")))?;

        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| ShardStatError::storage(format!("Failed to sync: {e}")))?;

        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.flush_and_sync()
    }
}

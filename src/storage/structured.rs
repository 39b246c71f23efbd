//! Structured file I/O for binary segment data.
//!
//! [`StructWriter`] and [`StructReader`] keep a running CRC32 over every byte
//! they move. The writer appends the checksum when closed; the reader can
//! verify it once the payload has been consumed.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher;

use crate::error::{Result, ShardStatError};
use crate::storage::{StorageInput, StorageOutput};
use crate::util::varint::{decode_u64, encode_u64};

/// A structured file writer for binary data.
pub struct StructWriter<W: StorageOutput> {
    writer: W,
    hasher: Hasher,
    position: u64,
}

impl<W: StorageOutput> StructWriter<W> {
    /// Create a new structured file writer.
    pub fn new(writer: W) -> Self {
        StructWriter {
            writer,
            hasher: Hasher::new(),
            position: 0,
        }
    }

    /// Write a u8 value.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.writer.write_u8(value)?;
        self.update_checksum(&[value]);
        self.position += 1;
        Ok(())
    }

    /// Write a u32 value (little-endian).
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.writer.write_u32::<LittleEndian>(value)?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 4;
        Ok(())
    }

    /// Write a variable-length integer.
    pub fn write_varint(&mut self, value: u64) -> Result<()> {
        let encoded = encode_u64(value);
        self.write_raw(&encoded)
    }

    /// Write an i64 value (little-endian).
    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.writer.write_i64::<LittleEndian>(value)?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 8;
        Ok(())
    }

    /// Write a f64 value (little-endian).
    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.writer.write_f64::<LittleEndian>(value)?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 8;
        Ok(())
    }

    /// Write a string with length prefix.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_bytes(value.as_bytes())
    }

    /// Write raw bytes with length prefix.
    pub fn write_bytes(&mut self, value: &[u8]) -> Result<()> {
        self.write_varint(value.len() as u64)?;
        self.write_raw(value)
    }

    fn write_raw(&mut self, value: &[u8]) -> Result<()> {
        self.writer.write_all(value)?;
        self.update_checksum(value);
        self.position += value.len() as u64;
        Ok(())
    }

    /// Write a sorted integer array using delta encoding.
    pub fn write_delta_compressed_u32s(&mut self, values: &[u32]) -> Result<()> {
        self.write_varint(values.len() as u64)?;

        let mut previous = 0u32;
        for &value in values {
            let delta = value.wrapping_sub(previous);
            self.write_varint(delta as u64)?;
            previous = value;
        }

        Ok(())
    }

    /// Get current file position.
    pub fn position(&self) -> u64 {
        self.position
    }

    fn update_checksum(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Write the trailing checksum, then flush and close the writer.
    pub fn close(mut self) -> Result<()> {
        let checksum = self.hasher.clone().finalize();
        self.writer.write_u32::<LittleEndian>(checksum)?;
        self.writer.flush_and_sync()?;
        self.writer.close()?;
        Ok(())
    }
}

/// A structured file reader for binary data.
pub struct StructReader<R: StorageInput> {
    reader: R,
    hasher: Hasher,
    position: u64,
    file_size: u64,
}

impl<R: StorageInput> StructReader<R> {
    /// Create a new structured file reader.
    pub fn new(reader: R) -> Result<Self> {
        let file_size = reader.size()?;
        Ok(StructReader {
            reader,
            hasher: Hasher::new(),
            position: 0,
            file_size,
        })
    }

    /// Read a u8 value.
    pub fn read_u8(&mut self) -> Result<u8> {
        let value = self.reader.read_u8()?;
        self.update_checksum(&[value]);
        self.position += 1;
        Ok(value)
    }

    /// Read a u32 value (little-endian).
    pub fn read_u32(&mut self) -> Result<u32> {
        let value = self.reader.read_u32::<LittleEndian>()?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 4;
        Ok(value)
    }

    /// Read a variable-length integer.
    pub fn read_varint(&mut self) -> Result<u64> {
        let mut bytes = Vec::with_capacity(4);
        loop {
            let byte = self.reader.read_u8()?;
            bytes.push(byte);
            if byte & 0x80 == 0 || bytes.len() > 10 {
                break;
            }
        }

        let (value, _) = decode_u64(&bytes)?;
        self.update_checksum(&bytes);
        self.position += bytes.len() as u64;
        Ok(value)
    }

    /// Read an i64 value (little-endian).
    pub fn read_i64(&mut self) -> Result<i64> {
        let value = self.reader.read_i64::<LittleEndian>()?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 8;
        Ok(value)
    }

    /// Read a f64 value (little-endian).
    pub fn read_f64(&mut self) -> Result<f64> {
        let value = self.reader.read_f64::<LittleEndian>()?;
        self.update_checksum(&value.to_le_bytes());
        self.position += 8;
        Ok(value)
    }

    /// Read a string with length prefix.
    pub fn read_string(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes).map_err(|e| ShardStatError::segment(format!("Invalid UTF-8: {e}")))
    }

    /// Read bytes with length prefix.
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let length = self.read_varint()?;
        if length > self.remaining() {
            return Err(ShardStatError::segment(format!(
                "Length {length} exceeds remaining {} bytes",
                self.remaining()
            )));
        }
        self.read_raw(length as usize)
    }

    fn read_raw(&mut self, length: usize) -> Result<Vec<u8>> {
        let mut bytes = vec![0u8; length];
        self.reader.read_exact(&mut bytes)?;
        self.update_checksum(&bytes);
        self.position += length as u64;
        Ok(bytes)
    }

    /// Read a delta-compressed integer array.
    pub fn read_delta_compressed_u32s(&mut self) -> Result<Vec<u32>> {
        let length = self.read_varint()?;
        if length > self.remaining() {
            return Err(ShardStatError::segment(format!(
                "Array length {length} exceeds remaining {} bytes",
                self.remaining()
            )));
        }

        let mut values = Vec::with_capacity(length as usize);
        let mut previous = 0u32;

        for _ in 0..length {
            let delta = self.read_varint()? as u32;
            let value = previous.wrapping_add(delta);
            values.push(value);
            previous = value;
        }

        Ok(values)
    }

    /// Payload bytes left before the trailing checksum.
    fn remaining(&self) -> u64 {
        self.file_size
            .saturating_sub(4)
            .saturating_sub(self.position)
    }

    fn update_checksum(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Verify file integrity by checking the trailing checksum.
    ///
    /// Must be called after the whole payload has been read.
    pub fn verify_checksum(&mut self) -> Result<bool> {
        if self.position + 4 > self.file_size {
            return Err(ShardStatError::segment("File too short for checksum"));
        }

        let stored_checksum = self.reader.read_u32::<LittleEndian>()?;
        Ok(stored_checksum == self.hasher.clone().finalize())
    }
}

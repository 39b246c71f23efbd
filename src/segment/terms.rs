//! Term dictionary blocks and their byte accounting.
//!
//! Every indexed field's sorted terms are split into blocks of at most
//! [`BLOCK_SIZE`] terms. A block in the `.tim` file is laid out as
//!
//! ```text
//! header:   varint term_count, varint prefix_len, prefix bytes
//! suffixes: per term, varint suffix_len + suffix bytes
//! stats:    per term, varint doc_freq
//! ```
//!
//! and the `.tip` file holds, per field, the field name, the block count and
//! for each block its first term and `.tim` offset. The writer measures each
//! section as it emits it and the resulting [`TermDictionaryStats`] are stored
//! in the segment commit, so readers never parse the blocks.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::StorageOutput;
use crate::storage::structured::StructWriter;

/// Maximum number of terms per block.
pub const BLOCK_SIZE: usize = 32;

/// Magic number heading `.tim` files.
pub const TERMS_MAGIC: u32 = 0x5449_4d31; // "TIM1"

/// Magic number heading `.tip` files.
pub const TERMS_INDEX_MAGIC: u32 = 0x5449_5031; // "TIP1"

/// Byte breakdown of one field's term dictionary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermDictionaryStats {
    /// Bytes of the terms index (`.tip`).
    pub index_bytes: u64,
    /// Total length of all term keys.
    pub term_bytes: u64,
    /// Bytes of the suffix sections, length prefixes included.
    pub block_suffix_bytes: u64,
    /// Raw suffix bytes.
    pub uncompressed_block_suffix_bytes: u64,
    /// Bytes of the per-term statistics sections.
    pub block_stats_bytes: u64,
    /// Block header bytes.
    pub block_other_bytes: u64,
    /// Number of distinct terms.
    pub term_count: u64,
}

impl TermDictionaryStats {
    /// Sum of the six byte categories.
    pub fn total_bytes(&self) -> u64 {
        self.index_bytes
            + self.term_bytes
            + self.block_suffix_bytes
            + self.uncompressed_block_suffix_bytes
            + self.block_stats_bytes
            + self.block_other_bytes
    }

    /// Add another field's (or segment's) statistics to these.
    pub fn add(&mut self, other: &TermDictionaryStats) {
        self.index_bytes += other.index_bytes;
        self.term_bytes += other.term_bytes;
        self.block_suffix_bytes += other.block_suffix_bytes;
        self.uncompressed_block_suffix_bytes += other.uncompressed_block_suffix_bytes;
        self.block_stats_bytes += other.block_stats_bytes;
        self.block_other_bytes += other.block_other_bytes;
        self.term_count += other.term_count;
    }

    /// Average term key length, 0 when there are no terms.
    pub fn bytes_per_term(&self) -> f64 {
        if self.term_count == 0 {
            0.0
        } else {
            self.term_bytes as f64 / self.term_count as f64
        }
    }
}

fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Writes the `.tim` and `.tip` files of one segment.
pub struct TermsWriter<W: StorageOutput> {
    tim: StructWriter<W>,
    tip: StructWriter<W>,
}

impl<W: StorageOutput> TermsWriter<W> {
    /// Start both files.
    pub fn new(tim: W, tip: W) -> Result<Self> {
        let mut tim = StructWriter::new(tim);
        let mut tip = StructWriter::new(tip);
        tim.write_u32(TERMS_MAGIC)?;
        tip.write_u32(TERMS_INDEX_MAGIC)?;
        Ok(TermsWriter { tim, tip })
    }

    /// Write one field's terms (term → document frequency) and return the
    /// byte breakdown of what was written.
    pub fn write_field(
        &mut self,
        field: &str,
        terms: &BTreeMap<String, u64>,
    ) -> Result<TermDictionaryStats> {
        let mut stats = TermDictionaryStats {
            term_count: terms.len() as u64,
            ..Default::default()
        };

        let entries: Vec<(&[u8], u64)> = terms.iter().map(|(t, df)| (t.as_bytes(), *df)).collect();
        let blocks: Vec<&[(&[u8], u64)]> = entries.chunks(BLOCK_SIZE).collect();

        let tip_start = self.tip.position();
        self.tip.write_string(field)?;
        self.tip.write_varint(blocks.len() as u64)?;

        for block in blocks {
            let first = block[0].0;
            let prefix_len = block
                .iter()
                .map(|(term, _)| shared_prefix_len(first, term))
                .min()
                .unwrap_or(0);

            self.tip.write_bytes(first)?;
            self.tip.write_varint(self.tim.position())?;

            let header_start = self.tim.position();
            self.tim.write_varint(block.len() as u64)?;
            self.tim.write_bytes(&first[..prefix_len])?;

            let suffix_start = self.tim.position();
            for (term, _) in block {
                let suffix = &term[prefix_len..];
                self.tim.write_bytes(suffix)?;
                stats.uncompressed_block_suffix_bytes += suffix.len() as u64;
                stats.term_bytes += term.len() as u64;
            }

            let stats_start = self.tim.position();
            for (_, doc_freq) in block {
                self.tim.write_varint(*doc_freq)?;
            }
            let block_end = self.tim.position();

            stats.block_other_bytes += suffix_start - header_start;
            stats.block_suffix_bytes += stats_start - suffix_start;
            stats.block_stats_bytes += block_end - stats_start;
        }

        stats.index_bytes = self.tip.position() - tip_start;
        Ok(stats)
    }

    /// Finish both files.
    pub fn close(self) -> Result<()> {
        self.tim.close()?;
        self.tip.close()
    }
}

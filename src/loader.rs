//! Segment statistics loader.
//!
//! Measures one shard at a time: the disk usage of its segment store and
//! write-ahead log, its document counts, and per-field storage composition.
//! Term dictionary statistics are read in full from every segment; stored
//! fields are either visited completely or sampled per segment and
//! extrapolated.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info, trace, warn};
use walkdir::WalkDir;

use crate::config::{AnalysisConfig, SamplingConfig};
use crate::segment::{IndexOpener, SegmentReader, StoredFieldVisitor, StoredValue};
use crate::stats::{IndexGroup, ShardDescriptor, ShardMeasurement};

/// Total bytes of the regular files under a path.
pub trait DirectorySizer: Send + Sync + std::fmt::Debug {
    /// Bytes under `path`; a path that does not exist has size 0.
    fn size(&self, path: &Path) -> u64;
}

/// [`DirectorySizer`] walking the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkDirSizer;

impl DirectorySizer for WalkDirSizer {
    fn size(&self, path: &Path) -> u64 {
        if !path.exists() {
            debug!("{} does not exist, counted as 0 bytes", path.display());
            return 0;
        }

        let mut total = 0;
        for entry in WalkDir::new(path) {
            match entry {
                Ok(entry) if entry.file_type().is_file() => match entry.metadata() {
                    Ok(metadata) => total += metadata.len(),
                    Err(e) => warn!("Cannot stat {}: {e}", entry.path().display()),
                },
                Ok(_) => {}
                Err(e) => warn!("Skipping unreadable entry under {}: {e}", path.display()),
            }
        }
        total
    }
}

/// Scale bytes observed over `visited` documents to `live` documents,
/// rounding half up.
///
/// ```
/// use shardstat::loader::estimate_stored_bytes;
///
/// assert_eq!(estimate_stored_bytes(500, 10, 1000), 50_000);
/// assert_eq!(estimate_stored_bytes(500, 1000, 1000), 500);
/// ```
pub fn estimate_stored_bytes(observed: u64, visited: u64, live: u64) -> u64 {
    if visited == 0 || visited >= live {
        return observed;
    }
    let scaled = (observed as u128 * live as u128 + visited as u128 / 2) / visited as u128;
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Renders captured sample values as text.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRenderer {
    source_fields: Vec<String>,
    max_chars: usize,
}

impl SampleRenderer {
    /// Create a renderer from the analysis configuration.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        SampleRenderer {
            source_fields: config.source_fields.clone(),
            max_chars: config.sample_max_chars,
        }
    }

    /// Render a value of `field`.
    ///
    /// Source fields are decoded as UTF-8, other binary values hex-encoded,
    /// numerics printed in decimal. The result is cut to the configured
    /// number of characters.
    pub fn render(&self, field: &str, value: &StoredValue) -> String {
        let rendered = match value {
            StoredValue::Text(text) => text.clone(),
            StoredValue::Binary(bytes) if self.source_fields.iter().any(|f| f == field) => {
                String::from_utf8_lossy(bytes).into_owned()
            }
            StoredValue::Binary(bytes) => hex::encode(bytes),
            StoredValue::Integer(n) => n.to_string(),
            StoredValue::Float(x) => x.to_string(),
        };

        match rendered.char_indices().nth(self.max_chars) {
            Some((cut, _)) => rendered[..cut].to_string(),
            None => rendered,
        }
    }
}

/// Stored-field visitor collecting per-field byte counts for one segment.
struct StoredBytesVisitor<'a> {
    bytes: BTreeMap<String, u64>,
    samples: BTreeMap<String, String>,
    renderer: Option<&'a SampleRenderer>,
}

impl StoredFieldVisitor for StoredBytesVisitor<'_> {
    fn visit_field(&mut self, field: &str, value: &StoredValue) {
        match self.bytes.get_mut(field) {
            Some(total) => *total += value.counted_bytes(),
            None => {
                self.bytes.insert(field.to_string(), value.counted_bytes());
            }
        }

        if let Some(renderer) = self.renderer
            && !self.samples.contains_key(field)
        {
            self.samples
                .insert(field.to_string(), renderer.render(field, value));
        }
    }
}

/// Measures shards and merges the results into their groups.
#[derive(Debug, Clone)]
pub struct SegmentStatsLoader {
    opener: Arc<dyn IndexOpener>,
    sizer: Arc<dyn DirectorySizer>,
    sampling: SamplingConfig,
    renderer: Option<SampleRenderer>,
}

impl SegmentStatsLoader {
    /// Create a loader.
    pub fn new(
        opener: Arc<dyn IndexOpener>,
        sizer: Arc<dyn DirectorySizer>,
        config: &AnalysisConfig,
    ) -> Self {
        SegmentStatsLoader {
            opener,
            sizer,
            sampling: config.sampling.clone(),
            renderer: config
                .include_sample_docs
                .then(|| SampleRenderer::from_config(config)),
        }
    }

    /// Measure one shard without touching any shared state.
    ///
    /// Read failures are logged and leave the measurement with disk usage
    /// only.
    pub fn measure(&self, shard: &ShardDescriptor) -> ShardMeasurement {
        let mut measurement = ShardMeasurement {
            index_bytes: self.sizer.size(&shard.index_path),
            translog_bytes: self.sizer.size(&shard.translog_path),
            ..Default::default()
        };

        let segments = match self.opener.open(&shard.index_path) {
            Ok(segments) => segments,
            Err(e) if !shard.index_path.exists() && measurement.index_bytes == 0 => {
                warn!(
                    "{}: segment store {} is missing ({e})",
                    shard.name,
                    shard.index_path.display()
                );
                return measurement;
            }
            Err(e) => {
                error!("{}: cannot open segment store: {e}", shard.name);
                return measurement;
            }
        };

        if segments.is_empty() {
            info!("{}: no segments in {}", shard.name, shard.index_path.display());
            return measurement;
        }

        for segment in &segments {
            if let Err(e) = self.measure_segment(segment.as_ref(), &mut measurement) {
                error!(
                    "{}: failed reading segment {}: {e}",
                    shard.name,
                    segment.segment_id()
                );
                measurement.clear_contents();
                return measurement;
            }
        }

        debug!(
            "{}: {} segments, {} docs, {} deleted, {} bytes",
            shard.name,
            measurement.segments,
            measurement.docs,
            measurement.deleted_docs,
            measurement.index_bytes
        );
        measurement
    }

    fn measure_segment(
        &self,
        segment: &dyn SegmentReader,
        measurement: &mut ShardMeasurement,
    ) -> crate::error::Result<()> {
        let live = segment.num_docs();

        for (field, info) in segment.field_infos() {
            measurement
                .field_mut(field)
                .accumulate_terms(&info.terms, info.index_options);
        }

        let mut visitor = StoredBytesVisitor {
            bytes: BTreeMap::new(),
            samples: BTreeMap::new(),
            renderer: self.renderer.as_ref(),
        };
        let visited = segment.visit_live_documents(self.sampling.limit(), &mut visitor)?;
        trace!(
            "{}: visited {visited} of {live} live documents",
            segment.segment_id()
        );

        for (field, observed) in visitor.bytes {
            measurement
                .field_mut(&field)
                .accumulate_stored_bytes(estimate_stored_bytes(observed, visited, live));
        }
        for (field, sample) in visitor.samples {
            measurement.field_mut(&field).accumulate_sample(sample);
        }

        measurement.docs += live;
        measurement.deleted_docs += segment.num_deleted_docs();
        measurement.segments += 1;
        Ok(())
    }

    /// Measure the shard at `shard_index` of `group` and merge the result.
    pub fn load(&self, group: &mut IndexGroup, shard_index: usize) {
        let Some(shard) = group.shards().get(shard_index) else {
            return;
        };
        let measurement = self.measure(shard);
        group.merge_shard(shard_index, measurement);
    }
}

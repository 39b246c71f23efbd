//! End-to-end analysis of a node.
//!
//! [`NodeAnalyzer`] wires the collaborators together: it decodes the state
//! directory into index names, groups them, measures every shard, finalizes
//! each group against the corpus and returns a [`NodeReport`].
//!
//! # Examples
//!
//! ```no_run
//! use shardstat::analyzer::NodeAnalyzer;
//! use shardstat::config::AnalysisConfig;
//!
//! let analyzer = NodeAnalyzer::new(AnalysisConfig::default());
//! let report = analyzer.analyze("/var/lib/search/nodes/0/_state").unwrap();
//! for group in &report.groups {
//!     println!("{}: {:.2}%", group.name, group.percentage_of_corpus);
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use log::{debug, error, info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::AnalysisConfig;
use crate::error::{Result, ShardStatError};
use crate::grouping::group_indices;
use crate::loader::{DirectorySizer, SegmentStatsLoader, WalkDirSizer};
use crate::metadata::{CborCodec, MetadataCodec, StateDecoder};
use crate::report::{NodeReport, UnreferencedDirectory};
use crate::segment::{FsIndexOpener, IndexOpener};
use crate::stats::{Corpus, IndexGroup, NodeLayout, ShardDescriptor, ShardMeasurement};

/// Analyzes the storage of one node.
#[derive(Debug, Clone)]
pub struct NodeAnalyzer {
    config: AnalysisConfig,
    opener: Arc<dyn IndexOpener>,
    codec: Arc<dyn MetadataCodec>,
    sizer: Arc<dyn DirectorySizer>,
}

impl NodeAnalyzer {
    /// Create an analyzer reading the filesystem.
    pub fn new(config: AnalysisConfig) -> Self {
        NodeAnalyzer {
            config,
            opener: Arc::new(FsIndexOpener),
            codec: Arc::new(CborCodec),
            sizer: Arc::new(WalkDirSizer),
        }
    }

    /// Replace the segment store opener.
    pub fn with_opener(mut self, opener: Arc<dyn IndexOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Replace the metadata codec.
    pub fn with_codec(mut self, codec: Arc<dyn MetadataCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the directory sizer.
    pub fn with_sizer(mut self, sizer: Arc<dyn DirectorySizer>) -> Self {
        self.sizer = sizer;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze the node owning `state_dir`.
    ///
    /// Fails only when `state_dir` is not a state directory or when no index
    /// could be decoded from it. Every other problem is logged and leaves a
    /// partial report.
    pub fn analyze<P: AsRef<Path>>(&self, state_dir: P) -> Result<NodeReport> {
        let layout = NodeLayout::resolve(state_dir.as_ref(), &self.config)?;

        let decoder = StateDecoder::new(
            Arc::clone(&self.opener),
            Arc::clone(&self.codec),
            self.config.metadata_field.as_str(),
        );
        let mut mapping = BTreeMap::new();
        if let Err(e) = decoder.decode_into(layout.state_dir(), &mut mapping) {
            error!("{e}");
        }

        if mapping.is_empty() {
            return Err(ShardStatError::empty_result(format!(
                "no indices decoded from {}",
                layout.state_dir().display()
            )));
        }

        let corpus = Corpus::new(self.sizer.size(layout.indices_dir()));
        info!(
            "{} indices, corpus {} bytes under {}",
            mapping.len(),
            corpus.total_bytes,
            layout.indices_dir().display()
        );

        let mut groups = group_indices(&mapping, &layout);
        self.load_groups(&mut groups, &corpus)?;

        let referenced: BTreeSet<&str> = mapping.values().map(String::as_str).collect();
        let unreferenced = self.unreferenced_directories(layout.indices_dir(), &referenced);

        Ok(NodeReport::new(
            layout.indices_dir().display().to_string(),
            corpus.total_bytes,
            &self.config.sampling,
            &groups,
            unreferenced,
        ))
    }

    /// Analyze one bare segment store as a single group named after its
    /// directory.
    ///
    /// The write-ahead log is looked up in the sibling `translog` directory.
    /// The corpus is the segment store itself.
    pub fn analyze_segment_store<P: AsRef<Path>>(&self, path: P) -> Result<NodeReport> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(ShardStatError::input_shape(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let translog = path
            .parent()
            .map(|parent| parent.join("translog"))
            .unwrap_or_else(|| path.join("translog"));

        let mut group = IndexGroup::new(name.as_str());
        group.add_shard(ShardDescriptor::new(
            name.as_str(),
            name.as_str(),
            path.to_path_buf(),
            translog,
        ));
        let mut groups = BTreeMap::from([(name, group)]);

        let corpus = Corpus::new(self.sizer.size(path));
        self.load_groups(&mut groups, &corpus)?;

        Ok(NodeReport::new(
            path.display().to_string(),
            corpus.total_bytes,
            &self.config.sampling,
            &groups,
            Vec::new(),
        ))
    }

    fn load_groups(
        &self,
        groups: &mut BTreeMap<String, IndexGroup>,
        corpus: &Corpus,
    ) -> Result<()> {
        let loader = SegmentStatsLoader::new(
            Arc::clone(&self.opener),
            Arc::clone(&self.sizer),
            &self.config,
        );

        if !self.config.parallel {
            for group in groups.values_mut() {
                for shard_index in 0..group.shards().len() {
                    loader.load(group, shard_index);
                }
                group.calculate(corpus);
                debug!("Calculated group {}", group.name());
            }
            return Ok(());
        }

        let threads = self.config.worker_threads();
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("shardstat-{i}"))
            .build()
            .map_err(|e| ShardStatError::other(format!("Failed to create thread pool: {e}")))?;
        info!("Loading {} groups on {threads} threads", groups.len());

        pool.install(|| {
            groups.par_iter_mut().for_each(|(_, group)| {
                let measurements: Vec<ShardMeasurement> = group
                    .shards()
                    .par_iter()
                    .map(|shard| loader.measure(shard))
                    .collect();
                for (shard_index, measurement) in measurements.into_iter().enumerate() {
                    group.merge_shard(shard_index, measurement);
                }
                group.calculate(corpus);
                debug!("Calculated group {}", group.name());
            });
        });
        Ok(())
    }

    fn unreferenced_directories(
        &self,
        indices_dir: &Path,
        referenced: &BTreeSet<&str>,
    ) -> Vec<UnreferencedDirectory> {
        if !indices_dir.is_dir() {
            return Vec::new();
        }

        let mut unreferenced = Vec::new();
        for entry in WalkDir::new(indices_dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {e}", indices_dir.display());
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }

            let directory_id = entry.file_name().to_string_lossy().into_owned();
            if referenced.contains(directory_id.as_str()) {
                continue;
            }
            let bytes = self.sizer.size(entry.path());
            warn!("{directory_id} is not referenced by any index ({bytes} bytes)");
            unreferenced.push(UnreferencedDirectory {
                directory_id,
                bytes,
            });
        }
        unreferenced
    }
}

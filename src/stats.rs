//! Storage statistics model.
//!
//! Statistics are collected in two phases. While shards are loaded, their
//! measurements are merged into the owning [`IndexGroup`]: byte and document
//! counters only ever grow. Once every shard of a group is merged,
//! [`IndexGroup::calculate`] derives the group's calculated total and every
//! percentage in one pass. Percentages are never read from a partially
//! accumulated group.

pub mod field;
pub mod group;
pub mod layout;
pub mod shard;

pub use field::FieldStatistics;
pub use group::{Corpus, IndexGroup};
pub use layout::NodeLayout;
pub use shard::{ShardDescriptor, ShardMeasurement};

/// `part / whole * 100`, defined as 0 when `whole` is 0.
pub fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

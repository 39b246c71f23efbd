//! Node metadata decoding.
//!
//! The state directory of a node is a segment store whose live documents
//! each carry one encoded metadata record. [`StateDecoder`] visits those
//! records, decodes them with a [`MetadataCodec`] and recovers the mapping
//! from logical index name to the directory identifier its shards live under.

pub mod codec;
pub mod decoder;
pub mod value;

pub use codec::{CborCodec, MetadataCodec};
pub use decoder::{DecodeSummary, StateDecoder};
pub use value::{MetadataMap, MetadataValue};

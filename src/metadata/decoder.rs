//! Recovery of index names and directory identifiers from the state directory.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{Result, ShardStatError};
use crate::metadata::codec::MetadataCodec;
use crate::metadata::value::MetadataValue;
use crate::segment::{IndexOpener, StoredFieldVisitor, StoredValue};

/// Settings key holding the stable directory identifier of an index.
pub const UUID_SETTING: &str = "index.uuid";

/// Settings key holding the user-provided index name.
pub const NAME_SETTING: &str = "index.provided_name";

/// Counts of what a decode pass saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeSummary {
    /// Metadata payloads found.
    pub records: u64,
    /// Records that produced a mapping entry.
    pub mapped: u64,
    /// Records without a settings section.
    pub without_settings: u64,
    /// Records that could not be decoded or lacked the identifier or name.
    pub malformed: u64,
}

/// Decodes the state directory of a node.
#[derive(Debug, Clone)]
pub struct StateDecoder {
    opener: Arc<dyn IndexOpener>,
    codec: Arc<dyn MetadataCodec>,
    field: String,
}

impl StateDecoder {
    /// Create a decoder reading `field` of every live state document.
    pub fn new<S: Into<String>>(
        opener: Arc<dyn IndexOpener>,
        codec: Arc<dyn MetadataCodec>,
        field: S,
    ) -> Self {
        StateDecoder {
            opener,
            codec,
            field: field.into(),
        }
    }

    /// Add every index found under `state_dir` to `mapping` (name → directory id).
    ///
    /// Entries decoded before a read failure stay in `mapping`; the failure
    /// itself is returned as a [`ShardStatError::Decode`]. When two records
    /// carry the same name, the later one wins.
    pub fn decode_into(
        &self,
        state_dir: &Path,
        mapping: &mut BTreeMap<String, String>,
    ) -> Result<DecodeSummary> {
        let segments = self.opener.open(state_dir).map_err(|e| {
            ShardStatError::decode(format!("Cannot open {}: {e}", state_dir.display()))
        })?;

        let mut visitor = RecordVisitor {
            codec: self.codec.as_ref(),
            field: &self.field,
            mapping,
            summary: DecodeSummary::default(),
        };

        for segment in &segments {
            segment
                .visit_live_documents(None, &mut visitor)
                .map_err(|e| {
                    ShardStatError::decode(format!(
                        "Failed reading {} in {}: {e}",
                        segment.segment_id(),
                        state_dir.display()
                    ))
                })?;
        }

        let summary = visitor.summary;
        info!(
            "Decoded {} metadata records from {} ({} indices)",
            summary.records,
            state_dir.display(),
            summary.mapped
        );
        Ok(summary)
    }

    /// Decode `state_dir` into a fresh mapping.
    pub fn decode(&self, state_dir: &Path) -> Result<BTreeMap<String, String>> {
        let mut mapping = BTreeMap::new();
        self.decode_into(state_dir, &mut mapping)?;
        Ok(mapping)
    }
}

struct RecordVisitor<'a> {
    codec: &'a dyn MetadataCodec,
    field: &'a str,
    mapping: &'a mut BTreeMap<String, String>,
    summary: DecodeSummary,
}

enum Record {
    Index { name: String, uuid: String },
    NoSettings,
}

impl RecordVisitor<'_> {
    fn extract(&self, payload: &[u8]) -> Result<Record> {
        let decoded = self.codec.decode(payload)?;
        let (_, body) = decoded
            .as_map()
            .and_then(|map| map.first())
            .ok_or_else(|| ShardStatError::metadata("record is not a non-empty map"))?;

        let Some(settings) = body.as_map().and_then(|b| b.get("settings")) else {
            return Ok(Record::NoSettings);
        };

        let text = |key: &str| {
            settings
                .lookup(key)
                .and_then(MetadataValue::scalar_text)
                .ok_or_else(|| ShardStatError::metadata(format!("settings without {key}")))
        };

        Ok(Record::Index {
            uuid: text(UUID_SETTING)?,
            name: text(NAME_SETTING)?,
        })
    }
}

impl StoredFieldVisitor for RecordVisitor<'_> {
    fn visit_field(&mut self, field: &str, value: &StoredValue) {
        if field != self.field {
            return;
        }
        let payload = match value {
            StoredValue::Binary(bytes) => bytes.as_slice(),
            StoredValue::Text(text) => text.as_bytes(),
            _ => {
                warn!("Skipping non-binary metadata field {field}");
                self.summary.malformed += 1;
                return;
            }
        };

        self.summary.records += 1;
        match self.extract(payload) {
            Ok(Record::Index { name, uuid }) => {
                debug!("{name} -> {uuid}");
                if let Some(previous) = self.mapping.insert(name.clone(), uuid) {
                    debug!("{name} seen again, replacing {previous}");
                }
                self.summary.mapped += 1;
            }
            Ok(Record::NoSettings) => {
                self.summary.without_settings += 1;
            }
            Err(e) => {
                warn!("Skipping malformed metadata record: {e}");
                self.summary.malformed += 1;
            }
        }
    }
}

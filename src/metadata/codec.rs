//! Metadata codecs.

use ciborium::Value;

use crate::error::{Result, ShardStatError};
use crate::metadata::value::{MetadataMap, MetadataValue};

/// Turns an opaque record payload into a [`MetadataValue`].
pub trait MetadataCodec: Send + Sync + std::fmt::Debug {
    /// Decode one record.
    fn decode(&self, bytes: &[u8]) -> Result<MetadataValue>;
}

/// CBOR codec.
///
/// Map keys that are not text are rendered to text; tags are dropped in
/// favour of the value they wrap.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborCodec;

impl CborCodec {
    /// Encode a value as CBOR.
    pub fn encode(&self, value: &MetadataValue) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::into_writer(&to_cbor(value), &mut bytes)
            .map_err(|e| ShardStatError::metadata(format!("CBOR encode failed: {e}")))?;
        Ok(bytes)
    }
}

impl MetadataCodec for CborCodec {
    fn decode(&self, bytes: &[u8]) -> Result<MetadataValue> {
        let value: Value = ciborium::from_reader(bytes)
            .map_err(|e| ShardStatError::metadata(format!("CBOR decode failed: {e}")))?;
        from_cbor(value)
    }
}

fn from_cbor(value: Value) -> Result<MetadataValue> {
    Ok(match value {
        Value::Null => MetadataValue::Null,
        Value::Bool(b) => MetadataValue::Bool(b),
        Value::Integer(i) => {
            let wide = i128::from(i);
            match i64::try_from(wide) {
                Ok(n) => MetadataValue::Integer(n),
                Err(_) => MetadataValue::Text(wide.to_string()),
            }
        }
        Value::Float(x) => MetadataValue::Float(x),
        Value::Text(s) => MetadataValue::Text(s),
        Value::Bytes(b) => MetadataValue::Bytes(b),
        Value::Tag(_, inner) => from_cbor(*inner)?,
        Value::Array(items) => MetadataValue::Array(
            items
                .into_iter()
                .map(from_cbor)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Map(entries) => {
            let mut map = MetadataMap::new();
            for (key, value) in entries {
                map.insert(key_to_string(key)?, from_cbor(value)?);
            }
            MetadataValue::Map(map)
        }
        other => {
            return Err(ShardStatError::metadata(format!(
                "Unsupported CBOR value: {other:?}"
            )));
        }
    })
}

fn key_to_string(key: Value) -> Result<String> {
    match key {
        Value::Text(s) => Ok(s),
        other => Ok(from_cbor(other)?.to_string()),
    }
}

fn to_cbor(value: &MetadataValue) -> Value {
    match value {
        MetadataValue::Null => Value::Null,
        MetadataValue::Bool(b) => Value::Bool(*b),
        MetadataValue::Integer(i) => Value::Integer((*i).into()),
        MetadataValue::Float(x) => Value::Float(*x),
        MetadataValue::Text(s) => Value::Text(s.clone()),
        MetadataValue::Bytes(b) => Value::Bytes(b.clone()),
        MetadataValue::Array(items) => Value::Array(items.iter().map(to_cbor).collect()),
        MetadataValue::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (Value::Text(k.to_string()), to_cbor(v)))
                .collect(),
        ),
    }
}

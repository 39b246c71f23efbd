//! Stored values and documents.
//!
//! A stored value is one of four kinds. Each kind has one counting rule for
//! stored-payload statistics:
//!
//! | kind    | counted bytes           |
//! |---------|-------------------------|
//! | Text    | UTF-8 byte length       |
//! | Binary  | byte length             |
//! | Integer | 1                       |
//! | Float   | 1                       |
//!
//! ```
//! use shardstat::segment::StoredValue;
//!
//! assert_eq!(StoredValue::Text("héllo".to_string()).counted_bytes(), 6);
//! assert_eq!(StoredValue::Binary(vec![0; 32]).counted_bytes(), 32);
//! assert_eq!(StoredValue::Integer(1_000_000).counted_bytes(), 1);
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Result, ShardStatError};
use crate::storage::structured::{StructReader, StructWriter};
use crate::storage::{StorageInput, StorageOutput};

/// A value kept verbatim in the stored-fields file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StoredValue {
    /// UTF-8 text.
    Text(String),
    /// Opaque bytes.
    Binary(Vec<u8>),
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Float(f64),
}

impl StoredValue {
    const TAG_TEXT: u8 = 0;
    const TAG_BINARY: u8 = 1;
    const TAG_INTEGER: u8 = 2;
    const TAG_FLOAT: u8 = 3;

    /// Bytes this value contributes to its field's stored-payload total.
    pub fn counted_bytes(&self) -> u64 {
        match self {
            StoredValue::Text(text) => text.len() as u64,
            StoredValue::Binary(bytes) => bytes.len() as u64,
            StoredValue::Integer(_) | StoredValue::Float(_) => 1,
        }
    }

    /// On-disk kind tag.
    pub fn tag(&self) -> u8 {
        match self {
            StoredValue::Text(_) => Self::TAG_TEXT,
            StoredValue::Binary(_) => Self::TAG_BINARY,
            StoredValue::Integer(_) => Self::TAG_INTEGER,
            StoredValue::Float(_) => Self::TAG_FLOAT,
        }
    }

    /// Write the tag and value.
    pub(crate) fn write_to<W: StorageOutput>(&self, writer: &mut StructWriter<W>) -> Result<()> {
        writer.write_u8(self.tag())?;
        match self {
            StoredValue::Text(text) => writer.write_string(text),
            StoredValue::Binary(bytes) => writer.write_bytes(bytes),
            StoredValue::Integer(value) => writer.write_i64(*value),
            StoredValue::Float(value) => writer.write_f64(*value),
        }
    }

    /// Read a tag and value written by [`StoredValue::write_to`].
    pub(crate) fn read_from<R: StorageInput>(reader: &mut StructReader<R>) -> Result<Self> {
        match reader.read_u8()? {
            Self::TAG_TEXT => Ok(StoredValue::Text(reader.read_string()?)),
            Self::TAG_BINARY => Ok(StoredValue::Binary(reader.read_bytes()?)),
            Self::TAG_INTEGER => Ok(StoredValue::Integer(reader.read_i64()?)),
            Self::TAG_FLOAT => Ok(StoredValue::Float(reader.read_f64()?)),
            tag => Err(ShardStatError::segment(format!(
                "Unknown stored value tag: {tag}"
            ))),
        }
    }

    /// Get the text payload, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StoredValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Get the binary payload, if this is a binary value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            StoredValue::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Index options a field gets for a value of this kind.
    pub fn default_index_options(&self) -> IndexOptions {
        match self {
            StoredValue::Text(_) => IndexOptions::DocsAndFreqs,
            StoredValue::Integer(_) | StoredValue::Float(_) => IndexOptions::Docs,
            StoredValue::Binary(_) => IndexOptions::None,
        }
    }

    /// Terms produced when this value is indexed.
    ///
    /// Text is split into lower-cased unicode words, numerics index their
    /// decimal rendering, and binary values produce nothing.
    pub fn index_terms(&self) -> Vec<String> {
        match self {
            StoredValue::Text(text) => text.unicode_words().map(|w| w.to_lowercase()).collect(),
            StoredValue::Integer(value) => vec![value.to_string()],
            StoredValue::Float(value) => vec![value.to_string()],
            StoredValue::Binary(_) => Vec::new(),
        }
    }
}

/// What the inverted index records for a field.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexOptions {
    /// Not indexed.
    #[default]
    None,
    /// Document ids only.
    Docs,
    /// Document ids and term frequencies.
    DocsAndFreqs,
}

impl std::fmt::Display for IndexOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IndexOptions::None => "NONE",
            IndexOptions::Docs => "DOCS",
            IndexOptions::DocsAndFreqs => "DOCS_AND_FREQS",
        };
        write!(f, "{name}")
    }
}

/// One field occurrence in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: StoredValue,
    /// Keep the value in the stored-fields file.
    pub stored: bool,
    /// Add the value's terms to the term dictionary.
    pub indexed: bool,
}

/// A document to be written to a segment.
///
/// Fields keep their insertion order and may repeat (multi-valued fields).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    fields: Vec<DocumentField>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        Document::default()
    }

    /// Create a builder for constructing documents.
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Add a field occurrence.
    pub fn add_field(&mut self, field: DocumentField) {
        self.fields.push(field);
    }

    /// All field occurrences in insertion order.
    pub fn fields(&self) -> &[DocumentField] {
        &self.fields
    }

    /// Get the number of field occurrences.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A builder for constructing documents in a fluent manner.
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    document: Document,
}

impl DocumentBuilder {
    /// Create a new document builder.
    pub fn new() -> Self {
        DocumentBuilder::default()
    }

    fn push(mut self, name: String, value: StoredValue, stored: bool, indexed: bool) -> Self {
        self.document.add_field(DocumentField {
            name,
            value,
            stored,
            indexed,
        });
        self
    }

    /// Add a stored and indexed text field.
    pub fn add_text<S: Into<String>, T: Into<String>>(self, name: S, value: T) -> Self {
        self.push(name.into(), StoredValue::Text(value.into()), true, true)
    }

    /// Add an indexed text field that is not stored.
    pub fn add_unstored_text<S: Into<String>, T: Into<String>>(self, name: S, value: T) -> Self {
        self.push(name.into(), StoredValue::Text(value.into()), false, true)
    }

    /// Add a stored and indexed integer field.
    pub fn add_integer<S: Into<String>>(self, name: S, value: i64) -> Self {
        self.push(name.into(), StoredValue::Integer(value), true, true)
    }

    /// Add a stored and indexed float field.
    pub fn add_float<S: Into<String>>(self, name: S, value: f64) -> Self {
        self.push(name.into(), StoredValue::Float(value), true, true)
    }

    /// Add a stored binary field. Binary values are never indexed.
    pub fn add_binary<S: Into<String>>(self, name: S, value: Vec<u8>) -> Self {
        self.push(name.into(), StoredValue::Binary(value), true, false)
    }

    /// Build the document.
    pub fn build(self) -> Document {
        self.document
    }
}

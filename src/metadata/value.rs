//! Decoded metadata values.

use std::fmt;

/// A self-describing metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    /// Explicit null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Opaque bytes.
    Bytes(Vec<u8>),
    /// Ordered list.
    Array(Vec<MetadataValue>),
    /// String-keyed map.
    Map(MetadataMap),
}

impl MetadataValue {
    /// Get the text, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Render a scalar as text. Null, arrays and maps have no scalar text.
    ///
    /// ```
    /// use shardstat::metadata::MetadataValue;
    ///
    /// assert_eq!(MetadataValue::from(42).scalar_text().as_deref(), Some("42"));
    /// assert_eq!(MetadataValue::Null.scalar_text(), None);
    /// ```
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            MetadataValue::Null | MetadataValue::Array(_) | MetadataValue::Map(_) => None,
            MetadataValue::Text(text) => Some(text.clone()),
            scalar => Some(scalar.to_string()),
        }
    }

    /// Get the map, if this is a map value.
    pub fn as_map(&self) -> Option<&MetadataMap> {
        match self {
            MetadataValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a dotted key.
    ///
    /// Settings appear both flattened (`"index.uuid"`) and nested
    /// (`"index"` → `"uuid"`); both shapes, and mixtures of them, resolve.
    ///
    /// ```
    /// use shardstat::metadata::{MetadataMap, MetadataValue};
    ///
    /// let nested = MetadataValue::Map(MetadataMap::from_iter([(
    ///     "index",
    ///     MetadataValue::Map(MetadataMap::from_iter([("uuid", MetadataValue::from("Xy3"))])),
    /// )]));
    /// let flat = MetadataValue::Map(MetadataMap::from_iter([("index.uuid", MetadataValue::from("Xy3"))]));
    ///
    /// assert_eq!(nested.lookup("index.uuid").and_then(|v| v.as_str()), Some("Xy3"));
    /// assert_eq!(flat.lookup("index.uuid").and_then(|v| v.as_str()), Some("Xy3"));
    /// ```
    pub fn lookup(&self, dotted: &str) -> Option<&MetadataValue> {
        let map = self.as_map()?;
        if let Some(value) = map.get(dotted) {
            return Some(value);
        }

        dotted.match_indices('.').find_map(|(i, _)| {
            map.get(&dotted[..i])
                .and_then(|inner| inner.lookup(&dotted[i + 1..]))
        })
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl From<MetadataMap> for MetadataValue {
    fn from(value: MetadataMap) -> Self {
        MetadataValue::Map(value)
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Null => write!(f, "null"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(x) => write!(f, "{x}"),
            MetadataValue::Text(s) => write!(f, "{s}"),
            MetadataValue::Bytes(b) => write!(f, "{}", hex::encode(b)),
            MetadataValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            MetadataValue::Map(map) => {
                write!(f, "{{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A map that keeps keys in insertion order.
///
/// Record layout matters: the first top-level key of a record names the
/// record, so the order the encoder wrote is preserved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataMap {
    entries: Vec<(String, MetadataValue)>,
}

impl MetadataMap {
    /// Create an empty map.
    pub fn new() -> Self {
        MetadataMap::default()
    }

    /// Insert a value, replacing an existing key in place.
    pub fn insert<K: Into<String>>(&mut self, key: K, value: MetadataValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Get a value by exact key.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// The first entry in insertion order.
    pub fn first(&self) -> Option<(&str, &MetadataValue)> {
        self.entries.first().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, MetadataValue)> for MetadataMap {
    fn from_iter<I: IntoIterator<Item = (K, MetadataValue)>>(iter: I) -> Self {
        let mut map = MetadataMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_keeps_insertion_order() {
        let mut map = MetadataMap::new();
        map.insert("zeta", MetadataValue::from(1));
        map.insert("alpha", MetadataValue::from(2));
        map.insert("zeta", MetadataValue::from(3));

        assert_eq!(map.len(), 2);
        assert_eq!(map.first(), Some(("zeta", &MetadataValue::Integer(3))));
        let keys: Vec<_> = map.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_lookup_mixed_shapes() {
        let value = MetadataValue::Map(MetadataMap::from_iter([(
            "index",
            MetadataValue::Map(MetadataMap::from_iter([
                ("provided_name", MetadataValue::from("logs-2020.10.01")),
                ("routing.allocation", MetadataValue::from("hot")),
            ])),
        )]));

        assert_eq!(
            value.lookup("index.provided_name").and_then(MetadataValue::as_str),
            Some("logs-2020.10.01")
        );
        assert_eq!(
            value.lookup("index.routing.allocation").and_then(MetadataValue::as_str),
            Some("hot")
        );
        assert!(value.lookup("index.uuid").is_none());
        assert!(MetadataValue::from("leaf").lookup("index").is_none());
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(MetadataValue::from("Xy3").scalar_text().as_deref(), Some("Xy3"));
        assert_eq!(MetadataValue::from(20201001).scalar_text().as_deref(), Some("20201001"));
        assert_eq!(MetadataValue::Float(1.5).scalar_text().as_deref(), Some("1.5"));
        assert_eq!(MetadataValue::from(false).scalar_text().as_deref(), Some("false"));
        assert_eq!(MetadataValue::Bytes(vec![0xab]).scalar_text().as_deref(), Some("ab"));
        assert_eq!(MetadataValue::Array(vec![]).scalar_text(), None);
        assert_eq!(MetadataValue::Map(MetadataMap::new()).scalar_text(), None);
    }

    #[test]
    fn test_display() {
        let value = MetadataValue::Map(MetadataMap::from_iter([
            ("a", MetadataValue::Array(vec![MetadataValue::Null, MetadataValue::from(true)])),
            ("b", MetadataValue::Bytes(vec![0xca, 0xfe])),
        ]));
        assert_eq!(value.to_string(), "{a: [null, true], b: cafe}");
    }
}

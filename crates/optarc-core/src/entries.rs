//! Normalized output records
//!
//! Converters of every entry type produce the same [`EntryRecord`] shape,
//! so the rest of the pipeline never branches on what a plugin returned.

use serde::Serialize;
use serde_json::{Map, Value};

/// Attribute keys with this prefix are conversion-time bookkeeping only.
/// They never appear in the output; the serializer strips them.
pub const INTERNAL_PREFIX: &str = "_tmp_";

/// One output record: an identifier, its entry type, and a flat attribute
/// mapping. Attribute insertion order is preserved through serialization.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EntryRecord {
    pub id: String,

    #[serde(rename = "type")]
    pub entry_type: String,

    pub attributes: Map<String, Value>,
}

impl EntryRecord {
    /// Create a record with no identifier yet; the ingestion-derived
    /// identifier is substituted when the converter leaves `id` empty.
    pub fn new(entry_type: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            entry_type: entry_type.into(),
            attributes: Map::new(),
        }
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: Value) {
        self.attributes.insert(key.into(), value);
    }

    /// Drop all bookkeeping attributes
    pub fn strip_internal(&mut self) {
        self.attributes
            .retain(|key, _| !key.starts_with(INTERNAL_PREFIX));
    }
}

/// Insert-or-append accumulator keyed by entry type, preserving first-seen
/// key order so repeated runs serialize identically.
#[derive(Debug, Default)]
pub struct TypedLists<T> {
    groups: Vec<(String, Vec<T>)>,
}

impl<T> TypedLists<T> {
    pub fn new() -> Self {
        Self { groups: Vec::new() }
    }

    /// Append values under a key, creating the key on first use
    pub fn extend(&mut self, key: &str, values: impl IntoIterator<Item = T>) {
        if let Some((_, existing)) = self.groups.iter_mut().find(|(k, _)| k == key) {
            existing.extend(values);
        } else {
            self.groups.push((key.to_string(), values.into_iter().collect()));
        }
    }

    pub fn get(&self, key: &str) -> Option<&[T]> {
        self.groups
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_serializes_with_type_key() {
        let mut record = EntryRecord::new("structures");
        record.id = "structures/foo.cif".to_string();
        record.set_attribute("nsites", json!(8));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "structures");
        assert_eq!(value["id"], "structures/foo.cif");
        assert_eq!(value["attributes"]["nsites"], 8);
    }

    #[test]
    fn test_strip_internal_removes_bookkeeping_keys() {
        let mut record = EntryRecord::new("references");
        record.set_attribute("title", json!("A paper"));
        record.set_attribute(format!("{INTERNAL_PREFIX}raw_bibtex"), json!("@article{..}"));

        record.strip_internal();
        assert!(record.attributes.contains_key("title"));
        assert_eq!(record.attributes.len(), 1);
    }

    #[test]
    fn test_typed_lists_preserves_first_seen_order() {
        let mut lists = TypedLists::new();
        lists.extend("structures", vec![1, 2]);
        lists.extend("references", vec![3]);
        lists.extend("structures", vec![4]);

        let keys: Vec<&str> = lists.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["structures", "references"]);
        assert_eq!(lists.get("structures"), Some(&[1, 2, 4][..]));
    }
}

//! Parser, converter and property-parser registries
//!
//! Each registry holds an explicit ordered list of named strategies.
//! Drivers try the candidates in order and aggregate the failures; the
//! chain itself fails only when exhausted. Registries are constructed per
//! conversion run, never shared as module state, so tests can inject their
//! own candidate lists.

use crate::config::PropertyDefinition;
use crate::entries::EntryRecord;
use crate::parsers::{bibtex, property, structure, Document};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Outcome of one entry parser: a single document, or an ordered batch
/// when one file yields many records (e.g. a multi-record bibliography).
#[derive(Debug)]
pub enum Parsed {
    One(Document),
    Many(Vec<Document>),
}

/// Rows parsed from one property file: record key → {property name → raw value}
pub type PropertyRows = HashMap<String, Map<String, Value>>;

pub type ParseFn = fn(&Path) -> anyhow::Result<Parsed>;
pub type ConvertFn = fn(&Document, &[PropertyDefinition]) -> anyhow::Result<EntryRecord>;
pub type PropertyParseFn = fn(&Path, &[PropertyDefinition]) -> anyhow::Result<PropertyRows>;

/// A named entry-file parser candidate
pub struct EntryParser {
    pub name: &'static str,
    pub parse: ParseFn,
}

/// A named document-to-record converter candidate
pub struct EntryConverter {
    pub name: &'static str,
    pub convert: ConvertFn,
}

/// A named property-file parser candidate
pub struct PropertyParser {
    pub name: &'static str,
    pub parse: PropertyParseFn,
}

/// All strategy lists for one conversion run
pub struct Registry {
    entry_parsers: HashMap<String, Vec<EntryParser>>,
    converters: HashMap<String, Vec<EntryConverter>>,
    /// Keyed by file extension without the leading dot
    property_parsers: HashMap<String, Vec<PropertyParser>>,
}

impl Registry {
    /// Registry with the built-in plugins: CIF and XYZ structure readers,
    /// a BibTeX reference reader, and CSV/JSON property parsers.
    pub fn with_defaults() -> Self {
        let mut entry_parsers = HashMap::new();
        entry_parsers.insert(
            "structures".to_string(),
            vec![
                EntryParser {
                    name: "cif",
                    parse: structure::parse_cif_file,
                },
                EntryParser {
                    name: "xyz",
                    parse: structure::parse_xyz_file,
                },
            ],
        );
        entry_parsers.insert(
            "references".to_string(),
            vec![EntryParser {
                name: "bibtex",
                parse: bibtex::parse_bibtex_file,
            }],
        );

        let mut converters = HashMap::new();
        converters.insert(
            "structures".to_string(),
            vec![EntryConverter {
                name: "structure",
                convert: structure::convert_structure,
            }],
        );
        converters.insert(
            "references".to_string(),
            vec![EntryConverter {
                name: "reference",
                convert: bibtex::convert_reference,
            }],
        );

        let mut property_parsers = HashMap::new();
        property_parsers.insert(
            "csv".to_string(),
            vec![PropertyParser {
                name: "csv",
                parse: property::parse_csv_file,
            }],
        );
        property_parsers.insert(
            "json".to_string(),
            vec![PropertyParser {
                name: "json",
                parse: property::parse_json_file,
            }],
        );

        Self {
            entry_parsers,
            converters,
            property_parsers,
        }
    }

    /// Empty registry for tests that register their own candidates
    pub fn empty() -> Self {
        Self {
            entry_parsers: HashMap::new(),
            converters: HashMap::new(),
            property_parsers: HashMap::new(),
        }
    }

    pub fn register_entry_parser(&mut self, entry_type: &str, parser: EntryParser) {
        self.entry_parsers
            .entry(entry_type.to_string())
            .or_default()
            .push(parser);
    }

    pub fn register_converter(&mut self, entry_type: &str, converter: EntryConverter) {
        self.converters
            .entry(entry_type.to_string())
            .or_default()
            .push(converter);
    }

    pub fn register_property_parser(&mut self, extension: &str, parser: PropertyParser) {
        self.property_parsers
            .entry(extension.to_string())
            .or_default()
            .push(parser);
    }

    pub fn entry_parsers(&self, entry_type: &str) -> Option<&[EntryParser]> {
        self.entry_parsers.get(entry_type).map(Vec::as_slice)
    }

    pub fn converters(&self, entry_type: &str) -> Option<&[EntryConverter]> {
        self.converters.get(entry_type).map(Vec::as_slice)
    }

    pub fn property_parsers(&self, extension: &str) -> Option<&[PropertyParser]> {
        self.property_parsers.get(extension).map(Vec::as_slice)
    }

    /// Whether an entry type can be both parsed and converted
    pub fn supports(&self, entry_type: &str) -> bool {
        self.entry_parsers.contains_key(entry_type) && self.converters.contains_key(entry_type)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_both_entry_types() {
        let registry = Registry::with_defaults();
        assert!(registry.supports("structures"));
        assert!(registry.supports("references"));
        assert!(!registry.supports("trajectories"));
        assert!(registry.property_parsers("csv").is_some());
        assert!(registry.property_parsers("json").is_some());
        assert!(registry.property_parsers("xlsx").is_none());
    }

    #[test]
    fn test_structures_try_cif_before_xyz() {
        let registry = Registry::with_defaults();
        let names: Vec<_> = registry
            .entry_parsers("structures")
            .unwrap()
            .iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["cif", "xyz"]);
    }
}

//! Archive configuration handling (optimade.yaml)
//!
//! The configuration sits at the root of an archive and declares which
//! files hold which entry types and which files carry extra property
//! values for them.

use crate::error::{ConvertError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the archive configuration, relative to the archive root
pub const CONFIG_FILENAME: &str = "optimade.yaml";

/// Provider prefix used for namespaced attributes when none is configured
pub const DEFAULT_PROVIDER_PREFIX: &str = "optarc";

/// Archive configuration file (optimade.yaml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveConfig {
    /// Provider-specific prefix for namespaced attribute keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_prefix: Option<String>,

    /// Human-readable description of the overall database
    pub database_description: String,

    /// Entry declarations, or a reference to a pre-built JSONL file
    pub entries: EntrySpec,
}

/// Either per-type entry declarations or a single pre-built JSONL reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EntrySpec {
    /// A pre-built JSONL file shipped inside the archive
    Jsonl(JsonlConfig),
    /// Entry declarations to be parsed and converted
    Entries(Vec<EntryConfig>),
}

/// Reference to a pre-built JSONL file inside the archive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonlConfig {
    /// Compressed source that must be inflated before the JSONL is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Path of the JSONL file relative to the archive root
    pub jsonl_path: String,
}

/// Declaration of one entry type within an archive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryConfig {
    /// The OPTIMADE entry type, e.g. `structures` or `references`
    pub entry_type: String,

    /// Paths holding the entry data, relative to the archive root
    pub entry_paths: Vec<PathSpec>,

    /// Paths of auxiliary files mapping record keys to extra properties
    #[serde(default)]
    pub property_paths: Vec<PathSpec>,

    /// Metadata for the fields carried by the auxiliary property files
    #[serde(default)]
    pub property_definitions: Vec<PropertyDefinition>,
}

/// A declarative path specification: literal names or glob patterns,
/// optionally scoped to a named sub-archive file.
///
/// An absent/empty `matches` list means the sub-archive name itself is the
/// single file to use.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathSpec {
    /// Name of the sub-archive (e.g. a compressed file) the patterns are
    /// scoped to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Literal relative paths or glob patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<String>>,
}

impl PathSpec {
    /// Whether this spec carries at least one explicit pattern
    pub fn has_patterns(&self) -> bool {
        self.matches.as_deref().is_some_and(|m| !m.is_empty())
    }
}

/// A short-hand definition of one property served by the API.
/// This is a subset of the full OPTIMADE property definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyDefinition {
    /// Field name as used in the auxiliary property files. Served with a
    /// provider prefix in the output, so it must not start with an
    /// underscore.
    pub name: String,

    /// Human-readable title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Unit of the property, e.g. 'eV'
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Declared scalar type, used to cast raw parsed values
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
}

/// Scalar types a property value may be cast to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Float,
    Boolean,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PropertyType::String => write!(f, "string"),
            PropertyType::Integer => write!(f, "integer"),
            PropertyType::Float => write!(f, "float"),
            PropertyType::Boolean => write!(f, "boolean"),
        }
    }
}

impl ArchiveConfig {
    /// Load a configuration from a file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConvertError::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: ArchiveConfig = serde_yaml::from_str(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Provider prefix to use for namespaced attributes
    pub fn provider_prefix(&self) -> &str {
        self.provider_prefix
            .as_deref()
            .unwrap_or(DEFAULT_PROVIDER_PREFIX)
    }

    /// Validate the configuration structure
    pub fn validate(&self) -> Result<()> {
        if let Some(prefix) = &self.provider_prefix {
            if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
                return Err(ConvertError::config(format!(
                    "Provider prefix '{prefix}' must be non-empty lowercase alphanumeric"
                )));
            }
        }

        let entry_configs = match &self.entries {
            EntrySpec::Jsonl(_) => return Ok(()),
            EntrySpec::Entries(entries) => entries,
        };

        if entry_configs.is_empty() {
            return Err(ConvertError::config(
                "At least one entry declaration is required",
            ));
        }

        for entry in entry_configs {
            if entry.entry_type.is_empty() {
                return Err(ConvertError::config("Entry type cannot be empty"));
            }

            if entry.entry_paths.is_empty() {
                return Err(ConvertError::config(format!(
                    "Entry type '{}' declares no entry paths",
                    entry.entry_type
                )));
            }

            for spec in entry.entry_paths.iter().chain(&entry.property_paths) {
                if spec.file.is_none() && !spec.has_patterns() {
                    return Err(ConvertError::config(format!(
                        "A path spec for entry type '{}' has neither a file name nor match patterns",
                        entry.entry_type
                    )));
                }
            }

            let mut seen = std::collections::HashSet::new();
            for def in &entry.property_definitions {
                if def.name.starts_with('_') {
                    return Err(ConvertError::config(format!(
                        "Property name '{}' must not start with an underscore; the provider prefix is added automatically",
                        def.name
                    )));
                }
                if !seen.insert(def.name.as_str()) {
                    return Err(ConvertError::config(format!(
                        "Property '{}' is defined more than once for entry type '{}'",
                        def.name, entry.entry_type
                    )));
                }
            }
        }

        Ok(())
    }
}

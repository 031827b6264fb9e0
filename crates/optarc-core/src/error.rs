//! Error types for archive conversion
//!
//! Every fatal condition in the pipeline maps to one variant with a clear,
//! actionable message. Failures inside a parser/converter fail-over chain
//! are never raised individually; they accumulate as [`Attempt`] values and
//! surface only through the aggregated `*Exhausted` variants once the whole
//! chain has been tried.

use std::path::PathBuf;
use thiserror::Error;

use crate::config::PropertyType;

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;

/// One failed candidate in a fail-over chain
#[derive(Debug, Clone)]
pub struct Attempt {
    /// Registered name of the parser or converter that was tried
    pub name: String,
    /// Its error message
    pub message: String,
}

impl Attempt {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Fatal errors raised while converting one archive
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The archive has no configuration file at its root
    #[error("Archive configuration not found at '{}'. Every archive needs an optimade.yaml at its root.", .0.display())]
    ConfigNotFound(PathBuf),

    /// A declared data source (compressed file or pre-built JSONL) is missing
    #[error("Could not find declared data source at '{}'. Check the paths in optimade.yaml.", .0.display())]
    DataNotFound(PathBuf),

    /// A wildcard pattern matched nothing on disk
    #[error("No files match the pattern '{0}'. Fix or remove the pattern in optimade.yaml.")]
    NoMatch(String),

    /// One or more literal paths do not exist (reported in a single batch)
    #[error("Could not find the following files: {}", format_paths(.0))]
    MissingFiles(Vec<PathBuf>),

    /// The entry type has no registered parsers or converters
    #[error("Entry type '{0}' is not supported: no parsers or converters are registered for it.")]
    UnsupportedEntryType(String),

    /// A property file has an extension no parser is registered for
    #[error("No property parser is registered for '{extension}' files (while reading '{}').", .path.display())]
    UnsupportedPropertyFormat { path: PathBuf, extension: String },

    /// Every registered parser failed on one file
    #[error("No parser could read '{}'. {}", .path.display(), format_attempts(.attempts))]
    ParseExhausted {
        path: PathBuf,
        attempts: Vec<Attempt>,
    },

    /// Every registered converter failed on one document
    #[error("No converter could map the document derived from '{id}'. {}", format_attempts(.attempts))]
    ConvertExhausted { id: String, attempts: Vec<Attempt> },

    /// Property files were configured but produced no rows at all
    #[error("No property rows could be parsed from the configured property files. {}", format_attempts(.attempts))]
    NoPropertiesParsed { attempts: Vec<Attempt> },

    /// Two entries resolved to the same identifier
    #[error("Duplicate entry ID '{0}'. Entry identifiers must be unique within an entry type.")]
    DuplicateId(String),

    /// A property value does not fit its declared type
    #[error("Could not cast property '{property}' value {value} to declared type '{declared}': {reason}. Check the property definition in optimade.yaml.")]
    PropertyCast {
        property: String,
        value: serde_json::Value,
        declared: PropertyType,
        reason: String,
    },

    /// The output file already exists
    #[error("Not overwriting existing file at '{}'. Delete it before re-running the conversion.", .0.display())]
    OutputExists(PathBuf),

    /// The configuration is structurally valid YAML but semantically wrong
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing failed
    #[error("Failed to parse YAML: {0}. Check the file syntax at the indicated line/column.")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization failed
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Zip archive could not be read
    #[error("Failed to read zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ConvertError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_attempts(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "No candidates were tried.".to_string();
    }
    let tried = attempts
        .iter()
        .map(|a| format!("{}: {}", a.name, a.message))
        .collect::<Vec<_>>()
        .join("; ");
    format!("Tried: {tried}")
}

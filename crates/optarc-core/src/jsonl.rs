//! JSONL serialization
//!
//! Writes the whole output as newline-delimited JSON in a fixed order:
//! one `x-optimade` header line, one info line per entry type carrying
//! property definitions (even with zero records), then one line per
//! record in insertion order. The target file is claimed with
//! `create_new`, so a previous conversion is never overwritten.

use crate::config::PropertyDefinition;
use crate::entries::{EntryRecord, TypedLists};
use crate::error::{ConvertError, Result};
use crate::info::entry_type_info;
use crate::schemas::BuiltinSchemas;
use serde_json::json;
use serde_jsonlines::JsonLinesWriter;
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind};
use std::path::{Path, PathBuf};

/// OPTIMADE API version advertised in the header line
pub const API_VERSION: &str = "1.1.0";

/// Write all entries and their info descriptors to a JSONL file.
///
/// Bookkeeping attributes (the internal `_tmp_` namespace) are stripped
/// from every record before it is written.
pub fn write_jsonl(
    path: &Path,
    entries: &TypedLists<EntryRecord>,
    definitions: &TypedLists<PropertyDefinition>,
    provider_prefix: &str,
    builtins: Option<&BuiltinSchemas>,
) -> Result<PathBuf> {
    let file = match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(error) if error.kind() == ErrorKind::AlreadyExists => {
            return Err(ConvertError::OutputExists(path.to_path_buf()));
        }
        Err(error) => return Err(error.into()),
    };
    let mut writer = JsonLinesWriter::new(BufWriter::new(file));

    writer.write(&json!({"x-optimade": {"meta": {"api_version": API_VERSION}}}))?;

    for (entry_type, type_definitions) in definitions.iter() {
        let info = entry_type_info(entry_type, type_definitions, provider_prefix, builtins)?;
        writer.write(&info)?;
    }

    for (_, records) in entries.iter() {
        for record in records {
            let mut record = record.clone();
            record.strip_internal();
            writer.write(&record)?;
        }
    }

    writer.flush()?;
    Ok(path.to_path_buf())
}

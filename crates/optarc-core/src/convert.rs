//! Archive conversion pipeline
//!
//! Top-level orchestration: load and validate the configuration, inflate
//! declared sub-archives, then per entry declaration match files, parse
//! documents, convert them to records, attach properties, and finally
//! serialize everything as one JSONL file. Processing is synchronous and
//! deterministic; repeated runs over unchanged input produce identical
//! output.

use crate::config::{ArchiveConfig, EntryConfig, JsonlConfig, PathSpec, CONFIG_FILENAME, EntrySpec};
use crate::entries::{EntryRecord, TypedLists};
use crate::error::{Attempt, ConvertError, Result};
use crate::inflate::inflate_archive;
use crate::ingest::parse_entry_files;
use crate::jsonl::write_jsonl;
use crate::matcher::{check_missing, match_paths};
use crate::progress::create_progress_bar;
use crate::properties::parse_and_assign;
use crate::registry::{EntryConverter, Registry};
use crate::schemas::BuiltinSchemas;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::info;

/// Default output file name, relative to the archive root
pub const JSONL_FILENAME: &str = "optimade.jsonl";

/// Convert one archive into an OPTIMADE JSONL file.
///
/// Reads `optimade.yaml` from the archive root and writes to
/// `output_path`, defaulting to `<archive>/optimade.jsonl`. Returns the
/// path written.
pub fn convert_archive(archive_path: &Path, output_path: Option<&Path>) -> Result<PathBuf> {
    convert_archive_with_registry(archive_path, output_path, &Registry::with_defaults())
}

/// Convert with a caller-supplied plugin registry
pub fn convert_archive_with_registry(
    archive_path: &Path,
    output_path: Option<&Path>,
    registry: &Registry,
) -> Result<PathBuf> {
    let config = ArchiveConfig::from_file(archive_path.join(CONFIG_FILENAME))?;
    let output = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| archive_path.join(JSONL_FILENAME));

    let entry_configs = match &config.entries {
        EntrySpec::Jsonl(jsonl) => return prebuilt_jsonl(archive_path, jsonl, &output),
        EntrySpec::Entries(entry_configs) => entry_configs,
    };

    info!(archive = %archive_path.display(), "Converting archive");

    // Decompress every declared sub-archive before any matching happens
    for data_path in declared_data_paths(entry_configs) {
        inflate_archive(archive_path, &data_path)?;
    }

    let prefix = config.provider_prefix();
    let mut entries_by_type: TypedLists<EntryRecord> = TypedLists::new();
    let mut ids_by_type: HashMap<String, HashSet<String>> = HashMap::new();

    for entry_config in entry_configs {
        let records = construct_entries(archive_path, entry_config, prefix, registry)?;

        // identifiers must stay injective across all declarations of a type
        let seen = ids_by_type.entry(entry_config.entry_type.clone()).or_default();
        for record in &records {
            if !seen.insert(record.id.clone()) {
                return Err(ConvertError::DuplicateId(record.id.clone()));
            }
        }

        entries_by_type.extend(&entry_config.entry_type, records);
    }

    let mut definitions_by_type = TypedLists::new();
    for entry_config in entry_configs {
        definitions_by_type.extend(
            &entry_config.entry_type,
            entry_config.property_definitions.iter().cloned(),
        );
    }

    let written = write_jsonl(
        &output,
        &entries_by_type,
        &definitions_by_type,
        prefix,
        Some(&BuiltinSchemas::optimade()),
    )?;

    info!(output = %written.display(), "Conversion finished");
    Ok(written)
}

/// Build all records for one entry declaration: match, parse, convert,
/// then attach properties.
pub fn construct_entries(
    archive_path: &Path,
    entry_config: &EntryConfig,
    provider_prefix: &str,
    registry: &Registry,
) -> Result<Vec<EntryRecord>> {
    let entry_type = entry_config.entry_type.as_str();
    if !registry.supports(entry_type) {
        return Err(ConvertError::UnsupportedEntryType(entry_type.to_string()));
    }

    let entry_matches = match_paths(archive_path, &entry_config.entry_paths)?;
    check_missing(&entry_matches)?;

    let documents = parse_entry_files(archive_path, &entry_matches, entry_type, registry)?;

    let property_matches = match_paths(archive_path, &entry_config.property_paths)?;
    check_missing(&property_matches)?;

    let converters = registry
        .converters(entry_type)
        .ok_or_else(|| ConvertError::UnsupportedEntryType(entry_type.to_string()))?;

    let bar = create_progress_bar(
        documents.len() as u64,
        format!("Constructing {entry_type} entries"),
    );
    let mut records = Vec::with_capacity(documents.len());
    let mut seen_ids = HashSet::new();
    for ingested in documents {
        let mut record = try_converters(
            converters,
            &ingested.document,
            entry_config,
            &ingested.derived_id,
        )?;

        if record.id.is_empty() {
            record.id = ingested.derived_id;
        }
        if !seen_ids.insert(record.id.clone()) {
            return Err(ConvertError::DuplicateId(record.id));
        }

        records.push(record);
        bar.inc(1);
    }
    bar.finish_and_clear();

    parse_and_assign(
        &mut records,
        &property_matches,
        &entry_config.property_definitions,
        provider_prefix,
        entry_type,
        registry,
    )?;

    Ok(records)
}

fn try_converters(
    converters: &[EntryConverter],
    document: &crate::parsers::Document,
    entry_config: &EntryConfig,
    derived_id: &str,
) -> Result<EntryRecord> {
    let mut attempts = Vec::new();
    for converter in converters {
        match (converter.convert)(document, &entry_config.property_definitions) {
            Ok(record) => return Ok(record),
            Err(error) => attempts.push(Attempt::new(converter.name, format!("{error:#}"))),
        }
    }
    Err(ConvertError::ConvertExhausted {
        id: derived_id.to_string(),
        attempts,
    })
}

/// Sub-archive names referenced by specs that carry match patterns, in
/// declaration order without duplicates. Specs without patterns name a
/// plain data file directly and need no inflation.
fn declared_data_paths(entry_configs: &[EntryConfig]) -> Vec<PathBuf> {
    let mut data_paths = Vec::new();
    let specs = entry_configs
        .iter()
        .flat_map(|entry| entry.entry_paths.iter().chain(&entry.property_paths));

    for spec in specs {
        if let PathSpec {
            file: Some(file), ..
        } = spec
        {
            if spec.has_patterns() {
                let path = PathBuf::from(file);
                if !data_paths.contains(&path) {
                    data_paths.push(path);
                }
            }
        }
    }
    data_paths
}

/// Pre-built JSONL passthrough: inflate the named source if any, then
/// place the referenced file at the output path.
fn prebuilt_jsonl(archive_path: &Path, jsonl: &JsonlConfig, output: &Path) -> Result<PathBuf> {
    if let Some(file) = &jsonl.file {
        inflate_archive(archive_path, Path::new(file))?;
    }

    if output.exists() {
        return Err(ConvertError::OutputExists(output.to_path_buf()));
    }

    let source = archive_path.join(&jsonl.jsonl_path);
    if !source.exists() {
        return Err(ConvertError::DataNotFound(source));
    }

    std::fs::copy(&source, output)?;
    info!(output = %output.display(), "Using pre-built JSONL");
    Ok(output.to_path_buf())
}

//! Entry-file ingestion
//!
//! Runs the parser fail-over chain over every matched file and derives a
//! stable identifier for each resulting document. Identifiers must stay
//! reproducible across runs, so they are built purely from the sub-archive
//! name, the sorted file order and the in-file document index.

use crate::error::{Attempt, ConvertError, Result};
use crate::matcher::MatchedFiles;
use crate::parsers::Document;
use crate::progress::create_progress_bar;
use crate::registry::{EntryParser, Parsed, Registry};
use std::path::Path;

/// A parsed document paired with the identifier derived from its source
#[derive(Debug)]
pub struct IngestedDocument {
    pub derived_id: String,
    pub document: Document,
}

/// Parse all matched entry files for one entry type.
///
/// For each file, registered parsers are tried in priority order; the
/// first one returning a non-empty result wins, and the other candidates'
/// errors surface only if the whole chain fails.
pub fn parse_entry_files(
    archive_path: &Path,
    matched: &MatchedFiles,
    entry_type: &str,
    registry: &Registry,
) -> Result<Vec<IngestedDocument>> {
    let parsers = registry
        .entry_parsers(entry_type)
        .ok_or_else(|| ConvertError::UnsupportedEntryType(entry_type.to_string()))?;

    let mut ingested = Vec::new();
    for (sub_archive, paths) in matched.groups() {
        let bar = create_progress_bar(paths.len() as u64, format!("Parsing {entry_type} files"));
        for path in paths {
            let relative = path.strip_prefix(archive_path).unwrap_or(path);
            let id_root = derive_id_root(sub_archive, relative, paths.len());

            match try_parsers(parsers, path)? {
                Parsed::One(document) => ingested.push(IngestedDocument {
                    derived_id: id_root.clone(),
                    document,
                }),
                Parsed::Many(documents) => {
                    for (index, document) in documents.into_iter().enumerate() {
                        ingested.push(IngestedDocument {
                            derived_id: format!("{id_root}/{index}"),
                            document,
                        });
                    }
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    Ok(ingested)
}

/// Identifier root for one file.
///
/// Scoped to a sub-archive, the root is `<sub-archive>/<relative path>`
/// when that sub-archive matched several files, and collapses to the
/// sub-archive name alone when it matched exactly one, keeping
/// identifiers short when unambiguous. Unscoped specs use the relative
/// path.
fn derive_id_root(sub_archive: Option<&str>, relative: &Path, files_in_group: usize) -> String {
    let relative = relative.to_string_lossy();
    match sub_archive {
        Some(name) if files_in_group > 1 => format!("{name}/{relative}"),
        Some(name) => name.to_string(),
        None => relative.to_string(),
    }
}

fn try_parsers(parsers: &[EntryParser], path: &Path) -> Result<Parsed> {
    let mut attempts = Vec::new();
    for parser in parsers {
        match (parser.parse)(path) {
            Ok(Parsed::Many(documents)) if documents.is_empty() => {
                attempts.push(Attempt::new(parser.name, "no entries parsed"));
            }
            Ok(parsed) => return Ok(parsed),
            Err(error) => attempts.push(Attempt::new(parser.name, format!("{error:#}"))),
        }
    }
    Err(ConvertError::ParseExhausted {
        path: path.to_path_buf(),
        attempts,
    })
}

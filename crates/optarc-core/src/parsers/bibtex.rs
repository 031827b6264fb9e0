//! BibTeX reference reader and the OPTIMADE reference converter
//!
//! Handles the common BibTeX subset: `@type{key, field = value, ...}`
//! entries with braced (including nested braces), quoted or bare values.
//! `@comment`, `@string` and `@preamble` blocks are skipped; string macros
//! are not expanded. One file yields one document per entry.

use crate::config::PropertyDefinition;
use crate::entries::{EntryRecord, INTERNAL_PREFIX};
use crate::parsers::Document;
use crate::registry::Parsed;
use anyhow::{bail, Result};
use nom::{
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    error::{Error, ErrorKind},
    IResult,
};
use serde_json::{json, Value};
use std::path::Path;

/// One parsed bibliography record
#[derive(Debug, Clone)]
pub struct BibRecord {
    /// Citation key
    pub key: String,
    /// Entry type (article, book, ...), lowercased
    pub record_type: String,
    /// Field names (lowercased) and cleaned values, in source order
    pub fields: Vec<(String, String)>,
    /// Verbatim source of the entry, kept for diagnostics
    pub raw: String,
}

impl BibRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a BibTeX file into one document per entry
pub fn parse_bibtex_file(path: &Path) -> Result<Parsed> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_records(&content)?;
    if records.is_empty() {
        bail!("no BibTeX entries found");
    }
    Ok(Parsed::Many(
        records.into_iter().map(Document::Reference).collect(),
    ))
}

fn parse_records(input: &str) -> Result<Vec<BibRecord>> {
    let mut records = Vec::new();
    let mut rest = input;

    // Text outside @-blocks is prose and skipped, per BibTeX convention
    while let Some(at) = rest.find('@') {
        let block = &rest[at..];
        match parse_at_block(block) {
            Ok((remaining, Some(mut record))) => {
                let consumed = &block[..block.len() - remaining.len()];
                record.raw = consumed.trim().to_string();
                records.push(record);
                rest = remaining;
            }
            Ok((remaining, None)) => rest = remaining,
            Err(_) => bail!("malformed BibTeX entry near '{}'", snippet(block)),
        }
    }

    Ok(records)
}

fn snippet(s: &str) -> String {
    s.chars().take(40).collect()
}

/// Parse one `@...{...}` block; special blocks return `None`
fn parse_at_block(input: &str) -> IResult<&str, Option<BibRecord>> {
    let (input, _) = char('@')(input)?;
    let (input, kind) = identifier(input)?;
    let (input, _) = multispace0(input)?;

    if ["comment", "string", "preamble"]
        .iter()
        .any(|special| kind.eq_ignore_ascii_case(special))
    {
        let (input, _) = braced(input)?;
        return Ok((input, None));
    }

    let (input, _) = char('{')(input)?;
    let (input, _) = multispace0(input)?;
    let (input, key) = take_while1(|c: char| c != ',' && c != '}' && !c.is_whitespace())(input)?;
    let (mut input, _) = multispace0(input)?;

    let mut fields = Vec::new();
    loop {
        if let Ok((after, _)) = char::<_, Error<&str>>(',')(input) {
            let (after, _) = multispace0(after)?;
            input = after;
        }
        if let Ok((after, _)) = char::<_, Error<&str>>('}')(input) {
            input = after;
            break;
        }

        let (after, name) = identifier(input)?;
        let (after, _) = multispace0(after)?;
        let (after, _) = char('=')(after)?;
        let (after, _) = multispace0(after)?;
        let (after, value) = field_value(after)?;
        let (after, _) = multispace0(after)?;
        fields.push((name.to_ascii_lowercase(), clean_value(value)));
        input = after;
    }

    Ok((
        input,
        Some(BibRecord {
            key: key.to_string(),
            record_type: kind.to_ascii_lowercase(),
            fields,
            raw: String::new(),
        }),
    ))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '-')(input)
}

fn field_value(input: &str) -> IResult<&str, &str> {
    if input.starts_with('{') {
        braced(input)
    } else if input.starts_with('"') {
        quoted(input)
    } else {
        take_while1(|c: char| c.is_ascii_alphanumeric() || "_-.:+/".contains(c))(input)
    }
}

/// Consume a balanced `{...}` group, returning its inner content
fn braced(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Char)));
    }
    let mut depth = 0usize;
    for (i, c) in input.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[i + 1..], &input[1..i]));
                }
            }
            _ => {}
        }
    }
    Err(nom::Err::Error(Error::new(input, ErrorKind::TakeUntil)))
}

fn quoted(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('"')(input)?;
    match input.find('"') {
        Some(end) => Ok((&input[end + 1..], &input[..end])),
        None => Err(nom::Err::Error(Error::new(input, ErrorKind::TakeUntil))),
    }
}

/// Drop protective braces and normalize whitespace
fn clean_value(value: &str) -> String {
    let without_braces: String = value.chars().filter(|c| *c != '{' && *c != '}').collect();
    without_braces.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fields copied onto every reference record, null when absent
const REFERENCE_FIELDS: [&str; 8] = [
    "title", "journal", "year", "volume", "pages", "publisher", "doi", "url",
];

/// Convert a bibliography record into an OPTIMADE reference record.
///
/// The citation key becomes the record's own `id`, taking precedence over
/// the ingestion-derived identifier.
pub fn convert_reference(
    document: &Document,
    _properties: &[PropertyDefinition],
) -> Result<EntryRecord> {
    let Document::Reference(reference) = document else {
        bail!("not a reference document");
    };

    let mut record = EntryRecord::new("references");
    record.id = reference.key.clone();

    record.set_attribute("authors", json!(parse_authors(reference.field("author"))));
    for field in REFERENCE_FIELDS {
        let value = reference
            .field(field)
            .map(|v| Value::String(v.to_string()))
            .unwrap_or(Value::Null);
        record.set_attribute(field, value);
    }
    record.set_attribute(
        "bib_type",
        Value::String(reference.record_type.clone()),
    );
    record.set_attribute("last_modified", Value::Null);
    record.set_attribute(
        format!("{INTERNAL_PREFIX}raw_bibtex"),
        Value::String(reference.raw.clone()),
    );

    Ok(record)
}

/// Split an author field on " and ", turning "Last, First" into
/// "First Last"
fn parse_authors(author_field: Option<&str>) -> Vec<Value> {
    let Some(authors) = author_field else {
        return Vec::new();
    };
    authors
        .split(" and ")
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|author| {
            let name = match author.split_once(',') {
                Some((last, first)) => format!("{} {}", first.trim(), last.trim()),
                None => author.to_string(),
            };
            json!({ "name": name })
        })
        .collect()
}

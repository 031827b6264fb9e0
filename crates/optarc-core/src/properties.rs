//! Property ingestion and assignment
//!
//! Property files are keyed by an arbitrary external key (often a filename
//! stem) while entries carry archive-derived identifiers, so assignment
//! reconciles the two before writing values. The written attribute set is
//! rectangular: every declared property appears on every record of the
//! type, null when no value was found.

use crate::config::{PropertyDefinition, PropertyType};
use crate::entries::EntryRecord;
use crate::error::{Attempt, ConvertError, Result};
use crate::matcher::MatchedFiles;
use crate::progress::create_progress_bar;
use crate::registry::{PropertyRows, Registry};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Parse all matched property files and merge their values onto the
/// already-built records for one entry type.
///
/// With no property files configured this is a no-op; properties are
/// optional. If files were configured but no rows could be parsed at all,
/// the conversion fails.
pub fn parse_and_assign(
    records: &mut [EntryRecord],
    matched: &MatchedFiles,
    definitions: &[PropertyDefinition],
    provider_prefix: &str,
    entry_type: &str,
    registry: &Registry,
) -> Result<()> {
    if matched.total() == 0 {
        return Ok(());
    }

    let rows = parse_property_files(matched, definitions, entry_type, registry)?;
    check_coverage(&rows, definitions, entry_type);
    assign(records, &rows, definitions, provider_prefix)
}

/// Parse every property file, selected by extension, with the fail-over
/// discipline; later files update earlier values for the same key.
fn parse_property_files(
    matched: &MatchedFiles,
    definitions: &[PropertyDefinition],
    entry_type: &str,
    registry: &Registry,
) -> Result<PropertyRows> {
    let mut merged = PropertyRows::new();
    let mut all_attempts = Vec::new();

    for (_, paths) in matched.groups() {
        let bar = create_progress_bar(
            paths.len() as u64,
            format!("Parsing properties for {entry_type} entries"),
        );
        for path in paths {
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            let parsers = registry.property_parsers(extension).ok_or_else(|| {
                ConvertError::UnsupportedPropertyFormat {
                    path: path.clone(),
                    extension: extension.to_string(),
                }
            })?;

            let mut attempts = Vec::new();
            let mut parsed = false;
            for parser in parsers {
                match (parser.parse)(path, definitions) {
                    Ok(rows) => {
                        for (key, values) in rows {
                            merged.entry(key).or_default().extend(values);
                        }
                        parsed = true;
                        break;
                    }
                    Err(error) => {
                        attempts.push(Attempt::new(parser.name, format!("{error:#}")));
                    }
                }
            }

            if !parsed {
                return Err(ConvertError::ParseExhausted {
                    path: path.clone(),
                    attempts,
                });
            }
            all_attempts.extend(attempts);
            bar.inc(1);
        }
        bar.finish_and_clear();
    }

    if merged.is_empty() {
        return Err(ConvertError::NoPropertiesParsed {
            attempts: all_attempts,
        });
    }

    Ok(merged)
}

/// Warn when the property names found in the data do not exactly match
/// the declared definitions. A subset is legitimate (a file may only cover
/// some entries), so this is suspicious but never fatal.
fn check_coverage(rows: &PropertyRows, definitions: &[PropertyDefinition], entry_type: &str) {
    let declared: HashSet<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
    let found: HashSet<&str> = rows
        .values()
        .flat_map(|values| values.keys())
        .map(String::as_str)
        .collect();

    if declared != found {
        let undeclared: Vec<&str> = found.difference(&declared).copied().collect();
        let unseen: Vec<&str> = declared.difference(&found).copied().collect();
        warn!(
            entry_type,
            ?undeclared,
            ?unseen,
            "Property files and property definitions disagree"
        );
    }
}

/// Write every declared property onto every record, reconciling
/// identifiers and casting values to their declared types.
fn assign(
    records: &mut [EntryRecord],
    rows: &PropertyRows,
    definitions: &[PropertyDefinition],
    provider_prefix: &str,
) -> Result<()> {
    for record in records.iter_mut() {
        let row = resolve_row(record, rows);
        if row.is_none() {
            debug!(id = %record.id, "No property row matched; declared properties set to null");
        }

        for definition in definitions {
            let raw = row
                .and_then(|values| values.get(&definition.name))
                .cloned()
                .unwrap_or(Value::Null);

            let value = match (&raw, definition.property_type) {
                (Value::Null, _) => Value::Null,
                (_, Some(declared)) => {
                    cast_value(&raw, declared).map_err(|reason| ConvertError::PropertyCast {
                        property: definition.name.clone(),
                        value: raw.clone(),
                        declared,
                        reason,
                    })?
                }
                (_, None) => raw,
            };

            record.set_attribute(format!("_{provider_prefix}_{}", definition.name), value);
        }
    }

    Ok(())
}

/// Find the property row for a record: the record's immutable-identifier
/// attribute, then its identifier's filename stem, then the identifier
/// itself. No match means every declared property resolves to null.
fn resolve_row<'a>(record: &EntryRecord, rows: &'a PropertyRows) -> Option<&'a Map<String, Value>> {
    if let Some(Value::String(immutable_id)) = record.attributes.get("immutable_id") {
        if let Some(row) = rows.get(immutable_id) {
            return Some(row);
        }
    }

    let last_segment = record.id.rsplit('/').next().unwrap_or(record.id.as_str());
    let stem = last_segment.split('.').next().unwrap_or(last_segment);
    if let Some(row) = rows.get(stem) {
        return Some(row);
    }

    rows.get(&record.id)
}

/// Cast a raw parsed value to its declared scalar type. Raw values arrive
/// either as native JSON scalars or as undifferentiated strings (CSV).
fn cast_value(value: &Value, declared: PropertyType) -> std::result::Result<Value, String> {
    match declared {
        PropertyType::Float => match value {
            Value::Number(n) => n
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| "not a finite number".to_string()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("'{s}' is not a float")),
            _ => Err("not a number".to_string()),
        },
        PropertyType::Integer => match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::Number(i.into()))
                } else {
                    match n.as_f64() {
                        Some(f) if f.fract() == 0.0 => Ok(Value::Number((f as i64).into())),
                        _ => Err("not an integer".to_string()),
                    }
                }
            }
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(|i| Value::Number(i.into()))
                .map_err(|_| format!("'{s}' is not an integer")),
            _ => Err("not a number".to_string()),
        },
        PropertyType::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!("'{s}' is not a boolean")),
            },
            _ => Err("not a boolean".to_string()),
        },
        PropertyType::String => match value {
            Value::String(s) => Ok(Value::String(s.clone())),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err("not a scalar".to_string()),
        },
    }
}

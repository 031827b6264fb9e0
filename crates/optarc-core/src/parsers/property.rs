//! Property-file parsers
//!
//! Property files map an external record key to raw property values. CSV
//! cells are kept as strings here; casting to the declared scalar types
//! happens during assignment, where failures can be reported against the
//! property definition.

use crate::config::PropertyDefinition;
use crate::registry::PropertyRows;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Parse a CSV property file. The `id` column keys the rows; every other
/// column becomes a raw property value (empty cells become null).
pub fn parse_csv_file(path: &Path, _properties: &[PropertyDefinition]) -> Result<PropertyRows> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    let id_column = headers
        .iter()
        .position(|h| h == "id")
        .with_context(|| format!("CSV property file '{}' must have an 'id' column", path.display()))?;

    let mut rows = PropertyRows::new();
    for record in reader.records() {
        let record = record?;
        let id = record
            .get(id_column)
            .context("CSV row is missing its id cell")?
            .to_string();

        let mut values = Map::new();
        for (column, header) in headers.iter().enumerate() {
            if column == id_column {
                continue;
            }
            let cell = record.get(column).unwrap_or_default();
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            values.insert(header.to_string(), value);
        }

        // later rows update earlier ones for the same key
        rows.entry(id).or_default().extend(values);
    }

    Ok(rows)
}

/// Parse a JSON property file: an object mapping record key to an object
/// of property values.
pub fn parse_json_file(path: &Path, _properties: &[PropertyDefinition]) -> Result<PropertyRows> {
    let data: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    let object = data
        .as_object()
        .with_context(|| format!("JSON property file '{}' must be an object keyed by record ID", path.display()))?;

    let mut rows = PropertyRows::new();
    for (id, values) in object {
        let values = values
            .as_object()
            .with_context(|| format!("Properties for '{id}' must be an object"))?;
        rows.entry(id.clone()).or_default().extend(values.clone());
    }

    Ok(rows)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_csv_rows_keyed_by_id() {
        let file = write_temp("id,energy,stable\nfoo,3.5,true\nbar,-1.2,false\n");
        let rows = parse_csv_file(file.path(), &[]).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows["foo"]["energy"], json!("3.5"));
        assert_eq!(rows["bar"]["stable"], json!("false"));
    }

    #[test]
    fn test_parse_csv_empty_cells_become_null() {
        let file = write_temp("id,energy\nfoo,\n");
        let rows = parse_csv_file(file.path(), &[]).unwrap();
        assert_eq!(rows["foo"]["energy"], Value::Null);
    }

    #[test]
    fn test_parse_csv_requires_id_column() {
        let file = write_temp("name,energy\nfoo,3.5\n");
        assert!(parse_csv_file(file.path(), &[]).is_err());
    }

    #[test]
    fn test_parse_json_object_of_objects() {
        let file = write_temp(r#"{"foo": {"energy": 3.5}, "bar": {"energy": -1.2}}"#);
        let rows = parse_json_file(file.path(), &[]).unwrap();

        assert_eq!(rows["foo"]["energy"], json!(3.5));
        assert_eq!(rows["bar"]["energy"], json!(-1.2));
    }

    #[test]
    fn test_parse_json_rejects_non_object() {
        let file = write_temp("[1, 2, 3]");
        assert!(parse_json_file(file.path(), &[]).is_err());
    }
}

//! Entry-info construction
//!
//! Builds the per-type metadata descriptor that precedes the records in
//! the output: every queryable field with its description, unit, type and
//! title. Custom (namespaced) fields come first, then the target API's
//! built-in fields for the type, and the json output-field order is
//! exactly that insertion order.

use crate::config::PropertyDefinition;
use crate::error::Result;
use crate::schemas::BuiltinSchemas;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Metadata for one queryable field
#[derive(Debug, Clone, Serialize)]
pub struct PropertyInfo {
    pub description: Option<String>,
    pub unit: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub title: Option<String>,
}

impl From<&PropertyDefinition> for PropertyInfo {
    fn from(definition: &PropertyDefinition) -> Self {
        Self {
            description: definition.description.clone(),
            unit: definition.unit.clone(),
            property_type: definition.property_type.map(|t| t.to_string()),
            title: definition.title.clone(),
        }
    }
}

impl PropertyInfo {
    /// Built-in field metadata: a description and a type, nothing else
    pub fn builtin(description: &str, property_type: &str) -> Self {
        Self {
            description: Some(description.to_string()),
            unit: None,
            property_type: Some(property_type.to_string()),
            title: None,
        }
    }
}

/// Per-type info descriptor, serialized as one output line
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub formats: Vec<String>,
    pub description: String,
    pub properties: Map<String, Value>,
    pub output_fields_by_format: Map<String, Value>,
}

/// Build the info descriptor for one entry type.
///
/// Custom definitions are namespaced with the provider prefix and
/// inserted first; if the type has a known built-in schema, its queryable
/// fields follow unprefixed. The result is deterministic for a given
/// configuration.
pub fn entry_type_info(
    entry_type: &str,
    definitions: &[PropertyDefinition],
    provider_prefix: &str,
    builtins: Option<&BuiltinSchemas>,
) -> Result<EntryInfo> {
    let mut properties = Map::new();

    for definition in definitions {
        properties.insert(
            format!("_{provider_prefix}_{}", definition.name),
            serde_json::to_value(PropertyInfo::from(definition))?,
        );
    }

    if let Some(schemas) = builtins {
        if let Some(fields) = schemas.fields_for(entry_type) {
            for (name, info) in fields {
                properties.insert(name, serde_json::to_value(info)?);
            }
        }
    }

    let field_names: Vec<&String> = properties.keys().collect();
    let mut output_fields_by_format = Map::new();
    output_fields_by_format.insert("json".to_string(), json!(field_names));

    Ok(EntryInfo {
        formats: vec!["json".to_string()],
        description: entry_type.to_string(),
        properties,
        output_fields_by_format,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::PropertyType;

    fn definition(name: &str) -> PropertyDefinition {
        PropertyDefinition {
            name: name.to_string(),
            title: Some(format!("Title of {name}")),
            description: Some(format!("Description of {name}")),
            unit: Some("eV".to_string()),
            property_type: Some(PropertyType::Float),
        }
    }

    #[test]
    fn test_custom_fields_are_namespaced_and_first() {
        let info = entry_type_info(
            "structures",
            &[definition("energy"), definition("band_gap")],
            "example",
            Some(&BuiltinSchemas::optimade()),
        )
        .unwrap();

        let keys: Vec<&String> = info.properties.keys().collect();
        assert_eq!(keys[0], "_example_energy");
        assert_eq!(keys[1], "_example_band_gap");
        assert!(keys.len() > 2);
        assert!(keys.contains(&&"nelements".to_string()));

        let json_fields = info.output_fields_by_format["json"].as_array().unwrap();
        assert_eq!(json_fields.len(), info.properties.len());
        assert_eq!(json_fields[0], "_example_energy");
    }

    #[test]
    fn test_without_builtin_schema_only_custom_fields() {
        let info = entry_type_info("structures", &[definition("energy")], "example", None).unwrap();
        assert_eq!(info.properties.len(), 1);
        assert_eq!(info.description, "structures");
        assert_eq!(info.formats, vec!["json"]);
    }

    #[test]
    fn test_unknown_type_gets_no_builtin_fields() {
        let info = entry_type_info(
            "trajectories",
            &[definition("length")],
            "example",
            Some(&BuiltinSchemas::optimade()),
        )
        .unwrap();
        assert_eq!(info.properties.len(), 1);
    }

    #[test]
    fn test_property_info_carries_definition_metadata() {
        let info = entry_type_info("structures", &[definition("energy")], "example", None).unwrap();
        let energy = &info.properties["_example_energy"];
        assert_eq!(energy["unit"], "eV");
        assert_eq!(energy["type"], "float");
        assert_eq!(energy["title"], "Title of energy");
    }
}

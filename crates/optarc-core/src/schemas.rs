//! Built-in queryable-property registry
//!
//! A static lookup of the OPTIMADE-defined queryable fields per entry
//! type, injected into the info builder so it never consults global
//! state. The id/type/attributes envelope fields are deliberately absent;
//! they are part of every record's frame, not queryable attributes.

use crate::info::PropertyInfo;

/// Lookup collaborator for built-in entry-type schemas
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinSchemas;

impl BuiltinSchemas {
    /// The OPTIMADE v1.1 built-in schemas for `structures` and `references`
    pub fn optimade() -> Self {
        Self
    }

    /// Queryable fields for an entry type, in a fixed documented order.
    /// Unknown types have no built-in schema.
    pub fn fields_for(&self, entry_type: &str) -> Option<Vec<(String, PropertyInfo)>> {
        let fields: &[(&str, &str, &str)] = match entry_type {
            "structures" => &[
                ("elements", "Names of the different elements present in the structure.", "list"),
                ("nelements", "Number of different elements in the structure.", "integer"),
                ("elements_ratios", "Relative proportions of the different elements in the structure.", "list"),
                ("chemical_formula_descriptive", "The chemical formula for a structure as a string in a form chosen by the API implementation.", "string"),
                ("chemical_formula_reduced", "The reduced chemical formula for a structure with element proportions given as integers.", "string"),
                ("chemical_formula_anonymous", "The anonymous formula with element names replaced by letters in order of descending proportion.", "string"),
                ("dimension_types", "List of three integers describing periodicity along each lattice vector.", "list"),
                ("nperiodic_dimensions", "Number of dimensions with periodic boundary conditions.", "integer"),
                ("lattice_vectors", "The three lattice vectors in Cartesian coordinates, in ångström.", "list"),
                ("cartesian_site_positions", "Cartesian positions of each site in the structure, in ångström.", "list"),
                ("nsites", "Number of sites in the structure.", "integer"),
                ("species", "Description of the chemical species found at each site.", "list"),
                ("species_at_sites", "Name of the species at each site, in the same order as cartesian_site_positions.", "list"),
                ("structure_features", "List of features used by this structure, e.g. disorder or assemblies.", "list"),
                ("last_modified", "Date and time representing when the entry was last modified.", "timestamp"),
                ("immutable_id", "An optional implementation-specific identifier that is permanent for this entry.", "string"),
            ],
            "references" => &[
                ("authors", "List of authors, each an object with a name.", "list"),
                ("title", "Title of the reference.", "string"),
                ("journal", "Journal or periodical the reference was published in.", "string"),
                ("year", "Year of publication.", "string"),
                ("volume", "Volume of the periodical.", "string"),
                ("pages", "Page range of the reference.", "string"),
                ("publisher", "Publisher of the reference.", "string"),
                ("doi", "Digital object identifier of the reference.", "string"),
                ("url", "URL where the reference can be found.", "string"),
                ("bib_type", "Type of the reference, following the BibTeX entry types.", "string"),
                ("last_modified", "Date and time representing when the entry was last modified.", "timestamp"),
                ("immutable_id", "An optional implementation-specific identifier that is permanent for this entry.", "string"),
            ],
            _ => return None,
        };

        Some(
            fields
                .iter()
                .map(|(name, description, property_type)| {
                    (
                        name.to_string(),
                        PropertyInfo::builtin(description, property_type),
                    )
                })
                .collect(),
        )
    }
}

//! Structure file readers (XYZ, CIF) and the OPTIMADE structure converter
//!
//! The readers cover the common subset of each format: single-frame XYZ
//! with cartesian coordinates, and CIF files carrying cell parameters plus
//! one `_atom_site` loop with fractional coordinates. Anything else is
//! rejected so the next candidate in the fail-over chain gets a chance.

use crate::config::PropertyDefinition;
use crate::entries::{EntryRecord, INTERNAL_PREFIX};
use crate::parsers::Document;
use crate::registry::Parsed;
use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// One atomic site with cartesian coordinates in Å
#[derive(Debug, Clone)]
pub struct Site {
    pub species: String,
    pub position: [f64; 3],
}

/// Parsed structure document
#[derive(Debug, Clone)]
pub struct ParsedStructure {
    /// Row-major lattice vectors in Å, absent for non-periodic structures
    pub lattice: Option<[[f64; 3]; 3]>,
    pub sites: Vec<Site>,
    pub source_format: &'static str,
}

/// Parse a single-frame XYZ file
pub fn parse_xyz_file(path: &Path) -> Result<Parsed> {
    let content = std::fs::read_to_string(path)?;
    let mut lines = content.lines();

    let natoms: usize = lines
        .next()
        .context("XYZ file is empty")?
        .trim()
        .parse()
        .context("XYZ first line must be the atom count")?;
    if natoms == 0 {
        bail!("XYZ atom count is zero");
    }

    // comment line
    lines.next().context("XYZ file has no comment line")?;

    let mut sites = Vec::with_capacity(natoms);
    for _ in 0..natoms {
        let line = lines.next().context("XYZ file ended before all atoms were read")?;
        let mut tokens = line.split_whitespace();
        let symbol = tokens.next().context("XYZ atom line is empty")?;
        if !symbol.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            bail!("'{symbol}' is not a chemical symbol");
        }
        let mut position = [0.0f64; 3];
        for coord in &mut position {
            *coord = tokens
                .next()
                .context("XYZ atom line has fewer than three coordinates")?
                .parse()
                .context("XYZ coordinate is not a number")?;
        }
        sites.push(Site {
            species: normalize_symbol(symbol),
            position,
        });
    }

    Ok(Parsed::One(Document::Structure(ParsedStructure {
        lattice: None,
        sites,
        source_format: "xyz",
    })))
}

/// Parse a CIF file with cell parameters and one fractional atom-site loop
pub fn parse_cif_file(path: &Path) -> Result<Parsed> {
    let content = std::fs::read_to_string(path)?;
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.split('#').next().unwrap_or("").trim_end())
        .collect();

    let cell = parse_cell(&lines)?;
    let lattice = cell_to_lattice(cell);
    let sites = parse_atom_sites(&lines, &lattice)?;
    if sites.is_empty() {
        bail!("CIF file has no atom sites");
    }

    Ok(Parsed::One(Document::Structure(ParsedStructure {
        lattice: Some(lattice),
        sites,
        source_format: "cif",
    })))
}

/// Cell parameters (a, b, c, alpha, beta, gamma)
type Cell = [f64; 6];

fn parse_cell(lines: &[&str]) -> Result<Cell> {
    const TAGS: [&str; 6] = [
        "_cell_length_a",
        "_cell_length_b",
        "_cell_length_c",
        "_cell_angle_alpha",
        "_cell_angle_beta",
        "_cell_angle_gamma",
    ];

    let mut cell = [f64::NAN; 6];
    for line in lines {
        let mut tokens = line.split_whitespace();
        let Some(tag) = tokens.next() else { continue };
        if let Some(idx) = TAGS.iter().position(|t| *t == tag) {
            let value = tokens
                .next()
                .with_context(|| format!("CIF tag {tag} has no value"))?;
            cell[idx] = parse_cif_number(value)
                .with_context(|| format!("CIF tag {tag} value '{value}' is not a number"))?;
        }
    }

    if cell.iter().any(|v| v.is_nan()) {
        bail!("CIF file does not declare all six cell parameters");
    }
    Ok(cell)
}

fn parse_atom_sites(lines: &[&str], lattice: &[[f64; 3]; 3]) -> Result<Vec<Site>> {
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim() != "loop_" {
            i += 1;
            continue;
        }

        // column headers
        let mut tags = Vec::new();
        let mut j = i + 1;
        while j < lines.len() && lines[j].trim_start().starts_with('_') {
            if let Some(tag) = lines[j].split_whitespace().next() {
                tags.push(tag.to_string());
            }
            j += 1;
        }

        if !tags.iter().any(|t| t.starts_with("_atom_site_")) {
            i = j;
            continue;
        }

        let symbol_col = tags
            .iter()
            .position(|t| t == "_atom_site_type_symbol")
            .or_else(|| tags.iter().position(|t| t == "_atom_site_label"))
            .context("CIF atom-site loop has no symbol or label column")?;
        let x_col = column(&tags, "_atom_site_fract_x")?;
        let y_col = column(&tags, "_atom_site_fract_y")?;
        let z_col = column(&tags, "_atom_site_fract_z")?;

        let mut sites = Vec::new();
        while j < lines.len() {
            let row = lines[j].trim();
            if row.is_empty()
                || row == "loop_"
                || row.starts_with('_')
                || row.starts_with("data_")
            {
                break;
            }
            let fields: Vec<&str> = row.split_whitespace().collect();
            if fields.len() < tags.len() {
                bail!("CIF atom-site row '{row}' has fewer fields than columns");
            }
            let frac = [
                parse_cif_number(fields[x_col]).context("bad fractional coordinate")?,
                parse_cif_number(fields[y_col]).context("bad fractional coordinate")?,
                parse_cif_number(fields[z_col]).context("bad fractional coordinate")?,
            ];
            sites.push(Site {
                species: symbol_from_label(fields[symbol_col])?,
                position: frac_to_cartesian(frac, lattice),
            });
            j += 1;
        }
        return Ok(sites);
    }

    bail!("CIF file has no atom-site loop");
}

fn column(tags: &[String], name: &str) -> Result<usize> {
    tags.iter()
        .position(|t| t == name)
        .with_context(|| format!("CIF atom-site loop has no {name} column"))
}

/// Parse a CIF numeric value, dropping a trailing uncertainty like "5.43(2)"
fn parse_cif_number(value: &str) -> Result<f64> {
    let cleaned = value.split('(').next().unwrap_or(value);
    Ok(cleaned.parse()?)
}

/// Strip any site-numbering suffix from a label ("Si1" → "Si")
fn symbol_from_label(label: &str) -> Result<String> {
    let symbol: String = label.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    if symbol.is_empty() {
        bail!("'{label}' has no chemical symbol");
    }
    Ok(normalize_symbol(&symbol))
}

fn normalize_symbol(symbol: &str) -> String {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Standard cell-parameter to lattice-vector transformation, with `a`
/// along x and `b` in the xy plane.
fn cell_to_lattice(cell: Cell) -> [[f64; 3]; 3] {
    let [a, b, c, alpha, beta, gamma] = cell;
    let (alpha, beta, gamma) = (
        alpha.to_radians(),
        beta.to_radians(),
        gamma.to_radians(),
    );

    let cx = c * beta.cos();
    let cy = c * (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
    let cz = (c * c - cx * cx - cy * cy).max(0.0).sqrt();

    [
        [a, 0.0, 0.0],
        [b * gamma.cos(), b * gamma.sin(), 0.0],
        [cx, cy, cz],
    ]
}

fn frac_to_cartesian(frac: [f64; 3], lattice: &[[f64; 3]; 3]) -> [f64; 3] {
    let mut cart = [0.0f64; 3];
    for (axis, coord) in cart.iter_mut().enumerate() {
        *coord = frac[0] * lattice[0][axis] + frac[1] * lattice[1][axis] + frac[2] * lattice[2][axis];
    }
    cart
}

/// Convert a parsed structure into an OPTIMADE structure record.
///
/// Leaves `id` empty: structure files carry no natural identifier, so the
/// ingestion-derived one is substituted downstream.
pub fn convert_structure(
    document: &Document,
    _properties: &[PropertyDefinition],
) -> Result<EntryRecord> {
    let Document::Structure(structure) = document else {
        bail!("not a structure document");
    };

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for site in &structure.sites {
        *counts.entry(site.species.as_str()).or_insert(0) += 1;
    }

    let elements: Vec<&str> = counts.keys().copied().collect();
    let nsites = structure.sites.len();
    let ratios: Vec<f64> = counts.values().map(|&c| c as f64 / nsites as f64).collect();

    let mut record = EntryRecord::new("structures");
    record.set_attribute("elements", json!(elements));
    record.set_attribute("nelements", json!(elements.len()));
    record.set_attribute("elements_ratios", json!(ratios));
    record.set_attribute(
        "chemical_formula_descriptive",
        Value::String(formula(counts.iter().map(|(s, c)| (*s, *c)))),
    );
    record.set_attribute(
        "chemical_formula_reduced",
        Value::String(formula(reduced_counts(&counts))),
    );
    record.set_attribute(
        "chemical_formula_anonymous",
        Value::String(anonymous_formula(&counts)),
    );

    match structure.lattice {
        Some(lattice) => {
            record.set_attribute("lattice_vectors", json!(lattice));
            record.set_attribute("dimension_types", json!([1, 1, 1]));
            record.set_attribute("nperiodic_dimensions", json!(3));
        }
        None => {
            record.set_attribute("lattice_vectors", Value::Null);
            record.set_attribute("dimension_types", json!([0, 0, 0]));
            record.set_attribute("nperiodic_dimensions", json!(0));
        }
    }

    record.set_attribute("nsites", json!(nsites));
    record.set_attribute(
        "cartesian_site_positions",
        json!(structure.sites.iter().map(|s| s.position).collect::<Vec<_>>()),
    );
    record.set_attribute(
        "species_at_sites",
        json!(structure.sites.iter().map(|s| s.species.as_str()).collect::<Vec<_>>()),
    );
    record.set_attribute(
        "species",
        json!(elements
            .iter()
            .map(|e| json!({"name": e, "chemical_symbols": [e], "concentration": [1.0]}))
            .collect::<Vec<_>>()),
    );
    record.set_attribute("structure_features", json!([]));
    record.set_attribute("last_modified", Value::Null);
    record.set_attribute(
        format!("{INTERNAL_PREFIX}source_format"),
        Value::String(structure.source_format.to_string()),
    );

    Ok(record)
}

fn formula<S, I>(counts: I) -> String
where
    S: std::fmt::Display,
    I: Iterator<Item = (S, usize)>,
{
    let mut out = String::new();
    for (symbol, count) in counts {
        out.push_str(&symbol.to_string());
        if count > 1 {
            out.push_str(&count.to_string());
        }
    }
    out
}

fn reduced_counts<'a>(
    counts: &'a BTreeMap<&'a str, usize>,
) -> impl Iterator<Item = (&'a str, usize)> {
    let divisor = counts.values().copied().fold(0, gcd).max(1);
    counts.iter().map(move |(s, c)| (*s, c / divisor))
}

/// Anonymous formula: reduced proportions mapped onto A, B, C, ... in
/// descending order of abundance.
fn anonymous_formula(counts: &BTreeMap<&str, usize>) -> String {
    let mut reduced: Vec<usize> = reduced_counts(counts).map(|(_, c)| c).collect();
    reduced.sort_unstable_by(|a, b| b.cmp(a));
    formula(reduced.into_iter().enumerate().map(|(i, c)| (anonymous_symbol(i), c)))
}

fn anonymous_symbol(index: usize) -> String {
    let letter = |i: usize| (b'A' + (i % 26) as u8) as char;
    if index < 26 {
        letter(index).to_string()
    } else {
        format!("{}{}", letter(index / 26 - 1), letter(index % 26).to_ascii_lowercase())
    }
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const QUARTZ_CIF: &str = "\
data_quartz
_cell_length_a 4.913
_cell_length_b 4.913
_cell_length_c 5.405
_cell_angle_alpha 90.0
_cell_angle_beta 90.0
_cell_angle_gamma 120.0
loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
Si1 Si 0.470 0.000 0.000
O1 O 0.410 0.270 0.120
O2 O 0.410 0.140 0.880
";

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn single_document(parsed: Parsed) -> ParsedStructure {
        match parsed {
            Parsed::One(Document::Structure(s)) => s,
            other => panic!("expected one structure document, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_xyz() {
        let file = write_temp("3\nwater molecule\nO 0.0 0.0 0.117\nH 0.0 0.757 -0.467\nH 0.0 -0.757 -0.467\n");
        let structure = single_document(parse_xyz_file(file.path()).unwrap());

        assert_eq!(structure.sites.len(), 3);
        assert!(structure.lattice.is_none());
        assert_eq!(structure.sites[0].species, "O");
        assert_eq!(structure.sites[1].position[1], 0.757);
    }

    #[test]
    fn test_parse_xyz_rejects_truncated_file() {
        let file = write_temp("5\ncomment\nO 0.0 0.0 0.0\n");
        assert!(parse_xyz_file(file.path()).is_err());
    }

    #[test]
    fn test_parse_xyz_rejects_cif_content() {
        let file = write_temp(QUARTZ_CIF);
        assert!(parse_xyz_file(file.path()).is_err());
    }

    #[test]
    fn test_parse_cif() {
        let file = write_temp(QUARTZ_CIF);
        let structure = single_document(parse_cif_file(file.path()).unwrap());

        assert_eq!(structure.sites.len(), 3);
        let lattice = structure.lattice.unwrap();
        assert!((lattice[0][0] - 4.913).abs() < 1e-9);
        // b is rotated 120 degrees from a
        assert!((lattice[1][0] - 4.913 * 120f64.to_radians().cos()).abs() < 1e-9);
        assert_eq!(structure.sites[0].species, "Si");
    }

    #[test]
    fn test_parse_cif_rejects_xyz_content() {
        let file = write_temp("2\ncomment\nH 0.0 0.0 0.0\nH 0.0 0.0 0.74\n");
        assert!(parse_cif_file(file.path()).is_err());
    }

    #[test]
    fn test_cif_number_uncertainty_stripped() {
        assert_eq!(parse_cif_number("5.43(2)").unwrap(), 5.43);
        assert_eq!(parse_cif_number("90.0").unwrap(), 90.0);
        assert!(parse_cif_number("abc").is_err());
    }

    #[test]
    fn test_convert_structure_formulas() {
        let file = write_temp(QUARTZ_CIF);
        let parsed = single_document(parse_cif_file(file.path()).unwrap());
        let record = convert_structure(&Document::Structure(parsed), &[]).unwrap();

        assert!(record.id.is_empty());
        assert_eq!(record.entry_type, "structures");
        assert_eq!(record.attributes["elements"], json!(["O", "Si"]));
        assert_eq!(record.attributes["nelements"], json!(2));
        assert_eq!(record.attributes["nsites"], json!(3));
        assert_eq!(record.attributes["chemical_formula_descriptive"], json!("O2Si"));
        assert_eq!(record.attributes["chemical_formula_reduced"], json!("O2Si"));
        assert_eq!(record.attributes["chemical_formula_anonymous"], json!("A2B"));
        assert_eq!(record.attributes["dimension_types"], json!([1, 1, 1]));
        assert!(record
            .attributes
            .contains_key(&format!("{INTERNAL_PREFIX}source_format")));
    }

    #[test]
    fn test_convert_molecule_has_no_lattice() {
        let file = write_temp("2\nhydrogen\nH 0.0 0.0 0.0\nH 0.0 0.0 0.74\n");
        let parsed = single_document(parse_xyz_file(file.path()).unwrap());
        let record = convert_structure(&Document::Structure(parsed), &[]).unwrap();

        assert_eq!(record.attributes["lattice_vectors"], Value::Null);
        assert_eq!(record.attributes["dimension_types"], json!([0, 0, 0]));
        assert_eq!(record.attributes["chemical_formula_reduced"], json!("H"));
        assert_eq!(record.attributes["chemical_formula_anonymous"], json!("A"));
    }
}

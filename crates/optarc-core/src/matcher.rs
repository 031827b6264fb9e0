//! Declarative path matching
//!
//! Resolves the `PathSpec` lists from the configuration into concrete file
//! lists, grouped by the sub-archive name they were declared under.
//! Wildcard expansion is sorted so identifier derivation downstream is
//! stable across runs.

use crate::config::PathSpec;
use crate::error::{ConvertError, Result};
use std::path::{Path, PathBuf};

/// Resolved files grouped by sub-archive name (`None` for unscoped specs),
/// in declaration order.
#[derive(Debug, Default)]
pub struct MatchedFiles {
    groups: Vec<(Option<String>, Vec<PathBuf>)>,
}

impl MatchedFiles {
    /// Append paths under a sub-archive key, creating the group on first use
    fn extend(&mut self, key: Option<&str>, paths: Vec<PathBuf>) {
        if let Some((_, existing)) = self.groups.iter_mut().find(|(k, _)| k.as_deref() == key) {
            existing.extend(paths);
        } else {
            self.groups.push((key.map(str::to_string), paths));
        }
    }

    pub fn groups(&self) -> impl Iterator<Item = (Option<&str>, &[PathBuf])> {
        self.groups
            .iter()
            .map(|(k, v)| (k.as_deref(), v.as_slice()))
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.groups.iter().flat_map(|(_, v)| v.iter())
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, v)| v.len()).sum()
    }
}

/// Resolve a list of path specs against an archive directory.
///
/// Patterns containing a `*` are expanded with a sorted filesystem glob; a
/// wildcard that matches nothing is a hard error rather than a silent skip.
/// A spec with no patterns resolves to the sub-archive name itself as a
/// single literal path. Existence of literal paths is checked separately by
/// [`check_missing`] so every problem is reported in one pass.
pub fn match_paths(archive_path: &Path, specs: &[PathSpec]) -> Result<MatchedFiles> {
    let mut matched = MatchedFiles::default();

    for spec in specs {
        let patterns = spec.matches.as_deref().unwrap_or_default();
        let mut paths = Vec::new();

        for pattern in patterns {
            if pattern.contains('*') {
                paths.extend(expand_wildcard(archive_path, pattern)?);
            } else {
                paths.push(archive_path.join(pattern));
            }
        }

        if patterns.is_empty() {
            let file = spec.file.as_deref().ok_or_else(|| {
                ConvertError::config("A path spec needs either a file name or match patterns")
            })?;
            paths.push(archive_path.join(file));
        }

        matched.extend(spec.file.as_deref(), paths);
    }

    Ok(matched)
}

/// Check that every matched path exists, aggregating all offenders into a
/// single error.
pub fn check_missing(matched: &MatchedFiles) -> Result<()> {
    let missing: Vec<PathBuf> = matched
        .files()
        .filter(|path| !path.exists())
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConvertError::MissingFiles(missing))
    }
}

fn expand_wildcard(archive_path: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full_pattern = archive_path.join(pattern);
    let full_pattern = full_pattern.to_string_lossy();

    let entries = glob::glob(&full_pattern)
        .map_err(|e| ConvertError::config(format!("Invalid pattern '{pattern}': {e}")))?;

    let mut hits = Vec::new();
    for entry in entries {
        hits.push(entry.map_err(|e| ConvertError::Io(e.into_error()))?);
    }

    if hits.is_empty() {
        return Err(ConvertError::NoMatch(pattern.to_string()));
    }

    hits.sort();
    Ok(hits)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn spec(file: Option<&str>, matches: &[&str]) -> PathSpec {
        PathSpec {
            file: file.map(str::to_string),
            matches: if matches.is_empty() {
                None
            } else {
                Some(matches.iter().map(|m| m.to_string()).collect())
            },
        }
    }

    fn touch(dir: &Path, name: &str) {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_wildcard_expansion_is_sorted_and_deterministic() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "cifs/b.cif");
        touch(dir.path(), "cifs/a.cif");
        touch(dir.path(), "cifs/c.cif");

        let specs = [spec(Some("structures.zip"), &["cifs/*.cif"])];
        let first = match_paths(dir.path(), &specs).unwrap();
        let second = match_paths(dir.path(), &specs).unwrap();

        let names: Vec<_> = first
            .files()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.cif", "b.cif", "c.cif"]);
        assert_eq!(
            first.files().collect::<Vec<_>>(),
            second.files().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_wildcard_without_matches_is_an_error() {
        let dir = TempDir::new().unwrap();
        let specs = [spec(Some("structures.zip"), &["*.nonexistent"])];

        let err = match_paths(dir.path(), &specs).unwrap_err();
        assert!(matches!(err, ConvertError::NoMatch(p) if p == "*.nonexistent"));
    }

    #[test]
    fn test_spec_without_patterns_resolves_to_file_name() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "data.csv");

        let matched = match_paths(dir.path(), &[spec(Some("data.csv"), &[])]).unwrap();
        assert_eq!(matched.total(), 1);
        assert_eq!(matched.files().next().unwrap(), &dir.path().join("data.csv"));
    }

    #[test]
    fn test_missing_literal_paths_aggregate_into_one_error() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "present.cif");

        let specs = [spec(
            Some("structures"),
            &["present.cif", "gone.cif", "also_gone.cif"],
        )];
        let matched = match_paths(dir.path(), &specs).unwrap();

        let err = check_missing(&matched).unwrap_err();
        match err {
            ConvertError::MissingFiles(missing) => {
                assert_eq!(missing.len(), 2);
            }
            other => panic!("expected MissingFiles, got {other:?}"),
        }
    }

    #[test]
    fn test_groups_keyed_by_sub_archive() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.cif");
        touch(dir.path(), "b.xyz");

        let specs = [
            spec(Some("structures.zip"), &["a.cif"]),
            spec(None, &["b.xyz"]),
        ];
        let matched = match_paths(dir.path(), &specs).unwrap();

        let keys: Vec<_> = matched.groups().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![Some("structures.zip"), None]);
    }
}

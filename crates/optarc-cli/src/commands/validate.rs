//! `optarc validate` command implementation

use anyhow::Result;
use optarc_core::config::{ArchiveConfig, EntrySpec, CONFIG_FILENAME};
use std::path::Path;

/// Load and validate an archive configuration without converting
pub fn run(archive_path: &Path) -> Result<()> {
    let config_path = archive_path.join(CONFIG_FILENAME);
    let config = ArchiveConfig::from_file(&config_path)?;

    println!("✓ Valid configuration: {}", config_path.display());
    match &config.entries {
        EntrySpec::Jsonl(jsonl) => {
            println!("  Pre-built JSONL: {}", jsonl.jsonl_path);
        }
        EntrySpec::Entries(entries) => {
            for entry in entries {
                println!(
                    "  {}: {} entry path(s), {} property definition(s)",
                    entry.entry_type,
                    entry.entry_paths.len(),
                    entry.property_definitions.len()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_validate_accepts_well_formed_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("optimade.yaml"),
            r#"
database_description: Test
entries:
  - entry_type: structures
    entry_paths:
      - file: structures.zip
"#,
        )
        .unwrap();

        assert!(run(dir.path()).is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("optimade.yaml"),
            "database_description: [broken\n",
        )
        .unwrap();

        assert!(run(dir.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_missing_config() {
        let dir = TempDir::new().unwrap();
        assert!(run(dir.path()).is_err());
    }
}

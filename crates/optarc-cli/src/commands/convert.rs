//! `optarc convert` command implementation

use anyhow::Result;
use std::path::Path;
use tracing::info;

/// Convert one archive and report what was written
pub fn run(archive_path: &Path, output: Option<&Path>) -> Result<()> {
    info!(archive = %archive_path.display(), "Starting conversion");
    let jsonl_path = optarc_core::convert_archive(archive_path, output)?;

    println!("✓ Converted archive: {}", archive_path.display());
    println!("  Wrote: {}", jsonl_path.display());

    Ok(())
}

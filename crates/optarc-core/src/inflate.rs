//! Decompression of declared data sources
//!
//! Sub-archives named in the configuration are extracted next to
//! themselves before any matching or parsing happens. Supported containers
//! are zip and tar (gzip, bzip2 or uncompressed); individually compressed
//! `<x>.gz` and `<x>.bz2` files are rewritten without the compression
//! suffix. Anything else is left untouched.

use crate::error::{ConvertError, Result};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Inflate one declared data source in place.
///
/// `data_path` is resolved relative to `archive_path` unless absolute. The
/// extracted contents land in the directory containing the compressed file.
pub fn inflate_archive(archive_path: &Path, data_path: &Path) -> Result<()> {
    let real_path = if data_path.is_absolute() {
        data_path.to_path_buf()
    } else {
        archive_path.join(data_path)
    };

    if !real_path.exists() {
        return Err(ConvertError::DataNotFound(real_path));
    }

    let target_dir = real_path.parent().unwrap_or(archive_path).to_path_buf();
    let file_name = real_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = real_path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if extension == "zip" {
        debug!(path = %real_path.display(), "Extracting zip archive");
        let mut archive = zip::ZipArchive::new(File::open(&real_path)?)?;
        archive.extract(&target_dir)?;
        return Ok(());
    }

    // tarfile-style detection: any ".tar" in the name handles .tar,
    // .tar.gz and .tar.bz2 uniformly
    if file_name.contains(".tar") {
        debug!(path = %real_path.display(), "Extracting tar archive");
        let file = File::open(&real_path)?;
        let reader: Box<dyn Read> = match extension {
            "gz" => Box::new(flate2::read::GzDecoder::new(file)),
            "bz2" => Box::new(bzip2::read::BzDecoder::new(file)),
            _ => Box::new(file),
        };
        tar::Archive::new(reader).unpack(&target_dir)?;
        return Ok(());
    }

    // Individually compressed file: decompress and strip the suffix
    match extension {
        "gz" => {
            debug!(path = %real_path.display(), "Decompressing gzip file");
            let reader = flate2::read::GzDecoder::new(File::open(&real_path)?);
            rewrite_decompressed(&real_path, reader)
        }
        "bz2" => {
            debug!(path = %real_path.display(), "Decompressing bzip2 file");
            let reader = bzip2::read::BzDecoder::new(File::open(&real_path)?);
            rewrite_decompressed(&real_path, reader)
        }
        _ => {
            debug!(path = %real_path.display(), "Not a compressed source, leaving as-is");
            Ok(())
        }
    }
}

fn rewrite_decompressed(real_path: &Path, mut reader: impl Read) -> Result<()> {
    let target = real_path.with_extension("");
    let mut out = File::create(&target)?;
    io::copy(&mut reader, &mut out)?;
    Ok(())
}

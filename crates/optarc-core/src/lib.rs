//! optarc core library
//!
//! Converts an on-disk scientific-data archive plus a declarative
//! `optimade.yaml` description into a single OPTIMADE JSONL file.
//!
//! # Pipeline
//!
//! - **Matching**: resolve the configured path specs (literals or globs)
//!   into concrete file lists ([`matcher`])
//! - **Inflation**: extract declared compressed sub-archives in place
//!   ([`inflate`])
//! - **Ingestion**: parse each file with a fail-over chain of registered
//!   parsers and derive stable identifiers ([`ingest`], [`registry`])
//! - **Conversion**: map parsed documents onto normalized records
//!   ([`convert`], [`entries`])
//! - **Properties**: parse auxiliary property files, reconcile their keys
//!   with entry identifiers, cast and attach values ([`properties`])
//! - **Serialization**: write the header, per-type info descriptors and
//!   records as newline-delimited JSON ([`info`], [`jsonl`])
//!
//! # Example
//!
//! ```no_run
//! use optarc_core::convert_archive;
//! use std::path::Path;
//!
//! fn main() -> optarc_core::Result<()> {
//!     let jsonl = convert_archive(Path::new("./my-archive"), None)?;
//!     println!("wrote {}", jsonl.display());
//!     Ok(())
//! }
//! ```
//!
//! Plugin strategy lists (parsers, converters, property parsers) live in
//! a [`registry::Registry`] constructed per run; see
//! [`convert::convert_archive_with_registry`] to supply custom plugins.

pub mod config;
pub mod convert;
pub mod entries;
pub mod error;
pub mod inflate;
pub mod info;
pub mod ingest;
pub mod jsonl;
pub mod matcher;
pub mod parsers;
pub mod progress;
pub mod properties;
pub mod registry;
pub mod schemas;

// Re-export commonly used types
pub use config::ArchiveConfig;
pub use convert::convert_archive;
pub use error::{ConvertError, Result};

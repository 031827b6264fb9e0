//! optarc CLI library
//!
//! Command-line interface for converting scientific-data archives into
//! OPTIMADE JSONL files:
//!
//! - **Conversion**: turn an archive plus its optimade.yaml into a JSONL
//!   file (`optarc convert`)
//! - **Validation**: check an archive's configuration without converting
//!   (`optarc validate`)

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// optarc - scientific-data archives to OPTIMADE JSONL
#[derive(Parser, Debug)]
#[command(name = "optarc")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an archive described by optimade.yaml into an OPTIMADE
    /// JSONL file
    Convert {
        /// Archive directory containing optimade.yaml
        archive_path: PathBuf,

        /// Where to write the JSONL file (defaults to
        /// <ARCHIVE_PATH>/optimade.jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load and validate an archive's optimade.yaml without converting
    Validate {
        /// Archive directory containing optimade.yaml
        archive_path: PathBuf,
    },
}

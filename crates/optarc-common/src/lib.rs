//! optarc common library
//!
//! Shared plumbing for the optarc workspace. Currently this is the
//! logging layer used by the CLI and any future long-running frontends.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel, LogOutput};

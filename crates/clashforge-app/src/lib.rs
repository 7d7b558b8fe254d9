//! Clashforge - converts vless descriptor lists into Clash configuration files.
//!
//! This crate holds the I/O shell around `clashforge-core`:
//!
//! - Reading descriptor lines and JSON configuration from disk
//! - Writing the finished document as YAML or JSON
//! - Logging setup for the `clashforge` binary

pub mod io;
pub mod logging;

pub use io::{load_config, read_lines, write_document, OutputFormat, ShellError};
pub use logging::{init_logging, LogOptions};

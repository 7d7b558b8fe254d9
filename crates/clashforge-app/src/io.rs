//! File input and output for the converter.

use std::fs;
use std::path::{Path, PathBuf};

use clashforge_core::{ClashDocument, ConvertError, ConverterConfig};
use thiserror::Error;

/// Errors from the I/O shell.
#[derive(Debug, Error)]
pub enum ShellError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),

    /// Document could not be rendered.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Serialization format of the output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl OutputFormat {
    /// Guesses the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Renders the document in this format.
    pub fn render(&self, document: &ClashDocument) -> Result<String, ConvertError> {
        match self {
            Self::Yaml => document.to_yaml(),
            Self::Json => document.to_json(),
        }
    }
}

/// Reads a UTF-8 text file as lines, dropping a leading byte-order mark.
pub fn read_lines(path: &Path) -> Result<Vec<String>, ShellError> {
    let text = fs::read_to_string(path)?;
    Ok(text
        .trim_start_matches('\u{feff}')
        .lines()
        .map(str::to_string)
        .collect())
}

/// Loads a JSON configuration file, or the defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<ConverterConfig, ShellError> {
    match path {
        Some(path) => Ok(ConverterConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(ConverterConfig::default()),
    }
}

/// Writes the document to `path`.
///
/// The content goes to a hidden sibling file first and is renamed into
/// place, so readers never see a partial document.
pub fn write_document(
    document: &ClashDocument,
    path: &Path,
    format: OutputFormat,
) -> Result<(), ShellError> {
    let rendered = format.render(document)?;
    let staging = staging_path(path);

    fs::write(&staging, rendered)?;
    if let Err(e) = fs::rename(&staging, path) {
        let _ = fs::remove_file(&staging);
        return Err(e.into());
    }
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "clashforge".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

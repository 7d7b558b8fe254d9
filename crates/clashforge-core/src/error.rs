//! Error types for descriptor conversion.

use thiserror::Error;

use crate::pipeline::ConversionStats;

/// Structural failures while parsing a single descriptor line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line does not start with the expected scheme prefix.
    #[error("missing scheme prefix {0:?}")]
    MissingScheme(String),

    /// No `@` between credential and host.
    #[error("missing '@' separator")]
    MissingCredentialSeparator,

    /// No `?` introducing the query string.
    #[error("missing '?' query separator")]
    MissingQuery,

    /// The host segment has no `:port`.
    #[error("missing port in {0:?}")]
    MissingPort(String),

    /// The host segment is empty.
    #[error("empty host")]
    EmptyHost,

    /// The port is not an integer in 1..=65535.
    #[error("invalid port {0:?}")]
    InvalidPort(String),

    /// The fragment could not be percent-decoded into UTF-8.
    #[error("undecodable display name: {0}")]
    InvalidDisplayName(String),
}

/// Endpoint-level validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The reality short id contains characters outside `[0-9a-fA-F]`.
    #[error("short id {sid:?} of {name:?} is not hexadecimal")]
    InvalidShortId {
        /// Display name of the rejected endpoint.
        name: String,
        /// The offending short id.
        sid: String,
    },
}

/// Batch-level conversion errors.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Nothing survived parsing and validation; no document is produced.
    #[error("no valid endpoints among {} candidate lines", .0.candidates)]
    NoValidEndpoints(ConversionStats),

    /// YAML serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, ConvertError>;

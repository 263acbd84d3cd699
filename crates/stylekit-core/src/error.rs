//! Error types for stylekit-core

use thiserror::Error;

/// Result type alias for stylekit-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stylekit-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file could not be found
    #[error("configuration file not found: {path}")]
    ConfigNotFound {
        /// Path that was searched
        path: String,
    },

    /// Failed to parse YAML configuration
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// Filename pattern uses a placeholder we cannot resolve
    #[error("invalid filename pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending template
        pattern: String,
        /// Description of the problem
        message: String,
    },

    /// A backend emitted a source map we could not parse
    #[error("invalid source map from {backend}: {message}")]
    InvalidSourceMap {
        /// Backend that produced the map
        backend: String,
        /// Parser error message
        message: String,
    },

    /// A backend was asked for a source map but returned none
    #[error("{backend} did not return a source map")]
    MissingSourceMap {
        /// Backend that should have produced the map
        backend: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Short name of the variant, used as the `kind` of fallback diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::ConfigNotFound { .. } => "ConfigNotFound",
            Error::ConfigParse(_) => "ConfigParse",
            Error::InvalidPattern { .. } => "InvalidPattern",
            Error::InvalidSourceMap { .. } => "InvalidSourceMap",
            Error::MissingSourceMap { .. } => "MissingSourceMap",
            Error::Io(_) => "IoError",
            Error::Json(_) => "JsonError",
        }
    }
}

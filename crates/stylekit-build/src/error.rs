//! Error types for the build pipeline
//!
//! These never leave [`Pipeline::build`](crate::Pipeline::build); they record
//! which stage failed until the failure is normalized into a diagnostic.

use std::fmt;

use stylekit_core::BackendError;
use thiserror::Error;

/// Result type for pipeline stages
pub type Result<T> = std::result::Result<T, Error>;

/// A failed pipeline stage
#[derive(Error, Debug)]
pub enum Error {
    /// The style compiler rejected the stylesheet
    #[error("{backend} failed: {source}")]
    Style {
        /// Style compiler name
        backend: String,
        /// Error raised by the compiler
        #[source]
        source: BackendError,
    },

    /// The transformer rejected the compiled CSS
    #[error("{backend} failed: {source}")]
    Transform {
        /// Transformer name
        backend: String,
        /// Error raised by the transformer
        #[source]
        source: BackendError,
    },

    /// Preparing inputs or assembling outputs failed
    #[error(transparent)]
    Core(#[from] stylekit_core::Error),
}

/// Pipeline stage a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The style compiler was running
    Compile,
    /// The transformer was running
    Transform,
    /// Output paths or artifacts were being prepared
    Assemble,
}

impl Stage {
    /// Lowercase stage name
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Compile => "compile",
            Stage::Transform => "transform",
            Stage::Assemble => "assemble",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// The stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            Error::Style { .. } => Stage::Compile,
            Error::Transform { .. } => Stage::Transform,
            Error::Core(_) => Stage::Assemble,
        }
    }

    /// The underlying backend-shaped error
    pub fn into_backend_error(self) -> BackendError {
        match self {
            Error::Style { source, .. } | Error::Transform { source, .. } => source,
            Error::Core(err) => err.into(),
        }
    }
}

//! stylekit Core Library
//!
//! This crate provides the shared model for stylekit:
//! - Build requests and component configuration
//! - Output filename templates
//! - Backend contracts for the style compiler and CSS transformer
//! - Source map model and path helpers
//! - Compiled artifacts and the sink they are registered with
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Request   │────▶│  Backends   │────▶│  Artifacts  │
//! │  + Config   │     │ (contracts) │     │   + Sink    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! The pipeline that ties these together lives in `stylekit-build`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod backend;
pub mod config;
pub mod error;
pub mod paths;
pub mod pattern;
pub mod request;
pub mod sourcemap;

pub use artifact::{ArtifactCollection, ArtifactSink, CompiledArtifact};
pub use backend::{
    BackendError, BackendResult, Browsers, CssTransformer, Location, StyleCompiler, StyleFailure,
    StyleOptions, StyleOutput, StyleOverrides, TraceFrame, TransformOptions, TransformOutput,
};
pub use config::CompilerConfig;
pub use error::{Error, Result};
pub use pattern::FilenamePattern;
pub use request::BuildRequest;
pub use sourcemap::SourceMap;

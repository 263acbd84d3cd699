//! stylekit Build Pipeline
//!
//! This crate compiles one stylesheet into a readable and a minified CSS
//! artifact, each with a source map, and turns backend failures into a
//! single diagnostic.
//!
//! # Pipeline Overview
//!
//! ```text
//! ┌─────────┐     ┌─────────┐     ┌──────────┐     ┌───────────┐
//! │  SCSS   │────▶│  Debug  │────▶│ Minified │────▶│ 4 outputs │
//! │ Source  │     │   CSS   │     │   CSS    │     │ + 2 maps  │
//! └─────────┘     └─────────┘     └──────────┘     └───────────┘
//!      style compiler   transformer     reconcile maps
//! ```
//!
//! The minified map points at the debug artifact and the debug map points at
//! the original sources, so tools can follow minified → debug → original.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stylekit_build::Pipeline;
//! use stylekit_core::{ArtifactCollection, BuildRequest, CompilerConfig};
//!
//! let collection = Arc::new(ArtifactCollection::new());
//! let pipeline = Pipeline::new(
//!     CompilerConfig::load("./assets")?,
//!     Arc::new(MySass),
//!     Arc::new(MyMinifier),
//!     collection.clone(),
//! );
//! let outcome = pipeline
//!     .build(&BuildRequest::new("./assets", "styles/app.scss"))
//!     .await;
//! if let Some(error) = outcome.error() {
//!     eprintln!("{error}");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod pipeline;
pub mod reconcile;
mod style;

pub use context::extract_context;
pub use diagnostics::{Diagnostic, ErrorRecord, ErrorShape, Normalizer};
pub use error::{Error, Result, Stage};
pub use pipeline::{BuildOutcome, FailedBuild, OutputPaths, Pipeline};
pub use reconcile::{reconcile_debug_map, reconcile_minified_map};

//! Dual-target build orchestration
//!
//! One build runs two stages strictly in sequence: the style compiler turns
//! the stylesheet into readable CSS, then the transformer minifies that CSS.
//! Both maps are reconciled and four artifacts come out. Any failure along
//! the way is normalized into a single diagnostic and no artifacts are
//! produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use stylekit_core::pattern::{DEBUG_EXTENSION, MINIFIED_EXTENSION, select_pattern};
use stylekit_core::{
    ArtifactSink, BuildRequest, CompiledArtifact, CompilerConfig, CssTransformer,
    FilenamePattern, StyleCompiler, StyleOptions, TransformOptions,
};

use crate::diagnostics::{Diagnostic, Normalizer};
use crate::error::{Error, Result};
use crate::reconcile::{reconcile_debug_map, reconcile_minified_map};

/// Destination-relative paths of the two CSS artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Readable CSS
    pub debug: PathBuf,
    /// Minified CSS
    pub minified: PathBuf,
}

/// A build that produced a diagnostic instead of artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedBuild {
    /// The request as it was received
    #[serde(flatten)]
    pub request: BuildRequest,

    /// What went wrong
    pub error: Diagnostic,
}

/// Result of one build: four artifacts or one failure record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Debug CSS, debug map, minified CSS, minified map
    Compiled(Vec<CompiledArtifact>),
    /// The build failed
    Failed(Box<FailedBuild>),
}

impl BuildOutcome {
    /// Number of records: 4 on success, 1 on failure
    pub fn len(&self) -> usize {
        match self {
            BuildOutcome::Compiled(artifacts) => artifacts.len(),
            BuildOutcome::Failed(_) => 1,
        }
    }

    /// Never true; a build always yields at least one record
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the build produced artifacts
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Compiled(_))
    }

    /// The artifacts, if the build succeeded
    pub fn artifacts(&self) -> Option<&[CompiledArtifact]> {
        match self {
            BuildOutcome::Compiled(artifacts) => Some(artifacts),
            BuildOutcome::Failed(_) => None,
        }
    }

    /// The diagnostic, if the build failed
    pub fn error(&self) -> Option<&Diagnostic> {
        match self {
            BuildOutcome::Compiled(_) => None,
            BuildOutcome::Failed(failed) => Some(&failed.error),
        }
    }
}

/// The dual-target stylesheet pipeline
pub struct Pipeline {
    config: CompilerConfig,
    compiler: Arc<dyn StyleCompiler>,
    transformer: Arc<dyn CssTransformer>,
    sink: Arc<dyn ArtifactSink>,
    normalizer: Normalizer,
}

impl Pipeline {
    /// Create a pipeline over the given backends, registering into `sink`
    pub fn new(
        config: CompilerConfig,
        compiler: Arc<dyn StyleCompiler>,
        transformer: Arc<dyn CssTransformer>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        let normalizer = Normalizer::new(compiler.name(), transformer.name(), config.context);
        Self {
            config,
            compiler,
            transformer,
            sink,
            normalizer,
        }
    }

    /// Component-level configuration
    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Whether `path` is a stylesheet this pipeline builds
    pub fn accepts(&self, path: &Path) -> bool {
        self.config.accepts(path)
    }

    /// Whether `path` is one of this pipeline's outputs
    pub fn is_generated(&self, path: &Path) -> bool {
        self.config.is_generated(path)
    }

    /// Resolve where the two CSS artifacts of `request` go
    pub fn output_paths(&self, request: &BuildRequest) -> stylekit_core::Result<OutputPaths> {
        let per_call = request.filename_pattern.as_deref();
        let shared = self.config.filename_pattern.as_deref();
        let debug = FilenamePattern::parse(select_pattern(
            per_call,
            self.config.debug_filename.as_deref(),
            shared,
        ))?;
        let minified = FilenamePattern::parse(select_pattern(
            per_call,
            self.config.minified_filename.as_deref(),
            shared,
        ))?;

        let dir = request.input_dir();
        let stem = request.input_stem();
        Ok(OutputPaths {
            debug: debug.resolve(&dir, &stem, DEBUG_EXTENSION),
            minified: minified.resolve(&dir, &stem, MINIFIED_EXTENSION),
        })
    }

    /// Build one stylesheet.
    ///
    /// Never fails: errors come back as [`BuildOutcome::Failed`]. On success
    /// the artifacts are registered with the sink before being returned.
    pub async fn build(&self, request: &BuildRequest) -> BuildOutcome {
        let input = request.relative_input();
        tracing::info!("Building stylesheet: {}", input.display());

        let paths = match self.output_paths(request) {
            Ok(paths) => paths,
            Err(err) => return self.fail(request, &input, err.into()),
        };

        match self.run(request, &paths).await {
            Ok(artifacts) => {
                self.sink.add(&artifacts);
                tracing::info!(
                    "✓ {} → {} ({} bytes), {} ({} bytes)",
                    input.display(),
                    paths.debug.display(),
                    artifacts[0].size(),
                    paths.minified.display(),
                    artifacts[2].size()
                );
                BuildOutcome::Compiled(artifacts)
            }
            Err(err) => self.fail(request, &paths.debug, err),
        }
    }

    /// Build several independent stylesheets concurrently.
    ///
    /// Outcomes are returned in request order.
    pub async fn build_all(&self, requests: &[BuildRequest]) -> Vec<BuildOutcome> {
        futures::future::join_all(requests.iter().map(|request| self.build(request))).await
    }

    async fn run(
        &self,
        request: &BuildRequest,
        paths: &OutputPaths,
    ) -> Result<Vec<CompiledArtifact>> {
        let overrides = request
            .compiler_options
            .as_ref()
            .or(self.config.options.as_ref());
        let options = StyleOptions::with_overrides(overrides);
        let input = request.absolute_input();

        tracing::debug!("Compiling {} with {}", input.display(), self.compiler.name());
        let compiled = self
            .compiler
            .compile(&input, &options)
            .await
            .map_err(|source| Error::Style {
                backend: self.compiler.name().to_string(),
                source,
            })?;

        let debug_filename = file_name(&paths.debug);
        let transform_options = TransformOptions {
            filename: debug_filename.clone(),
            targets: request.targets.or(self.config.targets),
            minify: true,
            source_map: true,
        };

        tracing::debug!(
            "Transforming {} bytes with {}",
            compiled.css.len(),
            self.transformer.name()
        );
        let transformed = self
            .transformer
            .transform(compiled.css.as_bytes(), &transform_options)
            .await
            .map_err(|source| Error::Transform {
                backend: self.transformer.name().to_string(),
                source,
            })?;

        let raw_map = transformed
            .map
            .ok_or_else(|| stylekit_core::Error::MissingSourceMap {
                backend: self.transformer.name().to_string(),
            })?;

        let destination = self.destination(request);
        let debug_map = reconcile_debug_map(
            compiled.source_map,
            &destination.join(&paths.debug),
            &request.source_root,
        );
        let minified_map = reconcile_minified_map(&raw_map, &debug_filename).map_err(|err| {
            stylekit_core::Error::InvalidSourceMap {
                backend: self.transformer.name().to_string(),
                message: err.to_string(),
            }
        })?;

        let debug_map_json = debug_map.to_json().map_err(stylekit_core::Error::Json)?;
        let minified_map_json = minified_map.to_json().map_err(stylekit_core::Error::Json)?;

        Ok(vec![
            artifact(&destination, paths.debug.clone(), compiled.css),
            artifact(&destination, with_map_suffix(&paths.debug), debug_map_json),
            artifact(&destination, paths.minified.clone(), transformed.code),
            artifact(&destination, with_map_suffix(&paths.minified), minified_map_json),
        ])
    }

    fn destination(&self, request: &BuildRequest) -> PathBuf {
        request
            .destination_root
            .clone()
            .or_else(|| self.config.destination.clone())
            .unwrap_or_else(|| request.source_root.clone())
    }

    fn fail(&self, request: &BuildRequest, debug_output: &Path, err: Error) -> BuildOutcome {
        let stage = err.stage();
        tracing::warn!(
            input = %request.relative_input().display(),
            stage = %stage,
            "Build failed: {}",
            err
        );
        let error = self
            .normalizer
            .normalize(&err.into_backend_error(), stage, request, debug_output);
        BuildOutcome::Failed(Box::new(FailedBuild {
            request: request.clone(),
            error,
        }))
    }
}

fn artifact(destination: &Path, relative_path: PathBuf, contents: String) -> CompiledArtifact {
    let filename = file_name(&relative_path);
    let extension = relative_path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    CompiledArtifact {
        output_path: destination.join(&relative_path),
        relative_path,
        filename,
        extension,
        contents,
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn with_map_suffix(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".map");
    PathBuf::from(name)
}

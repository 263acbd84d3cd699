//! Per-invocation build input
//!
//! The host creates one [`BuildRequest`] for every stylesheet it wants
//! compiled. Anything left unset falls back to the component-level
//! [`CompilerConfig`](crate::config::CompilerConfig).

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::backend::{Browsers, StyleOverrides};
use crate::paths::{absolutize, normalize, relative_to};

/// Everything the pipeline needs to build one stylesheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildRequest {
    /// Stylesheet to compile, absolute or relative to `source_root`
    pub input_path: PathBuf,

    /// File name of the stylesheet
    pub input_filename: String,

    /// Root all source-relative paths are expressed against
    pub source_root: PathBuf,

    /// Root the outputs are placed under
    pub destination_root: Option<PathBuf>,

    /// Per-call filename template
    pub filename_pattern: Option<String>,

    /// Per-call style compiler option overrides
    pub compiler_options: Option<StyleOverrides>,

    /// Per-call browser targets
    pub targets: Option<Browsers>,
}

impl BuildRequest {
    /// Request to build `input_path` under `source_root`
    pub fn new(source_root: impl Into<PathBuf>, input_path: impl Into<PathBuf>) -> Self {
        let input_path = input_path.into();
        let input_filename = input_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            input_path,
            input_filename,
            source_root: source_root.into(),
            destination_root: None,
            filename_pattern: None,
            compiler_options: None,
            targets: None,
        }
    }

    /// Place outputs under `destination`
    pub fn with_destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination_root = Some(destination.into());
        self
    }

    /// Use `pattern` for both artifacts
    pub fn with_filename_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.filename_pattern = Some(pattern.into());
        self
    }

    /// Override style compiler options for this call
    pub fn with_compiler_options(mut self, options: StyleOverrides) -> Self {
        self.compiler_options = Some(options);
        self
    }

    /// Override browser targets for this call
    pub fn with_targets(mut self, targets: Browsers) -> Self {
        self.targets = Some(targets);
        self
    }

    /// The input as an absolute path; a relative root is resolved against
    /// the current directory
    pub fn absolute_input(&self) -> PathBuf {
        if self.input_path.is_absolute() {
            normalize(&self.input_path)
        } else {
            absolutize(&self.source_root.join(&self.input_path))
        }
    }

    /// The input relative to the source root
    pub fn relative_input(&self) -> PathBuf {
        relative_to(&self.absolute_input(), &self.source_root)
    }

    /// Directory of the input relative to the source root, empty at the root
    pub fn input_dir(&self) -> PathBuf {
        self.relative_input()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// File name of the input with its extension removed
    pub fn input_stem(&self) -> String {
        Path::new(&self.input_filename)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_input() {
        let request = BuildRequest::new("/project/src", "styles/app.scss");
        assert_eq!(request.input_filename, "app.scss");
        assert_eq!(
            request.absolute_input(),
            PathBuf::from("/project/src/styles/app.scss")
        );
        assert_eq!(request.input_dir(), PathBuf::from("styles"));
        assert_eq!(request.input_stem(), "app");
    }

    #[test]
    fn test_absolute_input_under_root() {
        let request = BuildRequest::new("/project/src", "/project/src/theme/dark.sass");
        assert_eq!(request.relative_input(), PathBuf::from("theme/dark.sass"));
        assert_eq!(request.input_stem(), "dark");
    }

    #[test]
    fn test_relative_root() {
        let request = BuildRequest::new("./assets", "styles/app.scss");
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(request.absolute_input(), cwd.join("assets/styles/app.scss"));
        assert_eq!(request.relative_input(), PathBuf::from("styles/app.scss"));
        assert_eq!(request.input_dir(), PathBuf::from("styles"));
    }

    #[test]
    fn test_input_at_root_has_empty_dir() {
        let request = BuildRequest::new("/project/src", "main.scss");
        assert_eq!(request.input_dir(), PathBuf::new());
    }
}

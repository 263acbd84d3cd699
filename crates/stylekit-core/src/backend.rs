//! Backend contracts
//!
//! The pipeline drives two black boxes: a style-language compiler that turns
//! a stylesheet into CSS plus a source map, and a CSS transformer that
//! minifies that CSS. Both are injected as trait objects so hosts can plug in
//! whatever implementation they ship, and tests can substitute fixtures.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::sourcemap::SourceMap;

/// Result type returned by backends
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Trait for style-language compilers (stage one)
#[async_trait]
pub trait StyleCompiler: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str {
        "sass"
    }

    /// Compile the stylesheet at `path` to CSS
    async fn compile(&self, path: &Path, options: &StyleOptions) -> BackendResult<StyleOutput>;
}

/// Trait for CSS transformers (stage two)
#[async_trait]
pub trait CssTransformer: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str {
        "lightningcss"
    }

    /// Transform already-compiled CSS
    async fn transform(
        &self,
        code: &[u8],
        options: &TransformOptions,
    ) -> BackendResult<TransformOutput>;
}

/// Successful style compilation
#[derive(Debug, Clone)]
pub struct StyleOutput {
    /// Compiled, readable CSS
    pub css: String,

    /// Map from `css` back to the stylesheet sources
    pub source_map: SourceMap,
}

/// Successful transformation
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Minified CSS
    pub code: String,

    /// Source map as JSON text, if one was produced
    pub map: Option<String>,
}

// ============================================================================
// Options
// ============================================================================

/// Output style of the style compiler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Readable output
    #[default]
    Expanded,
    /// Whitespace-stripped output
    Compressed,
}

/// Options handed to [`StyleCompiler::compile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleOptions {
    /// Emit a source map
    pub source_map: bool,

    /// Embed source text in the map's `sourcesContent`
    pub include_sources: bool,

    /// Silence warnings coming from dependencies
    pub quiet_deps: bool,

    /// Extra directories searched for imports
    pub load_paths: Vec<PathBuf>,

    /// Output style
    pub style: OutputStyle,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            source_map: true,
            include_sources: true,
            quiet_deps: true,
            load_paths: Vec::new(),
            style: OutputStyle::Expanded,
        }
    }
}

impl StyleOptions {
    /// Defaults with any set override fields applied on top
    pub fn with_overrides(overrides: Option<&StyleOverrides>) -> Self {
        let mut options = Self::default();
        let Some(overrides) = overrides else {
            return options;
        };

        if let Some(source_map) = overrides.source_map {
            options.source_map = source_map;
        }
        if let Some(include_sources) = overrides.include_sources {
            options.include_sources = include_sources;
        }
        if let Some(quiet_deps) = overrides.quiet_deps {
            options.quiet_deps = quiet_deps;
        }
        if let Some(load_paths) = &overrides.load_paths {
            options.load_paths = load_paths.clone();
        }
        if let Some(style) = overrides.style {
            options.style = style;
        }
        options
    }
}

/// Caller-supplied adjustments to [`StyleOptions`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleOverrides {
    /// Override `source_map`
    pub source_map: Option<bool>,
    /// Override `include_sources`
    pub include_sources: Option<bool>,
    /// Override `quiet_deps`
    pub quiet_deps: Option<bool>,
    /// Override `load_paths`
    pub load_paths: Option<Vec<PathBuf>>,
    /// Override `style`
    pub style: Option<OutputStyle>,
}

/// Options handed to [`CssTransformer::transform`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Name of the CSS being transformed, used in the emitted map
    pub filename: String,

    /// Browser targets for syntax lowering and prefixing
    pub targets: Option<Browsers>,

    /// Minify the output
    pub minify: bool,

    /// Emit a source map
    pub source_map: bool,
}

/// Minimum browser versions to support.
///
/// Versions are packed as `major << 16 | minor << 8 | patch`, the encoding
/// CSS transformers commonly accept. In configuration they can be written as
/// a bare major number (`chrome: 110`) or a dotted string (`safari: "16.4"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Browsers {
    /// Android browser
    pub android: Option<BrowserVersion>,
    /// Chrome
    pub chrome: Option<BrowserVersion>,
    /// Edge
    pub edge: Option<BrowserVersion>,
    /// Firefox
    pub firefox: Option<BrowserVersion>,
    /// Internet Explorer
    pub ie: Option<BrowserVersion>,
    /// Safari on iOS
    pub ios_saf: Option<BrowserVersion>,
    /// Opera
    pub opera: Option<BrowserVersion>,
    /// Safari
    pub safari: Option<BrowserVersion>,
    /// Samsung Internet
    pub samsung: Option<BrowserVersion>,
}

/// A packed browser version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "VersionSpec", into = "String")]
pub struct BrowserVersion(u32);

impl BrowserVersion {
    /// Pack a version triple
    pub fn new(major: u8, minor: u8, patch: u8) -> Self {
        Self((u32::from(major) << 16) | (u32::from(minor) << 8) | u32::from(patch))
    }

    /// The packed representation
    pub fn packed(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BrowserVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let major = (self.0 >> 16) & 0xff;
        let minor = (self.0 >> 8) & 0xff;
        let patch = self.0 & 0xff;
        if patch > 0 {
            write!(f, "{}.{}.{}", major, minor, patch)
        } else if minor > 0 {
            write!(f, "{}.{}", major, minor)
        } else {
            write!(f, "{}", major)
        }
    }
}

impl From<BrowserVersion> for String {
    fn from(version: BrowserVersion) -> Self {
        version.to_string()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VersionSpec {
    Major(u8),
    Dotted(String),
}

impl TryFrom<VersionSpec> for BrowserVersion {
    type Error = String;

    fn try_from(spec: VersionSpec) -> Result<Self, Self::Error> {
        match spec {
            VersionSpec::Major(major) => Ok(Self::new(major, 0, 0)),
            VersionSpec::Dotted(text) => {
                let mut parts = [0u8; 3];
                let segments: Vec<&str> = text.trim().split('.').collect();
                if segments.is_empty() || segments.len() > 3 {
                    return Err(format!("invalid browser version '{}'", text));
                }
                for (slot, segment) in parts.iter_mut().zip(&segments) {
                    *slot = segment
                        .parse()
                        .map_err(|_| format!("invalid browser version '{}'", text))?;
                }
                Ok(Self::new(parts[0], parts[1], parts[2]))
            }
        }
    }
}

// ============================================================================
// Failures
// ============================================================================

/// A 1-based position reported by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Line, starting at 1
    pub line: u32,
    /// Column, starting at 1
    pub column: u32,
}

impl Location {
    /// Create a location
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// One step of a style compiler's import/call chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    /// URI-style path of the file
    pub file: String,
    /// Line, starting at 1
    pub line: u32,
    /// Column, starting at 1
    pub column: u32,
}

impl TraceFrame {
    /// Create a frame
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

// `path line:column  member`, as printed by sass-family compilers
static STACK_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\S.*?)\s+(\d+):(\d+)(?:\s.*)?$").expect("stack line pattern is valid")
});

/// Payload that only style compilers attach to their errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleFailure {
    /// The compiler's own message, without location decoration
    pub message: Option<String>,

    /// Import/call chain, innermost frame first
    pub trace: Option<Vec<TraceFrame>>,
}

impl StyleFailure {
    /// Failure with a message and no trace
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            trace: None,
        }
    }

    /// Attach a trace
    pub fn with_trace(mut self, trace: Vec<TraceFrame>) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Build a failure from a textual stack trace.
    ///
    /// Lines that do not look like `path line:column` are skipped. A stack
    /// with no recognizable frames leaves `trace` unset.
    pub fn from_stack_text(message: impl Into<String>, stack: &str) -> Self {
        let frames: Vec<TraceFrame> = stack
            .lines()
            .filter_map(|line| {
                let caps = STACK_LINE.captures(line)?;
                Some(TraceFrame {
                    file: caps[1].to_string(),
                    line: caps[2].parse().ok()?,
                    column: caps[3].parse().ok()?,
                })
            })
            .collect();

        Self {
            message: Some(message.into()),
            trace: (!frames.is_empty()).then_some(frames),
        }
    }
}

/// Error raised by a backend.
///
/// Backends fill whichever fields they know about; the normalizer in the
/// build crate decides what kind of failure it is from which fields are set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendError {
    /// Human-readable message
    pub message: String,

    /// Error type name, e.g. `SyntaxError`
    pub kind: Option<String>,

    /// Style-compiler payload
    pub style: Option<StyleFailure>,

    /// Source text the backend was processing when it failed
    pub source: Option<String>,

    /// Where in `source` the failure happened
    pub location: Option<Location>,

    /// Location of an underlying cause
    pub cause: Option<Location>,

    /// File the backend blames
    pub file_name: Option<String>,

    /// Backend-specific backtrace
    pub backtrace: Option<String>,
}

impl BackendError {
    /// Error carrying only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Set the error type name
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Attach the style-compiler payload
    pub fn with_style(mut self, style: StyleFailure) -> Self {
        self.style = Some(style);
        self
    }

    /// Attach the source text being processed
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the failure location
    pub fn at(mut self, line: u32, column: u32) -> Self {
        self.location = Some(Location::new(line, column));
        self
    }

    /// Set the location of the underlying cause
    pub fn with_cause(mut self, cause: Location) -> Self {
        self.cause = Some(cause);
        self
    }

    /// Set the blamed file
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Attach a backtrace
    pub fn with_backtrace(mut self, backtrace: impl Into<String>) -> Self {
        self.backtrace = Some(backtrace.into());
        self
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Some(kind) => write!(f, "{}: {}", kind, self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<crate::error::Error> for BackendError {
    fn from(err: crate::error::Error) -> Self {
        Self::new(err.to_string()).with_kind(err.kind())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string()).with_kind("IoError")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_options_defaults() {
        let opts = StyleOptions::default();
        assert!(opts.source_map);
        assert!(opts.include_sources);
        assert!(opts.quiet_deps);
        assert_eq!(opts.style, OutputStyle::Expanded);
    }

    #[test]
    fn test_overrides_win() {
        let overrides = StyleOverrides {
            quiet_deps: Some(false),
            style: Some(OutputStyle::Compressed),
            ..Default::default()
        };
        let opts = StyleOptions::with_overrides(Some(&overrides));
        assert!(!opts.quiet_deps);
        assert!(opts.source_map);
        assert_eq!(opts.style, OutputStyle::Compressed);
    }

    #[test]
    fn test_parse_stack_text() {
        let stack = "styles/_buttons.scss 4:12  @use\nstyles/app.scss 1:1       root stylesheet\n";
        let failure = StyleFailure::from_stack_text("Undefined variable.", stack);
        let trace = failure.trace.unwrap();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0], TraceFrame::new("styles/_buttons.scss", 4, 12));
        assert_eq!(trace[1], TraceFrame::new("styles/app.scss", 1, 1));
    }

    #[test]
    fn test_parse_stack_text_without_frames() {
        let failure = StyleFailure::from_stack_text("boom", "no frames here");
        assert!(failure.trace.is_none());
        assert_eq!(failure.message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_browser_versions_from_yaml() {
        let yaml = "chrome: 110\nsafari: \"16.4\"\n";
        let browsers: Browsers = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(browsers.chrome, Some(BrowserVersion::new(110, 0, 0)));
        assert_eq!(browsers.safari.unwrap().packed(), (16 << 16) | (4 << 8));
        assert_eq!(browsers.safari.unwrap().to_string(), "16.4");
        assert!(browsers.firefox.is_none());
    }

    #[test]
    fn test_backend_error_display() {
        let err = BackendError::new("Unexpected token").with_kind("SyntaxError");
        assert_eq!(err.to_string(), "SyntaxError: Unexpected token");
    }
}

//! Error normalization
//!
//! The two backends fail in unrelated ways. A style compiler reports the
//! import chain that led to the failure; a transformer reports a single
//! position inside the CSS it was handed. [`Normalizer`] turns either into
//! one [`Diagnostic`]: a formatted terminal report when the shape is
//! recognized, a structured [`ErrorRecord`] otherwise.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use stylekit_core::config::ContextConfig;
use stylekit_core::paths::{absolutize, relative_to, to_slash, uri_to_path};
use stylekit_core::{BackendError, BuildRequest, Location, TraceFrame};

use crate::context::extract_context;
use crate::error::Stage;
use crate::style::{BOLD, CYAN, DIM, RED, RESET, strip_ansi};

/// Joins the lines of a formatted diagnostic
const SEPARATOR: &str = "\n\x1b[0m";

/// Kind reported for transformer errors that do not name one
const DEFAULT_TRANSFORM_KIND: &str = "SyntaxError";

/// What a [`BackendError`] turned out to be, decided by which fields are set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorShape<'a> {
    /// Style-compiler failure with an optional import/call chain
    Style {
        /// The compiler's message
        message: &'a str,
        /// Innermost frame first
        trace: Option<&'a [TraceFrame]>,
    },

    /// Transformer failure inside the CSS it was given
    Transform {
        /// Error type name
        kind: &'a str,
        /// Error message
        message: &'a str,
        /// CSS the transformer was processing
        source: &'a str,
        /// Failure position in `source`
        location: Location,
    },

    /// Anything else
    Unrecognized,
}

impl<'a> ErrorShape<'a> {
    /// Classify an error. The style-compiler payload takes precedence over
    /// an embedded source, which takes precedence over nothing at all.
    pub fn classify(error: &'a BackendError) -> Self {
        if let Some(style) = &error.style {
            return ErrorShape::Style {
                message: style.message.as_deref().unwrap_or(&error.message),
                trace: style.trace.as_deref(),
            };
        }

        if let (Some(source), Some(location)) = (&error.source, error.location) {
            if location.line > 0 {
                return ErrorShape::Transform {
                    kind: error.kind.as_deref().unwrap_or(DEFAULT_TRANSFORM_KIND),
                    message: &error.message,
                    source,
                    location,
                };
            }
        }

        ErrorShape::Unrecognized
    }
}

/// Structured fallback for errors we cannot format
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// Error type name
    #[serde(rename = "type")]
    pub kind: String,
    /// Line, if the error carried one
    pub line: Option<u32>,
    /// Column, if the error carried one
    pub column: Option<u32>,
    /// Blamed file relative to the source root, as `./path`
    pub path: Option<String>,
    /// Error message
    pub message: String,
    /// Backend backtrace
    pub trace: Option<String>,
}

/// The single diagnostic attached to a failed build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Diagnostic {
    /// Multi-line report with terminal styling
    Formatted(String),
    /// Fallback record
    Structured(ErrorRecord),
}

impl Diagnostic {
    /// The formatted report, if this is one
    pub fn as_formatted(&self) -> Option<&str> {
        match self {
            Diagnostic::Formatted(text) => Some(text),
            Diagnostic::Structured(_) => None,
        }
    }

    /// The fallback record, if this is one
    pub fn as_record(&self) -> Option<&ErrorRecord> {
        match self {
            Diagnostic::Formatted(_) => None,
            Diagnostic::Structured(record) => Some(record),
        }
    }

    /// Display text with terminal styling removed
    pub fn plain_text(&self) -> String {
        strip_ansi(&self.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Formatted(text) => f.write_str(text),
            Diagnostic::Structured(record) => {
                write!(f, "{}: {}", record.kind, record.message)?;
                if let Some(path) = &record.path {
                    write!(f, " ({}", path)?;
                    if let (Some(line), Some(column)) = (record.line, record.column) {
                        write!(f, "[{}:{}]", line, column)?;
                    }
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

/// Turns backend errors into diagnostics
#[derive(Debug, Clone)]
pub struct Normalizer {
    style_backend: String,
    transform_backend: String,
    window: ContextConfig,
}

impl Normalizer {
    /// Create a normalizer naming the two backends in its reports
    pub fn new(
        style_backend: impl Into<String>,
        transform_backend: impl Into<String>,
        window: ContextConfig,
    ) -> Self {
        Self {
            style_backend: style_backend.into(),
            transform_backend: transform_backend.into(),
            window,
        }
    }

    /// Normalize `error` raised during `stage` while building `request`.
    ///
    /// `debug_output` is the destination-relative path of the debug artifact;
    /// positions reported by the transformer refer to that file. Positions
    /// reported during compilation refer to the input itself.
    pub fn normalize(
        &self,
        error: &BackendError,
        stage: Stage,
        request: &BuildRequest,
        debug_output: &Path,
    ) -> Diagnostic {
        let lines = match ErrorShape::classify(error) {
            ErrorShape::Style { message, trace } => {
                let backend = self.backend_for(stage, &self.style_backend);
                let mut lines = vec![self.header(request, backend)];
                lines.extend(self.render_style(backend, message, trace, &request.source_root));
                lines
            }
            ErrorShape::Transform {
                kind,
                message,
                source,
                location,
            } => {
                let backend = self.backend_for(stage, &self.transform_backend);
                let located_in = match stage {
                    Stage::Compile => request.relative_input(),
                    Stage::Transform | Stage::Assemble => debug_output.to_path_buf(),
                };
                let mut lines = vec![self.header(request, backend)];
                lines.extend(self.render_transform(
                    backend,
                    kind,
                    message,
                    source,
                    location,
                    &located_in,
                ));
                lines
            }
            ErrorShape::Unrecognized => Vec::new(),
        };

        if lines.len() >= 2 {
            Diagnostic::Formatted(lines.join(SEPARATOR))
        } else {
            Diagnostic::Structured(fallback_record(error, request))
        }
    }

    /// The backend that was running during `stage`
    fn backend_for<'a>(&'a self, stage: Stage, fallback: &'a str) -> &'a str {
        match stage {
            Stage::Compile => &self.style_backend,
            Stage::Transform => &self.transform_backend,
            Stage::Assemble => fallback,
        }
    }

    fn header(&self, request: &BuildRequest, backend: &str) -> String {
        format!(
            "{BOLD}{RED}✖ {}{RESET} {DIM}({}){RESET}",
            to_slash(&request.relative_input()),
            backend
        )
    }

    fn render_style(
        &self,
        backend: &str,
        message: &str,
        trace: Option<&[TraceFrame]>,
        source_root: &Path,
    ) -> Vec<String> {
        let mut lines = vec![format!("{BOLD}{}:{RESET} {}", backend, message)];

        let Some((first, callers)) = trace.and_then(<[TraceFrame]>::split_first) else {
            return lines;
        };

        let (absolute, relative) = resolve_frame(first, source_root);
        lines.push(format!(
            "{CYAN}{}[{}:{}]{RESET}",
            relative, first.line, first.column
        ));

        // Secondary failure: the traced file may have moved since the compiler saw it.
        match std::fs::read_to_string(&absolute) {
            Ok(source) => lines.extend(extract_context(
                &source,
                first.line as usize,
                first.column as usize,
                self.window,
            )),
            Err(err) => {
                tracing::debug!(path = %absolute.display(), "Traced source unavailable: {}", err);
                lines.push(format!("{DIM}(source unavailable: {}){RESET}", err));
            }
        }

        for frame in callers {
            let (_, relative) = resolve_frame(frame, source_root);
            lines.push(format!(
                "{DIM}↳ {}[{}:{}]{RESET}",
                relative, frame.line, frame.column
            ));
        }

        lines
    }

    fn render_transform(
        &self,
        backend: &str,
        kind: &str,
        message: &str,
        source: &str,
        location: Location,
        located_in: &Path,
    ) -> Vec<String> {
        let mut lines = vec![format!(
            "{BOLD}{}:{RESET} {}: {}, {CYAN}{}[{}:{}]{RESET}",
            backend,
            kind,
            message,
            to_slash(located_in),
            location.line,
            location.column
        )];
        lines.extend(extract_context(
            source,
            location.line as usize,
            location.column as usize,
            self.window,
        ));
        lines
    }
}

/// Absolute path to read and source-root-relative path to display
fn resolve_frame(frame: &TraceFrame, source_root: &Path) -> (PathBuf, String) {
    let path = uri_to_path(&frame.file);
    let absolute = if path.is_absolute() {
        path
    } else {
        absolutize(&source_root.join(path))
    };
    let relative = to_slash(&relative_to(&absolute, source_root));
    (absolute, relative)
}

fn fallback_record(error: &BackendError, request: &BuildRequest) -> ErrorRecord {
    let position = error.location.or(error.cause);
    let path = error.file_name.as_deref().map(|file| {
        let path = uri_to_path(file);
        let relative = if path.is_absolute() {
            relative_to(&path, &request.source_root)
        } else {
            path
        };
        let relative = to_slash(&relative);
        if relative.starts_with("..") {
            relative
        } else {
            format!("./{}", relative)
        }
    });

    ErrorRecord {
        kind: error.kind.clone().unwrap_or_else(|| "Error".to_string()),
        line: position.map(|p| p.line),
        column: position.map(|p| p.column),
        path,
        message: error.message.clone(),
        trace: error.backtrace.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stylekit_core::StyleFailure;

    fn normalizer() -> Normalizer {
        Normalizer::new("sass", "lightningcss", ContextConfig::default())
    }

    fn request(root: &Path) -> BuildRequest {
        BuildRequest::new(root, "styles/app.scss")
    }

    #[test]
    fn test_classify_prefers_style_payload() {
        let error = BackendError::new("generic")
            .with_style(StyleFailure::new("specific"))
            .with_source("a{}")
            .at(1, 1);
        assert!(matches!(
            ErrorShape::classify(&error),
            ErrorShape::Style {
                message: "specific",
                trace: None
            }
        ));
    }

    #[test]
    fn test_classify_style_falls_back_to_generic_message() {
        let error = BackendError::new("generic").with_style(StyleFailure::default());
        assert!(matches!(
            ErrorShape::classify(&error),
            ErrorShape::Style {
                message: "generic",
                ..
            }
        ));
    }

    #[test]
    fn test_classify_transform_needs_line() {
        let error = BackendError::new("bad").with_source("a{}").at(0, 3);
        assert_eq!(ErrorShape::classify(&error), ErrorShape::Unrecognized);

        let error = BackendError::new("bad").with_source("a{}").at(1, 3);
        assert!(matches!(
            ErrorShape::classify(&error),
            ErrorShape::Transform {
                kind: "SyntaxError",
                ..
            }
        ));
    }

    #[test]
    fn test_style_error_with_trace() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("styles")).unwrap();
        std::fs::write(
            root.path().join("styles/_colors.scss"),
            "$primary: blue;\n.btn { color: $primray; }\n",
        )
        .unwrap();

        let colors = root.path().join("styles/_colors.scss");
        let app = root.path().join("styles/app.scss");
        let error = BackendError::new("Undefined variable.").with_style(
            StyleFailure::new("Undefined variable.").with_trace(vec![
                TraceFrame::new(format!("file://{}", colors.display()), 2, 15),
                TraceFrame::new(app.display().to_string(), 1, 1),
            ]),
        );

        let diagnostic = normalizer().normalize(
            &error,
            Stage::Compile,
            &request(root.path()),
            Path::new("styles/app.debug.css"),
        );
        let text = diagnostic.as_formatted().expect("formatted diagnostic");
        assert!(text.contains(SEPARATOR));

        let plain = diagnostic.plain_text();
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(lines[0], "✖ styles/app.scss (sass)");
        assert_eq!(lines[1], "sass: Undefined variable.");
        assert_eq!(lines[2], "styles/_colors.scss[2:15]");
        assert_eq!(lines[3], "1: $primary: blue;");
        assert_eq!(lines[4], "2: .btn { color: $primray; }");
        assert_eq!(lines[5], "↳ styles/app.scss[1:1]");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_style_error_without_trace() {
        let root = tempfile::tempdir().unwrap();
        let error = BackendError::new("boom").with_style(StyleFailure::new("boom"));
        let diagnostic = normalizer().normalize(
            &error,
            Stage::Compile,
            &request(root.path()),
            Path::new("styles/app.debug.css"),
        );

        let plain = diagnostic.plain_text();
        assert_eq!(plain.lines().count(), 2);
        assert!(plain.ends_with("sass: boom"));
    }

    #[test]
    fn test_style_error_missing_traced_file_degrades() {
        let root = tempfile::tempdir().unwrap();
        let error = BackendError::new("Can't find stylesheet to import.").with_style(
            StyleFailure::new("Can't find stylesheet to import.")
                .with_trace(vec![TraceFrame::new("styles/gone.scss", 3, 1)]),
        );

        let diagnostic = normalizer().normalize(
            &error,
            Stage::Compile,
            &request(root.path()),
            Path::new("styles/app.debug.css"),
        );
        let plain = diagnostic.plain_text();
        assert!(plain.contains("styles/gone.scss[3:1]"));
        assert!(plain.contains("source unavailable"));
    }

    #[test]
    fn test_transform_error_uses_embedded_source() {
        let root = tempfile::tempdir().unwrap();
        let error = BackendError::new("Unexpected token Semicolon")
            .with_source(".a {\n  color: red;;\n}\n")
            .at(2, 13);

        let diagnostic = normalizer().normalize(
            &error,
            Stage::Transform,
            &request(root.path()),
            Path::new("styles/app.debug.css"),
        );
        let plain = diagnostic.plain_text();
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(lines[0], "✖ styles/app.scss (lightningcss)");
        assert_eq!(
            lines[1],
            "lightningcss: SyntaxError: Unexpected token Semicolon, styles/app.debug.css[2:13]"
        );
        assert_eq!(lines[2], "1: .a {");
        assert_eq!(lines[3], "2:   color: red;;");
        assert_eq!(lines[4], "3: }");
    }

    #[test]
    fn test_unrecognized_error_falls_back_to_record() {
        let root = Path::new("/project/src");
        let error = BackendError::new("disk on fire")
            .with_kind("IoError")
            .with_cause(Location::new(4, 2))
            .with_file_name("/project/src/styles/app.scss")
            .with_backtrace("at read()");

        let diagnostic = normalizer().normalize(
            &error,
            Stage::Assemble,
            &request(root),
            Path::new("x"),
        );
        let record = diagnostic.as_record().expect("structured diagnostic");
        assert_eq!(record.kind, "IoError");
        assert_eq!(record.line, Some(4));
        assert_eq!(record.column, Some(2));
        assert_eq!(record.path.as_deref(), Some("./styles/app.scss"));
        assert_eq!(record.trace.as_deref(), Some("at read()"));
        assert_eq!(
            diagnostic.to_string(),
            "IoError: disk on fire (./styles/app.scss[4:2])"
        );
    }

    #[test]
    fn test_unrecognized_error_defaults() {
        let error = BackendError::new("???");
        let diagnostic = normalizer().normalize(
            &error,
            Stage::Assemble,
            &request(Path::new("/src")),
            Path::new("x"),
        );
        let record = diagnostic.as_record().unwrap();
        assert_eq!(record.kind, "Error");
        assert!(record.line.is_none());
        assert!(record.column.is_none());
        assert!(record.path.is_none());

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["type"], "Error");
        assert!(json["line"].is_null());
    }

    #[test]
    fn test_compile_stage_error_with_embedded_source() {
        let root = tempfile::tempdir().unwrap();
        let error = BackendError::new("expected \"{\".")
            .with_source(".a\n  color: red;\n")
            .at(1, 2);

        let diagnostic = normalizer().normalize(
            &error,
            Stage::Compile,
            &request(root.path()),
            Path::new("styles/app.debug.css"),
        );
        let plain = diagnostic.plain_text();
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(lines[0], "✖ styles/app.scss (sass)");
        assert_eq!(lines[1], "sass: SyntaxError: expected \"{\"., styles/app.scss[1:2]");
        assert_eq!(lines[2], "1: .a");
        assert!(!plain.contains("lightningcss"));
        assert!(!plain.contains("app.debug.css"));
    }

    #[test]
    fn test_style_error_relative_source_root() {
        let cwd = std::env::current_dir().unwrap();
        let frame = TraceFrame::new(
            format!("file://{}", cwd.join("assets/styles/_x.scss").display()),
            1,
            1,
        );
        let error =
            BackendError::new("boom").with_style(StyleFailure::new("boom").with_trace(vec![frame]));

        let request = BuildRequest::new("./assets", "styles/app.scss");
        let diagnostic = normalizer().normalize(
            &error,
            Stage::Compile,
            &request,
            Path::new("styles/app.debug.css"),
        );
        let plain = diagnostic.plain_text();
        let lines: Vec<&str> = plain.lines().collect();
        assert_eq!(lines[0], "✖ styles/app.scss (sass)");
        assert_eq!(lines[2], "styles/_x.scss[1:1]");
    }
}

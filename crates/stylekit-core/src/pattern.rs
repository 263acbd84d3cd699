//! Output filename templates
//!
//! A pattern such as `[path]/[name].[ext]` decides where each artifact lands
//! relative to the destination root. `[path]` is the input's directory
//! relative to the source root, `[name]` is its stem and `[ext]` is the
//! artifact's fixed extension without the leading dot.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{Error, Result};
use crate::paths::to_slash;

/// Built-in template used when nothing else is configured
pub const DEFAULT_FILENAME_PATTERN: &str = "[path]/[name].[ext]";

/// Extension of the readable artifact
pub const DEBUG_EXTENSION: &str = "debug.css";

/// Extension of the minified artifact
pub const MINIFIED_EXTENSION: &str = "min.css";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]]*)\]").expect("placeholder pattern is valid"));

/// A validated filename template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenamePattern {
    template: String,
}

impl FilenamePattern {
    /// Parse a template, rejecting empty templates and unknown placeholders
    pub fn parse(template: &str) -> Result<Self> {
        if template.trim().is_empty() {
            return Err(Error::InvalidPattern {
                pattern: template.to_string(),
                message: "pattern is empty".to_string(),
            });
        }

        for caps in PLACEHOLDER.captures_iter(template) {
            let name = &caps[1];
            if !matches!(name, "path" | "name" | "ext") {
                return Err(Error::InvalidPattern {
                    pattern: template.to_string(),
                    message: format!(
                        "unknown placeholder '[{}]', expected [path], [name] or [ext]",
                        name
                    ),
                });
            }
        }

        Ok(Self {
            template: template.to_string(),
        })
    }

    /// The raw template text
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Substitute the placeholders and return a destination-relative path.
    ///
    /// Empty and `.` segments are dropped, so an input sitting directly in
    /// the source root does not produce a leading `/`.
    pub fn resolve(&self, dir: &Path, name: &str, ext: &str) -> PathBuf {
        let dir = to_slash(dir);
        let rendered = PLACEHOLDER.replace_all(&self.template, |caps: &Captures<'_>| {
            match &caps[1] {
                "path" => dir.clone(),
                "name" => name.to_string(),
                "ext" => ext.to_string(),
                _ => caps[0].to_string(),
            }
        });

        rendered
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .collect()
    }
}

impl Default for FilenamePattern {
    fn default() -> Self {
        Self {
            template: DEFAULT_FILENAME_PATTERN.to_string(),
        }
    }
}

/// Pick the template for one artifact kind.
///
/// Precedence, highest first: the per-call pattern on the request, the
/// artifact-specific component default, the shared component default, then
/// [`DEFAULT_FILENAME_PATTERN`].
pub fn select_pattern<'a>(
    per_call: Option<&'a str>,
    artifact_default: Option<&'a str>,
    shared_default: Option<&'a str>,
) -> &'a str {
    per_call
        .or(artifact_default)
        .or(shared_default)
        .unwrap_or(DEFAULT_FILENAME_PATTERN)
}

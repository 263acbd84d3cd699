//! Configuration parsing and validation
//!
//! Component-level defaults for the pipeline, loaded from `stylekit.yaml`.
//! Every field is optional; a request can override the pattern, the
//! compiler options and the targets per call.
//!
//! # Example
//!
//! ```yaml
//! filename_pattern: "[path]/[name].[ext]"
//! minified_filename: "min/[path]/[name].[ext]"
//! destination: dist
//! options:
//!   quiet_deps: false
//!   load_paths: [node_modules]
//! targets:
//!   chrome: 110
//!   safari: "16.4"
//! context:
//!   before: 2
//!   after: 1
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::backend::{Browsers, StyleOverrides};
use crate::error::{Error, Result};
use crate::pattern::FilenamePattern;

/// File name looked up when [`CompilerConfig::load`] is given a directory
pub const CONFIG_FILE: &str = "stylekit.yaml";

/// Component-level pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Template shared by both artifacts
    #[serde(default)]
    pub filename_pattern: Option<String>,

    /// Template for the debug artifact only
    #[serde(default)]
    pub debug_filename: Option<String>,

    /// Template for the minified artifact only
    #[serde(default)]
    pub minified_filename: Option<String>,

    /// Default destination root
    #[serde(default)]
    pub destination: Option<PathBuf>,

    /// Default style compiler option overrides
    #[serde(default)]
    pub options: Option<StyleOverrides>,

    /// Default browser targets
    #[serde(default)]
    pub targets: Option<Browsers>,

    /// Globs (matched on file names) of stylesheets this component builds
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Globs of files this component generates
    #[serde(default = "default_clean")]
    pub clean: Vec<String>,

    /// Source excerpt size in diagnostics
    #[serde(default)]
    pub context: ContextConfig,
}

fn default_include() -> Vec<String> {
    vec!["*.scss".to_string(), "*.sass".to_string()]
}

fn default_clean() -> Vec<String> {
    vec!["*.debug.css".to_string(), "*.min.css".to_string()]
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            filename_pattern: None,
            debug_filename: None,
            minified_filename: None,
            destination: None,
            options: None,
            targets: None,
            include: default_include(),
            clean: default_clean(),
            context: ContextConfig::default(),
        }
    }
}

/// Lines of source shown around a diagnostic location
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Lines before the failing line
    #[serde(default = "default_context_lines")]
    pub before: usize,

    /// Lines after the failing line
    #[serde(default = "default_context_lines")]
    pub after: usize,
}

fn default_context_lines() -> usize {
    1
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            before: default_context_lines(),
            after: default_context_lines(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration from a directory or a YAML file
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let config = CompilerConfig::load("./assets")?;
    /// println!("destination: {:?}", config.destination);
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_path = if path.is_dir() {
            path.join(CONFIG_FILE)
        } else {
            path.to_path_buf()
        };

        if !config_path.exists() {
            return Err(Error::ConfigNotFound {
                path: config_path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(&config_path)?;
        let config = Self::from_yaml(&contents)?;
        tracing::debug!(path = %config_path.display(), "Loaded compiler configuration");
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every configured filename template
    pub fn validate(&self) -> Result<()> {
        for pattern in [
            &self.filename_pattern,
            &self.debug_filename,
            &self.minified_filename,
        ]
        .into_iter()
        .flatten()
        {
            FilenamePattern::parse(pattern)?;
        }
        Ok(())
    }

    /// Whether `path` is a stylesheet this component builds
    pub fn accepts(&self, path: &Path) -> bool {
        !self.is_generated(path) && matches_any(&self.include, path)
    }

    /// Whether `path` looks like one of our own outputs
    pub fn is_generated(&self, path: &Path) -> bool {
        matches_any(&self.clean, path)
    }
}

fn matches_any(globs: &[String], path: &Path) -> bool {
    let Some(name) = path.file_name().map(|n| n.to_string_lossy()) else {
        return false;
    };
    globs.iter().any(|glob| glob_matches(glob, &name))
}

fn glob_matches(glob: &str, name: &str) -> bool {
    let mut pattern = String::from("^");
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str("[^/]*"),
            '?' => pattern.push_str("[^/]"),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');

    regex::Regex::new(&pattern).is_ok_and(|re| re.is_match(name))
}

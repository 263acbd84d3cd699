//! Source map model
//!
//! Revision 3 source maps as emitted by both backends. Only the source
//! identity fields are modelled explicitly; anything else a backend emits
//! (`x_google_ignoreList`, vendor extensions) is carried in `extra` so it
//! survives a parse/serialize cycle untouched.

use serde::{Deserialize, Serialize};

/// A JSON source map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Format version, always 3 in practice
    pub version: u32,

    /// Generated file the map describes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Prefix applied to every entry in `sources`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Original sources, in mapping index order
    #[serde(default)]
    pub sources: Vec<String>,

    /// Inline contents of `sources`, index-aligned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,

    /// Symbol names referenced by `mappings`
    #[serde(default)]
    pub names: Vec<String>,

    /// VLQ-encoded segment data
    pub mappings: String,

    /// Fields we do not interpret
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SourceMap {
    /// Parse a map from JSON text
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize to compact JSON text
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

//! Source map reconciliation
//!
//! Both backends emit maps in their own frame of reference: the style
//! compiler lists absolute `file:` URIs, the transformer lists whatever name
//! it was given for its input. Before the maps are written next to their
//! artifacts they are rewritten so that:
//!
//! - the debug map resolves its sources from the debug artifact's final
//!   location back to the original stylesheets, and
//! - the minified map points at the debug artifact, forming the chain
//!   minified → debug → original.
//!
//! Only source identity is rewritten; `mappings` and `names` pass through.

use std::path::Path;

use stylekit_core::SourceMap;
use stylekit_core::paths::{normalize, relative_to, to_slash, uri_to_path};

/// Re-root the style compiler's map for an artifact written to `output_path`
pub fn reconcile_debug_map(
    mut map: SourceMap,
    output_path: &Path,
    source_root: &Path,
) -> SourceMap {
    let output_dir = output_path.parent().unwrap_or_else(|| Path::new(""));
    map.source_root = Some(to_slash(&relative_to(source_root, output_dir)));
    map.sources = map
        .sources
        .iter()
        .map(|source| rebase_source(source, source_root))
        .collect();
    map
}

/// Point the transformer's map at the debug artifact
pub fn reconcile_minified_map(
    raw_json: &str,
    debug_filename: &str,
) -> serde_json::Result<SourceMap> {
    let mut map = SourceMap::from_json(raw_json)?;
    map.source_root = Some(".".to_string());
    map.sources = vec![debug_filename.to_string()];

    // Inline contents only line up if the transformer saw a single input.
    if map
        .sources_content
        .as_ref()
        .is_some_and(|contents| contents.len() != 1)
    {
        map.sources_content = None;
    }
    Ok(map)
}

fn rebase_source(source: &str, source_root: &Path) -> String {
    let path = uri_to_path(source);
    if path.is_absolute() {
        to_slash(&relative_to(&path, source_root))
    } else {
        to_slash(&normalize(&path))
    }
}

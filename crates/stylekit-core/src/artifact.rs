//! Compiled artifacts and the sink they are registered with

use std::path::PathBuf;
use std::sync::Mutex;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// One output file produced by a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledArtifact {
    /// Path relative to the destination root
    pub relative_path: PathBuf,

    /// Where the host should write the file
    pub output_path: PathBuf,

    /// File name component of `relative_path`
    pub filename: String,

    /// Final extension including the dot (`.css`, `.map`)
    pub extension: String,

    /// File contents
    pub contents: String,
}

impl CompiledArtifact {
    /// Hex SHA-256 of the contents
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.contents.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Size of the contents in bytes
    pub fn size(&self) -> usize {
        self.contents.len()
    }
}

/// Receiver for finished artifacts.
///
/// Builds for different inputs may register concurrently, so implementations
/// must be safe to share across tasks. Registration is append-only and the
/// order between builds is not significant.
pub trait ArtifactSink: Send + Sync {
    /// Register the artifacts of one successful build
    fn add(&self, artifacts: &[CompiledArtifact]);
}

/// In-memory [`ArtifactSink`]
#[derive(Debug, Default)]
pub struct ArtifactCollection {
    artifacts: Mutex<Vec<CompiledArtifact>>,
}

impl ArtifactCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered artifacts
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of everything registered so far
    pub fn snapshot(&self) -> Vec<CompiledArtifact> {
        self.lock().clone()
    }

    /// Remove and return everything registered so far
    pub fn drain(&self) -> Vec<CompiledArtifact> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<CompiledArtifact>> {
        // A panicking writer cannot leave the Vec half-extended.
        self.artifacts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ArtifactSink for ArtifactCollection {
    fn add(&self, artifacts: &[CompiledArtifact]) {
        self.lock().extend_from_slice(artifacts);
    }
}

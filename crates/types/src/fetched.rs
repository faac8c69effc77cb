//! Result of materializing one package reference

use crate::Manifest;
use std::path::PathBuf;

/// Metadata produced by a successful fetch or a cache hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMetadata {
    /// Manifest read from the populated destination
    pub manifest: Manifest,
    /// Newly resolved locator; always `None` when served from cache
    pub resolved: Option<String>,
    /// Content hash of the fetched package
    pub hash: String,
    /// Destination directory holding the package
    pub dest: PathBuf,
    /// Whether the destination was already valid and no transport ran
    pub from_cache: bool,
}

impl FetchedMetadata {
    /// Metadata for a package a transport just wrote
    pub fn fetched(
        manifest: Manifest,
        resolved: Option<String>,
        hash: impl Into<String>,
        dest: impl Into<PathBuf>,
    ) -> Self {
        Self {
            manifest,
            resolved,
            hash: hash.into(),
            dest: dest.into(),
            from_cache: false,
        }
    }

    /// Metadata for a cache hit
    pub fn cached(manifest: Manifest, hash: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            manifest,
            resolved: None,
            hash: hash.into(),
            dest: dest.into(),
            from_cache: true,
        }
    }
}

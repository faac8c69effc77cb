//! Packages copied from a directory on the local filesystem

use super::{package_manifest, split_fragment};
use crate::strategy::{FetchRequest, FetchStrategy};
use async_trait::async_trait;
use kiln_errors::{Error, StorageError};
use kiln_types::FetchedMetadata;
use std::path::PathBuf;

/// Copies a local directory tree into the destination
///
/// The hash covers the copied tree, so edits to the source show up as a new
/// hash on the next fetch. No locator is resolved.
pub struct CopyStrategy {
    request: FetchRequest,
}

impl CopyStrategy {
    #[must_use]
    pub fn new(request: FetchRequest) -> Self {
        Self { request }
    }
}

#[async_trait]
impl FetchStrategy for CopyStrategy {
    async fn fetch(&mut self) -> Result<FetchedMetadata, Error> {
        let (source, _) = split_fragment(&self.request.remote.source);
        let source = PathBuf::from(source.strip_prefix("file://").unwrap_or(source));
        let dest = self.request.dest.clone();

        let metadata = tokio::fs::metadata(&source)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &source))?;
        if !metadata.is_dir() {
            return Err(StorageError::InvalidPath {
                path: source.display().to_string(),
            }
            .into());
        }

        kiln_store::fs::copy_directory(&source, &dest).await?;
        let manifest = package_manifest(&dest).await?;
        let hash = kiln_hash::hash_directory(&dest, &[]).await?;

        Ok(FetchedMetadata::fetched(manifest, None, hash.to_hex(), dest))
    }
}

//! Archives fetched over HTTP(S) or read from a local path

use super::{package_manifest, split_fragment, HttpClient};
use crate::strategy::{FetchRequest, FetchStrategy};
use async_trait::async_trait;
use kiln_errors::{Error, NetworkError};
use kiln_hash::Hash;
use kiln_types::FetchedMetadata;
use std::path::{Path, PathBuf};

/// Temporary name of a downloaded archive inside the destination
const DOWNLOAD_FILE: &str = ".kiln-download";

/// Downloads or reads a `.tar`/`.tar.gz` archive and unpacks it
///
/// The archive's BLAKE3 hash is checked against `remote.hash` when the
/// lockfile already records one. `resolved` pins the source to that hash.
pub struct TarballStrategy {
    request: FetchRequest,
}

impl TarballStrategy {
    #[must_use]
    pub fn new(request: FetchRequest) -> Self {
        Self { request }
    }

    fn is_remote(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    fn local_path(source: &str) -> PathBuf {
        PathBuf::from(source.strip_prefix("file://").unwrap_or(source))
    }

    async fn obtain(&self, source: &str, download: &Path) -> Result<(PathBuf, Hash), Error> {
        if Self::is_remote(source) {
            let client = HttpClient::from_config(&self.request.config.network)?;
            let hash = client.download(source, download).await?;
            Ok((download.to_path_buf(), hash))
        } else {
            let path = Self::local_path(source);
            let hash = Hash::hash_file(&path).await?;
            Ok((path, hash))
        }
    }
}

#[async_trait]
impl FetchStrategy for TarballStrategy {
    async fn fetch(&mut self) -> Result<FetchedMetadata, Error> {
        let dest = self.request.dest.clone();
        let (source, _) = split_fragment(&self.request.remote.source);
        let source = source.to_string();
        let download = dest.join(DOWNLOAD_FILE);

        let (archive, hash) = self.obtain(&source, &download).await?;

        if let Some(expected) = &self.request.remote.hash {
            // A malformed recorded hash can never match
            if !Hash::from_hex(expected).is_ok_and(|expected| expected == hash) {
                return Err(NetworkError::ChecksumMismatch {
                    expected: expected.clone(),
                    actual: hash.to_hex(),
                }
                .into());
            }
        }

        kiln_store::extract_archive(&archive, &dest).await?;
        if archive == download {
            tokio::fs::remove_file(&download)
                .await
                .map_err(|e| Error::io_with_path(&e, &download))?;
        }

        let manifest = package_manifest(&dest).await?;
        let hash = hash.to_hex();
        let resolved = format!("{source}#{hash}");
        Ok(FetchedMetadata::fetched(manifest, Some(resolved), hash, dest))
    }
}

#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Package cache storage for kiln
//!
//! Every package reference owns exactly one destination directory under the
//! cache root. A destination is either absent or complete: its contents are
//! only trusted once the integrity marker has been committed into it.

mod archive;
pub mod fs;
mod manifest_io;
mod marker;

pub use archive::{create_archive, extract_archive};
pub use manifest_io::{read_manifest, write_manifest};
pub use marker::{IntegrityMarker, MARKER_FILE};

use kiln_errors::{Error, StorageError};
use kiln_hash::Hash;
use kiln_types::{Manifest, PackageReference, MANIFEST_FILE};
use std::path::{Path, PathBuf};

/// Contents of a valid destination as read back by the cache gate
#[derive(Debug, Clone)]
pub struct CachedPackage {
    pub marker: IntegrityMarker,
    pub manifest: Manifest,
}

impl CachedPackage {
    #[must_use]
    pub fn hash(&self) -> &str {
        &self.marker.hash
    }
}

/// Cache root holding one directory per package reference
#[derive(Debug, Clone)]
pub struct PackageStore {
    base_path: PathBuf,
}

impl PackageStore {
    /// Create a new store instance
    #[must_use]
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Destination directory for a reference
    ///
    /// Pure function of the reference identity: the same name, version,
    /// transport and source always map to the same directory, and the result
    /// is always a direct child of the cache root.
    #[must_use]
    pub fn destination(&self, reference: &PackageReference) -> PathBuf {
        // The readable prefix is lossy; the suffix covers the raw identity
        let identity = Hash::from_data(
            format!(
                "{}\0{}\0{}\0{}",
                reference.name,
                reference.version,
                reference.remote.transport,
                reference.remote.source
            )
            .as_bytes(),
        );
        self.base_path.join(format!(
            "{}-{}-{}",
            sanitize(&reference.name),
            sanitize(&reference.version),
            identity.short()
        ))
    }

    /// Whether `dest` holds committed contents
    pub async fn is_valid(&self, dest: &Path) -> bool {
        fs::exists(&dest.join(MARKER_FILE)).await
    }

    /// Read the marker and manifest of a valid destination
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing or does not parse.
    pub async fn read_cached(&self, dest: &Path) -> Result<CachedPackage, Error> {
        let marker_path = dest.join(MARKER_FILE);
        let raw = tokio::fs::read(&marker_path)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &marker_path))?;
        let marker: IntegrityMarker =
            serde_json::from_slice(&raw).map_err(|e| StorageError::CorruptedData {
                message: format!("{}: {e}", marker_path.display()),
            })?;

        let manifest = read_manifest(&dest.join(MANIFEST_FILE)).await?;
        Ok(CachedPackage { marker, manifest })
    }

    /// Commit a populated destination by writing its integrity marker
    ///
    /// The marker is written to a temporary name and renamed into place, so
    /// a crash leaves either no marker or a complete one.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be serialized or written.
    pub async fn commit(&self, dest: &Path, marker: &IntegrityMarker) -> Result<(), Error> {
        let json = serde_json::to_vec_pretty(marker)?;
        let tmp = dest.join(format!("{MARKER_FILE}.tmp"));
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StorageError::from_io_with_path(&e, &tmp))?;
        fs::rename(&tmp, &dest.join(MARKER_FILE)).await
    }
}

/// Reduce a name or version to characters safe in a single path component
fn sanitize(part: &str) -> String {
    let cleaned: String = part
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_types::RemoteDescriptor;

    fn reference(name: &str, source: &str) -> PackageReference {
        PackageReference::new(name, "1.0.0", RemoteDescriptor::new("tarball", source))
    }

    #[test]
    fn scoped_names_stay_in_one_component() {
        let store = PackageStore::new(PathBuf::from("/cache"));
        let dest = store.destination(&reference("@scope/pkg", "https://x/pkg.tgz"));
        assert_eq!(dest.parent(), Some(Path::new("/cache")));
        let name = dest.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("_scope_pkg-1.0.0-"));
    }

    #[test]
    fn source_changes_destination() {
        let store = PackageStore::new(PathBuf::from("/cache"));
        let a = store.destination(&reference("pkg", "https://a/pkg.tgz"));
        let b = store.destination(&reference("pkg", "https://b/pkg.tgz"));
        assert_ne!(a, b);
    }

    #[test]
    fn names_that_sanitize_alike_stay_apart() {
        let store = PackageStore::new(PathBuf::from("/cache"));
        let scoped = store.destination(&reference("@scope/pkg", "https://a/pkg.tgz"));
        let flat = store.destination(&reference("_scope_pkg", "https://a/pkg.tgz"));
        assert_ne!(scoped, flat);

        let mut slash = reference("pkg", "https://a/pkg.tgz");
        slash.version = "1.0.0+a/b".to_string();
        let mut underscore = slash.clone();
        underscore.version = "1.0.0+a_b".to_string();
        assert_ne!(store.destination(&slash), store.destination(&underscore));
    }

    #[test]
    fn sanitize_never_returns_empty() {
        assert_eq!(sanitize(""), "_");
        assert_eq!(sanitize("../x"), ".._x");
    }
}

//! Lockfile reading and write-back

use crate::error::CliError;
use kiln_types::PackageReference;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Current lockfile format version
pub const LOCKFILE_VERSION: u32 = 1;

/// Resolved package set handed over by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub packages: Vec<PackageReference>,
}

fn default_version() -> u32 {
    LOCKFILE_VERSION
}

impl Lockfile {
    pub fn new(packages: Vec<PackageReference>) -> Self {
        Self {
            version: LOCKFILE_VERSION,
            packages,
        }
    }

    /// Read and parse a lockfile
    pub async fn load(path: &Path) -> Result<Self, CliError> {
        let contents = fs::read_to_string(path).await.map_err(|e| {
            CliError::Lockfile(format!("failed to read {}: {e}", path.display()))
        })?;
        let lockfile: Self = serde_json::from_str(&contents).map_err(|e| {
            CliError::Lockfile(format!("failed to parse {}: {e}", path.display()))
        })?;
        if lockfile.version > LOCKFILE_VERSION {
            return Err(CliError::Lockfile(format!(
                "{} uses lockfile version {}, this build understands up to {LOCKFILE_VERSION}",
                path.display(),
                lockfile.version
            )));
        }
        Ok(lockfile)
    }

    /// Write the lockfile through a temporary sibling and rename it into place
    pub async fn save(&self, path: &Path) -> Result<(), CliError> {
        let mut contents = serde_json::to_string_pretty(self)
            .map_err(|e| CliError::Lockfile(format!("failed to serialize lockfile: {e}")))?;
        contents.push('\n');

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).await?;
        fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_types::RemoteDescriptor;
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_then_load_keeps_written_back_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kiln.lock.json");

        let mut reference = PackageReference::new(
            "left-pad",
            "1.3.0",
            RemoteDescriptor::new("tarball", "https://example.invalid/left-pad-1.3.0.tgz"),
        );
        reference.remote.hash = Some("abc123".to_string());
        reference.remote.resolved = Some("https://example.invalid/left-pad-1.3.0.tgz#abc123".into());

        Lockfile::new(vec![reference.clone()])
            .save(&path)
            .await
            .unwrap();
        let loaded = Lockfile::load(&path).await.unwrap();

        assert_eq!(loaded.version, LOCKFILE_VERSION);
        assert_eq!(loaded.packages, vec![reference]);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn missing_fields_fall_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kiln.lock.json");
        fs::write(
            &path,
            r#"{"packages":[{"name":"a","version":"1.0.0","remote":{"type":"copy","source":"./a"}}]}"#,
        )
        .await
        .unwrap();

        let loaded = Lockfile::load(&path).await.unwrap();
        assert_eq!(loaded.version, LOCKFILE_VERSION);
        assert!(!loaded.packages[0].optional);
        assert!(loaded.packages[0].remote.hash.is_none());
    }

    #[tokio::test]
    async fn newer_versions_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kiln.lock.json");
        fs::write(&path, r#"{"version":99,"packages":[]}"#)
            .await
            .unwrap();

        let err = Lockfile::load(&path).await.unwrap_err();
        assert!(matches!(err, CliError::Lockfile(msg) if msg.contains("version 99")));
    }
}

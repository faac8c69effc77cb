//! Collects manifests written back during a fetch run

use async_trait::async_trait;
use dashmap::DashMap;
use kiln_errors::Error;
use kiln_fetch::ManifestSink;
use kiln_types::{Manifest, PackageReference};

/// Concurrent map of package name and version to the manifest its fetch produced
#[derive(Debug, Default)]
pub struct ManifestCollector {
    manifests: DashMap<(String, String), Manifest>,
}

impl ManifestCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of dependencies declared by a collected manifest
    pub fn dependency_count(&self, reference: &PackageReference) -> Option<usize> {
        self.manifests
            .get(&key(reference))
            .map(|manifest| manifest.dependencies.len())
    }
}

#[async_trait]
impl ManifestSink for ManifestCollector {
    async fn update_manifest(
        &self,
        reference: &PackageReference,
        manifest: Manifest,
    ) -> Result<(), Error> {
        if manifest.name() != reference.name {
            tracing::warn!(
                package = %reference.name,
                manifest_name = %manifest.name(),
                "fetched manifest names a different package"
            );
        }
        self.manifests.insert(key(reference), manifest);
        Ok(())
    }
}

fn key(reference: &PackageReference) -> (String, String) {
    (reference.name.clone(), reference.version.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_types::{RemoteDescriptor, Version};

    #[tokio::test]
    async fn later_updates_replace_earlier_ones() {
        let collector = ManifestCollector::new();
        let reference =
            PackageReference::new("a", "1.0.0", RemoteDescriptor::new("copy", "./a"));

        collector
            .update_manifest(&reference, Manifest::new("a", &Version::new(1, 0, 0)))
            .await
            .unwrap();
        collector
            .update_manifest(
                &reference,
                Manifest::new("a", &Version::new(1, 0, 1)).depends_on("b", "^2"),
            )
            .await
            .unwrap();

        assert_eq!(collector.dependency_count(&reference), Some(1));
        let other_version =
            PackageReference::new("a", "2.0.0", RemoteDescriptor::new("copy", "./a"));
        assert_eq!(collector.dependency_count(&other_version), None);
    }
}

//! Fatal vs tolerated failures, and writing results back

use crate::context::FetchContext;
use async_trait::async_trait;
use kiln_errors::{Error, UserFacingError};
use kiln_events::{EventEmitter, FailureContext, FetchEvent};
use kiln_types::{FetchedMetadata, Manifest, PackageReference};
use std::sync::Arc;

/// Receives the manifest of every successfully fetched package
///
/// This is how fetched metadata flows back to whoever resolved the
/// references. Errors returned here abort the run.
#[async_trait]
pub trait ManifestSink: Send + Sync {
    async fn update_manifest(
        &self,
        reference: &PackageReference,
        manifest: Manifest,
    ) -> Result<(), Error>;
}

/// Sink for callers that only care about the references themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct NullManifestSink;

#[async_trait]
impl ManifestSink for NullManifestSink {
    async fn update_manifest(
        &self,
        _reference: &PackageReference,
        _manifest: Manifest,
    ) -> Result<(), Error> {
        Ok(())
    }
}

/// What became of one reference that did not abort the run
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Contents are in place (fetched now or served from cache)
    Fetched(FetchedMetadata),
    /// An optional reference failed; the error was reported and skipped
    Tolerated(Error),
}

impl FetchOutcome {
    #[must_use]
    pub fn metadata(&self) -> Option<&FetchedMetadata> {
        match self {
            Self::Fetched(metadata) => Some(metadata),
            Self::Tolerated(_) => None,
        }
    }

    #[must_use]
    pub fn is_tolerated(&self) -> bool {
        matches!(self, Self::Tolerated(_))
    }
}

/// Decides which failures abort the run and applies successful results
#[derive(Clone)]
pub struct FailurePolicy {
    context: FetchContext,
    sink: Arc<dyn ManifestSink>,
}

impl FailurePolicy {
    #[must_use]
    pub fn new(context: FetchContext, sink: Arc<dyn ManifestSink>) -> Self {
        Self { context, sink }
    }

    /// Classify the executor's result for `reference`
    ///
    /// # Errors
    ///
    /// Returns the original error unchanged when `reference` is required.
    pub fn classify(
        &self,
        reference: &PackageReference,
        result: Result<FetchedMetadata, Error>,
    ) -> Result<FetchOutcome, Error> {
        match result {
            Ok(metadata) => Ok(FetchOutcome::Fetched(metadata)),
            Err(err) if reference.optional => {
                tracing::warn!(package = %reference.name, error = %err, "optional package failed");
                self.context.emit_error_with_details(
                    format!("failed to fetch optional package {reference}"),
                    err.user_message(),
                );
                self.context.emit_fetch(FetchEvent::Tolerated {
                    package: reference.name.clone(),
                    failure: FailureContext::from_error(&err),
                });
                Ok(FetchOutcome::Tolerated(err))
            }
            Err(err) => Err(err),
        }
    }

    /// Record the fetched hash and resolved locator in the reference
    ///
    /// The hash is always replaced. The resolved locator is only replaced
    /// when the fetch produced one, so cache hits keep the pinned locator.
    pub fn write_back(reference: &mut PackageReference, metadata: &FetchedMetadata) {
        reference.remote.hash = Some(metadata.hash.clone());
        if let Some(resolved) = &metadata.resolved {
            reference.remote.resolved = Some(resolved.clone());
        }
    }

    /// Write back into `reference` and hand the manifest to the sink
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest sink rejects the update.
    pub async fn apply(
        &self,
        reference: &mut PackageReference,
        outcome: &FetchOutcome,
    ) -> Result<(), Error> {
        if let FetchOutcome::Fetched(metadata) = outcome {
            Self::write_back(reference, metadata);
            self.sink
                .update_manifest(reference, metadata.manifest.clone())
                .await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailurePolicy")
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

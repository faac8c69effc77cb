//! One reference, start to finish

use crate::context::FetchContext;
use crate::registry::FetcherRegistry;
use crate::strategy::{FetchRequest, StrategyConstructor};
use kiln_config::Config;
use kiln_errors::{Error, FetchError};
use kiln_events::{EventEmitter, FetchEvent};
use kiln_store::{fs, IntegrityMarker, PackageStore};
use kiln_types::{FetchedMetadata, PackageReference};
use std::path::Path;
use std::sync::Arc;

/// Materializes a single reference into its destination directory
///
/// The destination is either served from cache untouched, or wiped and
/// repopulated by the registered strategy. A failed strategy never leaves
/// its destination behind.
#[derive(Debug, Clone)]
pub struct FetchExecutor {
    store: PackageStore,
    registry: Arc<FetcherRegistry>,
    config: Arc<Config>,
    context: FetchContext,
}

impl FetchExecutor {
    #[must_use]
    pub fn new(
        store: PackageStore,
        registry: Arc<FetcherRegistry>,
        config: Arc<Config>,
        context: FetchContext,
    ) -> Self {
        Self {
            store,
            registry,
            config,
            context,
        }
    }

    #[must_use]
    pub fn store(&self) -> &PackageStore {
        &self.store
    }

    /// Fetch `reference`, or return its cached contents
    ///
    /// # Errors
    ///
    /// Returns `FetchError::CacheRead` when a committed destination cannot be
    /// read back, `FetchError::UnknownTransport` when no strategy handles the
    /// transport, and `FetchError::Transport`/`Timeout` when the strategy fails.
    /// Storage errors from clearing or creating the destination are returned
    /// as they are.
    pub async fn fetch(&self, reference: &PackageReference) -> Result<FetchedMetadata, Error> {
        let dest = self.store.destination(reference);

        if self.store.is_valid(&dest).await {
            let cached =
                self.store
                    .read_cached(&dest)
                    .await
                    .map_err(|e| FetchError::CacheRead {
                        package: reference.name.clone(),
                        path: dest.display().to_string(),
                        message: e.to_string(),
                    })?;

            tracing::debug!(package = %reference.name, dest = %dest.display(), "cache hit");
            self.context.emit_fetch(FetchEvent::CacheHit {
                package: reference.name.clone(),
                dest: dest.clone(),
            });
            return Ok(FetchedMetadata::cached(
                cached.manifest,
                cached.marker.hash,
                dest,
            ));
        }

        fs::remove_dir_all(&dest).await?;
        let constructor = self
            .registry
            .lookup(&reference.remote.transport, &reference.name)?;

        match self.populate(reference, &dest, &constructor).await {
            Ok(metadata) => Ok(metadata),
            Err(err) => {
                self.cleanup(&dest).await;
                Err(err)
            }
        }
    }

    async fn populate(
        &self,
        reference: &PackageReference,
        dest: &Path,
        constructor: &StrategyConstructor,
    ) -> Result<FetchedMetadata, Error> {
        fs::create_dir_all(dest).await?;

        let transport = reference.remote.transport.to_string();
        self.context.emit_fetch(FetchEvent::Started {
            package: reference.name.clone(),
            transport: transport.clone(),
            dest: dest.to_path_buf(),
        });

        let mut strategy = constructor(FetchRequest {
            dest: dest.to_path_buf(),
            remote: reference.remote.clone(),
            config: Arc::clone(&self.config),
        });

        let timeout = self.config.network.timeout_duration();
        let outcome = if timeout.is_zero() {
            strategy.fetch().await
        } else {
            tokio::time::timeout(timeout, strategy.fetch())
                .await
                .map_err(|_| FetchError::Timeout {
                    package: reference.name.clone(),
                    transport: transport.clone(),
                    timeout_seconds: timeout.as_secs(),
                })?
        };
        let mut metadata = outcome.map_err(|e| attribute(e, &reference.name, &transport))?;

        let marker = IntegrityMarker::new(
            metadata.hash.clone(),
            metadata.resolved.clone(),
            transport,
        );
        self.store.commit(dest, &marker).await?;

        metadata.dest = dest.to_path_buf();
        metadata.from_cache = false;

        self.context.emit_fetch(FetchEvent::Completed {
            package: reference.name.clone(),
            hash: metadata.hash.clone(),
            resolved: metadata.resolved.clone(),
        });
        Ok(metadata)
    }

    /// Best-effort removal after a failure; the original error wins
    async fn cleanup(&self, dest: &Path) {
        if let Err(err) = fs::remove_dir_all(dest).await {
            let cleanup = FetchError::Cleanup {
                path: dest.display().to_string(),
                message: err.to_string(),
            };
            tracing::warn!(error = %cleanup, "failed to remove partial package");
            self.context.emit_fetch(FetchEvent::CleanupFailed {
                path: dest.to_path_buf(),
                message: err.to_string(),
            });
        }
    }
}

/// Attach the package to a strategy failure that does not already name one
fn attribute(error: Error, package: &str, transport: &str) -> Error {
    match error {
        Error::Fetch(_) | Error::Cancelled => error,
        other => FetchError::transport(package, transport, other.to_string()).into(),
    }
}

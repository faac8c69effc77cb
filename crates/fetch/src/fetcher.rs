//! The fetch phase entry point

use crate::context::FetchContext;
use crate::executor::FetchExecutor;
use crate::policy::{FailurePolicy, FetchOutcome, ManifestSink, NullManifestSink};
use crate::registry::FetcherRegistry;
use crate::scheduler::ConcurrencyScheduler;
use kiln_config::Config;
use kiln_errors::Error;
use kiln_events::{EventEmitter, EventSender, FailureContext};
use kiln_resources::{ResourceLimits, ResourceManager};
use kiln_store::PackageStore;
use kiln_types::PackageReference;
use std::sync::Arc;

/// An optional package that failed without aborting the run
#[derive(Debug, Clone)]
pub struct ToleratedFailure {
    /// Position of the package in the input list
    pub index: usize,
    pub package: String,
    pub error: Error,
}

/// Result of a completed fetch phase
#[derive(Debug, Clone, Default)]
pub struct FetchSummary {
    /// Every reference in input order, with hash and resolved written back
    pub references: Vec<PackageReference>,
    /// Packages a transport wrote during this run
    pub fetched: usize,
    /// Packages served from an already valid destination
    pub cached: usize,
    /// Input positions of the packages counted in `cached`
    pub cache_hits: Vec<usize>,
    pub tolerated: Vec<ToleratedFailure>,
}

/// Ensures every reference's contents exist in the package cache
///
/// ```no_run
/// # async fn run(refs: Vec<kiln_types::PackageReference>) -> Result<(), kiln_errors::Error> {
/// use kiln_fetch::PackageFetcher;
///
/// let config = kiln_config::Config::default();
/// let summary = PackageFetcher::from_config(config).init(refs).await?;
/// println!("{} fetched, {} cached", summary.fetched, summary.cached);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PackageFetcher {
    config: Arc<Config>,
    store: PackageStore,
    registry: Arc<FetcherRegistry>,
    resources: ResourceManager,
    context: FetchContext,
    sink: Option<Arc<dyn ManifestSink>>,
}

impl PackageFetcher {
    /// Fetcher over `store` using `registry`, sized by the config's concurrency
    #[must_use]
    pub fn new(config: Config, store: PackageStore, registry: FetcherRegistry) -> Self {
        let resources = ResourceManager::new(ResourceLimits::with_fetches(config.concurrency()));
        Self {
            config: Arc::new(config),
            store,
            registry: Arc::new(registry),
            resources,
            context: FetchContext::new(),
            sink: None,
        }
    }

    /// Fetcher with the bundled transports over the configured cache path
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let store = PackageStore::new(config.cache_path());
        Self::new(config, store, FetcherRegistry::builtin())
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.context = self.context.with_event_sender(sender);
        self
    }

    #[must_use]
    pub fn with_manifest_sink(mut self, sink: Arc<dyn ManifestSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the resource manager, e.g. to share fetch permits with other work
    #[must_use]
    pub fn with_resources(mut self, resources: ResourceManager) -> Self {
        self.resources = resources;
        self
    }

    #[must_use]
    pub fn store(&self) -> &PackageStore {
        &self.store
    }

    #[must_use]
    pub fn registry(&self) -> &FetcherRegistry {
        &self.registry
    }

    /// Fetch every reference, writing hash and resolved locator back
    ///
    /// Failures of optional references are reported as events and listed in
    /// the summary. Any other failure aborts the run once the fetches already
    /// in flight have finished.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: an unknown transport, an unreadable
    /// cache entry, a failed required fetch, a manifest sink error, or a
    /// panicked task.
    pub async fn init(&self, references: Vec<PackageReference>) -> Result<FetchSummary, Error> {
        let total = references.len();
        let executor = Arc::new(FetchExecutor::new(
            self.store.clone(),
            Arc::clone(&self.registry),
            Arc::clone(&self.config),
            self.context.clone(),
        ));
        let sink: Arc<dyn ManifestSink> = match &self.sink {
            Some(sink) => Arc::clone(sink),
            None => Arc::new(NullManifestSink),
        };
        let policy = Arc::new(FailurePolicy::new(self.context.clone(), sink));
        let scheduler = ConcurrencyScheduler::new(self.resources.clone());

        tracing::info!(packages = total, width = scheduler.width(), "fetching packages");
        self.context.emit_operation_started("fetch");
        let progress = self.context.progress("fetch packages", total as u64);

        let per_item = move |(index, mut reference): (usize, PackageReference)| {
            let executor = Arc::clone(&executor);
            let policy = Arc::clone(&policy);
            async move {
                let result = executor.fetch(&reference).await;
                let outcome = policy.classify(&reference, result)?;
                policy.apply(&mut reference, &outcome).await?;
                Ok::<_, Error>((index, reference, outcome))
            }
        };
        let on_complete = |(_, reference, _): &(usize, PackageReference, FetchOutcome)| {
            if let Some(progress) = &progress {
                progress.tick(reference.name.clone());
            }
        };

        let run = scheduler
            .run(
                references.into_iter().enumerate().collect(),
                per_item,
                on_complete,
            )
            .await;

        match run {
            Ok(mut completed) => {
                completed.sort_by_key(|(index, _, _)| *index);
                let summary = summarize(completed);
                if let Some(progress) = &progress {
                    progress.finish();
                }
                tracing::info!(
                    fetched = summary.fetched,
                    cached = summary.cached,
                    tolerated = summary.tolerated.len(),
                    "fetch complete"
                );
                self.context.emit_operation_completed("fetch", true);
                Ok(summary)
            }
            Err(err) => {
                if let Some(progress) = &progress {
                    progress.fail(FailureContext::from_error(&err));
                }
                self.context.emit_operation_failed("fetch", err.to_string());
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for PackageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageFetcher")
            .field("store", &self.store)
            .field("registry", &self.registry)
            .field("resources", &self.resources)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}

fn summarize(completed: Vec<(usize, PackageReference, FetchOutcome)>) -> FetchSummary {
    let mut summary = FetchSummary::default();
    for (index, reference, outcome) in completed {
        match outcome {
            FetchOutcome::Fetched(metadata) if metadata.from_cache => {
                summary.cached += 1;
                summary.cache_hits.push(index);
            }
            FetchOutcome::Fetched(_) => summary.fetched += 1,
            FetchOutcome::Tolerated(error) => summary.tolerated.push(ToleratedFailure {
                index,
                package: reference.name.clone(),
                error,
            }),
        }
        summary.references.push(reference);
    }
    summary
}

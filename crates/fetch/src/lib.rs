#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Fetch orchestration for kiln
//!
//! Given already-resolved package references, this crate makes sure each
//! package's contents exist in the local cache. The pieces, leaf first:
//!
//! - [`FetcherRegistry`] maps transport tags to [`FetchStrategy`] constructors
//! - [`FetchExecutor`] runs one reference: cache gate, strategy, cleanup
//! - [`ConcurrencyScheduler`] runs many references with bounded parallelism
//! - [`FailurePolicy`] decides fatal vs tolerated and writes results back
//! - [`PackageFetcher`] wires them together behind [`PackageFetcher::init`]

mod context;
mod executor;
mod fetcher;
mod policy;
mod registry;
mod scheduler;
mod strategy;
pub mod transports;

pub use context::FetchContext;
pub use executor::FetchExecutor;
pub use fetcher::{FetchSummary, PackageFetcher, ToleratedFailure};
pub use policy::{FailurePolicy, FetchOutcome, ManifestSink, NullManifestSink};
pub use registry::FetcherRegistry;
pub use scheduler::ConcurrencyScheduler;
pub use strategy::{FetchRequest, FetchStrategy, StrategyConstructor};

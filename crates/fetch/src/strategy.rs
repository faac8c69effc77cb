//! The contract every transport implements

use async_trait::async_trait;
use kiln_config::Config;
use kiln_errors::Error;
use kiln_types::{FetchedMetadata, RemoteDescriptor};
use std::path::PathBuf;
use std::sync::Arc;

/// Everything a strategy needs to populate one destination
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Empty directory the strategy writes into
    pub dest: PathBuf,
    pub remote: RemoteDescriptor,
    pub config: Arc<Config>,
}

/// Populates a destination directory from a remote locator
///
/// A strategy instance is built for a single attempt and owns the
/// in-progress write into `dest`. It must leave `manifest.toml` at the root
/// of the destination and report the content hash it verified or computed.
/// It never writes the integrity marker; the executor commits that.
#[async_trait]
pub trait FetchStrategy: Send {
    async fn fetch(&mut self) -> Result<FetchedMetadata, Error>;
}

/// Builds a strategy for one fetch request
pub type StrategyConstructor = Arc<dyn Fn(FetchRequest) -> Box<dyn FetchStrategy> + Send + Sync>;

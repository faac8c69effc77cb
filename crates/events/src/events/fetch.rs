use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::FailureContext;

/// Lifecycle of a single package fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FetchEvent {
    /// Transport work began for a package
    Started {
        package: String,
        transport: String,
        dest: PathBuf,
    },

    /// Destination already held valid contents
    CacheHit { package: String, dest: PathBuf },

    /// Package contents were written and committed
    Completed {
        package: String,
        hash: String,
        resolved: Option<String>,
    },

    /// An optional package failed and was skipped
    Tolerated {
        package: String,
        failure: FailureContext,
    },

    /// A failed fetch left a destination that could not be removed
    CleanupFailed { path: PathBuf, message: String },

    /// One package finished (fetched, cached or tolerated)
    Ticked {
        package: String,
        completed: u64,
        total: u64,
    },
}

impl FetchEvent {
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        match self {
            Self::Started { package, .. }
            | Self::CacheHit { package, .. }
            | Self::Completed { package, .. }
            | Self::Tolerated { package, .. }
            | Self::Ticked { package, .. } => Some(package),
            Self::CleanupFailed { .. } => None,
        }
    }
}

//! Resource limit configuration and availability tracking

use serde::{Deserialize, Serialize};

/// Resource limit configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of packages fetched concurrently
    pub concurrent_fetches: usize,
}

impl ResourceLimits {
    /// Limits with an explicit fetch width (at least one)
    #[must_use]
    pub fn with_fetches(concurrent_fetches: usize) -> Self {
        Self {
            concurrent_fetches: concurrent_fetches.max(1),
        }
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self::with_fetches(4)
    }
}

/// Resource availability information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceAvailability {
    /// Number of fetch permits currently available
    pub fetch: usize,
}

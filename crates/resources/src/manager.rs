//! Central owner of the semaphores bounding concurrent work

use crate::limits::{ResourceAvailability, ResourceLimits};
use crate::semaphore::{acquire_semaphore_permit, create_semaphore};
use kiln_errors::Error;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Hands out permits for concurrent fetches
#[derive(Debug, Clone)]
pub struct ResourceManager {
    limits: ResourceLimits,
    fetch_semaphore: Arc<Semaphore>,
}

impl ResourceManager {
    #[must_use]
    pub fn new(limits: ResourceLimits) -> Self {
        let fetch_semaphore = create_semaphore(limits.concurrent_fetches.max(1));
        Self {
            limits,
            fetch_semaphore,
        }
    }

    #[must_use]
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Wait for a fetch slot
    ///
    /// # Errors
    ///
    /// Returns an error if the manager has been shut down.
    pub async fn acquire_fetch_permit(&self) -> Result<OwnedSemaphorePermit, Error> {
        acquire_semaphore_permit(self.fetch_semaphore.clone(), "fetch").await
    }

    /// Fetch slots not currently held
    #[must_use]
    pub fn available(&self) -> ResourceAvailability {
        ResourceAvailability {
            fetch: self.fetch_semaphore.available_permits(),
        }
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new(ResourceLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn permits_are_bounded_by_limits() {
        let manager = ResourceManager::new(ResourceLimits::with_fetches(2));
        let first = manager.acquire_fetch_permit().await.unwrap();
        let _second = manager.acquire_fetch_permit().await.unwrap();
        assert_eq!(manager.available().fetch, 0);

        drop(first);
        assert_eq!(manager.available().fetch, 1);
        let _third = manager.acquire_fetch_permit().await.unwrap();
        assert_eq!(manager.available().fetch, 0);
    }

    #[tokio::test]
    async fn zero_width_is_raised_to_one() {
        let manager = ResourceManager::new(ResourceLimits { concurrent_fetches: 0 });
        assert_eq!(manager.available().fetch, 1);
    }

    #[tokio::test]
    async fn clones_share_one_pool() {
        let manager = ResourceManager::new(ResourceLimits::with_fetches(3));
        let clone = manager.clone();
        let _permit = clone.acquire_fetch_permit().await.unwrap();
        assert_eq!(manager.available().fetch, 2);
    }
}

//! Bounded-parallelism runner over a batch of work items

use kiln_errors::{Error, FetchError};
use kiln_resources::ResourceManager;
use std::future::Future;
use tokio::task::{JoinError, JoinSet};

/// Runs one spawned task per item, at most `width` at a time
///
/// Width comes from the resource manager's fetch semaphore: a task is only
/// spawned once it holds a permit, and the permit is released when the task
/// finishes.
#[derive(Debug, Clone)]
pub struct ConcurrencyScheduler {
    resources: ResourceManager,
}

impl ConcurrencyScheduler {
    #[must_use]
    pub fn new(resources: ResourceManager) -> Self {
        Self { resources }
    }

    /// Maximum number of tasks in flight
    #[must_use]
    pub fn width(&self) -> usize {
        self.resources.limits().concurrent_fetches.max(1)
    }

    /// Run `per_item` over every item
    ///
    /// `on_complete` sees each output in completion order. Outputs are
    /// returned in completion order as well.
    ///
    /// On the first error no further items are launched. Tasks already in
    /// flight are allowed to finish so their own cleanup runs, and then the
    /// first error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by any item, or
    /// `FetchError::TaskFailed` if a task panicked.
    pub async fn run<T, O, F, Fut, C>(
        &self,
        items: Vec<T>,
        per_item: F,
        mut on_complete: C,
    ) -> Result<Vec<O>, Error>
    where
        T: Send + 'static,
        O: Send + 'static,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<O, Error>> + Send + 'static,
        C: FnMut(&O),
    {
        let mut outputs = Vec::with_capacity(items.len());
        let mut pending = items.into_iter();
        let mut next = pending.next();
        let mut tasks: JoinSet<Result<O, Error>> = JoinSet::new();
        let mut first_error: Option<Error> = None;

        loop {
            if first_error.is_some() {
                next = None;
            }
            if next.is_none() && tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    match flatten(joined) {
                        Ok(output) => {
                            on_complete(&output);
                            outputs.push(output);
                        }
                        Err(err) => {
                            if first_error.is_none() {
                                tracing::debug!(
                                    error = %err,
                                    in_flight = tasks.len(),
                                    free_permits = self.resources.available().fetch,
                                    "stopping launches"
                                );
                                first_error = Some(err);
                            }
                        }
                    }
                }

                permit = self.resources.acquire_fetch_permit(), if next.is_some() => {
                    match permit {
                        Ok(permit) => {
                            if let Some(item) = next.take() {
                                let work = per_item(item);
                                tasks.spawn(async move {
                                    let _permit = permit;
                                    work.await
                                });
                            }
                            next = pending.next();
                        }
                        Err(err) => first_error = Some(err),
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(outputs),
        }
    }
}

fn flatten<O>(joined: Result<Result<O, Error>, JoinError>) -> Result<O, Error> {
    match joined {
        Ok(result) => result,
        Err(err) if err.is_panic() => Err(FetchError::TaskFailed {
            message: format!("fetch task panicked: {err}"),
        }
        .into()),
        Err(err) => Err(FetchError::TaskFailed {
            message: err.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_resources::ResourceLimits;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn scheduler(width: usize) -> ConcurrencyScheduler {
        ConcurrencyScheduler::new(ResourceManager::new(ResourceLimits::with_fetches(width)))
    }

    #[tokio::test]
    async fn empty_batch_completes() {
        let outputs = scheduler(4)
            .run(Vec::<u32>::new(), |n| async move { Ok(n) }, |_| {})
            .await
            .unwrap();
        assert!(outputs.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn every_item_completes_once() {
        let mut seen = Vec::new();
        let mut outputs = scheduler(3)
            .run(
                (0..20u32).collect(),
                |n| async move {
                    tokio::time::sleep(Duration::from_millis(u64::from(n % 4))).await;
                    Ok(n * 2)
                },
                |out| seen.push(*out),
            )
            .await
            .unwrap();

        outputs.sort_unstable();
        seen.sort_unstable();
        let expected: Vec<u32> = (0..20).map(|n| n * 2).collect();
        assert_eq!(outputs, expected);
        assert_eq!(seen, expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn width_bounds_in_flight_tasks() {
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (c, p) = (Arc::clone(&current), Arc::clone(&peak));
        scheduler(2)
            .run(
                (0..10u32).collect(),
                move |_| {
                    let (c, p) = (Arc::clone(&c), Arc::clone(&p));
                    async move {
                        let now = c.fetch_add(1, Ordering::SeqCst) + 1;
                        p.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        c.fetch_sub(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                |_| {},
            )
            .await
            .unwrap();

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn first_error_stops_launches_and_drains() {
        let started = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicUsize::new(0));

        let (s, f) = (Arc::clone(&started), Arc::clone(&finished));
        let scheduler = scheduler(1);
        let err = scheduler
            .run(
                (0..10u32).collect(),
                move |n| {
                    let (s, f) = (Arc::clone(&s), Arc::clone(&f));
                    async move {
                        s.fetch_add(1, Ordering::SeqCst);
                        tokio::task::yield_now().await;
                        f.fetch_add(1, Ordering::SeqCst);
                        if n == 2 {
                            Err(Error::internal("item 2 failed"))
                        } else {
                            Ok(n)
                        }
                    }
                },
                |_| {},
            )
            .await
            .unwrap_err();

        assert!(err.to_string().contains("item 2 failed"));
        // Width 1: nothing after the failing item may have started
        assert_eq!(started.load(Ordering::SeqCst), 3);
        assert_eq!(started.load(Ordering::SeqCst), finished.load(Ordering::SeqCst));
        // Drained tasks give their permits back
        assert_eq!(scheduler.resources.available().fetch, 1);
    }

    #[tokio::test]
    async fn panicking_task_is_task_failed() {
        let err = scheduler(2)
            .run(
                vec![1u32, 2],
                |n| async move {
                    assert!(n != 2, "boom");
                    Ok(n)
                },
                |_| {},
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::TaskFailed { .. })));
    }
}

//! Completion counter for a fixed-size batch of work

use crate::{AppEvent, EventEmitter, EventSender, FetchEvent, ProgressEvent};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Emits one progress update per finished item
///
/// Cheap to clone; clones share the same counter, so ticks from concurrent
/// tasks are counted exactly once each.
#[derive(Debug, Clone)]
pub struct ProgressTick {
    id: String,
    total: u64,
    completed: Arc<AtomicU64>,
    started: Instant,
    sender: EventSender,
}

impl ProgressTick {
    pub(crate) fn new(sender: EventSender, total: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            total,
            completed: Arc::new(AtomicU64::new(0)),
            started: Instant::now(),
            sender,
        }
    }

    pub(crate) fn start(&self, operation: impl Into<String>) {
        self.sender.emit(AppEvent::Progress(ProgressEvent::started(
            &self.id,
            operation,
            Some(self.total),
        )));
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    #[must_use]
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    /// Record one finished item and return the running count
    pub fn tick(&self, package: impl Into<String>) -> u64 {
        let current = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.sender.emit(AppEvent::Progress(ProgressEvent::updated(
            &self.id,
            current,
            Some(self.total),
        )));
        self.sender.emit(AppEvent::Fetch(FetchEvent::Ticked {
            package: package.into(),
            completed: current,
            total: self.total,
        }));
        current
    }

    /// Close the counter with a completion event
    pub fn finish(&self) {
        self.sender.emit(AppEvent::Progress(ProgressEvent::completed(
            &self.id,
            self.started.elapsed(),
            self.completed(),
        )));
    }

    /// Close the counter with a failure event
    pub fn fail(&self, failure: crate::FailureContext) {
        self.sender.emit(AppEvent::Progress(ProgressEvent::failed(
            &self.id,
            failure,
            self.completed(),
        )));
    }
}

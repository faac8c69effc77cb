use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Progress tracking events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    /// Progress tracking started
    Started {
        id: String,
        operation: String,
        total: Option<u64>,
    },

    /// One more unit of work finished
    Updated {
        id: String,
        current: u64,
        total: Option<u64>,
    },

    /// Progress completed successfully
    Completed {
        id: String,
        duration: Duration,
        total_processed: u64,
    },

    /// Progress failed
    Failed {
        id: String,
        failure: super::FailureContext,
        completed_items: u64,
    },
}

impl ProgressEvent {
    /// Create a simple progress started event
    pub fn started(id: impl Into<String>, operation: impl Into<String>, total: Option<u64>) -> Self {
        Self::Started {
            id: id.into(),
            operation: operation.into(),
            total,
        }
    }

    /// Create a progress update event
    pub fn updated(id: impl Into<String>, current: u64, total: Option<u64>) -> Self {
        Self::Updated {
            id: id.into(),
            current,
            total,
        }
    }

    /// Create a progress completed event
    pub fn completed(id: impl Into<String>, duration: Duration, total_processed: u64) -> Self {
        Self::Completed {
            id: id.into(),
            duration,
            total_processed,
        }
    }

    /// Create a progress failed event
    pub fn failed(
        id: impl Into<String>,
        failure: super::FailureContext,
        completed_items: u64,
    ) -> Self {
        Self::Failed {
            id: id.into(),
            failure,
            completed_items,
        }
    }
}

//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields so
//! debug log files carry the same information the terminal shows.

use kiln_events::{AppEvent, EventMessage, FetchEvent, GeneralEvent, ProgressEvent};
use tracing::{debug, error, info, warn};

/// Log an event using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    match &message.event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message, context } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    context = ?context,
                    "{message}"
                );
            }
            GeneralEvent::Error { message, details } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    details = ?details,
                    "{message}"
                );
            }
            GeneralEvent::DebugLog { message, context } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    context = ?context,
                    "{message}"
                );
            }
            GeneralEvent::OperationStarted { operation } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    "Operation started"
                );
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    success = success,
                    "Operation completed"
                );
            }
            GeneralEvent::OperationFailed { operation, error } => {
                error!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    operation = %operation,
                    error = %error,
                    "Operation failed"
                );
            }
        },

        AppEvent::Progress(progress) => match progress {
            ProgressEvent::Started {
                id,
                operation,
                total,
            } => {
                info!(
                    source = meta.source.as_str(),
                    progress_id = %id,
                    operation = %operation,
                    total = ?total,
                    "Progress started"
                );
            }
            ProgressEvent::Updated { id, current, total } => {
                debug!(
                    source = meta.source.as_str(),
                    progress_id = %id,
                    current = current,
                    total = ?total,
                    "Progress updated"
                );
            }
            ProgressEvent::Completed {
                id,
                duration,
                total_processed,
            } => {
                info!(
                    source = meta.source.as_str(),
                    progress_id = %id,
                    duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
                    total_processed = total_processed,
                    "Progress completed"
                );
            }
            ProgressEvent::Failed {
                id,
                failure,
                completed_items,
            } => {
                error!(
                    source = meta.source.as_str(),
                    progress_id = %id,
                    completed_items = completed_items,
                    code = ?failure.code,
                    message = %failure.message,
                    "Progress failed"
                );
            }
        },

        AppEvent::Fetch(fetch) => match fetch {
            FetchEvent::Started {
                package,
                transport,
                dest,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    package = %package,
                    transport = %transport,
                    dest = %dest.display(),
                    "Fetch started"
                );
            }
            FetchEvent::CacheHit { package, dest } => {
                debug!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    package = %package,
                    dest = %dest.display(),
                    "Cache hit"
                );
            }
            FetchEvent::Completed {
                package,
                hash,
                resolved,
            } => {
                info!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    package = %package,
                    hash = %hash,
                    resolved = ?resolved,
                    "Fetch completed"
                );
            }
            FetchEvent::Tolerated { package, failure } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    correlation = ?meta.correlation_id,
                    package = %package,
                    retryable = failure.retryable,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Optional package skipped"
                );
            }
            FetchEvent::CleanupFailed { path, message } => {
                warn!(
                    source = meta.source.as_str(),
                    event_id = %meta.event_id,
                    path = %path.display(),
                    message = %message,
                    "Cleanup failed"
                );
            }
            FetchEvent::Ticked {
                package,
                completed,
                total,
            } => {
                debug!(
                    source = meta.source.as_str(),
                    package = %package,
                    completed = completed,
                    total = total,
                    "Package finished"
                );
            }
        },
    }
}

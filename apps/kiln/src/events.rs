//! Event handling and user feedback

use crate::logging::log_event_with_tracing;
use console::{style, Term};
use kiln_events::{AppEvent, EventMessage, FetchEvent, GeneralEvent, ProgressEvent};
use std::collections::HashMap;

/// How a package ended up after a fetch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageStatus {
    Fetched,
    Cached,
    Skipped,
}

impl PackageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PackageStatus::Fetched => "fetched",
            PackageStatus::Cached => "cached",
            PackageStatus::Skipped => "skipped",
        }
    }
}

/// Event handler for status lines and per-package bookkeeping
pub struct EventHandler {
    colors_enabled: bool,
    /// Suppress terminal output (JSON mode)
    quiet: bool,
    debug_enabled: bool,
    /// Latest status by package name, for progress lines only
    statuses: HashMap<String, PackageStatus>,
    term: Term,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, quiet: bool, debug_enabled: bool) -> Self {
        Self {
            colors_enabled,
            quiet,
            debug_enabled,
            statuses: HashMap::new(),
            term: Term::stderr(),
        }
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: EventMessage) {
        log_event_with_tracing(&message);

        match message.event {
            AppEvent::Fetch(event) => self.handle_fetch_event(event),
            AppEvent::General(event) => self.handle_general_event(event),
            AppEvent::Progress(event) => self.handle_progress_event(&event),
        }
    }

    fn handle_fetch_event(&mut self, event: FetchEvent) {
        match event {
            FetchEvent::Started {
                package, transport, ..
            } => {
                if self.debug_enabled {
                    self.show_status(&format!("fetching {package} via {transport}"));
                }
            }
            FetchEvent::CacheHit { package, .. } => {
                self.statuses.insert(package, PackageStatus::Cached);
            }
            FetchEvent::Completed { package, .. } => {
                self.statuses.insert(package, PackageStatus::Fetched);
            }
            FetchEvent::Tolerated { package, failure } => {
                self.show_warning(&format!(
                    "skipped optional package {package}: {}",
                    failure.message
                ));
                self.statuses.insert(package, PackageStatus::Skipped);
            }
            FetchEvent::CleanupFailed { path, message } => {
                self.show_warning(&format!(
                    "could not remove {}: {message}",
                    path.display()
                ));
            }
            FetchEvent::Ticked {
                package,
                completed,
                total,
            } => {
                let label = match self.statuses.get(&package) {
                    Some(status) => status.as_str(),
                    None => "done",
                };
                self.show_status(&format!("[{completed}/{total}] {package} {label}"));
            }
        }
    }

    fn handle_general_event(&mut self, event: GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) => self.show_warning(&format!("{message} ({context})")),
                None => self.show_warning(&message),
            },
            GeneralEvent::Error { message, details } => match details {
                Some(details) => self.show_error(&format!("{message}: {details}")),
                None => self.show_error(&message),
            },
            GeneralEvent::DebugLog { message, .. } => {
                if self.debug_enabled {
                    self.show_status(&message);
                }
            }
            GeneralEvent::OperationStarted { .. }
            | GeneralEvent::OperationCompleted { .. }
            | GeneralEvent::OperationFailed { .. } => {}
        }
    }

    fn handle_progress_event(&mut self, event: &ProgressEvent) {
        if let ProgressEvent::Started {
            operation,
            total: Some(total),
            ..
        } = event
        {
            if *total > 0 {
                self.show_status(&format!("{operation}: {total} packages"));
            }
        }
    }

    fn show_status(&self, message: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(message);
    }

    fn show_warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let line = if self.colors_enabled {
            format!("{} {message}", style("warning:").yellow().bold())
        } else {
            format!("warning: {message}")
        };
        let _ = self.term.write_line(&line);
    }

    fn show_error(&self, message: &str) {
        if self.quiet {
            return;
        }
        let line = if self.colors_enabled {
            format!("{} {message}", style("error:").red().bold())
        } else {
            format!("error: {message}")
        };
        let _ = self.term.write_line(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_events::{EventEmitter, FailureContext};

    #[test]
    fn statuses_follow_fetch_events() {
        let (tx, mut rx) = kiln_events::channel();
        tx.emit_fetch(FetchEvent::CacheHit {
            package: "a".into(),
            dest: "/cache/a".into(),
        });
        tx.emit_fetch(FetchEvent::Completed {
            package: "b".into(),
            hash: "abc".into(),
            resolved: None,
        });
        tx.emit_fetch(FetchEvent::Tolerated {
            package: "c".into(),
            failure: FailureContext::new(None::<String>, "boom", None::<String>, false),
        });

        let mut handler = EventHandler::new(false, true, false);
        while let Ok(message) = rx.try_recv() {
            handler.handle_event(message);
        }

        assert_eq!(handler.statuses["a"], PackageStatus::Cached);
        assert_eq!(handler.statuses["b"], PackageStatus::Fetched);
        assert_eq!(handler.statuses["c"], PackageStatus::Skipped);
    }
}

//! Shared reporting context for a fetch run

use kiln_events::{EventEmitter, EventSender};

/// Carries the optional event channel through executor and policy
#[derive(Debug, Clone, Default)]
pub struct FetchContext {
    event_sender: Option<EventSender>,
}

impl FetchContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }
}

impl EventEmitter for FetchContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

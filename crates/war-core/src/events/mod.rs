//! Engine event buffering and the diagnostic log.

pub mod logger;

pub use logger::{DiagnosticLog, LogRecord};

use war_events::EngineEvent;

/// Events recorded by the engine since the last drain
#[derive(Debug, Default)]
pub struct PendingEvents {
    events: Vec<EngineEvent>,
}

impl PendingEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EngineEvent> {
        self.events.iter()
    }
}

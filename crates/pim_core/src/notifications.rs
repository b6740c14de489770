use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "description", rename_all = "snake_case")]
pub enum HistoryEvent {
    Undone,
    Redone,
    UndoAvailable(String),
    RedoAvailable(String),
}

/// Edit-menu adapters implement this trait. An empty description means the
/// action is no longer available.
pub trait HistorySink: Send + Sync {
    fn undone(&self);
    fn redone(&self);
    fn undo_available(&self, description: &str);
    fn redo_available(&self, description: &str);
}

/// Sink that keeps every notification in arrival order. Clones share the log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<HistoryEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<HistoryEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<HistoryEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn last(&self) -> Option<HistoryEvent> {
        self.events.lock().last().cloned()
    }

    fn push(&self, event: HistoryEvent) {
        self.events.lock().push(event);
    }
}

impl HistorySink for EventLog {
    fn undone(&self) {
        self.push(HistoryEvent::Undone);
    }

    fn redone(&self) {
        self.push(HistoryEvent::Redone);
    }

    fn undo_available(&self, description: &str) {
        self.push(HistoryEvent::UndoAvailable(description.to_string()));
    }

    fn redo_available(&self, description: &str) {
        self.push(HistoryEvent::RedoAvailable(description.to_string()));
    }
}

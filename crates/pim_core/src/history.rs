//! Linear undo/redo over incidence mutations.
//!
//! Every entry owns snapshots of the incidences it touched. Undo and redo
//! replay those snapshots against a [`Calendar`]; a replay step whose target
//! has vanished (or already exists) is skipped and the stacks move anyway.

use tracing::{debug, instrument, warn};

use crate::{
    calendar::Calendar,
    incidence::Incidence,
    notifications::HistorySink,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryEntry {
    Add {
        incidence: Incidence,
    },
    Delete {
        incidence: Incidence,
    },
    Edit {
        old: Incidence,
        new: Incidence,
    },
    Multi {
        description: String,
        entries: Vec<HistoryEntry>,
    },
}

impl HistoryEntry {
    pub fn description(&self) -> String {
        match self {
            HistoryEntry::Add { incidence } => format!("Add {}", incidence.kind().label()),
            HistoryEntry::Delete { incidence } => format!("Delete {}", incidence.kind().label()),
            HistoryEntry::Edit { new, .. } => format!("Edit {}", new.kind().label()),
            HistoryEntry::Multi { description, .. } => description.clone(),
        }
    }

    fn undo(&self, calendar: &dyn Calendar) {
        match self {
            HistoryEntry::Add { incidence } => remove_live(calendar, incidence.uid()),
            HistoryEntry::Delete { incidence } => restore(calendar, incidence),
            HistoryEntry::Edit { old, new } => {
                remove_live(calendar, new.uid());
                restore(calendar, old);
            }
            HistoryEntry::Multi { entries, .. } => {
                for entry in entries.iter().rev() {
                    entry.undo(calendar);
                }
            }
        }
    }

    fn redo(&self, calendar: &dyn Calendar) {
        match self {
            HistoryEntry::Add { incidence } => restore(calendar, incidence),
            HistoryEntry::Delete { incidence } => remove_live(calendar, incidence.uid()),
            HistoryEntry::Edit { old, new } => {
                remove_live(calendar, old.uid());
                restore(calendar, new);
            }
            HistoryEntry::Multi { entries, .. } => {
                for entry in entries {
                    entry.redo(calendar);
                }
            }
        }
    }
}

fn remove_live(calendar: &dyn Calendar, uid: &str) {
    let Some(live) = calendar.incidence_by_uid(uid) else {
        debug!(uid, "incidence already gone, skipping removal");
        return;
    };
    if let Err(err) = calendar.delete_incidence(&live) {
        warn!(uid, %err, "unable to remove incidence during replay");
    }
}

fn restore(calendar: &dyn Calendar, snapshot: &Incidence) {
    if let Err(err) = calendar.add_incidence(snapshot.clone()) {
        warn!(uid = snapshot.uid(), %err, "unable to restore incidence during replay");
    }
}

/// Undo and redo stacks for one calendar view.
///
/// Between [`start_multi_modify`](Self::start_multi_modify) and
/// [`end_multi_modify`](Self::end_multi_modify) recorded entries are
/// collected into the multi-entry on top of the undo stack and travel
/// between the stacks as one unit.
#[derive(Default)]
pub struct EditHistory {
    undo_stack: Vec<HistoryEntry>,
    redo_stack: Vec<HistoryEntry>,
    recording: bool,
    limit: Option<usize>,
    sink: Option<Box<dyn HistorySink>>,
}

impl EditHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `limit` top-level entries on the undo stack.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit.max(1));
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn HistorySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn record_add(&mut self, incidence: &Incidence) {
        self.record(HistoryEntry::Add {
            incidence: incidence.clone(),
        });
    }

    pub fn record_delete(&mut self, incidence: &Incidence) {
        self.record(HistoryEntry::Delete {
            incidence: incidence.clone(),
        });
    }

    pub fn record_edit(&mut self, old: &Incidence, new: &Incidence) {
        self.record(HistoryEntry::Edit {
            old: old.clone(),
            new: new.clone(),
        });
    }

    /// Opens a multi-entry; an already open one is closed first. The redo
    /// stack survives until the first child is recorded.
    #[instrument(skip(self))]
    pub fn start_multi_modify(&mut self, description: &str) {
        if self.recording {
            self.end_multi_modify();
        }
        self.push(HistoryEntry::Multi {
            description: description.to_string(),
            entries: Vec::new(),
        });
        self.recording = true;
    }

    /// Closes the open multi-entry. A multi-entry that collected nothing is
    /// dropped instead of leaving an empty undo step behind.
    pub fn end_multi_modify(&mut self) {
        if !self.recording {
            return;
        }
        self.recording = false;
        if matches!(self.undo_stack.last(), Some(HistoryEntry::Multi { entries, .. }) if entries.is_empty())
        {
            self.undo_stack.pop();
            debug!("dropping empty multi-entry");
            let description = top_description(&self.undo_stack);
            self.notify(|sink| sink.undo_available(&description));
        }
    }

    #[instrument(skip(self, calendar))]
    pub fn undo(&mut self, calendar: &dyn Calendar) -> bool {
        self.end_multi_modify();
        let Some(entry) = self.undo_stack.pop() else {
            debug!("undo stack empty, nothing to undo");
            return false;
        };
        debug!(description = %entry.description(), "undoing");
        entry.undo(calendar);
        self.redo_stack.push(entry);
        self.notify(|sink| sink.undone());
        self.announce_tops();
        true
    }

    #[instrument(skip(self, calendar))]
    pub fn redo(&mut self, calendar: &dyn Calendar) -> bool {
        self.end_multi_modify();
        let Some(entry) = self.redo_stack.pop() else {
            debug!("redo stack empty, nothing to redo");
            return false;
        };
        debug!(description = %entry.description(), "redoing");
        entry.redo(calendar);
        self.undo_stack.push(entry);
        self.notify(|sink| sink.redone());
        self.announce_tops();
        true
    }

    /// Drops everything that could be redone.
    pub fn truncate(&mut self) {
        if !self.redo_stack.is_empty() {
            debug!(dropped = self.redo_stack.len(), "truncating redo stack");
        }
        self.redo_stack.clear();
        self.notify(|sink| sink.redo_available(""));
    }

    pub fn clear(&mut self) {
        self.recording = false;
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.notify(|sink| sink.undo_available(""));
        self.notify(|sink| sink.redo_available(""));
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_description(&self) -> Option<String> {
        self.undo_stack.last().map(HistoryEntry::description)
    }

    pub fn redo_description(&self) -> Option<String> {
        self.redo_stack.last().map(HistoryEntry::description)
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn undo_entries(&self) -> &[HistoryEntry] {
        &self.undo_stack
    }

    pub fn redo_entries(&self) -> &[HistoryEntry] {
        &self.redo_stack
    }

    fn record(&mut self, entry: HistoryEntry) {
        if self.recording {
            if let Some(HistoryEntry::Multi { entries, .. }) = self.undo_stack.last_mut() {
                let first_child = entries.is_empty();
                entries.push(entry);
                if first_child {
                    self.truncate();
                }
                return;
            }
            warn!("open multi-entry missing from undo stack");
            self.recording = false;
        }

        self.truncate();
        self.push(entry);
    }

    fn push(&mut self, entry: HistoryEntry) {
        let description = entry.description();
        self.undo_stack.push(entry);
        if let Some(limit) = self.limit {
            if self.undo_stack.len() > limit {
                let excess = self.undo_stack.len() - limit;
                self.undo_stack.drain(..excess);
                debug!(excess, "evicted oldest history entries");
            }
        }
        self.notify(|sink| sink.undo_available(&description));
    }

    fn announce_tops(&self) {
        let undo = top_description(&self.undo_stack);
        let redo = top_description(&self.redo_stack);
        self.notify(|sink| sink.undo_available(&undo));
        self.notify(|sink| sink.redo_available(&redo));
    }

    fn notify(&self, f: impl FnOnce(&dyn HistorySink)) {
        if let Some(sink) = &self.sink {
            f(sink.as_ref());
        }
    }
}

fn top_description(stack: &[HistoryEntry]) -> String {
    stack.last().map(HistoryEntry::description).unwrap_or_default()
}

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use parking_lot::Mutex;
use pim_core::{
    completion::{toggle_completed, ToggleOutcome},
    notifications::HistorySink,
    Calendar, EditHistory, Incidence, MemoryCalendar,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// A recorded editing session: the calendar it starts from and the user
/// actions performed on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionScript {
    #[serde(default)]
    pub incidences: Vec<Incidence>,
    #[serde(default)]
    pub steps: Vec<SessionStep>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SessionStep {
    Add { incidence: Incidence },
    Delete { uid: String },
    Edit { incidence: Incidence },
    Toggle { uid: String, date: NaiveDate },
    Undo,
    Redo,
    BeginGroup { description: String },
    EndGroup,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionReport {
    pub incidences: Vec<Incidence>,
    pub undo_label: Option<String>,
    pub redo_label: Option<String>,
}

#[derive(Debug, Default)]
struct MenuLabels {
    undo: Option<String>,
    redo: Option<String>,
}

/// Keeps the Edit menu's undo/redo labels current.
#[derive(Debug, Clone, Default)]
pub struct EditMenu {
    labels: Arc<Mutex<MenuLabels>>,
}

impl EditMenu {
    pub fn undo_label(&self) -> Option<String> {
        self.labels.lock().undo.clone()
    }

    pub fn redo_label(&self) -> Option<String> {
        self.labels.lock().redo.clone()
    }
}

fn menu_label(action: &str, description: &str) -> Option<String> {
    (!description.is_empty()).then(|| format!("{action}: {description}"))
}

impl HistorySink for EditMenu {
    fn undone(&self) {
        debug!("edit undone");
    }

    fn redone(&self) {
        debug!("edit redone");
    }

    fn undo_available(&self, description: &str) {
        self.labels.lock().undo = menu_label("Undo", description);
    }

    fn redo_available(&self, description: &str) {
        self.labels.lock().redo = menu_label("Redo", description);
    }
}

/// Calendar plus its edit history, mutated the way a calendar view does:
/// change the store first, then record what changed.
pub struct CalendarSession {
    calendar: MemoryCalendar,
    history: EditHistory,
    menu: EditMenu,
}

impl CalendarSession {
    pub fn new(incidences: Vec<Incidence>, history_limit: usize) -> Result<Self> {
        let calendar = MemoryCalendar::builder()
            .add_incidences(incidences)
            .build()
            .context("failed to load initial incidences")?;
        let menu = EditMenu::default();
        let history = EditHistory::new()
            .with_limit(history_limit)
            .with_sink(Box::new(menu.clone()));
        Ok(Self {
            calendar,
            history,
            menu,
        })
    }

    pub fn calendar(&self) -> &MemoryCalendar {
        &self.calendar
    }

    pub fn history(&self) -> &EditHistory {
        &self.history
    }

    pub fn add(&mut self, incidence: Incidence) -> Result<()> {
        self.calendar.add_incidence(incidence.clone())?;
        self.history.record_add(&incidence);
        Ok(())
    }

    pub fn delete(&mut self, uid: &str) -> Result<()> {
        let incidence = self.lookup(uid)?;
        self.calendar.delete_incidence(&incidence)?;
        self.history.record_delete(&incidence);
        Ok(())
    }

    pub fn edit(&mut self, incidence: Incidence) -> Result<()> {
        let old = self.lookup(incidence.uid())?;
        self.calendar.modify_incidence(incidence.clone())?;
        self.history.record_edit(&old, &incidence);
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn toggle(&mut self, uid: &str, date: NaiveDate) -> Result<ToggleOutcome> {
        let old = self.lookup(uid)?;
        let mut new = old.clone();
        let todo = new
            .as_todo_mut()
            .ok_or_else(|| anyhow!("incidence `{uid}` is not a to-do"))?;
        let outcome = toggle_completed(todo, date);
        if outcome == ToggleOutcome::Unchanged {
            return Ok(outcome);
        }
        self.calendar.modify_incidence(new.clone())?;
        self.history.record_edit(&old, &new);
        Ok(outcome)
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&self.calendar)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&self.calendar)
    }

    pub fn begin_group(&mut self, description: &str) {
        self.history.start_multi_modify(description);
    }

    pub fn end_group(&mut self) {
        self.history.end_multi_modify();
    }

    pub fn apply(&mut self, step: SessionStep) -> Result<()> {
        match step {
            SessionStep::Add { incidence } => self.add(incidence),
            SessionStep::Delete { uid } => self.delete(&uid),
            SessionStep::Edit { incidence } => self.edit(incidence),
            SessionStep::Toggle { uid, date } => {
                let outcome = self.toggle(&uid, date)?;
                info!(%uid, %date, ?outcome, "toggled completion");
                Ok(())
            }
            SessionStep::Undo => {
                self.undo();
                Ok(())
            }
            SessionStep::Redo => {
                self.redo();
                Ok(())
            }
            SessionStep::BeginGroup { description } => {
                self.begin_group(&description);
                Ok(())
            }
            SessionStep::EndGroup => {
                self.end_group();
                Ok(())
            }
        }
    }

    pub fn report(&self) -> SessionReport {
        SessionReport {
            incidences: self.calendar.incidences(),
            undo_label: self.menu.undo_label(),
            redo_label: self.menu.redo_label(),
        }
    }

    fn lookup(&self, uid: &str) -> Result<Incidence> {
        self.calendar
            .incidence_by_uid(uid)
            .ok_or_else(|| anyhow!("no incidence with uid `{uid}`"))
    }
}

pub fn replay(script: SessionScript, history_limit: usize) -> Result<SessionReport> {
    let mut session = CalendarSession::new(script.incidences, history_limit)?;
    for (index, step) in script.steps.into_iter().enumerate() {
        session
            .apply(step)
            .with_context(|| format!("session step {index} failed"))?;
    }
    Ok(session.report())
}

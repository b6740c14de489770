use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::recurrence::RecurrenceRule;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IncidenceKind {
    Event,
    Todo,
    Journal,
}

impl IncidenceKind {
    /// Label fragment used in history descriptions such as "Add Event".
    pub fn label(self) -> &'static str {
        match self {
            IncidenceKind::Event => "Event",
            IncidenceKind::Todo => "Todo",
            IncidenceKind::Journal => "Journal",
        }
    }
}

/// Fields shared by every kind of incidence.
///
/// Instants are kept in UTC next to the zone they belong to; local views are
/// derived on demand through [`IncidenceCommon::to_local`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidenceCommon {
    #[serde(default = "generate_uid")]
    pub uid: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,
    #[serde(default)]
    pub dt_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence: Option<RecurrenceRule>,
}

impl IncidenceCommon {
    pub fn new(summary: impl Into<String>, dt_start: Option<DateTime<Tz>>) -> Self {
        let time_zone = dt_start
            .as_ref()
            .map(|start| start.timezone())
            .unwrap_or_else(default_time_zone);
        Self {
            uid: generate_uid(),
            summary: summary.into(),
            description: String::new(),
            categories: Vec::new(),
            time_zone,
            dt_start: dt_start.map(|start| start.with_timezone(&Utc)),
            recurrence: None,
        }
    }

    pub fn to_local(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.time_zone)
    }

    pub fn dt_start_local(&self) -> Option<DateTime<Tz>> {
        self.dt_start.map(|start| self.to_local(start))
    }

    /// A rule only takes effect once there is a start to anchor it on.
    pub fn recurs(&self) -> bool {
        self.recurrence.is_some() && self.dt_start.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    #[serde(flatten)]
    pub common: IncidenceCommon,
    #[serde(default)]
    pub dt_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
}

impl Event {
    pub fn new(summary: impl Into<String>, dt_start: DateTime<Tz>) -> Self {
        Self {
            common: IncidenceCommon::new(summary, Some(dt_start)),
            dt_end: None,
            all_day: false,
        }
    }

    pub fn with_end(mut self, dt_end: DateTime<Tz>) -> Self {
        self.dt_end = Some(dt_end.with_timezone(&Utc));
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Todo {
    #[serde(flatten)]
    pub common: IncidenceCommon,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: u8,
    #[serde(default)]
    completed: bool,
    #[serde(default)]
    completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    percent_complete: u8,
    #[serde(default)]
    dt_recurrence: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn new(summary: impl Into<String>, dt_start: Option<DateTime<Tz>>) -> Self {
        Self {
            common: IncidenceCommon::new(summary, dt_start),
            due: None,
            priority: 0,
            completed: false,
            completed_at: None,
            percent_complete: 0,
            dt_recurrence: None,
        }
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.common.recurrence = Some(rule);
        self
    }

    pub fn uid(&self) -> &str {
        &self.common.uid
    }

    pub fn time_zone(&self) -> Tz {
        self.common.time_zone
    }

    pub fn recurrence(&self) -> Option<&RecurrenceRule> {
        self.common.recurrence.as_ref()
    }

    pub fn recurs(&self) -> bool {
        self.common.recurs()
    }

    pub fn dt_start_local(&self) -> Option<DateTime<Tz>> {
        self.common.dt_start_local()
    }

    /// The pending occurrence of a recurring to-do. Before any occurrence has
    /// been completed this is the start itself.
    pub fn dt_recurrence(&self) -> Option<DateTime<Tz>> {
        self.dt_recurrence
            .or(self.common.dt_start)
            .map(|instant| self.common.to_local(instant))
    }

    pub fn set_dt_recurrence<Z: TimeZone>(&mut self, at: DateTime<Z>) {
        self.dt_recurrence = Some(at.with_timezone(&Utc));
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn percent_complete(&self) -> u8 {
        self.percent_complete
    }

    pub fn set_completed(&mut self, at: DateTime<Utc>) {
        self.completed = true;
        self.completed_at = Some(at);
        self.percent_complete = 100;
    }

    pub fn set_incomplete(&mut self) {
        self.completed = false;
        self.completed_at = None;
        self.percent_complete = 0;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Journal {
    #[serde(flatten)]
    pub common: IncidenceCommon,
}

impl Journal {
    pub fn new(summary: impl Into<String>, dt_start: DateTime<Tz>) -> Self {
        Self {
            common: IncidenceCommon::new(summary, Some(dt_start)),
        }
    }
}

/// A schedulable item as stored by a calendar. `Clone` produces a detached
/// snapshot that keeps the uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Incidence {
    Event(Event),
    Todo(Todo),
    Journal(Journal),
}

impl Incidence {
    pub fn kind(&self) -> IncidenceKind {
        match self {
            Incidence::Event(_) => IncidenceKind::Event,
            Incidence::Todo(_) => IncidenceKind::Todo,
            Incidence::Journal(_) => IncidenceKind::Journal,
        }
    }

    pub fn common(&self) -> &IncidenceCommon {
        match self {
            Incidence::Event(event) => &event.common,
            Incidence::Todo(todo) => &todo.common,
            Incidence::Journal(journal) => &journal.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut IncidenceCommon {
        match self {
            Incidence::Event(event) => &mut event.common,
            Incidence::Todo(todo) => &mut todo.common,
            Incidence::Journal(journal) => &mut journal.common,
        }
    }

    pub fn uid(&self) -> &str {
        &self.common().uid
    }

    pub fn summary(&self) -> &str {
        &self.common().summary
    }

    pub fn recurs(&self) -> bool {
        self.common().recurs()
    }

    pub fn as_todo(&self) -> Option<&Todo> {
        match self {
            Incidence::Todo(todo) => Some(todo),
            _ => None,
        }
    }

    pub fn as_todo_mut(&mut self) -> Option<&mut Todo> {
        match self {
            Incidence::Todo(todo) => Some(todo),
            _ => None,
        }
    }
}

impl From<Event> for Incidence {
    fn from(event: Event) -> Self {
        Incidence::Event(event)
    }
}

impl From<Todo> for Incidence {
    fn from(todo: Todo) -> Self {
        Incidence::Todo(todo)
    }
}

impl From<Journal> for Incidence {
    fn from(journal: Journal) -> Self {
        Incidence::Journal(journal)
    }
}

fn generate_uid() -> String {
    Uuid::new_v4().to_string()
}

fn default_time_zone() -> Tz {
    Tz::UTC
}

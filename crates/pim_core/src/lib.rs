pub mod calendar;
pub mod completion;
pub mod error;
pub mod history;
pub mod incidence;
pub mod notifications;
pub mod recurrence;

pub use crate::calendar::{Calendar, MemoryCalendar, MemoryCalendarBuilder};
pub use crate::completion::{toggle_completed, ToggleOutcome};
pub use crate::error::CalendarError;
pub use crate::history::{EditHistory, HistoryEntry};
pub use crate::incidence::{Incidence, IncidenceKind};

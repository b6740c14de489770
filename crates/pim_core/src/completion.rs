//! Completion toggling for single and recurring to-dos.
//!
//! A recurring to-do carries a cursor (`dt_recurrence`) on its pending
//! occurrence. Completing that occurrence moves the cursor to the next one;
//! completing the final occurrence completes the whole to-do. Toggling an
//! occurrence before the cursor, or any occurrence of a completed to-do,
//! reopens the series at that occurrence, which makes two toggles on the same
//! date cancel out.
//!
//! Occurrences are matched by their date in the to-do's own time zone. A date
//! before the series stands for the first occurrence. A date after a bounded
//! series reopens its last occurrence once the to-do is complete and is
//! otherwise ignored, so the cursor never leaves the series.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, instrument, warn};

use crate::{incidence::Todo, recurrence::resolve_local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The to-do as a whole is now complete.
    Completed,
    /// The to-do is open again; for a recurring to-do the cursor moved back.
    Reopened,
    /// One occurrence was completed and the cursor moved forward.
    Advanced,
    /// Nothing changed: the date follows the series of an open to-do, or no
    /// occurrence could be placed on the local clock.
    Unchanged,
}

pub fn toggle_completed(todo: &mut Todo, occurrence_date: NaiveDate) -> ToggleOutcome {
    toggle_completed_with_clock(todo, occurrence_date, Utc::now())
}

/// Toggles the occurrence that `instant` falls on, using the date it has in
/// the to-do's zone.
pub fn toggle_occurrence_at(todo: &mut Todo, instant: DateTime<Utc>) -> ToggleOutcome {
    let local_date = instant.with_timezone(&todo.time_zone()).date_naive();
    toggle_completed(todo, local_date)
}

#[instrument(skip(todo, now), fields(uid = %todo.uid()))]
pub fn toggle_completed_with_clock(
    todo: &mut Todo,
    occurrence_date: NaiveDate,
    now: DateTime<Utc>,
) -> ToggleOutcome {
    let (Some(rule), Some(start), Some(cursor)) = (
        todo.recurrence().cloned(),
        todo.dt_start_local(),
        todo.dt_recurrence(),
    ) else {
        return if todo.is_completed() {
            todo.set_incomplete();
            ToggleOutcome::Reopened
        } else {
            todo.set_completed(now);
            ToggleOutcome::Completed
        };
    };

    let occurrence = match rule.occurrence_on(start, occurrence_date) {
        Some(occurrence) => occurrence,
        None if occurrence_date < start.date_naive() => {
            let Some(first) = rule.occurrences(start).next() else {
                warn!("recurrence produces no occurrences");
                return ToggleOutcome::Unchanged;
            };
            debug!(%occurrence_date, at = %first, "date precedes the series");
            first
        }
        None => match rule.last_occurrence(start) {
            Some(last) if occurrence_date > last.date_naive() => {
                if !todo.is_completed() {
                    debug!(%occurrence_date, "date follows the series, cursor stays");
                    return ToggleOutcome::Unchanged;
                }
                debug!(%occurrence_date, at = %last, "date follows the series, reopening last occurrence");
                todo.set_dt_recurrence(last);
                todo.set_incomplete();
                return ToggleOutcome::Reopened;
            }
            _ => match resolve_local(&todo.time_zone(), occurrence_date.and_time(cursor.time())) {
                Some(occurrence) => occurrence,
                None => {
                    warn!(%occurrence_date, "occurrence time does not exist locally");
                    return ToggleOutcome::Unchanged;
                }
            },
        },
    };

    if todo.is_completed() || occurrence < cursor {
        debug!(from = %cursor, to = %occurrence, "reopening recurring to-do");
        todo.set_dt_recurrence(occurrence);
        todo.set_incomplete();
        return ToggleOutcome::Reopened;
    }

    match rule.next_after(start, occurrence) {
        Some(next) => {
            debug!(from = %cursor, to = %next, "advancing recurrence cursor");
            todo.set_dt_recurrence(next);
            ToggleOutcome::Advanced
        }
        None => {
            debug!(at = %occurrence, "final occurrence completed");
            todo.set_dt_recurrence(occurrence);
            todo.set_completed(now);
            ToggleOutcome::Completed
        }
    }
}

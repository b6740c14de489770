use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::{America::Winnipeg, Asia::Tokyo, Tz};

use pim_core::{
    completion::{toggle_completed, ToggleOutcome},
    incidence::Todo,
    recurrence::RecurrenceRule,
};

fn three_day_todo(start: DateTime<Tz>) -> Todo {
    Todo::new("Daily stand-up notes", Some(start))
        .with_recurrence(RecurrenceRule::daily().count(3))
}

fn local_day(start: DateTime<Tz>, offset: i64) -> NaiveDate {
    start.date_naive() + Duration::days(offset)
}

fn cursor_date(todo: &Todo) -> NaiveDate {
    todo.dt_recurrence().expect("recurring to-do has a cursor").date_naive()
}

#[test]
fn non_recurring_toggle_is_an_involution() {
    let mut todo = Todo::new("Buy milk", None);
    let any_day = NaiveDate::from_ymd_opt(2022, 10, 13).unwrap();

    toggle_completed(&mut todo, any_day);
    assert!(todo.is_completed());
    toggle_completed(&mut todo, any_day);
    assert!(!todo.is_completed());
}

#[test]
fn toggling_each_occurrence_advances_and_restores() {
    let start = Tz::UTC.with_ymd_and_hms(2022, 10, 13, 0, 0, 0).unwrap();
    let (day1, day2, day3) = (
        local_day(start, 0),
        local_day(start, 1),
        local_day(start, 2),
    );
    let mut todo = three_day_todo(start);

    assert_eq!(toggle_completed(&mut todo, day1), ToggleOutcome::Advanced);
    assert_eq!(cursor_date(&todo), day2);
    assert!(!todo.is_completed());
    assert_eq!(toggle_completed(&mut todo, day1), ToggleOutcome::Reopened);
    assert_eq!(cursor_date(&todo), day1);
    assert!(!todo.is_completed());

    toggle_completed(&mut todo, day1);
    assert_eq!(toggle_completed(&mut todo, day2), ToggleOutcome::Advanced);
    assert_eq!(cursor_date(&todo), day3);
    toggle_completed(&mut todo, day2);
    assert_eq!(cursor_date(&todo), day2);
    assert!(!todo.is_completed());

    toggle_completed(&mut todo, day2);
    assert_eq!(toggle_completed(&mut todo, day3), ToggleOutcome::Completed);
    assert!(todo.is_completed());
    assert_eq!(cursor_date(&todo), day3);
    assert_eq!(toggle_completed(&mut todo, day3), ToggleOutcome::Reopened);
    assert!(!todo.is_completed());
    assert_eq!(cursor_date(&todo), day3);
}

#[test]
fn toggling_earlier_occurrence_after_later_one_reopens_from_it() {
    let start = Tz::UTC.with_ymd_and_hms(2022, 10, 13, 0, 0, 0).unwrap();
    let mut todo = three_day_todo(start);

    toggle_completed(&mut todo, local_day(start, 1));
    assert_eq!(cursor_date(&todo), local_day(start, 2));

    toggle_completed(&mut todo, local_day(start, 0));
    assert_eq!(cursor_date(&todo), local_day(start, 0));
    assert!(!todo.is_completed());
}

#[test]
fn eastern_zone_uses_local_dates() {
    let start = Tokyo.with_ymd_and_hms(2022, 10, 13, 0, 0, 0).unwrap();
    assert_eq!(
        start.naive_utc().date(),
        NaiveDate::from_ymd_opt(2022, 10, 12).unwrap()
    );
    let mut todo = three_day_todo(start);
    let day1 = local_day(start, 0);

    toggle_completed(&mut todo, day1);
    assert_eq!(cursor_date(&todo), local_day(start, 1));
    assert!(!todo.is_completed());

    toggle_completed(&mut todo, day1);
    assert_eq!(todo.dt_recurrence(), Some(start));
    assert!(!todo.is_completed());
}

#[test]
fn western_zone_completes_on_final_local_date() {
    let start = Winnipeg.with_ymd_and_hms(2022, 10, 13, 19, 0, 0).unwrap();
    assert_eq!(
        start.naive_utc().date(),
        NaiveDate::from_ymd_opt(2022, 10, 14).unwrap()
    );
    let mut todo = three_day_todo(start);
    let day3 = local_day(start, 2);

    toggle_completed(&mut todo, local_day(start, 0));
    toggle_completed(&mut todo, local_day(start, 1));
    assert_eq!(toggle_completed(&mut todo, day3), ToggleOutcome::Completed);
    assert!(todo.is_completed());
    assert_eq!(cursor_date(&todo), day3);

    assert_eq!(toggle_completed(&mut todo, day3), ToggleOutcome::Reopened);
    assert!(!todo.is_completed());
    assert_eq!(cursor_date(&todo), day3);
    assert_eq!(
        todo.dt_recurrence().unwrap(),
        Winnipeg.with_ymd_and_hms(2022, 10, 15, 19, 0, 0).unwrap()
    );
}

#[test]
fn date_after_open_series_leaves_cursor_in_place() {
    let start = Tz::UTC.with_ymd_and_hms(2022, 10, 13, 0, 0, 0).unwrap();
    let mut todo = three_day_todo(start);
    let next_week = local_day(start, 7);

    assert_eq!(toggle_completed(&mut todo, next_week), ToggleOutcome::Unchanged);
    assert!(!todo.is_completed());
    assert_eq!(todo.dt_recurrence(), Some(start));

    toggle_completed(&mut todo, local_day(start, 0));
    assert_eq!(toggle_completed(&mut todo, next_week), ToggleOutcome::Unchanged);
    assert_eq!(cursor_date(&todo), local_day(start, 1));
}

#[test]
fn date_after_completed_series_reopens_last_occurrence() {
    let start = Tz::UTC.with_ymd_and_hms(2022, 10, 13, 0, 0, 0).unwrap();
    let mut todo = three_day_todo(start);
    let day3 = local_day(start, 2);

    assert_eq!(toggle_completed(&mut todo, day3), ToggleOutcome::Completed);
    assert!(todo.is_completed());

    assert_eq!(
        toggle_completed(&mut todo, local_day(start, 7)),
        ToggleOutcome::Reopened
    );
    assert!(!todo.is_completed());
    assert_eq!(todo.completed_at(), None);
    assert_eq!(cursor_date(&todo), day3);

    assert_eq!(toggle_completed(&mut todo, day3), ToggleOutcome::Completed);
    assert_eq!(cursor_date(&todo), day3);
}

#[test]
fn date_before_series_stands_for_first_occurrence() {
    let start = Tz::UTC.with_ymd_and_hms(2022, 10, 13, 0, 0, 0).unwrap();
    let mut todo = three_day_todo(start);
    let early = NaiveDate::from_ymd_opt(2022, 10, 1).unwrap();

    assert_eq!(toggle_completed(&mut todo, early), ToggleOutcome::Advanced);
    assert_eq!(cursor_date(&todo), local_day(start, 1));

    assert_eq!(toggle_completed(&mut todo, early), ToggleOutcome::Reopened);
    assert_eq!(todo.dt_recurrence(), Some(start));
    assert!(!todo.is_completed());
}

#[test]
fn date_before_completed_series_reopens_from_the_start() {
    let start = Winnipeg.with_ymd_and_hms(2022, 10, 13, 19, 0, 0).unwrap();
    let mut todo = three_day_todo(start);

    toggle_completed(&mut todo, local_day(start, 2));
    assert!(todo.is_completed());

    assert_eq!(
        toggle_completed(&mut todo, local_day(start, -5)),
        ToggleOutcome::Reopened
    );
    assert!(!todo.is_completed());
    assert_eq!(todo.dt_recurrence(), Some(start));
}

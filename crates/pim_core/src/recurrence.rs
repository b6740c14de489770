use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Upper bound on consecutive periods without a valid candidate (e.g. a
/// monthly rule anchored on the 31st, or a day a zone skipped entirely). Guards against rules that can never
/// produce another occurrence.
const MAX_SKIPPED_PERIODS: u32 = 48;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceEnd {
    #[default]
    Never,
    Count(u32),
    Until(DateTime<Utc>),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub end: RecurrenceEnd,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            end: RecurrenceEnd::Never,
        }
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    pub fn weekly() -> Self {
        Self::new(Frequency::Weekly)
    }

    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    pub fn yearly() -> Self {
        Self::new(Frequency::Yearly)
    }

    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval.max(1);
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.end = RecurrenceEnd::Count(count);
        self
    }

    pub fn until<Z: TimeZone>(mut self, until: DateTime<Z>) -> Self {
        self.end = RecurrenceEnd::Until(until.with_timezone(&Utc));
        self
    }

    /// Occurrences anchored at `start`, in order. Stepping happens on the
    /// local wall clock of `start`'s zone.
    pub fn occurrences(&self, start: DateTime<Tz>) -> Occurrences<'_> {
        Occurrences {
            rule: self,
            start,
            period: 0,
            emitted: 0,
            skipped: 0,
        }
    }

    pub fn next_after(&self, start: DateTime<Tz>, after: DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.occurrences(start).find(|occurrence| *occurrence > after)
    }

    /// The last occurrence of a bounded rule; `None` when unbounded.
    pub fn last_occurrence(&self, start: DateTime<Tz>) -> Option<DateTime<Tz>> {
        if self.end == RecurrenceEnd::Never {
            return None;
        }
        self.occurrences(start).last()
    }

    /// The occurrence falling on `date` in the zone of `start`.
    pub fn occurrence_on(&self, start: DateTime<Tz>, date: NaiveDate) -> Option<DateTime<Tz>> {
        self.occurrences(start)
            .take_while(|occurrence| occurrence.date_naive() <= date)
            .find(|occurrence| occurrence.date_naive() == date)
    }

    pub fn is_final(&self, start: DateTime<Tz>, occurrence: DateTime<Tz>) -> bool {
        self.next_after(start, occurrence).is_none()
    }

    /// Occurrences still to come after `occurrence`; `None` when unbounded.
    pub fn remaining_after(&self, start: DateTime<Tz>, occurrence: DateTime<Tz>) -> Option<u32> {
        if self.end == RecurrenceEnd::Never {
            return None;
        }
        let remaining = self
            .occurrences(start)
            .filter(|candidate| *candidate > occurrence)
            .count();
        Some(u32::try_from(remaining).unwrap_or(u32::MAX))
    }

    fn local_candidate(&self, base: NaiveDateTime, step: u32) -> Option<NaiveDateTime> {
        match self.frequency {
            Frequency::Daily => base.checked_add_signed(Duration::days(i64::from(step))),
            Frequency::Weekly => base.checked_add_signed(Duration::weeks(i64::from(step))),
            Frequency::Monthly => {
                let total = i64::from(base.month0()) + i64::from(step);
                let year = i32::try_from(i64::from(base.year()) + total / 12).ok()?;
                let month = u32::try_from(total % 12).ok()? + 1;
                NaiveDate::from_ymd_opt(year, month, base.day()).map(|date| date.and_time(base.time()))
            }
            Frequency::Yearly => {
                let year = base.year().checked_add(i32::try_from(step).ok()?)?;
                NaiveDate::from_ymd_opt(year, base.month(), base.day())
                    .map(|date| date.and_time(base.time()))
            }
        }
    }
}

pub struct Occurrences<'a> {
    rule: &'a RecurrenceRule,
    start: DateTime<Tz>,
    period: u32,
    emitted: u32,
    skipped: u32,
}

impl Iterator for Occurrences<'_> {
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        if let RecurrenceEnd::Count(count) = self.rule.end {
            if self.emitted >= count {
                return None;
            }
        }

        loop {
            let step = self.period.checked_mul(self.rule.interval.max(1))?;
            self.period = self.period.checked_add(1)?;

            let Some(occurrence) = self
                .rule
                .local_candidate(self.start.naive_local(), step)
                .and_then(|naive| resolve_local(&self.start.timezone(), naive))
            else {
                self.skipped += 1;
                if self.skipped > MAX_SKIPPED_PERIODS {
                    return None;
                }
                continue;
            };
            self.skipped = 0;

            if let RecurrenceEnd::Until(until) = self.rule.end {
                if occurrence.with_timezone(&Utc) > until {
                    return None;
                }
            }
            self.emitted += 1;
            return Some(occurrence);
        }
    }
}

/// Maps a wall-clock time onto `zone`. Ambiguous times take the earlier
/// instant; times inside a DST gap move forward by an hour.
pub fn resolve_local(zone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    zone.from_local_datetime(&naive).earliest().or_else(|| {
        naive
            .checked_add_signed(Duration::hours(1))
            .and_then(|shifted| zone.from_local_datetime(&shifted).earliest())
    })
}

fn default_interval() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use chrono_tz::{America::Winnipeg, Europe::Berlin, Pacific::Apia, Tz::UTC};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn daily_count_produces_exact_number_of_occurrences() {
        let start = UTC.with_ymd_and_hms(2022, 10, 13, 9, 0, 0).unwrap();
        let rule = RecurrenceRule::daily().count(3);
        let dates: Vec<NaiveDate> = rule
            .occurrences(start)
            .map(|occurrence| occurrence.date_naive())
            .collect();
        assert_eq!(dates, vec![date(2022, 10, 13), date(2022, 10, 14), date(2022, 10, 15)]);
    }

    #[test]
    fn monthly_rule_skips_missing_days_without_consuming_count() {
        let start = UTC.with_ymd_and_hms(2025, 1, 31, 8, 0, 0).unwrap();
        let rule = RecurrenceRule::monthly().count(3);
        let dates: Vec<NaiveDate> = rule
            .occurrences(start)
            .map(|occurrence| occurrence.date_naive())
            .collect();
        assert_eq!(dates, vec![date(2025, 1, 31), date(2025, 3, 31), date(2025, 5, 31)]);
    }

    #[test]
    fn until_bounds_the_series() {
        let start = UTC.with_ymd_and_hms(2025, 6, 2, 7, 30, 0).unwrap();
        let until = UTC.with_ymd_and_hms(2025, 6, 16, 7, 30, 0).unwrap();
        let rule = RecurrenceRule::weekly().until(until);
        assert_eq!(rule.occurrences(start).count(), 3);
        assert_eq!(rule.remaining_after(start, start), Some(2));
    }

    #[test]
    fn local_time_survives_dst_transition() {
        let start = Berlin.with_ymd_and_hms(2025, 3, 29, 9, 0, 0).unwrap();
        let rule = RecurrenceRule::daily().count(2);
        let second = rule.occurrences(start).nth(1).expect("second occurrence");
        assert_eq!(second.time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(second - start, Duration::hours(23));
    }

    #[test]
    fn occurrence_lookup_uses_local_dates() {
        let start = Winnipeg.with_ymd_and_hms(2022, 10, 13, 19, 0, 0).unwrap();
        let rule = RecurrenceRule::daily().count(3);

        let last = rule.occurrence_on(start, date(2022, 10, 15)).expect("local day three");
        assert_eq!(last.with_timezone(&Utc).date_naive(), date(2022, 10, 16));
        assert!(rule.is_final(start, last));
        assert!(rule.occurrence_on(start, date(2022, 10, 16)).is_none());
    }

    #[test]
    fn next_after_respects_interval() {
        let start = UTC.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        let rule = RecurrenceRule::yearly().every(2);
        let next = rule.next_after(start, start).expect("next leap day");
        assert_eq!(next.date_naive(), date(2028, 2, 29));
        assert_eq!(rule.remaining_after(start, start), None);
    }

    #[test]
    fn skipped_local_day_does_not_end_the_series() {
        // Apia jumped from the end of 2011-12-29 straight to 2011-12-31.
        let start = Apia.with_ymd_and_hms(2011, 12, 29, 9, 0, 0).unwrap();
        let rule = RecurrenceRule::daily().count(3);
        let dates: Vec<NaiveDate> = rule
            .occurrences(start)
            .map(|occurrence| occurrence.date_naive())
            .collect();
        assert_eq!(dates, vec![date(2011, 12, 29), date(2011, 12, 31), date(2012, 1, 1)]);
        assert!(!rule.is_final(start, start));
        assert_eq!(
            rule.last_occurrence(start).map(|last| last.date_naive()),
            Some(date(2012, 1, 1))
        );
        assert_eq!(RecurrenceRule::daily().last_occurrence(start), None);
    }
}

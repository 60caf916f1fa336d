//! Recurrence arithmetic.
//!
//! A rule is a cadence (weekday set every N weeks, or every N days), a local
//! time of day, a timezone and an anchor date. The next occurrence after an
//! instant is computed directly per weekday instead of walking day by day, and
//! each candidate is converted from wall-clock time at resolution time so a
//! meeting keeps its local time across DST transitions.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, Utc, Weekday};
use chrono_tz::Tz;
use kunai_core::types::{Cadence, WeekdaySet};

use crate::error::{TimeError, TimeResult};
use crate::timezone::local_to_utc;

/// One concrete instance produced by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Occurrence {
    /// Local calendar date in the rule's timezone. Stable identity of the occurrence.
    pub date: NaiveDate,
    pub at: DateTime<Utc>,
}

/// Half-open range `[start, end)` of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    Inclusive,
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub cadence: Cadence,
    pub time: NaiveTime,
    pub timezone: Tz,
    /// First date the rule may produce; week and day intervals count from here.
    pub anchor: NaiveDate,
}

impl RecurrenceRule {
    /// ## Summary
    /// Builds a rule anchored at `anchor`.
    ///
    /// ## Errors
    /// Returns `TimeError::InvalidRule` for a weekly cadence with no weekdays or
    /// an interval above [`Cadence::MAX_INTERVAL`].
    pub fn new(cadence: Cadence, time: NaiveTime, timezone: Tz, anchor: NaiveDate) -> TimeResult<Self> {
        if let Cadence::Weekly { weekdays, .. } = cadence
            && weekdays.is_empty()
        {
            return Err(TimeError::InvalidRule(
                "weekly cadence needs at least one weekday".to_string(),
            ));
        }
        if cadence.interval() > Cadence::MAX_INTERVAL {
            return Err(TimeError::InvalidRule(format!(
                "interval {} exceeds {}",
                cadence.interval(),
                Cadence::MAX_INTERVAL
            )));
        }
        Ok(Self {
            cadence,
            time,
            timezone,
            anchor,
        })
    }

    /// ## Summary
    /// Builds a rule whose first occurrence is the earliest one strictly after `after`.
    ///
    /// Interval counting starts from the week (or day) of that first occurrence,
    /// so "every other monday" said on a Wednesday starts with the coming Monday.
    ///
    /// ## Errors
    /// Returns an error if the cadence is invalid or the first occurrence cannot be resolved.
    pub fn starting_after(
        cadence: Cadence,
        time: NaiveTime,
        timezone: Tz,
        after: DateTime<Utc>,
    ) -> TimeResult<Self> {
        let today = after.with_timezone(&timezone).date_naive();
        let single_step = match cadence {
            Cadence::Weekly { weekdays, .. } => Cadence::weekly(weekdays),
            Cadence::Daily { .. } => Cadence::daily(),
        };
        let probe = Self::new(single_step, time, timezone, today)?;
        let first = probe.next_occurrence(after)?;
        Self::new(cadence, time, timezone, first.date)
    }

    /// ## Summary
    /// Earliest occurrence strictly after `after`.
    ///
    /// ## Errors
    /// Returns an error if a candidate local time cannot be placed on the timeline.
    pub fn next_occurrence(&self, after: DateTime<Utc>) -> TimeResult<Occurrence> {
        self.resolve(after, Bound::Exclusive)
    }

    /// ## Summary
    /// Earliest occurrence at or after `at`.
    ///
    /// ## Errors
    /// Returns an error if a candidate local time cannot be placed on the timeline.
    pub fn first_at_or_after(&self, at: DateTime<Utc>) -> TimeResult<Occurrence> {
        self.resolve(at, Bound::Inclusive)
    }

    /// Lazy, restartable sequence of occurrences inside `window`.
    #[must_use]
    pub fn occurrences_in(&self, window: TimeWindow) -> Occurrences {
        Occurrences {
            rule: *self,
            cursor: window.start,
            bound: Bound::Inclusive,
            end: window.end,
        }
    }

    /// Whether the rule naturally produces an occurrence on `date`.
    #[must_use]
    pub fn produces(&self, date: NaiveDate) -> bool {
        if date < self.anchor {
            return false;
        }
        match self.cadence {
            Cadence::Weekly { weekdays, .. } => {
                weekdays.contains(date.weekday())
                    && self.week_index(date) % i64::from(self.cadence.interval()) == 0
            }
            Cadence::Daily { .. } => {
                (date - self.anchor).num_days() % i64::from(self.cadence.interval()) == 0
            }
        }
    }

    /// ## Summary
    /// The occurrence the rule produces on `date`, if any.
    ///
    /// ## Errors
    /// Returns an error if the local time cannot be placed on the timeline.
    pub fn occurrence_on(&self, date: NaiveDate) -> TimeResult<Option<Occurrence>> {
        if !self.produces(date) {
            return Ok(None);
        }
        Ok(Some(Occurrence {
            date,
            at: self.instant_on(date)?,
        }))
    }

    /// ## Summary
    /// Converts `date` at the rule's time of day into an instant.
    ///
    /// ## Errors
    /// Returns an error if the local time cannot be placed on the timeline.
    pub fn instant_on(&self, date: NaiveDate) -> TimeResult<DateTime<Utc>> {
        local_to_utc(date.and_time(self.time), self.timezone)
    }

    /// RFC 5545 recurrence rule, e.g. `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE`.
    #[must_use]
    pub fn to_rrule(&self) -> String {
        let interval = self.cadence.interval();
        let mut rule = match self.cadence {
            Cadence::Weekly { .. } => "FREQ=WEEKLY".to_string(),
            Cadence::Daily { .. } => "FREQ=DAILY".to_string(),
        };
        if interval > 1 {
            rule.push_str(&format!(";INTERVAL={interval}"));
        }
        if let Cadence::Weekly { weekdays, .. } = self.cadence {
            rule.push_str(";BYDAY=");
            rule.push_str(&byday(weekdays));
        }
        rule
    }

    /// `DTSTART` plus `RRULE` lines describing the whole series.
    #[must_use]
    pub fn to_rrule_set(&self) -> String {
        format!(
            "DTSTART;TZID={}:{}\nRRULE:{}",
            self.timezone.name(),
            self.anchor.and_time(self.time).format("%Y%m%dT%H%M%S"),
            self.to_rrule()
        )
    }

    /// Human summary, e.g. `every Mon, Wed at 18:00`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} at {}", self.cadence, self.time.format("%H:%M"))
    }

    fn resolve(&self, bound_at: DateTime<Utc>, bound: Bound) -> TimeResult<Occurrence> {
        let local_date = bound_at.with_timezone(&self.timezone).date_naive();
        let start = local_date.max(self.anchor);
        let passes = |at: DateTime<Utc>| match bound {
            Bound::Inclusive => at >= bound_at,
            Bound::Exclusive => at > bound_at,
        };

        match self.cadence {
            Cadence::Weekly { weekdays, .. } => {
                let step = 7 * i64::from(self.cadence.interval());
                let mut best: Option<Occurrence> = None;
                for day in weekdays.iter() {
                    let mut date = self.align_week(on_or_after(start, day)?)?;
                    let mut at = self.instant_on(date)?;
                    if !passes(at) {
                        date = add_days(date, step)?;
                        at = self.instant_on(date)?;
                    }
                    if best.is_none_or(|current| at < current.at) {
                        best = Some(Occurrence { date, at });
                    }
                }
                best.ok_or_else(|| {
                    TimeError::InvalidRule("weekly cadence needs at least one weekday".to_string())
                })
            }
            Cadence::Daily { .. } => {
                let interval = i64::from(self.cadence.interval());
                let offset = (start - self.anchor).num_days().rem_euclid(interval);
                let mut date = if offset == 0 {
                    start
                } else {
                    add_days(start, interval - offset)?
                };
                let mut at = self.instant_on(date)?;
                if !passes(at) {
                    date = add_days(date, interval)?;
                    at = self.instant_on(date)?;
                }
                Ok(Occurrence { date, at })
            }
        }
    }

    /// Weeks between the Monday of `date` and the Monday of the anchor.
    fn week_index(&self, date: NaiveDate) -> i64 {
        (week_start(date) - week_start(self.anchor)).num_days() / 7
    }

    /// Moves `date` forward by whole weeks onto a week the interval selects.
    fn align_week(&self, date: NaiveDate) -> TimeResult<NaiveDate> {
        let interval = i64::from(self.cadence.interval());
        let remainder = self.week_index(date).rem_euclid(interval);
        if remainder == 0 {
            Ok(date)
        } else {
            add_days(date, 7 * (interval - remainder))
        }
    }
}

/// `date` moved by `days`, or `InvalidRule` past the end of the calendar.
fn add_days(date: NaiveDate, days: i64) -> TimeResult<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| TimeError::InvalidRule(format!("{date} plus {days} days is out of range")))
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(NaiveDate::MIN)
}

fn on_or_after(date: NaiveDate, day: Weekday) -> TimeResult<NaiveDate> {
    let ahead = (i64::from(day.num_days_from_monday())
        - i64::from(date.weekday().num_days_from_monday()))
    .rem_euclid(7);
    add_days(date, ahead)
}

fn byday(weekdays: WeekdaySet) -> String {
    weekdays
        .iter()
        .map(|day| match day {
            Weekday::Mon => "MO",
            Weekday::Tue => "TU",
            Weekday::Wed => "WE",
            Weekday::Thu => "TH",
            Weekday::Fri => "FR",
            Weekday::Sat => "SA",
            Weekday::Sun => "SU",
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Occurrences of a rule within a window, produced on demand.
///
/// A clone taken before iteration replays the same sequence.
#[derive(Debug, Clone)]
pub struct Occurrences {
    rule: RecurrenceRule,
    cursor: DateTime<Utc>,
    bound: Bound,
    end: DateTime<Utc>,
}

impl Iterator for Occurrences {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.end {
            return None;
        }
        let next = match self.rule.resolve(self.cursor, self.bound) {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!(error = %e, rule = %self.rule.to_rrule(), "Stopping occurrence expansion");
                self.cursor = self.end;
                return None;
            }
        };
        if next.at >= self.end {
            self.cursor = self.end;
            return None;
        }
        self.cursor = next.at;
        self.bound = Bound::Exclusive;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn ny(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        New_York
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn mon_wed_1800() -> RecurrenceRule {
        let weekdays: WeekdaySet = [Weekday::Mon, Weekday::Wed].into_iter().collect();
        RecurrenceRule::new(Cadence::weekly(weekdays), hm(18, 0), New_York, date(2026, 10, 19))
            .expect("valid rule")
    }

    #[test]
    fn next_occurrence_same_week() {
        // Tuesday 09:00 -> Wednesday 18:00 of the same week
        let next = mon_wed_1800()
            .next_occurrence(ny(2026, 10, 20, 9, 0))
            .expect("resolves");
        assert_eq!(next.date, date(2026, 10, 21));
        assert_eq!(next.at, ny(2026, 10, 21, 18, 0));
    }

    #[test]
    fn next_occurrence_rolls_to_following_week() {
        // Wednesday 19:00 -> following Monday 18:00
        let next = mon_wed_1800()
            .next_occurrence(ny(2026, 10, 21, 19, 0))
            .expect("resolves");
        assert_eq!(next.date, date(2026, 10, 26));
        assert_eq!(next.at, ny(2026, 10, 26, 18, 0));
    }

    #[test]
    fn next_occurrence_is_strict() {
        let rule = mon_wed_1800();
        let at = ny(2026, 10, 21, 18, 0);
        assert_eq!(rule.next_occurrence(at).expect("resolves").date, date(2026, 10, 26));
        assert_eq!(rule.first_at_or_after(at).expect("resolves").date, date(2026, 10, 21));
    }

    #[test]
    fn never_before_anchor() {
        let rule = mon_wed_1800();
        let next = rule
            .next_occurrence(ny(2026, 9, 1, 0, 0))
            .expect("resolves");
        assert_eq!(next.date, date(2026, 10, 19));
    }

    #[test]
    fn local_time_survives_dst_end() {
        // New York leaves daylight time on 2026-11-01
        let rule = mon_wed_1800();
        let before = rule.next_occurrence(ny(2026, 10, 27, 0, 0)).expect("resolves");
        let after = rule.next_occurrence(ny(2026, 11, 1, 0, 0)).expect("resolves");
        assert_eq!(before.at, Utc.with_ymd_and_hms(2026, 10, 28, 22, 0, 0).unwrap());
        assert_eq!(after.at, Utc.with_ymd_and_hms(2026, 11, 2, 23, 0, 0).unwrap());
        assert_eq!(after.at.with_timezone(&New_York).time(), hm(18, 0));
    }

    #[test]
    fn every_other_week() {
        let rule = RecurrenceRule::new(
            Cadence::Weekly {
                weekdays: WeekdaySet::single(Weekday::Fri),
                interval: 2,
            },
            hm(9, 30),
            New_York,
            date(2026, 10, 23),
        )
        .expect("valid rule");

        let first = rule.next_occurrence(ny(2026, 10, 19, 0, 0)).expect("resolves");
        assert_eq!(first.date, date(2026, 10, 23));
        let second = rule.next_occurrence(first.at).expect("resolves");
        assert_eq!(second.date, date(2026, 11, 6));
        assert!(!rule.produces(date(2026, 10, 30)));
        assert!(rule.produces(date(2026, 11, 20)));
    }

    #[test]
    fn every_three_days() {
        let rule = RecurrenceRule::new(
            Cadence::Daily { interval: 3 },
            hm(7, 0),
            New_York,
            date(2026, 10, 19),
        )
        .expect("valid rule");

        let dates: Vec<NaiveDate> = rule
            .occurrences_in(TimeWindow::new(ny(2026, 10, 20, 0, 0), ny(2026, 10, 31, 0, 0)))
            .map(|occurrence| occurrence.date)
            .collect();
        assert_eq!(dates, vec![date(2026, 10, 22), date(2026, 10, 25), date(2026, 10, 28)]);
    }

    #[test]
    fn starting_after_anchors_on_first_occurrence() {
        let rule = RecurrenceRule::starting_after(
            Cadence::Weekly {
                weekdays: WeekdaySet::single(Weekday::Mon),
                interval: 2,
            },
            hm(10, 0),
            New_York,
            ny(2026, 10, 21, 12, 0),
        )
        .expect("valid rule");
        assert_eq!(rule.anchor, date(2026, 10, 26));
        assert!(rule.produces(date(2026, 11, 9)));
        assert!(!rule.produces(date(2026, 11, 2)));
    }

    #[test]
    fn occurrences_in_window_is_bounded_and_restartable() {
        let rule = mon_wed_1800();
        let window = TimeWindow::new(ny(2026, 10, 19, 18, 0), ny(2026, 11, 2, 18, 0));
        let occurrences = rule.occurrences_in(window);

        let first_pass: Vec<NaiveDate> = occurrences.clone().map(|o| o.date).collect();
        let second_pass: Vec<NaiveDate> = occurrences.map(|o| o.date).collect();

        assert_eq!(
            first_pass,
            vec![
                date(2026, 10, 19),
                date(2026, 10, 21),
                date(2026, 10, 26),
                date(2026, 10, 28),
            ]
        );
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn empty_weekday_set_is_rejected() {
        let err = RecurrenceRule::new(
            Cadence::weekly(WeekdaySet::EMPTY),
            hm(9, 0),
            New_York,
            date(2026, 10, 19),
        )
        .expect_err("no weekdays");
        assert!(matches!(err, TimeError::InvalidRule(_)));
    }

    #[test]
    fn oversized_interval_is_rejected() {
        let err = RecurrenceRule::new(
            Cadence::Weekly {
                weekdays: WeekdaySet::single(Weekday::Mon),
                interval: 30_000_000,
            },
            hm(9, 0),
            New_York,
            date(2026, 10, 19),
        )
        .expect_err("interval too large");
        assert!(matches!(err, TimeError::InvalidRule(_)));
    }

    #[test]
    fn end_of_calendar_is_an_error() {
        let anchor = NaiveDate::MAX - TimeDelta::days(3);
        let weekly = RecurrenceRule::new(
            Cadence::Weekly {
                weekdays: WeekdaySet::single(anchor.weekday()),
                interval: Cadence::MAX_INTERVAL,
            },
            hm(9, 0),
            chrono_tz::UTC,
            anchor,
        )
        .expect("valid rule");
        let at = weekly.instant_on(anchor).expect("anchor resolves");
        assert!(matches!(weekly.next_occurrence(at), Err(TimeError::InvalidRule(_))));
        assert_eq!(
            weekly
                .occurrences_in(TimeWindow::new(at, DateTime::<Utc>::MAX_UTC))
                .count(),
            1
        );

        let daily = RecurrenceRule::new(Cadence::Daily { interval: 30 }, hm(9, 0), chrono_tz::UTC, anchor)
            .expect("valid rule");
        let at = daily.instant_on(anchor).expect("anchor resolves");
        assert!(matches!(daily.next_occurrence(at), Err(TimeError::InvalidRule(_))));
    }

    #[test]
    fn rrule_text() {
        let rule = mon_wed_1800();
        assert_eq!(rule.to_rrule(), "FREQ=WEEKLY;BYDAY=MO,WE");
        assert_eq!(
            rule.to_rrule_set(),
            "DTSTART;TZID=America/New_York:20261019T180000\nRRULE:FREQ=WEEKLY;BYDAY=MO,WE"
        );
        assert_eq!(rule.summary(), "every Mon, Wed at 18:00");
    }

    #[test]
    fn agrees_with_rrule_expansion() {
        let rules = [
            mon_wed_1800(),
            RecurrenceRule::new(
                Cadence::Weekly {
                    weekdays: [Weekday::Tue, Weekday::Thu].into_iter().collect(),
                    interval: 2,
                },
                hm(8, 15),
                New_York,
                date(2026, 10, 20),
            )
            .expect("valid rule"),
            RecurrenceRule::new(Cadence::Daily { interval: 4 }, hm(6, 0), New_York, date(2026, 10, 19))
                .expect("valid rule"),
        ];

        for rule in rules {
            let rrule_set: rrule::RRuleSet = rule
                .to_rrule_set()
                .parse()
                .unwrap_or_else(|err| panic!("rrule rejected {}: {err}", rule.to_rrule_set()));
            let expected: Vec<i64> = rrule_set
                .all(12)
                .dates
                .iter()
                .map(chrono::DateTime::timestamp)
                .collect();

            let start = rule.instant_on(rule.anchor).expect("anchor resolves");
            let actual: Vec<i64> = rule
                .occurrences_in(TimeWindow::new(start, start + TimeDelta::days(400)))
                .take(12)
                .map(|occurrence| occurrence.at.timestamp())
                .collect();

            assert_eq!(actual, expected, "mismatch for {}", rule.to_rrule());
        }
    }
}

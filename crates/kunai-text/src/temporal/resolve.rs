//! Places an extraction on the calendar relative to the current instant.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use kunai_core::types::{Cadence, WeekdaySet};
use kunai_time::{RecurrenceRule, local_to_utc};

use super::extract::{DateCue, Extraction};
use super::parser::DefaultTime;
use super::draft::{Ambiguity, FailureReason, MeetingSpec, ParseFailure, SegmentResult};

pub(crate) struct Resolver<'a> {
    pub now: DateTime<Utc>,
    pub timezone: Tz,
    pub default_time: DefaultTime,
    pub placeholder_title: &'a str,
}

impl Resolver<'_> {
    fn today(&self) -> NaiveDate {
        self.now.with_timezone(&self.timezone).date_naive()
    }

    fn instant(&self, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Utc>, FailureReason> {
        local_to_utc(date.and_time(time), self.timezone)
            .map_err(|e| FailureReason::Unresolvable(e.to_string()))
    }

    pub(crate) fn default_time(&self) -> NaiveTime {
        match self.default_time {
            DefaultTime::Fixed(time) => time,
            DefaultTime::NextHour => {
                let local = self.now.with_timezone(&self.timezone).time();
                NaiveTime::from_hms_opt((local.hour() + 1) % 24, 0, 0).unwrap_or(NaiveTime::MIN)
            }
        }
    }

    /// First date from today on at which `time` is still ahead of now.
    fn next_date_for(&self, time: NaiveTime) -> Result<NaiveDate, FailureReason> {
        let today = self.today();
        if self.instant(today, time)? > self.now {
            Ok(today)
        } else {
            add_days(today, 1)
        }
    }

    /// ## Summary
    /// Turns a date cue into a local date, given the time it will be combined with.
    ///
    /// ## Errors
    /// Returns `FailureReason::InvalidDate` for calendar dates that do not exist.
    pub(crate) fn resolve_date(&self, cue: DateCue, time: NaiveTime) -> Result<NaiveDate, FailureReason> {
        let today = self.today();
        match cue {
            DateCue::Today => Ok(today),
            DateCue::Tomorrow => add_days(today, 1),
            DateCue::InDays(days) => add_days(today, days),
            DateCue::Next(day) => on_or_after(add_days(today, 1)?, day),
            DateCue::This(day) => {
                let date = on_or_after(today, day)?;
                if self.instant(date, time)? > self.now {
                    Ok(date)
                } else {
                    add_days(date, 7)
                }
            }
            DateCue::Calendar {
                year: Some(year),
                month,
                day,
            } => NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| FailureReason::InvalidDate(format!("{year}-{month:02}-{day:02}"))),
            DateCue::Calendar {
                year: None,
                month,
                day,
            } => {
                // The coming occurrence of the date, this year or next
                for year in [today.year(), today.year() + 1] {
                    if let Some(date) = NaiveDate::from_ymd_opt(year, month, day)
                        && self.instant(date, time)? > self.now
                    {
                        return Ok(date);
                    }
                }
                Err(FailureReason::InvalidDate(format!("{month:02}-{day:02}")))
            }
        }
    }

    /// ## Summary
    /// Builds the draft for one segment.
    pub(crate) fn resolve(&self, extraction: &Extraction, source: String) -> SegmentResult {
        let fail = |reason| ParseFailure {
            segment: source.clone(),
            reason,
        };
        if let Some(reason) = extraction.range_failure() {
            return Err(fail(reason));
        }
        if !extraction.has_cue() {
            return Err(fail(FailureReason::NoTemporalCue));
        }

        let mut ambiguities = extraction.ambiguities.clone();
        let title = if extraction.title.is_empty() {
            self.placeholder_title.to_string()
        } else {
            extraction.title.clone()
        };

        let (anchor, recurrence, time) = self
            .place(extraction, &mut ambiguities)
            .map_err(fail)?;

        Ok(MeetingSpec {
            title,
            anchor,
            recurrence,
            time,
            timezone: self.timezone,
            confident: ambiguities.is_empty(),
            ambiguities,
            source,
        })
    }

    fn place(
        &self,
        extraction: &Extraction,
        ambiguities: &mut Vec<Ambiguity>,
    ) -> Result<(DateTime<Utc>, Option<RecurrenceRule>, NaiveTime), FailureReason> {
        if let Some(offset) = extraction.offset {
            let anchor = self.shifted(offset)?;
            let time = anchor.with_timezone(&self.timezone).time();
            let recurrence = match extraction.cadence {
                Some(cadence) => {
                    let date = anchor.with_timezone(&self.timezone).date_naive();
                    Some(self.rule(fill_weekdays(cadence, date.weekday()), time, date)?)
                }
                None => None,
            };
            return Ok((anchor, recurrence, time));
        }

        let time = extraction.time.unwrap_or_else(|| {
            ambiguities.push(Ambiguity::DefaultedTime);
            self.default_time()
        });

        let date = match extraction.date {
            Some(cue) => Some(self.resolve_date(cue, time)?),
            None => None,
        };

        if let Some(cadence) = extraction.cadence {
            let rule = match date {
                Some(date) => self.rule(fill_weekdays(cadence, date.weekday()), time, date)?,
                None => {
                    let first = self.next_date_for(time)?;
                    RecurrenceRule::starting_after(
                        fill_weekdays(cadence, first.weekday()),
                        time,
                        self.timezone,
                        self.now,
                    )
                    .map_err(|e| FailureReason::Unresolvable(e.to_string()))?
                }
            };
            let first = rule
                .next_occurrence(self.now)
                .map_err(|e| FailureReason::Unresolvable(e.to_string()))?;
            return Ok((first.at, Some(rule), time));
        }

        let date = match date {
            Some(date) => date,
            None => {
                ambiguities.push(Ambiguity::InferredDate);
                self.next_date_for(time)?
            }
        };
        let anchor = self.instant(date, time)?;
        if anchor <= self.now {
            ambiguities.push(Ambiguity::InPast);
        }
        Ok((anchor, None, time))
    }

    /// Now moved by `offset`.
    pub(crate) fn shifted(&self, offset: TimeDelta) -> Result<DateTime<Utc>, FailureReason> {
        self.now
            .checked_add_signed(offset)
            .ok_or_else(|| FailureReason::Unresolvable(format!("{offset} from now is out of range")))
    }

    fn rule(&self, cadence: Cadence, time: NaiveTime, anchor: NaiveDate) -> Result<RecurrenceRule, FailureReason> {
        RecurrenceRule::new(cadence, time, self.timezone, anchor)
            .map_err(|e| FailureReason::Unresolvable(e.to_string()))
    }
}

/// A weekly cadence without weekdays repeats on `day`.
pub(crate) fn fill_weekdays(cadence: Cadence, day: Weekday) -> Cadence {
    match cadence {
        Cadence::Weekly { weekdays, interval } if weekdays.is_empty() => Cadence::Weekly {
            weekdays: WeekdaySet::single(day),
            interval,
        },
        other => other,
    }
}

/// `date` moved by `days`, failing past the end of the calendar.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate, FailureReason> {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| FailureReason::Unresolvable(format!("{date} plus {days} days is out of range")))
}

pub(crate) fn on_or_after(date: NaiveDate, day: Weekday) -> Result<NaiveDate, FailureReason> {
    let ahead = (i64::from(day.num_days_from_monday())
        - i64::from(date.weekday().num_days_from_monday()))
    .rem_euclid(7);
    add_days(date, ahead)
}

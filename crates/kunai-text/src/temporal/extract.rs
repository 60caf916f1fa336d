//! Entity extraction over the corrected tokens of one segment.

use chrono::{Datelike, NaiveTime, TimeDelta, Weekday};
use kunai_core::types::{Cadence, WeekdaySet};

use crate::lexicon::{DayPeriod, Keyword, Relative, Term, Unit};

use super::draft::{Ambiguity, FailureReason};
use super::token::{Meridiem, Token, TokenKind};

/// Words dropped from the front of a title.
const LEADING_VERBS: &[&str] = &[
    "schedule", "book", "add", "create", "plan", "arrange", "organize", "organise", "setup",
];

/// Words dropped from either edge of a title once the cues around them are gone.
const EDGE_CONNECTORS: &[&str] = &[
    "a", "an", "the", "at", "on", "in", "and", "&", "for", "every", "each", "of", "from", "to",
];

/// Furthest a relative offset may reach, in days.
const MAX_OFFSET_DAYS: i64 = 3660;

/// A date named in a request, resolved against the current day later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCue {
    Today,
    Tomorrow,
    /// The first such weekday strictly after today.
    Next(Weekday),
    /// The first such weekday from today on whose time has not passed.
    This(Weekday),
    Calendar {
        year: Option<i32>,
        month: u32,
        day: u32,
    },
    InDays(i64),
}

/// What one segment says, before it is placed on the calendar.
///
/// A weekly cadence with an empty weekday set repeats on the weekday of its
/// first occurrence.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Extraction {
    pub date: Option<DateCue>,
    pub time: Option<NaiveTime>,
    /// Offset from now given as minutes or hours ("in 20 minutes").
    pub offset: Option<TimeDelta>,
    pub cadence: Option<Cadence>,
    /// Words not consumed as cues, possibly empty.
    pub title: String,
    pub ambiguities: Vec<Ambiguity>,
    /// A count too large to place on the calendar, as written.
    pub out_of_range: Option<String>,
    /// Token indices whose correction the extraction relied on.
    pub(crate) used_corrections: Vec<usize>,
}

impl Extraction {
    /// Whether anything anchors the segment in time.
    #[must_use]
    pub const fn has_cue(&self) -> bool {
        self.date.is_some() || self.time.is_some() || self.offset.is_some() || self.cadence.is_some()
    }

    /// Why the extraction cannot be placed, if a count was out of range.
    pub(crate) fn range_failure(&self) -> Option<FailureReason> {
        self.out_of_range
            .as_ref()
            .map(|count| FailureReason::Unresolvable(format!("{count} is too far out")))
    }

    /// The single weekday of a cadence read from a bare weekday, if any.
    #[must_use]
    pub fn single_weekday(&self) -> Option<Weekday> {
        match self.cadence {
            Some(Cadence::Weekly { weekdays, .. }) if weekdays.len() == 1 => weekdays.iter().next(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    Bare,
    Every,
    Next,
    This,
    On,
}

#[derive(Debug)]
struct WeekdayRun {
    modifier: Modifier,
    days: Vec<Weekday>,
    plural: bool,
}

#[derive(Debug, Clone, Copy)]
struct ClockTime {
    hour: u32,
    minute: u32,
    missing_meridiem: bool,
}

/// ## Summary
/// Reads date, time, recurrence and title out of one segment's tokens.
#[must_use]
pub fn extract(tokens: &[Token]) -> Extraction {
    let mut extractor = Extractor::new(tokens);
    let mut i = 0;
    while i < tokens.len() {
        i = extractor.step(i);
    }
    extractor.finish()
}

struct Extractor<'a> {
    tokens: &'a [Token],
    consumed: Vec<bool>,
    date: Option<DateCue>,
    clock: Option<ClockTime>,
    period: Option<DayPeriod>,
    pm_hint: bool,
    offset: Option<TimeDelta>,
    every: bool,
    interval: Option<u32>,
    unit: Option<Unit>,
    daily: bool,
    weekly: bool,
    fixed_days: WeekdaySet,
    runs: Vec<WeekdayRun>,
    out_of_range: Option<String>,
}

impl<'a> Extractor<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            consumed: vec![false; tokens.len()],
            date: None,
            clock: None,
            period: None,
            pm_hint: false,
            offset: None,
            every: false,
            interval: None,
            unit: None,
            daily: false,
            weekly: false,
            fixed_days: WeekdaySet::EMPTY,
            runs: Vec::new(),
            out_of_range: None,
        }
    }

    fn term(&self, i: usize) -> Option<Term> {
        self.tokens.get(i).and_then(|t| t.term)
    }

    fn keyword(&self, i: usize) -> Option<Keyword> {
        self.tokens.get(i).and_then(Token::keyword)
    }

    fn raw(&self, i: usize) -> &str {
        self.tokens.get(i).map_or("", |t| t.raw.as_str())
    }

    fn meridiem(&self, i: usize) -> Option<Meridiem> {
        match self.keyword(i) {
            Some(Keyword::Am) => Some(Meridiem::Am),
            Some(Keyword::Pm) => Some(Meridiem::Pm),
            _ => None,
        }
    }

    fn consume(&mut self, i: usize) {
        if let Some(flag) = self.consumed.get_mut(i) {
            *flag = true;
        }
    }

    /// Consumes the run of `keywords` directly before `i`, e.g. `on the` in "on the 5th".
    fn consume_preceding(&mut self, i: usize, keywords: &[Keyword]) {
        let mut j = i;
        while j > 0 {
            j -= 1;
            if self.consumed[j] || !self.keyword(j).is_some_and(|k| keywords.contains(&k)) {
                break;
            }
            self.consumed[j] = true;
        }
    }

    fn set_date(&mut self, cue: DateCue) {
        if self.date.is_none() {
            self.date = Some(cue);
        }
    }

    fn set_clock(&mut self, hour: u32, minute: u32, missing_meridiem: bool) {
        if self.clock.is_none() {
            self.clock = Some(ClockTime {
                hour,
                minute,
                missing_meridiem,
            });
        }
    }

    fn step(&mut self, i: usize) -> usize {
        if self.consumed[i] {
            return i + 1;
        }
        let token = &self.tokens[i];
        match (token.kind, token.term) {
            (TokenKind::Date(date), _) => {
                self.set_date(DateCue::Calendar {
                    year: Some(date.year()),
                    month: date.month(),
                    day: date.day(),
                });
                self.consume(i);
                self.consume_preceding(i, &[Keyword::On]);
                i + 1
            }
            (
                TokenKind::Clock {
                    hour,
                    minute,
                    meridiem,
                    twenty_four,
                },
                _,
            ) => self.clock_at(i, hour, minute, meridiem, twenty_four),
            (TokenKind::Ordinal(day), _) | (_, Some(Term::Ordinal(day))) => self.day_before_month(i, day),
            (TokenKind::Number(n), _) | (_, Some(Term::Number(n))) => self.number_at(i, n),
            (_, Some(Term::Keyword(keyword))) => self.keyword_at(i, keyword),
            (_, Some(Term::Weekday { .. })) => self.weekday_run(i),
            (_, Some(Term::Month(month))) => self.month_at(i, month),
            (_, Some(Term::Relative(relative))) => {
                match relative {
                    Relative::Today => self.set_date(DateCue::Today),
                    Relative::Tomorrow => self.set_date(DateCue::Tomorrow),
                    Relative::Tonight => {
                        self.set_date(DateCue::Today);
                        self.period.get_or_insert(DayPeriod::Night);
                        self.pm_hint = true;
                    }
                }
                self.consume(i);
                i + 1
            }
            (_, Some(Term::Period(period))) => self.period_at(i, period),
            _ => i + 1,
        }
    }

    fn clock_at(
        &mut self,
        i: usize,
        hour: u32,
        minute: u32,
        meridiem: Option<Meridiem>,
        twenty_four: bool,
    ) -> usize {
        let mut next = i + 1;
        let meridiem = match meridiem {
            Some(m) => Some(m),
            None if !twenty_four && (1..=12).contains(&hour) => {
                let following = self.meridiem(i + 1);
                if following.is_some() {
                    self.consume(i + 1);
                    next += 1;
                }
                following
            }
            None => None,
        };

        match meridiem {
            Some(m) => self.set_clock(m.apply(hour), minute, false),
            None => self.set_clock(hour, minute, !twenty_four && (1..=12).contains(&hour)),
        }
        self.consume(i);
        self.consume_preceding(i, &[Keyword::At]);
        next
    }

    fn number_at(&mut self, i: usize, n: u32) -> usize {
        let digits = matches!(self.tokens[i].kind, TokenKind::Number(_));

        if digits && let Some(Term::Month(month)) = self.term(i + 1) {
            return self.calendar(i, i + 1, n, month);
        }

        if (1..=12).contains(&n)
            && let Some(m) = self.meridiem(i + 1)
        {
            self.set_clock(m.apply(n), 0, false);
            self.consume(i);
            self.consume(i + 1);
            self.consume_preceding(i, &[Keyword::At]);
            return i + 2;
        }

        let after_at = i > 0 && !self.consumed[i - 1] && self.keyword(i - 1) == Some(Keyword::At);
        if after_at && n < 24 {
            self.set_clock(n, 0, (1..=12).contains(&n));
            self.consume(i);
            self.consume(i - 1);
        }
        i + 1
    }

    /// "5th of march", "5th march", "the fifth of march".
    fn day_before_month(&mut self, i: usize, day: u32) -> usize {
        let month_at = if self.keyword(i + 1) == Some(Keyword::Of) { i + 2 } else { i + 1 };
        match self.term(month_at) {
            Some(Term::Month(month)) => self.calendar(i, month_at, day, month),
            _ => i + 1,
        }
    }

    /// "march 5", "march 5th", "march the 5th", optionally followed by a year.
    fn month_at(&mut self, i: usize, month: u32) -> usize {
        let day_at = if self.keyword(i + 1) == Some(Keyword::The) { i + 2 } else { i + 1 };
        let Some(day_token) = self.tokens.get(day_at) else {
            return i + 1;
        };
        match day_token.ordinal().or_else(|| day_token.number()) {
            Some(day) if (1..=31).contains(&day) => self.calendar(i, day_at, day, month),
            _ => i + 1,
        }
    }

    /// Records a calendar date spanning tokens `first..=last` plus a trailing year.
    fn calendar(&mut self, first: usize, last: usize, day: u32, month: u32) -> usize {
        let mut next = last + 1;
        let year = match self.tokens.get(next).map(|t| t.kind) {
            Some(TokenKind::Number(year)) if year >= 1000 => {
                next += 1;
                i32::try_from(year).ok()
            }
            _ => None,
        };
        self.set_date(DateCue::Calendar { year, month, day });
        for j in first..next {
            self.consume(j);
        }
        self.consume_preceding(first, &[Keyword::The, Keyword::On]);
        next
    }

    fn keyword_at(&mut self, i: usize, keyword: Keyword) -> usize {
        match keyword {
            Keyword::Every => {
                self.every = true;
                self.consume(i);
                let mut j = i + 1;
                if self.keyword(j) == Some(Keyword::Other) {
                    self.interval = Some(2);
                    self.consume(j);
                    j += 1;
                }
                let count = self.tokens.get(j).and_then(Token::number);
                if let Some(n) = count
                    && let Some(Term::Unit(unit @ (Unit::Day | Unit::Week))) = self.term(j + 1)
                {
                    if n > Cadence::MAX_INTERVAL {
                        self.out_of_range = Some(format!("every {n} {}", self.raw(j + 1)));
                    }
                    self.interval = Some(n.max(1));
                    self.unit = Some(unit);
                    self.consume(j);
                    self.consume(j + 1);
                    j += 2;
                } else if let Some(Term::Unit(unit @ (Unit::Day | Unit::Week))) = self.term(j) {
                    self.unit = Some(unit);
                    self.consume(j);
                    j += 1;
                }
                j
            }
            Keyword::Daily => {
                self.daily = true;
                self.consume(i);
                i + 1
            }
            Keyword::Weekly | Keyword::Biweekly => {
                self.weekly = true;
                if keyword == Keyword::Biweekly {
                    self.interval = Some(2);
                }
                self.consume(i);
                i + 1
            }
            Keyword::Workdays | Keyword::Weekends => {
                let days = if keyword == Keyword::Workdays {
                    WeekdaySet::WORKDAYS
                } else {
                    WeekdaySet::WEEKEND
                };
                self.fixed_days = self.fixed_days.union(days);
                self.consume(i);
                self.consume_preceding(i, &[Keyword::On]);
                i + 1
            }
            Keyword::In => self.offset_at(i),
            _ => i + 1,
        }
    }

    /// "in 20 minutes", "in 2 hours", "in three days".
    fn offset_at(&mut self, i: usize) -> usize {
        let count = self.tokens.get(i + 1).and_then(Token::number);
        let (Some(n), Some(Term::Unit(unit))) = (count, self.term(i + 2)) else {
            return i + 1;
        };
        let n = i64::from(n);
        let limit = match unit {
            Unit::Minute => MAX_OFFSET_DAYS * 24 * 60,
            Unit::Hour => MAX_OFFSET_DAYS * 24,
            Unit::Day => MAX_OFFSET_DAYS,
            Unit::Week => MAX_OFFSET_DAYS / 7,
        };
        if n > limit {
            self.out_of_range = Some(format!("in {n} {}", self.raw(i + 2)));
        } else {
            match unit {
                Unit::Minute => self.offset = Some(TimeDelta::minutes(n)),
                Unit::Hour => self.offset = Some(TimeDelta::hours(n)),
                Unit::Day => self.set_date(DateCue::InDays(n)),
                Unit::Week => self.set_date(DateCue::InDays(n * 7)),
            }
        }
        for j in i..i + 3 {
            self.consume(j);
        }
        i + 3
    }

    /// Weekday words joined by `and`/`&`, with the modifier before the first one.
    fn weekday_run(&mut self, i: usize) -> usize {
        let tokens = self.tokens;
        let is_weekday = |j: usize| matches!(tokens.get(j).and_then(|t| t.term), Some(Term::Weekday { .. }));

        let mut days = Vec::new();
        let mut plural = false;
        let mut j = i;
        let mut last = i;
        loop {
            if let Some(Term::Weekday { day, plural: p }) = self.term(j) {
                days.push(day);
                plural |= p;
                last = j;
                j += 1;
            } else if tokens.get(j).is_some_and(Token::is_conjunction) && is_weekday(j + 1) {
                j += 1;
            } else {
                break;
            }
        }
        for k in i..=last {
            self.consume(k);
        }

        let modifier = match i.checked_sub(1).and_then(|p| self.keyword(p)) {
            Some(Keyword::Every) => Modifier::Every,
            Some(Keyword::Next) => Modifier::Next,
            Some(Keyword::This) => Modifier::This,
            Some(Keyword::On) => Modifier::On,
            _ => Modifier::Bare,
        };
        if matches!(modifier, Modifier::Next | Modifier::This | Modifier::On) {
            self.consume(i - 1);
        }

        self.runs.push(WeekdayRun {
            modifier,
            days,
            plural,
        });
        last + 1
    }

    fn period_at(&mut self, i: usize, period: DayPeriod) -> usize {
        let replaces = self.period.is_none_or(|current| current.is_meal() && !period.is_meal());
        if replaces {
            self.period = Some(period);
        }
        if period.implies_pm() {
            self.pm_hint = true;
        }
        if !period.is_meal() {
            if i > 0 && !self.consumed[i - 1] && self.keyword(i - 1) == Some(Keyword::This) {
                self.set_date(DateCue::Today);
            }
            self.consume(i);
            self.consume_preceding(i, &[Keyword::The, Keyword::In, Keyword::At, Keyword::This]);
        }
        i + 1
    }

    fn finish(mut self) -> Extraction {
        let mut ambiguities = Vec::new();

        let time = match self.clock {
            Some(clock) => {
                let mut hour = clock.hour;
                let mut missing = clock.missing_meridiem;
                if missing && self.pm_hint && hour < 12 {
                    hour += 12;
                    missing = false;
                }
                if missing {
                    ambiguities.push(Ambiguity::MissingMeridiem);
                }
                NaiveTime::from_hms_opt(hour, clock.minute, 0)
            }
            None => self.period.map(DayPeriod::time),
        };

        let every_applies =
            self.every || self.weekly || self.unit == Some(Unit::Week) || self.interval.is_some();
        let mut recurring = self.fixed_days;
        let mut bare = WeekdaySet::EMPTY;
        for run in &self.runs {
            let single = (!run.plural && run.days.len() == 1).then(|| run.days[0]);
            match (run.modifier, single) {
                (Modifier::Next, Some(day)) if !every_applies => {
                    self.date.get_or_insert(DateCue::Next(day));
                }
                (Modifier::This | Modifier::On, Some(day)) if !every_applies => {
                    self.date.get_or_insert(DateCue::This(day));
                }
                _ if run.plural || run.modifier == Modifier::Every || every_applies => {
                    recurring = recurring.union(run.days.iter().copied().collect());
                }
                _ => bare = bare.union(run.days.iter().copied().collect()),
            }
        }

        let interval = self.interval.unwrap_or(1);
        let cadence = if self.daily || self.unit == Some(Unit::Day) {
            Some(Cadence::Daily { interval })
        } else if !recurring.is_empty() || self.weekly || self.unit == Some(Unit::Week) {
            Some(Cadence::Weekly {
                weekdays: recurring,
                interval,
            })
        } else if self.every && time.is_some() {
            Some(Cadence::Daily { interval })
        } else if !bare.is_empty() && self.date.is_none() && self.offset.is_none() {
            ambiguities.push(Ambiguity::AmbiguousWeekday);
            Some(Cadence::weekly(bare))
        } else {
            None
        };

        let mut used_corrections = Vec::new();
        let mut corrections = Vec::new();
        for (i, token) in self.tokens.iter().enumerate() {
            if self.consumed[i] && token.was_corrected() {
                used_corrections.push(i);
                corrections.push(Ambiguity::Corrected {
                    from: token.raw.to_lowercase(),
                    to: token.corrected.clone(),
                });
            }
        }
        corrections.append(&mut ambiguities);

        Extraction {
            date: self.date,
            time,
            offset: self.offset,
            cadence,
            title: self.title(),
            ambiguities: corrections,
            out_of_range: self.out_of_range,
            used_corrections,
        }
    }

    fn title(&self) -> String {
        let words: Vec<&str> = self
            .tokens
            .iter()
            .zip(&self.consumed)
            .filter(|(t, consumed)| !**consumed && !t.is_separator())
            .map(|(t, _)| t.raw.as_str())
            .collect();

        let is = |list: &[&str], word: &str| list.contains(&word.to_lowercase().as_str());
        let mut start = 0;
        let mut end = words.len();
        while start < end && (is(LEADING_VERBS, words[start]) || is(EDGE_CONNECTORS, words[start])) {
            start += 1;
        }
        while end > start && is(EDGE_CONNECTORS, words[end - 1]) {
            end -= 1;
        }
        words[start..end].join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Corrector;
    use crate::temporal::token::tokenize;

    fn run(text: &str) -> Extraction {
        extract(&tokenize(text, &Corrector::scheduling()))
    }

    fn hm(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn every_weekday_with_time() {
        let ex = run("every friday at 7pm");
        assert_eq!(ex.cadence, Some(Cadence::weekly(WeekdaySet::single(Weekday::Fri))));
        assert_eq!(ex.time, hm(19, 0));
        assert_eq!(ex.title, "");
        assert!(ex.ambiguities.is_empty());
    }

    #[test]
    fn weekday_list_with_title() {
        let ex = run("Team sync every monday wednesday and friday at 9:30am");
        let days: WeekdaySet = [Weekday::Mon, Weekday::Wed, Weekday::Fri].into_iter().collect();
        assert_eq!(ex.cadence, Some(Cadence::weekly(days)));
        assert_eq!(ex.time, hm(9, 30));
        assert_eq!(ex.title, "Team sync");
    }

    #[test]
    fn interval_cadences() {
        assert_eq!(
            run("every other tuesday at 10am").cadence,
            Some(Cadence::Weekly {
                weekdays: WeekdaySet::single(Weekday::Tue),
                interval: 2
            })
        );
        assert_eq!(run("every 3 days at noon").cadence, Some(Cadence::Daily { interval: 3 }));
        assert_eq!(run("daily standup at 9am").cadence, Some(Cadence::daily()));
        assert_eq!(
            run("gym on weekdays at 6am").cadence,
            Some(Cadence::weekly(WeekdaySet::WORKDAYS))
        );
        assert_eq!(
            run("biweekly review on fridays").cadence,
            Some(Cadence::Weekly {
                weekdays: WeekdaySet::single(Weekday::Fri),
                interval: 2
            })
        );
    }

    #[test]
    fn weekday_modifiers_pick_dates() {
        assert_eq!(run("next friday at 3pm").date, Some(DateCue::Next(Weekday::Fri)));
        assert_eq!(run("demo on thursday at 3pm").date, Some(DateCue::This(Weekday::Thu)));
        assert_eq!(run("this monday at 3pm").cadence, None);
    }

    #[test]
    fn bare_weekday_is_ambiguous_weekly() {
        let ex = run("retro friday 4pm");
        assert_eq!(ex.cadence, Some(Cadence::weekly(WeekdaySet::single(Weekday::Fri))));
        assert!(ex.ambiguities.contains(&Ambiguity::AmbiguousWeekday));
        assert_eq!(ex.title, "retro");
    }

    #[test]
    fn calendar_dates() {
        let march_5 = Some(DateCue::Calendar {
            year: None,
            month: 3,
            day: 5,
        });
        assert_eq!(run("march 5th at 2pm").date, march_5);
        assert_eq!(run("5 march at 2pm").date, march_5);
        assert_eq!(run("on the 5th of march").date, march_5);
        assert_eq!(
            run("2027-01-02 09:00").date,
            Some(DateCue::Calendar {
                year: Some(2027),
                month: 1,
                day: 2
            })
        );
    }

    #[test]
    fn bare_hour_is_literal_unless_period_says_pm() {
        let ex = run("call at 7");
        assert_eq!(ex.time, hm(7, 0));
        assert!(ex.ambiguities.contains(&Ambiguity::MissingMeridiem));

        let ex = run("drinks at 7 in the evening");
        assert_eq!(ex.time, hm(19, 0));
        assert!(ex.ambiguities.is_empty());
        assert_eq!(ex.title, "drinks");

        assert_eq!(run("standup at 18:00").time, hm(18, 0));
        assert_eq!(run("call at 6 pm").time, hm(18, 0));
    }

    #[test]
    fn periods_and_relative_days() {
        let ex = run("lunch with bob");
        assert_eq!(ex.time, hm(12, 0));
        assert_eq!(ex.date, None);
        assert_eq!(ex.title, "lunch with bob");

        let ex = run("tomorrow morning dentist");
        assert_eq!(ex.date, Some(DateCue::Tomorrow));
        assert_eq!(ex.time, hm(9, 0));
        assert_eq!(ex.title, "dentist");

        let ex = run("movie tonight");
        assert_eq!(ex.date, Some(DateCue::Today));
        assert_eq!(ex.time, hm(20, 0));
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(run("call mom in 20 minutes").offset, Some(TimeDelta::minutes(20)));
        assert_eq!(run("in two hours").offset, Some(TimeDelta::hours(2)));
        assert_eq!(run("review in 2 weeks").date, Some(DateCue::InDays(14)));
    }

    #[test]
    fn oversized_counts_are_flagged() {
        let ex = run("review in 99999999 days");
        assert_eq!(ex.date, None);
        assert_eq!(ex.out_of_range.as_deref(), Some("in 99999999 days"));
        assert_eq!(ex.title, "review");

        let ex = run("call in 4000000000 hours");
        assert_eq!(ex.offset, None);
        assert_eq!(ex.out_of_range.as_deref(), Some("in 4000000000 hours"));

        let ex = run("sync every 30000000 weeks on monday at 9am");
        assert_eq!(ex.out_of_range.as_deref(), Some("every 30000000 weeks"));

        assert_eq!(run("review in 500 weeks").out_of_range, None);
    }

    #[test]
    fn corrections_relied_on_are_reported() {
        let ex = run("evry wendsay at 6pm");
        assert_eq!(ex.cadence, Some(Cadence::weekly(WeekdaySet::single(Weekday::Wed))));
        assert!(ex.ambiguities.contains(&Ambiguity::Corrected {
            from: "wendsay".to_string(),
            to: "wednesday".to_string()
        }));
        assert_eq!(ex.used_corrections, vec![0, 1]);
    }

    #[test]
    fn title_drops_verbs_and_connectors() {
        assert_eq!(run("schedule a design review on friday at 2pm").title, "design review");
        assert!(!run("asdkjasdkj").has_cue());
    }
}

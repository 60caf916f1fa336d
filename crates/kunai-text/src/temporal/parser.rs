use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use chrono_tz::Tz;
use kunai_core::config::ParserConfig;
use kunai_core::constants::PLACEHOLDER_TITLE;
use kunai_core::types::{Cadence, WeekdaySet};
use kunai_time::{RecurrenceRule, local_to_utc};

use crate::error::{TextError, TextResult};
use crate::lexicon::Corrector;

use super::extract::{DateCue, Extraction, extract};
use super::resolve::{Resolver, fill_weekdays};
use super::segment;
use super::draft::{FailureReason, ParseFailure, ParsedRequest};
use super::token::{Token, TokenKind, tokenize};

/// Time used when a request names none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultTime {
    /// The next top of the hour.
    NextHour,
    Fixed(NaiveTime),
}

impl FromStr for DefaultTime {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("next_hour") {
            return Ok(Self::NextHour);
        }
        NaiveTime::parse_from_str(s, "%H:%M")
            .map(Self::Fixed)
            .map_err(|e| TextError::InvalidOption(format!("default_time {s:?}: {e}")))
    }
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub default_time: DefaultTime,
    pub placeholder_title: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            default_time: DefaultTime::NextHour,
            placeholder_title: PLACEHOLDER_TITLE.to_string(),
        }
    }
}

impl ParserOptions {
    /// ## Summary
    /// Reads parser options from configuration.
    ///
    /// ## Errors
    /// Returns `TextError::InvalidOption` if `default_time` is neither `next_hour` nor `HH:MM`.
    pub fn from_config(config: &ParserConfig) -> TextResult<Self> {
        Ok(Self {
            default_time: config.default_time.parse()?,
            placeholder_title: config.placeholder_title.clone(),
        })
    }
}

/// Turns free-text scheduling requests into meeting drafts.
#[derive(Debug, Clone)]
pub struct TemporalParser {
    corrector: Corrector,
    options: ParserOptions,
}

impl TemporalParser {
    #[must_use]
    pub const fn new(corrector: Corrector, options: ParserOptions) -> Self {
        Self { corrector, options }
    }

    #[must_use]
    pub const fn corrector(&self) -> &Corrector {
        &self.corrector
    }

    #[must_use]
    pub const fn options(&self) -> &ParserOptions {
        &self.options
    }

    fn resolver(&self, timezone: Tz, now: DateTime<Utc>) -> Resolver<'_> {
        Resolver {
            now,
            timezone,
            default_time: self.options.default_time,
            placeholder_title: &self.options.placeholder_title,
        }
    }

    /// ## Summary
    /// Parses a request into one result per meeting it describes, in input order.
    ///
    /// A segment without any date, time or recurrence fails on its own; the
    /// other segments are unaffected.
    #[tracing::instrument(skip(self), fields(tz = %timezone))]
    pub fn parse(&self, text: &str, timezone: Tz, now: DateTime<Utc>) -> ParsedRequest {
        let tokens = tokenize(text, &self.corrector);
        let resolver = self.resolver(timezone, now);
        let mut used = HashSet::new();

        let segments = segment::split(tokens.clone())
            .into_iter()
            .map(|segment| {
                let extraction = extract(&segment.tokens);
                used.extend(
                    extraction
                        .used_corrections
                        .iter()
                        .map(|&i| segment.tokens[i].index),
                );
                resolver.resolve(&extraction, segment.source())
            })
            .collect::<Vec<_>>();

        let corrected_text = render(&tokens, &used);
        let parsed = ParsedRequest {
            segments,
            corrected_text,
        };
        tracing::debug!(
            drafts = parsed.drafts().count(),
            failures = parsed.failures().count(),
            confident = parsed.is_confident(),
            "Parsed scheduling request"
        );
        parsed
    }

    /// Reads the whole of `text` as one segment without placing it on the calendar.
    #[must_use]
    pub fn extract(&self, text: &str) -> Extraction {
        extract(&tokenize(text, &self.corrector))
    }

    /// ## Summary
    /// Moves one occurrence according to `text`, keeping whatever it does not mention.
    ///
    /// "friday" keeps the time, "at 3pm" keeps the date, "in 2 hours" is relative to now.
    ///
    /// ## Errors
    /// Returns a `ParseFailure` if `text` names no date or time, or names an impossible date.
    pub fn reschedule_instant(
        &self,
        text: &str,
        current: DateTime<Utc>,
        timezone: Tz,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, ParseFailure> {
        let fail = |reason| ParseFailure {
            segment: text.to_string(),
            reason,
        };
        let extraction = self.extract(text);
        let resolver = self.resolver(timezone, now);
        if let Some(reason) = extraction.range_failure() {
            return Err(fail(reason));
        }
        if let Some(offset) = extraction.offset {
            return resolver.shifted(offset).map_err(fail);
        }

        let date_cue = extraction
            .date
            .or_else(|| extraction.single_weekday().map(DateCue::This));
        if date_cue.is_none() && extraction.time.is_none() {
            return Err(fail(FailureReason::NoTemporalCue));
        }

        let local = current.with_timezone(&timezone);
        let time = extraction.time.unwrap_or_else(|| local.time());
        let date = match date_cue {
            Some(cue) => resolver.resolve_date(cue, time).map_err(fail)?,
            None => local.date_naive(),
        };
        local_to_utc(date.and_time(time), timezone)
            .map_err(|e| fail(FailureReason::Unresolvable(e.to_string())))
    }

    /// ## Summary
    /// Replaces a recurring rule according to `text`, keeping whatever it does not mention.
    ///
    /// A new time alone keeps the cadence and its anchor. A new cadence or weekday
    /// restarts the series from the next matching occurrence after `now`.
    ///
    /// ## Errors
    /// Returns a `ParseFailure` if `text` names neither a time nor a recurrence.
    pub fn reschedule_rule(
        &self,
        text: &str,
        rule: &RecurrenceRule,
        now: DateTime<Utc>,
    ) -> Result<RecurrenceRule, ParseFailure> {
        let fail = |reason| ParseFailure {
            segment: text.to_string(),
            reason,
        };
        let extraction = self.extract(text);
        if let Some(reason) = extraction.range_failure() {
            return Err(fail(reason));
        }

        let cadence = extraction.cadence.or_else(|| match (extraction.date, rule.cadence) {
            (Some(DateCue::Next(day) | DateCue::This(day)), Cadence::Weekly { interval, .. }) => {
                Some(Cadence::Weekly {
                    weekdays: WeekdaySet::single(day),
                    interval,
                })
            }
            (Some(DateCue::Next(day) | DateCue::This(day)), Cadence::Daily { .. }) => {
                Some(Cadence::weekly(WeekdaySet::single(day)))
            }
            _ => None,
        });
        if cadence.is_none() && extraction.time.is_none() {
            return Err(fail(FailureReason::NoTemporalCue));
        }

        let time = extraction.time.unwrap_or(rule.time);
        let unresolvable = |e: kunai_time::error::TimeError| fail(FailureReason::Unresolvable(e.to_string()));
        match cadence {
            Some(cadence) => {
                let cadence = fill_weekdays(cadence, rule.anchor.weekday());
                RecurrenceRule::starting_after(cadence, time, rule.timezone, now).map_err(unresolvable)
            }
            None => RecurrenceRule::new(rule.cadence, time, rule.timezone, rule.anchor).map_err(unresolvable),
        }
    }
}

/// The request with the corrections the parser relied on applied.
fn render(tokens: &[Token], used: &HashSet<usize>) -> String {
    let mut out = String::new();
    for token in tokens {
        let word = if used.contains(&token.index) {
            token.corrected.as_str()
        } else {
            token.raw.as_str()
        };
        if !out.is_empty() && token.kind != TokenKind::Comma {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

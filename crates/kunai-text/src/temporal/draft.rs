use chrono::{DateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use kunai_time::RecurrenceRule;
use serde::Serialize;

/// Reason a draft needs the user's confirmation before it may be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ambiguity {
    /// No time was given; the configured fallback was used.
    DefaultedTime,
    /// An hour without am/pm was taken literally.
    MissingMeridiem,
    /// A weekday without `every`, `next`, `this` or `on` was read as weekly.
    AmbiguousWeekday,
    /// A time without a date was placed at its next occurrence.
    InferredDate,
    /// The resolved one-off time has already passed.
    InPast,
    /// A misspelled word the parser relied on was corrected.
    Corrected { from: String, to: String },
}

/// Draft produced by the parser for one segment of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingSpec {
    pub title: String,
    /// First occurrence.
    pub anchor: DateTime<Utc>,
    pub recurrence: Option<RecurrenceRule>,
    /// Local time of day in `timezone`.
    pub time: NaiveTime,
    pub timezone: Tz,
    pub confident: bool,
    pub ambiguities: Vec<Ambiguity>,
    /// Segment text the draft was read from.
    pub source: String,
}

impl MeetingSpec {
    /// Marks a draft as accepted by the user.
    #[must_use]
    pub fn confirm(mut self) -> Self {
        self.confident = true;
        self
    }

    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// No date, time or recurrence was found.
    NoTemporalCue,
    /// A calendar date that does not exist, e.g. February 30.
    InvalidDate(String),
    /// The cues were found but could not be turned into an instant.
    Unresolvable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseFailure {
    pub segment: String,
    pub reason: FailureReason,
}

impl std::fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            FailureReason::NoTemporalCue => {
                write!(f, "no date, time or recurrence in \"{}\"", self.segment)
            }
            FailureReason::InvalidDate(detail) | FailureReason::Unresolvable(detail) => {
                write!(f, "could not read \"{}\": {detail}", self.segment)
            }
        }
    }
}

pub type SegmentResult = Result<MeetingSpec, ParseFailure>;

/// Everything the parser read from one request, in input order.
#[derive(Debug, Clone)]
pub struct ParsedRequest {
    pub segments: Vec<SegmentResult>,
    /// The request with the corrections the parser relied on applied.
    pub corrected_text: String,
}

impl ParsedRequest {
    pub fn drafts(&self) -> impl Iterator<Item = &MeetingSpec> {
        self.segments.iter().filter_map(|s| s.as_ref().ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ParseFailure> {
        self.segments.iter().filter_map(|s| s.as_ref().err())
    }

    /// True when at least one draft exists and every draft is confident.
    #[must_use]
    pub fn is_confident(&self) -> bool {
        let mut drafts = self.drafts().peekable();
        drafts.peek().is_some() && drafts.all(|d| d.confident)
    }

    /// Splits into drafts and failures, keeping input order within each.
    #[must_use]
    pub fn into_parts(self) -> (Vec<MeetingSpec>, Vec<ParseFailure>) {
        let mut drafts = Vec::new();
        let mut failures = Vec::new();
        for segment in self.segments {
            match segment {
                Ok(draft) => drafts.push(draft),
                Err(failure) => failures.push(failure),
            }
        }
        (drafts, failures)
    }
}

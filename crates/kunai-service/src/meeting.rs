//! Stored meetings and the occurrences they produce.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use kunai_core::types::{MeetingId, UserId};
use kunai_text::temporal::MeetingSpec;
use kunai_time::{RecurrenceRule, TimeWindow};
use serde::Serialize;

/// When a meeting happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// A single instant, with the timezone it was written in.
    OneOff { at: DateTime<Utc>, timezone: Tz },
    Recurring(RecurrenceRule),
}

impl Schedule {
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        match self {
            Self::OneOff { timezone, .. } => *timezone,
            Self::Recurring(rule) => rule.timezone,
        }
    }

    #[must_use]
    pub const fn rule(&self) -> Option<&RecurrenceRule> {
        match self {
            Self::OneOff { .. } => None,
            Self::Recurring(rule) => Some(rule),
        }
    }

    #[must_use]
    pub const fn is_recurring(&self) -> bool {
        matches!(self, Self::Recurring(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meeting {
    pub id: MeetingId,
    pub owner: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub schedule: Schedule,
}

impl Meeting {
    /// Builds a new meeting from a parsed draft.
    #[must_use]
    pub fn from_spec(owner: UserId, spec: MeetingSpec, now: DateTime<Utc>) -> Self {
        let schedule = match spec.recurrence {
            Some(rule) => Schedule::Recurring(rule),
            None => Schedule::OneOff {
                at: spec.anchor,
                timezone: spec.timezone,
            },
        };
        Self {
            id: MeetingId::new_v4(),
            owner,
            title: spec.title,
            created_at: now,
            schedule,
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner == user
    }

    /// Occurrences the schedule produces inside `window`, before exceptions.
    #[must_use]
    pub fn natural_in(&self, window: TimeWindow) -> Vec<NaturalOccurrence> {
        match self.schedule {
            Schedule::OneOff { at, .. } => {
                if window.contains(at) {
                    vec![NaturalOccurrence {
                        key: OccurrenceKey::Single,
                        at,
                    }]
                } else {
                    Vec::new()
                }
            }
            Schedule::Recurring(rule) => rule
                .occurrences_in(window)
                .map(|occurrence| NaturalOccurrence {
                    key: OccurrenceKey::Date(occurrence.date),
                    at: occurrence.at,
                })
                .collect(),
        }
    }
}

/// Stable identity of one occurrence of a meeting.
///
/// Recurring occurrences are keyed by their natural local date, so a
/// rescheduled occurrence keeps its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceKey {
    Date(NaiveDate),
    Single,
}

impl OccurrenceKey {
    #[must_use]
    pub const fn date(self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(date),
            Self::Single => None,
        }
    }
}

impl fmt::Display for OccurrenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{date}"),
            Self::Single => f.write_str("single"),
        }
    }
}

/// An occurrence as the schedule produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOccurrence {
    pub key: OccurrenceKey,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    Normal,
    Rescheduled,
}

/// An occurrence after exceptions are applied. Cancelled occurrences have none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveOccurrence {
    pub meeting_id: MeetingId,
    pub key: OccurrenceKey,
    pub at: DateTime<Utc>,
    pub status: OccurrenceStatus,
}

impl EffectiveOccurrence {
    #[must_use]
    pub const fn is_rescheduled(&self) -> bool {
        matches!(self.status, OccurrenceStatus::Rescheduled)
    }
}

//! Per-occurrence overrides layered over recurring rules.
//!
//! Overrides never alter the rule itself. Removing one restores the natural
//! occurrence.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use kunai_core::types::MeetingId;
use kunai_time::TimeWindow;
use kunai_time::error::TimeResult;

use crate::meeting::{
    EffectiveOccurrence, Meeting, NaturalOccurrence, OccurrenceKey, OccurrenceStatus, Schedule,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    Cancelled,
    RescheduledTo(DateTime<Utc>),
}

/// Overrides keyed by meeting and natural local date; at most one per key.
#[derive(Debug, Clone, Default)]
pub struct ExceptionStore {
    by_meeting: HashMap<MeetingId, BTreeMap<NaiveDate, Override>>,
}

impl ExceptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the override for one occurrence.
    pub fn upsert(&mut self, meeting: MeetingId, date: NaiveDate, value: Override) {
        self.by_meeting.entry(meeting).or_default().insert(date, value);
    }

    #[must_use]
    pub fn get(&self, meeting: MeetingId, date: NaiveDate) -> Option<Override> {
        self.by_meeting.get(&meeting)?.get(&date).copied()
    }

    #[must_use]
    pub fn has_exceptions(&self, meeting: MeetingId) -> bool {
        self.by_meeting.get(&meeting).is_some_and(|dates| !dates.is_empty())
    }

    /// Drops every override of a meeting, returning how many there were.
    pub fn clear(&mut self, meeting: MeetingId) -> usize {
        self.by_meeting.remove(&meeting).map_or(0, |dates| dates.len())
    }

    fn overrides(&self, meeting: MeetingId) -> impl Iterator<Item = (NaiveDate, Override)> + '_ {
        self.by_meeting
            .get(&meeting)
            .into_iter()
            .flat_map(|dates| dates.iter().map(|(date, value)| (*date, *value)))
    }

    fn lookup(&self, meeting: MeetingId, key: OccurrenceKey) -> Option<Override> {
        key.date().and_then(|date| self.get(meeting, date))
    }

    /// ## Summary
    /// Applies overrides to natural occurrences: cancelled ones are dropped,
    /// rescheduled ones move to their new instant, the rest pass through.
    pub fn apply(
        &self,
        meeting: &Meeting,
        natural: impl IntoIterator<Item = NaturalOccurrence>,
    ) -> Vec<EffectiveOccurrence> {
        natural
            .into_iter()
            .filter_map(|occurrence| match self.lookup(meeting.id, occurrence.key) {
                Some(Override::Cancelled) => None,
                Some(Override::RescheduledTo(at)) => Some(EffectiveOccurrence {
                    meeting_id: meeting.id,
                    key: occurrence.key,
                    at,
                    status: OccurrenceStatus::Rescheduled,
                }),
                None => Some(EffectiveOccurrence {
                    meeting_id: meeting.id,
                    key: occurrence.key,
                    at: occurrence.at,
                    status: OccurrenceStatus::Normal,
                }),
            })
            .collect()
    }

    /// ## Summary
    /// Effective occurrences whose effective instant lies in `window`, sorted by instant.
    ///
    /// Occurrences rescheduled into the window are included even when their
    /// natural time is outside it; occurrences rescheduled out of it are not.
    pub fn effective_in(&self, meeting: &Meeting, window: TimeWindow) -> Vec<EffectiveOccurrence> {
        let natural = meeting.natural_in(window);
        let seen: HashSet<OccurrenceKey> = natural.iter().map(|occurrence| occurrence.key).collect();
        let mut effective = self.apply(meeting, natural);

        if let Schedule::Recurring(rule) = meeting.schedule {
            for (date, value) in self.overrides(meeting.id) {
                if let Override::RescheduledTo(at) = value
                    && window.contains(at)
                    && rule.produces(date)
                    && !seen.contains(&OccurrenceKey::Date(date))
                {
                    effective.push(EffectiveOccurrence {
                        meeting_id: meeting.id,
                        key: OccurrenceKey::Date(date),
                        at,
                        status: OccurrenceStatus::Rescheduled,
                    });
                }
            }
        }

        effective.retain(|occurrence| window.contains(occurrence.at));
        effective.sort_by_key(|occurrence| (occurrence.at, occurrence.key));
        effective
    }

    /// ## Summary
    /// The earliest effective occurrence strictly after `after`.
    ///
    /// ## Errors
    /// Returns an error if the rule cannot place an occurrence on the timeline.
    pub fn next_effective(
        &self,
        meeting: &Meeting,
        after: DateTime<Utc>,
    ) -> TimeResult<Option<EffectiveOccurrence>> {
        let rule = match meeting.schedule {
            Schedule::OneOff { at, .. } => {
                return Ok((at > after).then_some(EffectiveOccurrence {
                    meeting_id: meeting.id,
                    key: OccurrenceKey::Single,
                    at,
                    status: OccurrenceStatus::Normal,
                }));
            }
            Schedule::Recurring(rule) => rule,
        };

        // Every overridden date is skipped at most once, so the walk ends.
        let overridden = self.by_meeting.get(&meeting.id).map_or(0, BTreeMap::len);
        let mut cursor = after;
        let mut natural = None;
        for _ in 0..=overridden {
            let occurrence = rule.next_occurrence(cursor)?;
            if self.get(meeting.id, occurrence.date).is_none() {
                natural = Some(EffectiveOccurrence {
                    meeting_id: meeting.id,
                    key: OccurrenceKey::Date(occurrence.date),
                    at: occurrence.at,
                    status: OccurrenceStatus::Normal,
                });
                break;
            }
            cursor = occurrence.at;
        }

        let moved = self
            .overrides(meeting.id)
            .filter_map(|(date, value)| match value {
                Override::RescheduledTo(at) if at > after && rule.produces(date) => {
                    Some(EffectiveOccurrence {
                        meeting_id: meeting.id,
                        key: OccurrenceKey::Date(date),
                        at,
                        status: OccurrenceStatus::Rescheduled,
                    })
                }
                _ => None,
            })
            .min_by_key(|occurrence| occurrence.at);

        Ok([natural, moved].into_iter().flatten().min_by_key(|occurrence| occurrence.at))
    }
}

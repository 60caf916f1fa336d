//! The operations a chat user can run, wired to parser, registry and timezones.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use kunai_core::config::Settings;
use kunai_core::types::{MeetingId, UserId};
use kunai_text::lexicon::Corrector;
use kunai_text::temporal::{Ambiguity, MeetingSpec, ParseFailure, ParserOptions, TemporalParser};
use kunai_time::{format_local, resolve_timezone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::exception::Override;
use crate::meeting::Schedule;
use crate::registry::{ClearRequest, MeetingEntry, MeetingRegistry};
use crate::timezone_store::UserTimezones;

/// A stored meeting as shown to its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeetingView {
    pub id: MeetingId,
    pub title: String,
    pub timezone: String,
    pub next: Option<DateTime<Utc>>,
    pub next_local: Option<String>,
    /// e.g. `every Mon, Wed at 18:00`; absent for one-off meetings.
    pub recurrence: Option<String>,
    pub rrule: Option<String>,
    pub has_exceptions: bool,
}

impl From<MeetingEntry> for MeetingView {
    fn from(entry: MeetingEntry) -> Self {
        let meeting = entry.meeting;
        let timezone = meeting.schedule.timezone();
        let rule = meeting.schedule.rule();
        Self {
            id: meeting.id,
            title: meeting.title,
            timezone: timezone.name().to_string(),
            next: entry.next.map(|occurrence| occurrence.at),
            next_local: entry.next.map(|occurrence| format_local(occurrence.at, timezone)),
            recurrence: rule.map(kunai_time::RecurrenceRule::summary),
            rrule: rule.map(kunai_time::RecurrenceRule::to_rrule),
            has_exceptions: entry.has_exceptions,
        }
    }
}

/// A parsed draft awaiting confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DraftView {
    pub title: String,
    pub first: DateTime<Utc>,
    pub first_local: String,
    pub recurrence: Option<String>,
    pub confident: bool,
    pub ambiguities: Vec<Ambiguity>,
    pub source: String,
}

impl From<&MeetingSpec> for DraftView {
    fn from(spec: &MeetingSpec) -> Self {
        Self {
            title: spec.title.clone(),
            first: spec.anchor,
            first_local: format_local(spec.anchor, spec.timezone),
            recurrence: spec.recurrence.as_ref().map(kunai_time::RecurrenceRule::summary),
            confident: spec.confident,
            ambiguities: spec.ambiguities.clone(),
            source: spec.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    /// Every draft was confident and has been stored.
    Created {
        meetings: Vec<MeetingView>,
        failures: Vec<ParseFailure>,
    },
    /// Nothing was stored; the user must confirm or reject the drafts.
    NeedsConfirmation {
        token: Uuid,
        corrected_text: String,
        drafts: Vec<DraftView>,
        failures: Vec<ParseFailure>,
    },
    /// No segment produced a draft.
    Failed { failures: Vec<ParseFailure> },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ManageAction {
    CancelInstance,
    CancelSeries,
    RescheduleInstance { text: String },
    RescheduleSeries { text: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ManageOutcome {
    OccurrenceCancelled {
        date: NaiveDate,
    },
    OccurrenceRescheduled {
        date: NaiveDate,
        at: DateTime<Utc>,
        at_local: String,
    },
    Deleted {
        id: MeetingId,
    },
    Rescheduled {
        meeting: MeetingView,
    },
}

#[derive(Debug)]
struct PendingDrafts {
    owner: UserId,
    drafts: Vec<MeetingSpec>,
    expires_at: DateTime<Utc>,
}

/// Everything a command needs, owned and passed around instead of global.
pub struct SchedulingContext {
    parser: TemporalParser,
    registry: Arc<MeetingRegistry>,
    timezones: UserTimezones,
    clock: Arc<dyn Clock>,
    pending: Mutex<HashMap<Uuid, PendingDrafts>>,
    draft_ttl: TimeDelta,
}

impl SchedulingContext {
    #[must_use]
    pub fn new(
        parser: TemporalParser,
        registry: Arc<MeetingRegistry>,
        timezones: UserTimezones,
        clock: Arc<dyn Clock>,
        draft_ttl: TimeDelta,
    ) -> Self {
        Self {
            parser,
            registry,
            timezones,
            clock,
            pending: Mutex::new(HashMap::new()),
            draft_ttl,
        }
    }

    /// ## Summary
    /// Builds the context and its registry from configuration.
    ///
    /// ## Errors
    /// Returns an error if parser options, the default timezone or the
    /// timezone store are invalid.
    pub fn from_settings(settings: &Settings, clock: Arc<dyn Clock>) -> ServiceResult<Self> {
        let parser = TemporalParser::new(
            Corrector::scheduling(),
            ParserOptions::from_config(&settings.parser)?,
        );
        Ok(Self::new(
            parser,
            Arc::new(MeetingRegistry::from_config(&settings.registry)),
            UserTimezones::from_config(&settings.timezone)?,
            clock,
            settings.registry.draft_ttl(),
        ))
    }

    #[must_use]
    pub fn registry(&self) -> Arc<MeetingRegistry> {
        Arc::clone(&self.registry)
    }

    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    #[must_use]
    pub const fn parser(&self) -> &TemporalParser {
        &self.parser
    }

    fn pending(&self) -> ServiceResult<MutexGuard<'_, HashMap<Uuid, PendingDrafts>>> {
        self.pending
            .lock()
            .map_err(|_err| ServiceError::InvariantViolation("pending drafts lock poisoned"))
    }

    fn view(&self, id: MeetingId, now: DateTime<Utc>) -> ServiceResult<MeetingView> {
        Ok(MeetingEntry {
            meeting: self.registry.get(id)?,
            next: self.registry.next_effective(id, now)?,
            has_exceptions: self.registry.has_exceptions(id)?,
        }
        .into())
    }

    /// ## Summary
    /// Parses `text` and stores the resulting meetings, or holds them for
    /// confirmation when any draft is uncertain.
    ///
    /// `timezone` overrides the user's stored timezone for this request.
    ///
    /// ## Errors
    /// Returns a `TimeError` if `timezone` is not a known timezone.
    #[tracing::instrument(skip(self))]
    pub fn schedule(&self, user: &UserId, text: &str, timezone: Option<&str>) -> ServiceResult<ScheduleOutcome> {
        let tz: Tz = match timezone {
            Some(name) => resolve_timezone(name)?,
            None => self.timezones.resolve(user)?,
        };
        let now = self.clock.now();
        let parsed = self.parser.parse(text, tz, now);
        let confident = parsed.is_confident();
        let corrected_text = parsed.corrected_text.clone();
        let (drafts, failures) = parsed.into_parts();

        if drafts.is_empty() {
            tracing::debug!(failures = failures.len(), "Nothing to schedule");
            return Ok(ScheduleOutcome::Failed { failures });
        }

        if confident {
            let mut meetings = Vec::with_capacity(drafts.len());
            for draft in drafts {
                let meeting = self.registry.create(user, draft, now)?;
                meetings.push(self.view(meeting.id, now)?);
            }
            return Ok(ScheduleOutcome::Created { meetings, failures });
        }

        let token = Uuid::new_v4();
        let views = drafts.iter().map(DraftView::from).collect();
        let mut pending = self.pending()?;
        pending.retain(|_, entry| entry.expires_at >= now);
        pending.insert(
            token,
            PendingDrafts {
                owner: user.clone(),
                drafts,
                expires_at: now + self.draft_ttl,
            },
        );
        tracing::debug!(%token, "Drafts held for confirmation");
        Ok(ScheduleOutcome::NeedsConfirmation {
            token,
            corrected_text,
            drafts: views,
            failures,
        })
    }

    fn take_pending(&self, user: &UserId, token: Uuid, now: DateTime<Utc>) -> ServiceResult<Vec<MeetingSpec>> {
        let mut pending = self.pending()?;
        let entry = pending
            .get(&token)
            .ok_or_else(|| ServiceError::NotFound(format!("drafts {token}")))?;
        if &entry.owner != user {
            return Err(ServiceError::InvalidOperation(
                "these drafts belong to another user".to_string(),
            ));
        }
        let entry = pending
            .remove(&token)
            .ok_or(ServiceError::InvariantViolation("pending drafts vanished under lock"))?;
        if now > entry.expires_at {
            return Err(ServiceError::InvalidOperation(
                "the drafts have expired; schedule again".to_string(),
            ));
        }
        Ok(entry.drafts)
    }

    /// ## Summary
    /// Stores drafts the user agreed to.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown token and `InvalidOperation` if the
    /// drafts belong to someone else or have expired.
    #[tracing::instrument(skip(self))]
    pub fn confirm(&self, user: &UserId, token: Uuid) -> ServiceResult<Vec<MeetingView>> {
        let now = self.clock.now();
        let drafts = self.take_pending(user, token, now)?;
        let mut meetings = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let meeting = self.registry.create(user, draft.confirm(), now)?;
            meetings.push(self.view(meeting.id, now)?);
        }
        Ok(meetings)
    }

    /// ## Summary
    /// Discards held drafts, returning how many there were.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown token and `InvalidOperation` if the
    /// drafts belong to someone else or have expired.
    #[tracing::instrument(skip(self))]
    pub fn reject(&self, user: &UserId, token: Uuid) -> ServiceResult<usize> {
        let now = self.clock.now();
        Ok(self.take_pending(user, token, now)?.len())
    }

    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn list(&self, user: &UserId) -> ServiceResult<Vec<MeetingView>> {
        let now = self.clock.now();
        Ok(self
            .registry
            .list(user, now)?
            .into_iter()
            .map(MeetingView::from)
            .collect())
    }

    /// The occurrence an instance action applies to: `date` if given, else the next one.
    fn instance_date(&self, id: MeetingId, date: Option<NaiveDate>, now: DateTime<Utc>) -> ServiceResult<NaiveDate> {
        if let Some(date) = date {
            return Ok(date);
        }
        self.registry
            .next_effective(id, now)?
            .ok_or_else(|| ServiceError::NotFound(format!("upcoming occurrence of meeting {id}")))?
            .key
            .date()
            .ok_or_else(one_off_has_no_instances)
    }

    /// ## Summary
    /// Cancels or moves one occurrence or the whole meeting.
    ///
    /// Instance actions apply to `date` (the occurrence's natural local date)
    /// or, when absent, to the next effective occurrence.
    ///
    /// ## Errors
    /// Returns `NotFound` for unknown meetings or occurrences, `NotOwner` when
    /// `user` does not own the meeting, `InvalidOperation` for instance actions
    /// on one-off meetings and `ParseFailed` if the new time cannot be read.
    #[tracing::instrument(skip(self))]
    pub fn manage(
        &self,
        user: &UserId,
        id: MeetingId,
        action: &ManageAction,
        date: Option<NaiveDate>,
    ) -> ServiceResult<ManageOutcome> {
        let now = self.clock.now();
        let meeting = self.registry.get(id)?;
        if !meeting.is_owned_by(user) {
            return Err(ServiceError::NotOwner(id));
        }

        match action {
            ManageAction::CancelSeries => {
                self.registry.delete(user, id)?;
                Ok(ManageOutcome::Deleted { id })
            }
            ManageAction::CancelInstance => {
                if !meeting.schedule.is_recurring() {
                    return Err(one_off_has_no_instances());
                }
                let date = self.instance_date(id, date, now)?;
                self.registry.cancel_instance(user, id, date)?;
                Ok(ManageOutcome::OccurrenceCancelled { date })
            }
            ManageAction::RescheduleInstance { text } => {
                let Schedule::Recurring(rule) = meeting.schedule else {
                    return Err(one_off_has_no_instances());
                };
                let date = self.instance_date(id, date, now)?;
                let current = match self.registry.exception(id, date)? {
                    Some(Override::RescheduledTo(at)) => at,
                    _ => rule.instant_on(date)?,
                };
                let at = self
                    .parser
                    .reschedule_instant(text, current, rule.timezone, now)
                    .map_err(|e| ServiceError::ParseFailed(e.to_string()))?;
                self.registry.reschedule_instance(user, id, date, at)?;
                Ok(ManageOutcome::OccurrenceRescheduled {
                    date,
                    at,
                    at_local: format_local(at, rule.timezone),
                })
            }
            ManageAction::RescheduleSeries { text } => {
                match meeting.schedule {
                    Schedule::Recurring(rule) => {
                        let rule = self
                            .parser
                            .reschedule_rule(text, &rule, now)
                            .map_err(|e| ServiceError::ParseFailed(e.to_string()))?;
                        self.registry.reschedule_series(user, id, rule)?;
                    }
                    Schedule::OneOff { at, timezone } => {
                        let at = self
                            .parser
                            .reschedule_instant(text, at, timezone, now)
                            .map_err(|e| ServiceError::ParseFailed(e.to_string()))?;
                        self.registry.reschedule_one_off(user, id, at)?;
                    }
                }
                Ok(ManageOutcome::Rescheduled {
                    meeting: self.view(id, now)?,
                })
            }
        }
    }

    /// ## Summary
    /// First step of deleting all of `user`'s meetings.
    ///
    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn clear_all(&self, user: &UserId) -> ServiceResult<ClearRequest> {
        self.registry.request_clear_all(user, self.clock.now())
    }

    /// ## Summary
    /// Second step of deleting all of `user`'s meetings.
    ///
    /// ## Errors
    /// Returns `InvalidOperation` if the token is missing, wrong or expired.
    pub fn confirm_clear_all(&self, user: &UserId, token: Uuid) -> ServiceResult<usize> {
        self.registry.confirm_clear_all(user, token, self.clock.now())
    }

    /// ## Summary
    /// Stores the user's timezone and returns its canonical name.
    ///
    /// ## Errors
    /// Returns a `TimeError` for unknown names or an error if the store cannot be written.
    pub fn set_timezone(&self, user: &UserId, name: &str) -> ServiceResult<String> {
        Ok(self.timezones.set(user, name)?.name().to_string())
    }

    /// ## Errors
    /// Returns an error if the timezone store cannot be read.
    pub fn timezone_of(&self, user: &UserId) -> ServiceResult<Tz> {
        self.timezones.resolve(user)
    }
}

fn one_off_has_no_instances() -> ServiceError {
    ServiceError::InvalidOperation("a one-off meeting has no separate occurrences".to_string())
}

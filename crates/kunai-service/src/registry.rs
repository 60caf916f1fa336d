//! In-memory meeting registry.
//!
//! Meetings and their exceptions live behind one lock so every mutation is
//! atomic with respect to a concurrent reminder poll.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use kunai_core::config::RegistryConfig;
use kunai_core::types::{MeetingId, UserId};
use kunai_text::temporal::MeetingSpec;
use kunai_time::RecurrenceRule;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ServiceError, ServiceResult};
use crate::exception::{ExceptionStore, Override};
use crate::meeting::{EffectiveOccurrence, Meeting, Schedule};

/// A pending request to delete all of a user's meetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClearRequest {
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
    /// Meetings that would be deleted.
    pub pending: usize,
}

/// A meeting with its next effective occurrence, as listed to its owner.
#[derive(Debug, Clone)]
pub struct MeetingEntry {
    pub meeting: Meeting,
    pub next: Option<EffectiveOccurrence>,
    pub has_exceptions: bool,
}

/// Consistent copy of the registry taken under the read lock.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub meetings: Vec<Meeting>,
    pub exceptions: ExceptionStore,
}

#[derive(Debug, Default)]
struct RegistryState {
    meetings: HashMap<MeetingId, Meeting>,
    exceptions: ExceptionStore,
    clear_requests: HashMap<UserId, ClearRequest>,
}

impl RegistryState {
    fn owned(&self, actor: &UserId, id: MeetingId) -> ServiceResult<&Meeting> {
        let meeting = self
            .meetings
            .get(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("meeting {id}")))?;
        if !meeting.is_owned_by(actor) {
            return Err(ServiceError::NotOwner(id));
        }
        Ok(meeting)
    }

    /// The rule of an owned recurring meeting, checked to produce `date`.
    fn instance_rule(&self, actor: &UserId, id: MeetingId, date: NaiveDate) -> ServiceResult<RecurrenceRule> {
        match self.owned(actor, id)?.schedule {
            Schedule::OneOff { .. } => Err(ServiceError::InvalidOperation(
                "a one-off meeting has no separate occurrences".to_string(),
            )),
            Schedule::Recurring(rule) if rule.produces(date) => Ok(rule),
            Schedule::Recurring(_) => Err(ServiceError::NotFound(format!(
                "occurrence on {date} of meeting {id}"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct MeetingRegistry {
    state: RwLock<RegistryState>,
    clear_ttl: TimeDelta,
}

impl MeetingRegistry {
    #[must_use]
    pub fn new(clear_ttl: TimeDelta) -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            clear_ttl,
        }
    }

    #[must_use]
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.clear_confirmation_ttl())
    }

    fn read(&self) -> ServiceResult<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|_err| ServiceError::InvariantViolation("meeting registry lock poisoned"))
    }

    fn write(&self) -> ServiceResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|_err| ServiceError::InvariantViolation("meeting registry lock poisoned"))
    }

    /// ## Summary
    /// Stores a confident draft as a new meeting owned by `owner`.
    ///
    /// ## Errors
    /// Returns `ParseAmbiguous` if the draft still needs the user's confirmation.
    #[tracing::instrument(skip(self, spec), fields(title = %spec.title))]
    pub fn create(&self, owner: &UserId, spec: MeetingSpec, now: DateTime<Utc>) -> ServiceResult<Meeting> {
        if !spec.confident {
            return Err(ServiceError::ParseAmbiguous(spec.source));
        }
        let meeting = Meeting::from_spec(owner.clone(), spec, now);
        self.write()?.meetings.insert(meeting.id, meeting.clone());
        tracing::info!(meeting_id = %meeting.id, recurring = meeting.schedule.is_recurring(), "Meeting created");
        Ok(meeting)
    }

    /// ## Errors
    /// Returns `NotFound` if no meeting has this id.
    pub fn get(&self, id: MeetingId) -> ServiceResult<Meeting> {
        self.read()?
            .meetings
            .get(&id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("meeting {id}")))
    }

    /// ## Summary
    /// The user's meetings, soonest next occurrence first. Meetings with no
    /// further occurrence come last, oldest first.
    ///
    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn list(&self, user: &UserId, now: DateTime<Utc>) -> ServiceResult<Vec<MeetingEntry>> {
        let state = self.read()?;
        let mut entries: Vec<MeetingEntry> = state
            .meetings
            .values()
            .filter(|meeting| meeting.is_owned_by(user))
            .map(|meeting| {
                let next = state
                    .exceptions
                    .next_effective(meeting, now)
                    .unwrap_or_else(|e| {
                        tracing::warn!(meeting_id = %meeting.id, error = %e, "Could not resolve next occurrence");
                        None
                    });
                MeetingEntry {
                    meeting: meeting.clone(),
                    next,
                    has_exceptions: state.exceptions.has_exceptions(meeting.id),
                }
            })
            .collect();
        drop(state);

        entries.sort_by(|a, b| match (&a.next, &b.next) {
            (Some(x), Some(y)) => x.at.cmp(&y.at).then(a.meeting.created_at.cmp(&b.meeting.created_at)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.meeting.created_at.cmp(&b.meeting.created_at),
        });
        Ok(entries)
    }

    /// ## Summary
    /// Next effective occurrence of one meeting after `after`.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown meeting or a `TimeError` if the rule cannot be resolved.
    pub fn next_effective(&self, id: MeetingId, after: DateTime<Utc>) -> ServiceResult<Option<EffectiveOccurrence>> {
        let state = self.read()?;
        let meeting = state
            .meetings
            .get(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("meeting {id}")))?;
        Ok(state.exceptions.next_effective(meeting, after)?)
    }

    /// ## Summary
    /// The override recorded for one occurrence, if any.
    ///
    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn exception(&self, id: MeetingId, date: NaiveDate) -> ServiceResult<Option<Override>> {
        Ok(self.read()?.exceptions.get(id, date))
    }

    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn has_exceptions(&self, id: MeetingId) -> ServiceResult<bool> {
        Ok(self.read()?.exceptions.has_exceptions(id))
    }

    /// ## Summary
    /// Deletes a meeting and its exceptions.
    ///
    /// ## Errors
    /// Returns `NotFound` for an unknown meeting and `NotOwner` if `actor` does not own it.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, actor: &UserId, id: MeetingId) -> ServiceResult<Meeting> {
        let mut state = self.write()?;
        state.owned(actor, id)?;
        state.exceptions.clear(id);
        let meeting = state
            .meetings
            .remove(&id)
            .ok_or(ServiceError::InvariantViolation("owned meeting vanished under write lock"))?;
        tracing::info!(meeting_id = %id, "Meeting deleted");
        Ok(meeting)
    }

    /// ## Summary
    /// Cancels the occurrence of a recurring meeting on its natural local `date`.
    ///
    /// ## Errors
    /// Returns `InvalidOperation` for a one-off meeting and `NotFound` if the rule
    /// does not produce `date`.
    #[tracing::instrument(skip(self))]
    pub fn cancel_instance(&self, actor: &UserId, id: MeetingId, date: NaiveDate) -> ServiceResult<()> {
        let mut state = self.write()?;
        state.instance_rule(actor, id, date)?;
        state.exceptions.upsert(id, date, Override::Cancelled);
        tracing::info!(meeting_id = %id, %date, "Occurrence cancelled");
        Ok(())
    }

    /// ## Summary
    /// Moves the occurrence of a recurring meeting on its natural local `date` to `at`.
    ///
    /// ## Errors
    /// Returns `InvalidOperation` for a one-off meeting and `NotFound` if the rule
    /// does not produce `date`.
    #[tracing::instrument(skip(self))]
    pub fn reschedule_instance(
        &self,
        actor: &UserId,
        id: MeetingId,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> ServiceResult<()> {
        let mut state = self.write()?;
        state.instance_rule(actor, id, date)?;
        state.exceptions.upsert(id, date, Override::RescheduledTo(at));
        tracing::info!(meeting_id = %id, %date, %at, "Occurrence rescheduled");
        Ok(())
    }

    /// ## Summary
    /// Replaces the rule of a recurring meeting and drops all of its exceptions.
    ///
    /// ## Errors
    /// Returns `InvalidOperation` for a one-off meeting.
    #[tracing::instrument(skip(self, rule), fields(rrule = %rule.to_rrule()))]
    pub fn reschedule_series(&self, actor: &UserId, id: MeetingId, rule: RecurrenceRule) -> ServiceResult<Meeting> {
        let mut state = self.write()?;
        if !state.owned(actor, id)?.schedule.is_recurring() {
            return Err(ServiceError::InvalidOperation(
                "a one-off meeting has no series to reschedule".to_string(),
            ));
        }
        let cleared = state.exceptions.clear(id);
        let meeting = state
            .meetings
            .get_mut(&id)
            .ok_or(ServiceError::InvariantViolation("owned meeting vanished under write lock"))?;
        meeting.schedule = Schedule::Recurring(rule);
        tracing::info!(meeting_id = %id, cleared, "Series rescheduled");
        Ok(meeting.clone())
    }

    /// ## Summary
    /// Moves a one-off meeting to `at`.
    ///
    /// ## Errors
    /// Returns `InvalidOperation` for a recurring meeting.
    #[tracing::instrument(skip(self))]
    pub fn reschedule_one_off(&self, actor: &UserId, id: MeetingId, at: DateTime<Utc>) -> ServiceResult<Meeting> {
        let mut state = self.write()?;
        let timezone = match state.owned(actor, id)?.schedule {
            Schedule::OneOff { timezone, .. } => timezone,
            Schedule::Recurring(_) => {
                return Err(ServiceError::InvalidOperation(
                    "a recurring meeting is moved by occurrence or by series".to_string(),
                ));
            }
        };
        let meeting = state
            .meetings
            .get_mut(&id)
            .ok_or(ServiceError::InvariantViolation("owned meeting vanished under write lock"))?;
        meeting.schedule = Schedule::OneOff { at, timezone };
        tracing::info!(meeting_id = %id, %at, "Meeting rescheduled");
        Ok(meeting.clone())
    }

    /// ## Summary
    /// Starts the two-step deletion of all of `user`'s meetings. Deletes nothing.
    ///
    /// A second request replaces the first token.
    ///
    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    #[tracing::instrument(skip(self))]
    pub fn request_clear_all(&self, user: &UserId, now: DateTime<Utc>) -> ServiceResult<ClearRequest> {
        let mut state = self.write()?;
        let pending = state.meetings.values().filter(|m| m.is_owned_by(user)).count();
        let request = ClearRequest {
            token: Uuid::new_v4(),
            expires_at: now + self.clear_ttl,
            pending,
        };
        state.clear_requests.insert(user.clone(), request);
        tracing::debug!(pending, expires_at = %request.expires_at, "Clear-all requested");
        Ok(request)
    }

    /// ## Summary
    /// Deletes all of `user`'s meetings and their exceptions, given the token
    /// from [`Self::request_clear_all`]. Returns how many meetings were deleted.
    ///
    /// ## Errors
    /// Returns `InvalidOperation` if there is no pending request, the token does
    /// not match, or the request has expired.
    #[tracing::instrument(skip(self))]
    pub fn confirm_clear_all(&self, user: &UserId, token: Uuid, now: DateTime<Utc>) -> ServiceResult<usize> {
        let mut state = self.write()?;
        let request = state
            .clear_requests
            .get(user)
            .copied()
            .ok_or_else(|| ServiceError::InvalidOperation("no clear-all request is pending".to_string()))?;
        if request.token != token {
            return Err(ServiceError::InvalidOperation(
                "clear-all confirmation token does not match".to_string(),
            ));
        }
        state.clear_requests.remove(user);
        if now > request.expires_at {
            return Err(ServiceError::InvalidOperation(
                "clear-all confirmation has expired".to_string(),
            ));
        }

        let ids: Vec<MeetingId> = state
            .meetings
            .values()
            .filter(|m| m.is_owned_by(user))
            .map(|m| m.id)
            .collect();
        for id in &ids {
            state.meetings.remove(id);
            state.exceptions.clear(*id);
        }
        tracing::info!(deleted = ids.len(), "Cleared all meetings");
        Ok(ids.len())
    }

    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn snapshot(&self) -> ServiceResult<Snapshot> {
        let state = self.read()?;
        Ok(Snapshot {
            meetings: state.meetings.values().cloned().collect(),
            exceptions: state.exceptions.clone(),
        })
    }

    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn len(&self) -> ServiceResult<usize> {
        Ok(self.read()?.meetings.len())
    }

    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn is_empty(&self) -> ServiceResult<bool> {
        Ok(self.len()? == 0)
    }
}

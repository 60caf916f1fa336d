use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use kunai_core::config::SchedulerConfig;
use kunai_core::types::MeetingId;
use kunai_time::{TimeWindow, format_local};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing_futures::Instrument;

use crate::clock::Clock;
use crate::error::ServiceResult;
use crate::meeting::OccurrenceKey;
use crate::registry::MeetingRegistry;

use super::sink::{ReminderNotice, ReminderSink};

#[derive(Debug, Clone, Copy)]
pub struct ReminderSettings {
    pub enabled: bool,
    pub poll_interval: Duration,
    /// How long before an occurrence its reminder is due.
    pub lead: TimeDelta,
    /// How far past its start an occurrence may be and still get a reminder.
    pub catch_up: TimeDelta,
}

impl From<&SchedulerConfig> for ReminderSettings {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            enabled: config.enabled,
            poll_interval: config.poll_interval(),
            lead: config.lead_time(),
            catch_up: config.catch_up(),
        }
    }
}

/// Periodically notifies owners of occurrences that are about to start.
///
/// Each occurrence is notified at most once per process. An occurrence is
/// marked before its notice is delivered, so a failing sink is never retried.
pub struct ReminderScheduler {
    registry: Arc<MeetingRegistry>,
    sink: Arc<dyn ReminderSink>,
    clock: Arc<dyn Clock>,
    settings: ReminderSettings,
    notified: Mutex<HashSet<(MeetingId, OccurrenceKey)>>,
}

impl ReminderScheduler {
    #[must_use]
    pub fn new(
        registry: Arc<MeetingRegistry>,
        sink: Arc<dyn ReminderSink>,
        clock: Arc<dyn Clock>,
        settings: ReminderSettings,
    ) -> Self {
        Self {
            registry,
            sink,
            clock,
            settings,
            notified: Mutex::new(HashSet::new()),
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &ReminderSettings {
        &self.settings
    }

    /// Instants a poll at `now` covers: `(now - catch_up, now + lead]`.
    fn window(&self, now: DateTime<Utc>) -> TimeWindow {
        let tick = TimeDelta::nanoseconds(1);
        let start = now
            .checked_sub_signed(self.settings.catch_up)
            .and_then(|start| start.checked_add_signed(tick))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = now
            .checked_add_signed(self.settings.lead)
            .and_then(|end| end.checked_add_signed(tick))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        TimeWindow::new(start, end)
    }

    /// ## Summary
    /// Collects the notices due at `now` and marks them as sent.
    ///
    /// Occurrences are evaluated per meeting before the reminder record is
    /// touched. A meeting whose rule cannot be expanded contributes nothing.
    ///
    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub fn due(&self, now: DateTime<Utc>) -> ServiceResult<Vec<ReminderNotice>> {
        let snapshot = self.registry.snapshot()?;
        let window = self.window(now);

        let pending: Vec<_> = snapshot
            .meetings
            .iter()
            .map(|meeting| (meeting, snapshot.exceptions.effective_in(meeting, window)))
            .filter(|(_, due)| !due.is_empty())
            .collect();

        let mut notified = self.notified.lock().unwrap_or_else(PoisonError::into_inner);
        let mut notices = Vec::new();
        for (meeting, due) in pending {
            let timezone = meeting.schedule.timezone();
            for occurrence in due {
                if !notified.insert((meeting.id, occurrence.key)) {
                    continue;
                }
                tracing::debug!(
                    meeting_id = %meeting.id,
                    occurrence = %occurrence.key,
                    at = %occurrence.at,
                    "Reminder due"
                );
                notices.push(ReminderNotice {
                    meeting_id: meeting.id,
                    title: meeting.title.clone(),
                    at: occurrence.at,
                    localized: format_local(occurrence.at, timezone),
                    owner: meeting.owner.clone(),
                    rescheduled: occurrence.is_rescheduled(),
                });
            }
        }
        Ok(notices)
    }

    /// ## Summary
    /// Runs one poll: delivers every notice due at `now` and returns how many were due.
    ///
    /// Delivery failures are logged per notice and do not stop the others.
    ///
    /// ## Errors
    /// Returns `InvariantViolation` if the registry lock is poisoned.
    pub async fn poll_once(&self, now: DateTime<Utc>) -> ServiceResult<usize> {
        let notices = self.due(now)?;
        for notice in &notices {
            if let Err(e) = self.sink.deliver(notice).await {
                tracing::warn!(
                    meeting_id = %notice.meeting_id,
                    error = %e,
                    "Reminder delivery failed"
                );
            }
        }
        Ok(notices.len())
    }

    /// Whether the occurrence was already notified.
    #[must_use]
    pub fn was_notified(&self, meeting: MeetingId, key: OccurrenceKey) -> bool {
        self.notified
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(meeting, key))
    }

    /// ## Summary
    /// Spawns the polling loop. Returns `None` when reminders are disabled.
    ///
    /// Missed ticks are skipped rather than replayed in a burst.
    pub fn run(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if !self.settings.enabled {
            tracing::info!("Reminder scheduler disabled by configuration");
            return None;
        }

        tracing::info!(
            interval_secs = self.settings.poll_interval.as_secs(),
            lead_minutes = self.settings.lead.num_minutes(),
            "Starting reminder scheduler"
        );

        let span = tracing::info_span!("reminder_scheduler");
        Some(tokio::spawn(
            async move {
                let mut timer = interval(self.settings.poll_interval);
                timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

                loop {
                    timer.tick().await;
                    let now = self.clock.now();
                    match self.poll_once(now).await {
                        Ok(0) => tracing::trace!("No reminders due"),
                        Ok(sent) => tracing::debug!(sent, "Reminder poll complete"),
                        Err(e) => tracing::error!(error = %e, "Reminder poll failed"),
                    }
                }
            }
            .instrument(span),
        ))
    }
}

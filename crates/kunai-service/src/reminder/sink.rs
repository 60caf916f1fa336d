use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use kunai_core::config::SchedulerConfig;
use kunai_core::types::{MeetingId, UserId};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::{ServiceError, ServiceResult};

/// What a reminder tells its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderNotice {
    pub meeting_id: MeetingId,
    pub title: String,
    /// Effective start of the occurrence.
    pub at: DateTime<Utc>,
    /// `at` rendered in the meeting's timezone.
    pub localized: String,
    pub owner: UserId,
    pub rescheduled: bool,
}

impl ReminderNotice {
    /// Chat message text, e.g. `<@alice> reminder: Standup at Wed 21 Oct 2026 18:00 UTC`.
    #[must_use]
    pub fn message(&self) -> String {
        let mut text = format!("<@{}> reminder: {} at {}", self.owner, self.title, self.localized);
        if self.rescheduled {
            text.push_str(" (rescheduled)");
        }
        text
    }
}

/// Destination for reminder notices.
pub trait ReminderSink: Send + Sync {
    /// ## Errors
    /// Returns an error if the notice could not be handed over.
    fn deliver<'a>(&'a self, notice: &'a ReminderNotice) -> BoxFuture<'a, ServiceResult<()>>;
}

/// Writes reminders to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ReminderSink for LogSink {
    fn deliver<'a>(&'a self, notice: &'a ReminderNotice) -> BoxFuture<'a, ServiceResult<()>> {
        Box::pin(async move {
            tracing::info!(
                meeting_id = %notice.meeting_id,
                owner = %notice.owner,
                at = %notice.at,
                rescheduled = notice.rescheduled,
                "{}",
                notice.message()
            );
            Ok(())
        })
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// Posts reminders to a chat webhook as `{"content": "..."}`.
#[derive(Debug, Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl ReminderSink for WebhookSink {
    fn deliver<'a>(&'a self, notice: &'a ReminderNotice) -> BoxFuture<'a, ServiceResult<()>> {
        Box::pin(async move {
            let message = notice.message();
            let response = self
                .client
                .post(&self.url)
                .json(&WebhookPayload { content: &message })
                .send()
                .await?;
            response.error_for_status()?;
            tracing::debug!(meeting_id = %notice.meeting_id, "Reminder posted to webhook");
            Ok(())
        })
    }
}

/// Hands reminders to an in-process receiver.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ReminderNotice>,
}

impl ChannelSink {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReminderNotice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ReminderSink for ChannelSink {
    fn deliver<'a>(&'a self, notice: &'a ReminderNotice) -> BoxFuture<'a, ServiceResult<()>> {
        Box::pin(async move {
            self.tx
                .send(notice.clone())
                .map_err(|_err| ServiceError::InvariantViolation("reminder receiver dropped"))
        })
    }
}

/// Webhook sink when a URL is configured, log sink otherwise.
#[must_use]
pub fn sink_from_config(config: &SchedulerConfig) -> Arc<dyn ReminderSink> {
    match config.webhook_url.as_deref().filter(|url| !url.is_empty()) {
        Some(url) => {
            tracing::info!(url, "Reminders will be posted to webhook");
            Arc::new(WebhookSink::new(url))
        }
        None => Arc::new(LogSink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn notice(rescheduled: bool) -> ReminderNotice {
        ReminderNotice {
            meeting_id: MeetingId::new_v4(),
            title: "Standup".to_string(),
            at: Utc.with_ymd_and_hms(2026, 10, 21, 18, 0, 0).unwrap(),
            localized: "Wed 21 Oct 2026 18:00 UTC".to_string(),
            owner: UserId::new("alice"),
            rescheduled,
        }
    }

    #[test]
    fn message_mentions_owner_and_reschedule() {
        assert_eq!(
            notice(false).message(),
            "<@alice> reminder: Standup at Wed 21 Oct 2026 18:00 UTC"
        );
        assert!(notice(true).message().ends_with("(rescheduled)"));
    }

    #[test]
    fn webhook_payload_shape() {
        let json = serde_json::to_value(WebhookPayload { content: "hi" }).unwrap();
        assert_eq!(json, serde_json::json!({ "content": "hi" }));
    }

    #[tokio::test]
    async fn channel_sink_forwards_notices() {
        let (sink, mut rx) = ChannelSink::new();
        sink.deliver(&notice(false)).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().title, "Standup");
    }
}

//! Reminder delivery for upcoming occurrences.

mod scheduler;
mod sink;

pub use scheduler::{ReminderScheduler, ReminderSettings};
pub use sink::{ChannelSink, LogSink, ReminderNotice, ReminderSink, WebhookSink, sink_from_config};

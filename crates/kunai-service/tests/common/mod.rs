#![expect(clippy::unwrap_used, reason = "Fixtures panic on malformed setup")]
#![allow(dead_code, reason = "Each test binary uses a different subset of the fixtures")]
//! Shared fixtures for the service integration tests.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use kunai_core::types::{Cadence, UserId, WeekdaySet};
use kunai_service::meeting::Meeting;
use kunai_service::registry::MeetingRegistry;
use kunai_text::temporal::MeetingSpec;
use kunai_time::RecurrenceRule;

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn alice() -> UserId {
    UserId::new("alice")
}

pub fn bob() -> UserId {
    UserId::new("bob")
}

pub fn recurring_spec(title: &str, weekdays: &[Weekday], hour: u32, tz: Tz, anchor: NaiveDate) -> MeetingSpec {
    let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
    let rule = RecurrenceRule::new(
        Cadence::weekly(weekdays.iter().copied().collect::<WeekdaySet>()),
        time,
        tz,
        anchor,
    )
    .unwrap();
    MeetingSpec {
        title: title.to_string(),
        anchor: rule.instant_on(anchor).unwrap(),
        recurrence: Some(rule),
        time,
        timezone: tz,
        confident: true,
        ambiguities: Vec::new(),
        source: title.to_string(),
    }
}

pub fn one_off_spec(title: &str, at: DateTime<Utc>) -> MeetingSpec {
    MeetingSpec {
        title: title.to_string(),
        anchor: at,
        recurrence: None,
        time: at.time(),
        timezone: chrono_tz::UTC,
        confident: true,
        ambiguities: Vec::new(),
        source: title.to_string(),
    }
}

/// Alice's Mon/Wed 18:00 UTC standup starting Mon 2026-10-19.
pub fn standup(registry: &MeetingRegistry) -> Meeting {
    registry
        .create(
            &alice(),
            recurring_spec("Standup", &[Weekday::Mon, Weekday::Wed], 18, chrono_tz::UTC, date(2026, 10, 19)),
            utc(2026, 10, 1, 0, 0),
        )
        .unwrap()
}

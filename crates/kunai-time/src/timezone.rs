//! Timezone resolution and UTC conversion for wall-clock meeting times.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and timezone canonicalization,
//! so users may type `Eastern Standard Time`, `US/Eastern` or `america/new_york`.

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;
use std::str::FromStr;

use crate::error::{TimeError, TimeResult};

/// ## Summary
/// Resolves a user-supplied timezone name to a `chrono_tz::Tz`.
///
/// ## Errors
/// Returns `TimeError::UnknownTimezone` if the name cannot be resolved.
pub fn resolve_timezone(name: &str) -> TimeResult<Tz> {
    let normalized = normalize_timezone_name(name);
    Tz::from_str(&normalized).map_err(|_e| TimeError::UnknownTimezone(name.to_string()))
}

/// Normalizes a timezone name to its canonical IANA spelling.
///
/// Windows names are mapped through ICU; IANA names and aliases are
/// canonicalized case-insensitively. Unrecognized input is returned trimmed.
#[must_use]
pub fn normalize_timezone_name(name: &str) -> String {
    let trimmed = name.trim();

    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(trimmed, None) {
        let iana_parser = IanaParserExtended::new();
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    // Handles aliases like Europe/Kiev -> Europe/Kyiv
    let iana_parser = IanaParserExtended::new();
    let parsed = iana_parser.parse(trimmed);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    trimmed.to_string()
}

/// ## Summary
/// Places a wall-clock time in `tz` on the UTC timeline.
///
/// A time inside a DST gap is shifted forward by the length of the gap
/// (02:30 on a spring-forward night becomes 03:30). A time inside a DST
/// fold resolves to the earlier of the two instants.
///
/// ## Errors
/// Returns `TimeError::NonExistentTime` if no offset can be found around `local`.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> TimeResult<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earlier, _later) => Ok(earlier.with_timezone(&Utc)),
        LocalResult::None => {
            // Interpret with the offset in force before the transition.
            let missing = || TimeError::NonExistentTime(format!("{local} in timezone {tz}"));
            let day_before = local
                .checked_sub_signed(TimeDelta::days(1))
                .ok_or_else(missing)?;
            let before = tz.from_local_datetime(&day_before).earliest().ok_or_else(missing)?;
            let offset = TimeDelta::seconds(i64::from(before.offset().fix().local_minus_utc()));
            let utc = local.checked_sub_signed(offset).ok_or_else(missing)?;
            tracing::trace!(%local, %tz, "Shifted local time out of DST gap");
            Ok(Utc.from_utc_datetime(&utc))
        }
    }
}

/// Renders an instant in `tz` for people, e.g. `Mon 19 Oct 2026 18:00 EDT`.
#[must_use]
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    instant
        .with_timezone(&tz)
        .format("%a %-d %b %Y %H:%M %Z")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDateTime::new(
            NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            NaiveTime::from_hms_opt(h, min, 0).unwrap(),
        )
    }

    #[test]
    fn resolves_iana_name() {
        let tz = resolve_timezone("America/New_York").expect("known timezone");
        assert_eq!(tz, chrono_tz::America::New_York);
    }

    #[test]
    fn normalizes_windows_timezone() {
        assert_eq!(
            normalize_timezone_name("Eastern Standard Time"),
            "America/New_York"
        );
        assert_eq!(
            normalize_timezone_name("Pacific Standard Time"),
            "America/Los_Angeles"
        );
    }

    #[test]
    fn normalizes_iana_alias() {
        assert_eq!(normalize_timezone_name("Europe/Kiev"), "Europe/Kyiv");
        assert_eq!(normalize_timezone_name("US/Eastern"), "America/New_York");
    }

    #[test]
    fn unknown_timezone_is_rejected() {
        let err = resolve_timezone("Mars/Olympus_Mons").expect_err("unknown timezone");
        assert!(matches!(err, TimeError::UnknownTimezone(name) if name == "Mars/Olympus_Mons"));
    }

    #[test]
    fn converts_standard_and_daylight_time() {
        let tz = chrono_tz::America::New_York;

        let winter = local_to_utc(local(2026, 1, 15, 10, 0), tz).expect("valid time");
        assert_eq!(winter, Utc.with_ymd_and_hms(2026, 1, 15, 15, 0, 0).unwrap());

        let summer = local_to_utc(local(2026, 7, 15, 10, 0), tz).expect("valid time");
        assert_eq!(summer, Utc.with_ymd_and_hms(2026, 7, 15, 14, 0, 0).unwrap());
    }

    #[test]
    fn dst_gap_shifts_forward() {
        // 2026-03-08 02:30 does not exist in New York
        let tz = chrono_tz::America::New_York;
        let utc = local_to_utc(local(2026, 3, 8, 2, 30), tz).expect("shifted");
        assert_eq!(utc, Utc.with_ymd_and_hms(2026, 3, 8, 7, 30, 0).unwrap());
        assert_eq!(
            utc.with_timezone(&tz).time(),
            NaiveTime::from_hms_opt(3, 30, 0).unwrap()
        );
    }

    #[test]
    fn dst_fold_takes_earlier_instant() {
        // 2026-11-01 01:30 happens twice in New York
        let tz = chrono_tz::America::New_York;
        let utc = local_to_utc(local(2026, 11, 1, 1, 30), tz).expect("valid time");
        assert_eq!(utc, Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap());
    }

    #[test]
    fn formats_local_time() {
        let instant = Utc.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap();
        assert_eq!(
            format_local(instant, chrono_tz::America::New_York),
            "Mon 19 Oct 2026 18:00 EDT"
        );
    }
}

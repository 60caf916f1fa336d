use std::fmt;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// Chat-side identity of a user. Opaque to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identity of a stored meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingId(uuid::Uuid);

impl MeetingId {
    #[must_use]
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    #[must_use]
    pub const fn from_uuid(id: uuid::Uuid) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for MeetingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(Self)
    }
}

/// A set of weekdays stored as a Monday-first bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdaySet(u8);

const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

impl WeekdaySet {
    pub const EMPTY: Self = Self(0);
    pub const WORKDAYS: Self = Self(0b001_1111);
    pub const WEEKEND: Self = Self(0b110_0000);

    #[must_use]
    pub fn single(day: Weekday) -> Self {
        Self(1 << day.num_days_from_monday())
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn len(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterates members Monday first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        ALL_WEEKDAYS.into_iter().filter(move |day| self.contains(*day))
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl fmt::Display for WeekdaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::WORKDAYS {
            return f.write_str("weekdays");
        }
        if *self == Self::WEEKEND {
            return f.write_str("weekends");
        }
        let names: Vec<String> = self.iter().map(|day| day.to_string()).collect();
        f.write_str(&names.join(", "))
    }
}

/// How a recurring meeting repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cadence {
    /// On each listed weekday, every `interval` weeks.
    Weekly { weekdays: WeekdaySet, interval: u32 },
    /// Every `interval` days.
    Daily { interval: u32 },
}

impl Cadence {
    /// Largest interval a cadence may have, in days or weeks.
    pub const MAX_INTERVAL: u32 = 366;

    #[must_use]
    pub const fn weekly(weekdays: WeekdaySet) -> Self {
        Self::Weekly {
            weekdays,
            interval: 1,
        }
    }

    #[must_use]
    pub const fn daily() -> Self {
        Self::Daily { interval: 1 }
    }

    /// Interval clamped to at least one period.
    #[must_use]
    pub const fn interval(&self) -> u32 {
        let raw = match self {
            Self::Weekly { interval, .. } | Self::Daily { interval } => *interval,
        };
        if raw == 0 { 1 } else { raw }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weekly { weekdays, .. } => match self.interval() {
                1 => write!(f, "every {weekdays}"),
                2 => write!(f, "every other week on {weekdays}"),
                n => write!(f, "every {n} weeks on {weekdays}"),
            },
            Self::Daily { .. } => match self.interval() {
                1 => f.write_str("daily"),
                2 => f.write_str("every other day"),
                n => write!(f, "every {n} days"),
            },
        }
    }
}

//! Wall-clock time handling for the Kunai scheduler.
//!
//! Timezone name resolution, local-to-instant conversion across DST
//! transitions, and the recurrence arithmetic that turns a rule into
//! concrete occurrences.

pub mod error;
pub mod recurrence;
pub mod timezone;

pub use recurrence::{Occurrence, Occurrences, RecurrenceRule, TimeWindow};
pub use timezone::{format_local, local_to_utc, resolve_timezone};

//! Temporal expression parsing.
//!
//! A request is tokenized and spell-corrected, split into one segment per
//! meeting, and each segment is read for date, time, recurrence and title
//! before being placed on the calendar in the requester's timezone.

mod draft;
mod extract;
mod parser;
mod resolve;
mod segment;
mod token;

pub use draft::{Ambiguity, FailureReason, MeetingSpec, ParseFailure, ParsedRequest, SegmentResult};
pub use extract::{DateCue, Extraction};
pub use parser::{DefaultTime, ParserOptions, TemporalParser};

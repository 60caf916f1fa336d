//! Free-text understanding for the Kunai scheduler.
//!
//! The lexicon corrects misspelled scheduling words; the temporal parser turns
//! corrected text into meeting drafts.

pub mod error;
pub mod lexicon;
pub mod temporal;

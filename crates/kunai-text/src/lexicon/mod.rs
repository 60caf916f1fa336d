//! Scheduling vocabulary and typo correction.

mod corrector;
mod trie;
mod vocabulary;

pub use corrector::{Corrector, max_distance};
pub use trie::{Candidate, Trie};
pub use vocabulary::{Category, DayPeriod, Keyword, Relative, Term, Unit, Vocabulary};

use super::trie::{Candidate, Trie};
use super::vocabulary::{Term, Vocabulary};

/// Largest edit distance any correction may have.
pub const DISTANCE_CAP: usize = 3;

const MIN_CORRECTABLE_LEN: usize = 3;

/// Abbreviations such as `wed` or `mon` are recognized exactly but never
/// offered as corrections, or names like `ted` and `tom` would become weekdays.
const MIN_CANDIDATE_LEN: usize = 4;

/// Shortest token allowed an extra edit towards a longer word.
const MIN_STRETCH_LEN: usize = 5;

/// ## Summary
/// Edit budget for a word of `len` characters: up to 4 allows one edit,
/// 5 to 7 allow two, longer words allow three.
#[must_use]
pub const fn max_distance(len: usize) -> usize {
    match len {
        0..=4 => 1,
        5..=7 => 2,
        _ => DISTANCE_CAP,
    }
}

/// Spelling corrector over a scheduling vocabulary.
#[derive(Debug, Clone)]
pub struct Corrector {
    vocabulary: Vocabulary,
    trie: Trie,
}

impl Corrector {
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        let trie = vocabulary.words().collect();
        Self { vocabulary, trie }
    }

    #[must_use]
    pub fn scheduling() -> Self {
        Self::new(Vocabulary::scheduling())
    }

    #[must_use]
    pub const fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Vocabulary entry for an already-corrected token.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<Term> {
        self.vocabulary.lookup(token)
    }

    /// ## Summary
    /// Returns the closest vocabulary word to `token`, or `token` lowercased when
    /// it is already a word, is too short, contains non-letters, or nothing is
    /// close enough.
    ///
    /// A candidate is admissible when its distance fits the budget for the token's
    /// length. A token of five or more characters may spend one extra edit on a
    /// longer candidate with the same first letter that holds every letter of the
    /// token (`wendsay` to `wednesday`).
    /// Ties go to the smaller distance, then to a candidate sharing the token's
    /// first letter, then to the shorter word, then alphabetically.
    #[must_use]
    pub fn correct(&self, token: &str) -> String {
        let lowered = token.to_lowercase();
        let len = lowered.chars().count();

        if len < MIN_CORRECTABLE_LEN
            || !lowered.chars().all(char::is_alphabetic)
            || self.trie.contains(&lowered)
        {
            return lowered;
        }

        let first = lowered.chars().next();
        let best = self
            .trie
            .search(&lowered, DISTANCE_CAP)
            .into_iter()
            .filter(|c| {
                let candidate_len = c.word.chars().count();
                let stretched = len >= MIN_STRETCH_LEN
                    && candidate_len > len
                    && c.word.chars().next() == first
                    && letters_within(&lowered, &c.word);
                candidate_len >= MIN_CANDIDATE_LEN
                    && c.distance <= max_distance(len) + usize::from(stretched)
            })
            .min_by(|a, b| rank(a, first).cmp(&rank(b, first)));

        match best {
            Some(candidate) => {
                tracing::trace!(token, correction = %candidate.word, distance = candidate.distance, "Corrected token");
                candidate.word
            }
            None => lowered,
        }
    }
}

/// Whether `word` holds every letter of `token`, counting repeats.
fn letters_within(token: &str, word: &str) -> bool {
    let mut pool: Vec<char> = word.chars().collect();
    token.chars().all(|ch| match pool.iter().position(|&c| c == ch) {
        Some(at) => {
            pool.swap_remove(at);
            true
        }
        None => false,
    })
}

fn rank(candidate: &Candidate, first: Option<char>) -> (usize, bool, usize, &str) {
    (
        candidate.distance,
        candidate.word.chars().next() != first,
        candidate.word.chars().count(),
        candidate.word.as_str(),
    )
}

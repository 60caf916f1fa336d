use std::sync::LazyLock;

use chrono::NaiveDate;
use regex_lite::Regex;

use crate::lexicon::{Corrector, Keyword, Term};

#[expect(clippy::expect_used)]
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d{4}-\d{1,2}-\d{1,2}|\d{1,2}:\d{2}(?:[ap]m)?|\d+(?:st|nd|rd|th|[ap]m)?|[,&]|[^\s\d,&.!?;:()]+",
    )
    .expect("valid token regex")
});

#[expect(clippy::expect_used)]
static CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?::(\d{2}))?([ap]m)?$").expect("valid clock regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meridiem {
    Am,
    Pm,
}

impl Meridiem {
    /// Converts a 12-hour clock hour to 24-hour.
    #[must_use]
    pub const fn apply(self, hour: u32) -> u32 {
        match (self, hour % 12) {
            (Self::Am, h) => h,
            (Self::Pm, h) => h + 12,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Number(u32),
    /// Digits with an ordinal suffix, e.g. `5th`.
    Ordinal(u32),
    Clock {
        hour: u32,
        minute: u32,
        meridiem: Option<Meridiem>,
        /// Written unambiguously on a 24-hour clock, e.g. `18:00` or `07:30`.
        twenty_four: bool,
    },
    Date(NaiveDate),
    Comma,
    Ampersand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Position in the request.
    pub index: usize,
    /// Text as the user typed it.
    pub raw: String,
    /// Lowercased and spelling-corrected form.
    pub corrected: String,
    pub kind: TokenKind,
    pub term: Option<Term>,
}

impl Token {
    #[must_use]
    pub fn was_corrected(&self) -> bool {
        self.kind == TokenKind::Word && self.raw.to_lowercase() != self.corrected
    }

    #[must_use]
    pub fn keyword(&self) -> Option<Keyword> {
        match self.term {
            Some(Term::Keyword(keyword)) => Some(keyword),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }

    /// Digits or a number word.
    #[must_use]
    pub const fn number(&self) -> Option<u32> {
        match (self.kind, self.term) {
            (TokenKind::Number(n), _) | (_, Some(Term::Number(n))) => Some(n),
            _ => None,
        }
    }

    /// `5th` or `fifth`.
    #[must_use]
    pub const fn ordinal(&self) -> Option<u32> {
        match (self.kind, self.term) {
            (TokenKind::Ordinal(n), _) | (_, Some(Term::Ordinal(n))) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_separator(&self) -> bool {
        matches!(self.kind, TokenKind::Comma | TokenKind::Ampersand)
    }

    /// `and` or `&`.
    #[must_use]
    pub fn is_conjunction(&self) -> bool {
        self.kind == TokenKind::Ampersand || self.is_keyword(Keyword::And)
    }
}

/// Splits `text` into tokens and corrects each word one-to-one.
#[must_use]
pub fn tokenize(text: &str, corrector: &Corrector) -> Vec<Token> {
    TOKEN
        .find_iter(text)
        .enumerate()
        .map(|(index, m)| classify(index, m.as_str(), corrector))
        .collect()
}

fn classify(index: usize, raw: &str, corrector: &Corrector) -> Token {
    let lowered = raw.to_lowercase();
    let kind = match lowered.as_str() {
        "," => TokenKind::Comma,
        "&" => TokenKind::Ampersand,
        s if s.starts_with(|c: char| c.is_ascii_digit()) => numeric_kind(s),
        _ => TokenKind::Word,
    };

    let corrected = if kind == TokenKind::Word {
        corrector.correct(&lowered)
    } else {
        lowered
    };
    let term = if kind == TokenKind::Word {
        corrector.lookup(&corrected)
    } else {
        None
    };

    Token {
        index,
        raw: raw.to_string(),
        corrected,
        kind,
        term,
    }
}

fn numeric_kind(s: &str) -> TokenKind {
    if s.contains('-') {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d").map_or(TokenKind::Word, TokenKind::Date);
    }

    for suffix in ["st", "nd", "rd", "th"] {
        if let Some(digits) = s.strip_suffix(suffix) {
            return digits.parse().map_or(TokenKind::Word, TokenKind::Ordinal);
        }
    }

    if let Some(caps) = CLOCK.captures(s)
        && (caps.get(2).is_some() || caps.get(3).is_some())
    {
        let hour: u32 = caps[1].parse().unwrap_or(u32::MAX);
        let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok()).unwrap_or(u32::MAX);
        let meridiem = caps.get(3).map(|m| {
            if m.as_str().starts_with('a') {
                Meridiem::Am
            } else {
                Meridiem::Pm
            }
        });
        let valid = minute < 60 && if meridiem.is_some() { (1..=12).contains(&hour) } else { hour < 24 };
        if !valid {
            return TokenKind::Word;
        }
        let twenty_four = meridiem.is_none() && (hour == 0 || hour > 12 || caps[1].starts_with('0'));
        return TokenKind::Clock {
            hour,
            minute,
            meridiem,
            twenty_four,
        };
    }

    s.parse().map_or(TokenKind::Word, TokenKind::Number)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text, &Corrector::scheduling())
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn splits_words_and_punctuation() {
        let tokens = tokenize("Lunch with Bob, tmrw & more!", &Corrector::scheduling());
        let raw: Vec<&str> = tokens.iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(raw, vec!["Lunch", "with", "Bob", ",", "tmrw", "&", "more"]);
        assert!(tokens[1].kind == TokenKind::Word);
        assert!(tokens[3].is_separator());
        assert!(tokens[5].is_conjunction());
    }

    #[test]
    fn recognizes_clock_times() {
        assert_eq!(
            kinds("6pm 6:30pm 18:00 07:15 12am"),
            vec![
                TokenKind::Clock { hour: 6, minute: 0, meridiem: Some(Meridiem::Pm), twenty_four: false },
                TokenKind::Clock { hour: 6, minute: 30, meridiem: Some(Meridiem::Pm), twenty_four: false },
                TokenKind::Clock { hour: 18, minute: 0, meridiem: None, twenty_four: true },
                TokenKind::Clock { hour: 7, minute: 15, meridiem: None, twenty_four: true },
                TokenKind::Clock { hour: 12, minute: 0, meridiem: Some(Meridiem::Am), twenty_four: false },
            ]
        );
    }

    #[test]
    fn recognizes_numbers_ordinals_and_dates() {
        assert_eq!(
            kinds("7 5th 2026-03-05"),
            vec![
                TokenKind::Number(7),
                TokenKind::Ordinal(5),
                TokenKind::Date(NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()),
            ]
        );
    }

    #[test]
    fn corrects_words_one_to_one() {
        let tokens = tokenize("evry wendsay", &Corrector::scheduling());
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].corrected, "every");
        assert!(tokens[0].was_corrected());
        assert_eq!(tokens[1].corrected, "wednesday");
        assert_eq!(tokens[1].raw, "wendsay");
    }

    #[test]
    fn meridiem_converts_to_24_hour() {
        assert_eq!(Meridiem::Pm.apply(6), 18);
        assert_eq!(Meridiem::Pm.apply(12), 12);
        assert_eq!(Meridiem::Am.apply(12), 0);
        assert_eq!(Meridiem::Am.apply(9), 9);
    }
}

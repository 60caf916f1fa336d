//! Splitting one request into per-meeting segments.

use crate::lexicon::{Keyword, Term};

use super::token::{Token, TokenKind};

/// Tokens describing one meeting.
#[derive(Debug, Clone)]
pub struct Segment {
    pub tokens: Vec<Token>,
}

impl Segment {
    /// The segment as typed, words joined by single spaces.
    #[must_use]
    pub fn source(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.raw.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// ## Summary
/// Splits tokens into segments.
///
/// Commas split unless they sit between two numbers. A fragment holding only
/// weekday words joins the fragment after it (or the one before, when last),
/// and a fragment continuing a weekday list joins the one before it. Inside a
/// fragment, `and`/`&` splits only when the left side already names a time of
/// day and the right side names a date, time or recurrence.
#[must_use]
pub fn split(tokens: Vec<Token>) -> Vec<Segment> {
    let fragments = merge_weekday_lists(split_commas(tokens));
    fragments
        .into_iter()
        .flat_map(split_conjunctions)
        .filter(|tokens| !tokens.is_empty())
        .map(|tokens| Segment { tokens })
        .collect()
}

fn split_commas(tokens: Vec<Token>) -> Vec<Vec<Token>> {
    let mut fragments = vec![Vec::new()];
    let numeric: Vec<bool> = tokens
        .iter()
        .map(|t| matches!(t.kind, TokenKind::Number(_)))
        .collect();

    for (i, token) in tokens.into_iter().enumerate() {
        if token.kind == TokenKind::Comma {
            let between_numbers =
                i > 0 && numeric[i - 1] && numeric.get(i + 1).copied().unwrap_or(false);
            if !between_numbers {
                fragments.push(Vec::new());
                continue;
            }
        }
        if let Some(current) = fragments.last_mut() {
            current.push(token);
        }
    }

    fragments.retain(|f| !f.is_empty());
    fragments
}

fn merge_weekday_lists(fragments: Vec<Vec<Token>>) -> Vec<Vec<Token>> {
    let mut merged: Vec<Vec<Token>> = Vec::with_capacity(fragments.len());
    let mut carry: Vec<Token> = Vec::new();

    for fragment in fragments {
        if is_weekday_only(&fragment) {
            carry.extend(fragment);
            continue;
        }

        let continues_list = carry.is_empty()
            && fragment.first().is_some_and(is_weekday)
            && merged
                .last()
                .is_some_and(|prev| prev.last().is_some_and(is_weekday) && !has_time_of_day(prev));

        let mut fragment = if carry.is_empty() {
            fragment
        } else {
            let mut joined = std::mem::take(&mut carry);
            joined.extend(fragment);
            joined
        };

        match merged.last_mut() {
            Some(prev) if continues_list => prev.append(&mut fragment),
            _ => merged.push(fragment),
        }
    }

    if !carry.is_empty() {
        match merged.last_mut() {
            Some(prev) => prev.extend(carry),
            None => merged.push(carry),
        }
    }

    merged
}

fn split_conjunctions(fragment: Vec<Token>) -> Vec<Vec<Token>> {
    let conjunctions: Vec<usize> = fragment
        .iter()
        .enumerate()
        .filter(|(_, t)| t.is_conjunction())
        .map(|(i, _)| i)
        .collect();

    let mut cuts = Vec::new();
    let mut start = 0;
    for (n, &at) in conjunctions.iter().enumerate() {
        let end = conjunctions.get(n + 1).copied().unwrap_or(fragment.len());
        let left = &fragment[start..at];
        let right = &fragment[at + 1..end];
        if has_time_of_day(left) && has_temporal_cue(right) {
            cuts.push(at);
            start = at + 1;
        }
    }

    if cuts.is_empty() {
        return vec![fragment];
    }

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut rest = fragment;
    for &cut in cuts.iter().rev() {
        let mut tail = rest.split_off(cut);
        tail.remove(0);
        pieces.push(tail);
    }
    pieces.push(rest);
    pieces.reverse();
    pieces
}

fn is_weekday(token: &Token) -> bool {
    matches!(token.term, Some(Term::Weekday { .. }))
}

fn is_weekday_only(fragment: &[Token]) -> bool {
    fragment.iter().any(is_weekday)
        && fragment.iter().all(|t| {
            is_weekday(t)
                || t.is_conjunction()
                || matches!(t.keyword(), Some(Keyword::Every | Keyword::On))
        })
}

/// An explicit time of day. Meal words do not count since they often name the meeting.
pub(crate) fn has_time_of_day(tokens: &[Token]) -> bool {
    tokens.iter().enumerate().any(|(i, t)| match (t.kind, t.term) {
        (TokenKind::Clock { .. }, _) => true,
        (_, Some(Term::Period(period))) => !period.is_meal(),
        (_, Some(Term::Relative(crate::lexicon::Relative::Tonight))) => true,
        _ if t.number().is_some() => {
            let next_is_meridiem = tokens
                .get(i + 1)
                .is_some_and(|n| matches!(n.keyword(), Some(Keyword::Am | Keyword::Pm)));
            let after_at = i > 0 && tokens[i - 1].is_keyword(Keyword::At);
            next_is_meridiem || after_at
        }
        _ => false,
    })
}

/// Anything that can anchor a meeting in time.
pub(crate) fn has_temporal_cue(tokens: &[Token]) -> bool {
    has_time_of_day(tokens)
        || tokens.iter().any(|t| {
            matches!(t.kind, TokenKind::Clock { .. } | TokenKind::Date(_) | TokenKind::Ordinal(_))
                || match t.term {
                    Some(
                        Term::Weekday { .. } | Term::Month(_) | Term::Relative(_) | Term::Period(_),
                    ) => true,
                    Some(Term::Keyword(keyword)) => matches!(
                        keyword,
                        Keyword::Every
                            | Keyword::Daily
                            | Keyword::Weekly
                            | Keyword::Biweekly
                            | Keyword::Workdays
                            | Keyword::Weekends
                    ),
                    _ => false,
                }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::Corrector;
    use crate::temporal::token::tokenize;

    fn sources(text: &str) -> Vec<String> {
        split(tokenize(text, &Corrector::scheduling()))
            .iter()
            .map(Segment::source)
            .collect()
    }

    #[test]
    fn commas_split_meetings() {
        assert_eq!(
            sources("every friday at 7pm, every wednesday at 6:30pm"),
            vec!["every friday at 7pm", "every wednesday at 6:30pm"]
        );
    }

    #[test]
    fn weekday_list_stays_together() {
        assert_eq!(
            sources("standup every monday, wednesday and friday at 9am"),
            vec!["standup every monday wednesday and friday at 9am"]
        );
        assert_eq!(
            sources("every monday, wednesday and friday at 6pm"),
            vec!["every monday wednesday and friday at 6pm"]
        );
    }

    #[test]
    fn and_splits_only_between_timed_parts() {
        assert_eq!(
            sources("standup at 9am and review friday at 3pm"),
            vec!["standup at 9am", "review friday at 3pm"]
        );
        assert_eq!(
            sources("lunch with tom and jerry at noon"),
            vec!["lunch with tom and jerry at noon"]
        );
    }

    #[test]
    fn garbage_fragment_is_kept_as_its_own_segment() {
        assert_eq!(
            sources("lunch with bob, asdkjasdkj"),
            vec!["lunch with bob", "asdkjasdkj"]
        );
    }
}

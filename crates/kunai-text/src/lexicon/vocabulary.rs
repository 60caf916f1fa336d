use std::collections::HashMap;

use chrono::{NaiveTime, Weekday};

/// Dictionary partition a word belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Weekday,
    Month,
    Relative,
    Period,
    Ordinal,
    Number,
    Unit,
    Keyword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relative {
    Today,
    Tonight,
    Tomorrow,
}

/// Named parts of the day that imply a clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayPeriod {
    Breakfast,
    Morning,
    Noon,
    Lunch,
    Afternoon,
    Evening,
    Dinner,
    Night,
    Midnight,
}

impl DayPeriod {
    /// Clock time the period stands for.
    #[must_use]
    pub fn time(self) -> NaiveTime {
        let hour = match self {
            Self::Midnight => 0,
            Self::Breakfast => 8,
            Self::Morning => 9,
            Self::Noon | Self::Lunch => 12,
            Self::Afternoon => 15,
            Self::Evening => 18,
            Self::Dinner => 19,
            Self::Night => 20,
        };
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Whether a bare hour next to this period is an afternoon/evening hour.
    #[must_use]
    pub const fn implies_pm(self) -> bool {
        matches!(
            self,
            Self::Afternoon | Self::Evening | Self::Dinner | Self::Night
        )
    }

    /// Meal words describe the meeting as well as its time and stay in the title.
    #[must_use]
    pub const fn is_meal(self) -> bool {
        matches!(self, Self::Breakfast | Self::Lunch | Self::Dinner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unit {
    Minute,
    Hour,
    Day,
    Week,
}

/// Words the parser reads structurally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Every,
    Next,
    This,
    On,
    At,
    In,
    And,
    Am,
    Pm,
    Daily,
    Weekly,
    Biweekly,
    Other,
    Workdays,
    Weekends,
    Of,
    The,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Term {
    Weekday { day: Weekday, plural: bool },
    Month(u32),
    Relative(Relative),
    Period(DayPeriod),
    Ordinal(u32),
    Number(u32),
    Unit(Unit),
    Keyword(Keyword),
}

impl Term {
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::Weekday { .. } => Category::Weekday,
            Self::Month(_) => Category::Month,
            Self::Relative(_) => Category::Relative,
            Self::Period(_) => Category::Period,
            Self::Ordinal(_) => Category::Ordinal,
            Self::Number(_) => Category::Number,
            Self::Unit(_) => Category::Unit,
            Self::Keyword(_) => Category::Keyword,
        }
    }
}

const fn weekday(day: Weekday) -> Term {
    Term::Weekday { day, plural: false }
}

const fn weekdays(day: Weekday) -> Term {
    Term::Weekday { day, plural: true }
}

const SCHEDULING_WORDS: &[(&str, Term)] = &[
    ("monday", weekday(Weekday::Mon)),
    ("tuesday", weekday(Weekday::Tue)),
    ("wednesday", weekday(Weekday::Wed)),
    ("thursday", weekday(Weekday::Thu)),
    ("friday", weekday(Weekday::Fri)),
    ("saturday", weekday(Weekday::Sat)),
    ("sunday", weekday(Weekday::Sun)),
    ("mondays", weekdays(Weekday::Mon)),
    ("tuesdays", weekdays(Weekday::Tue)),
    ("wednesdays", weekdays(Weekday::Wed)),
    ("thursdays", weekdays(Weekday::Thu)),
    ("fridays", weekdays(Weekday::Fri)),
    ("saturdays", weekdays(Weekday::Sat)),
    ("sundays", weekdays(Weekday::Sun)),
    ("mon", weekday(Weekday::Mon)),
    ("tue", weekday(Weekday::Tue)),
    ("tues", weekday(Weekday::Tue)),
    ("wed", weekday(Weekday::Wed)),
    ("weds", weekday(Weekday::Wed)),
    ("thu", weekday(Weekday::Thu)),
    ("thur", weekday(Weekday::Thu)),
    ("thurs", weekday(Weekday::Thu)),
    ("fri", weekday(Weekday::Fri)),
    ("sat", weekday(Weekday::Sat)),
    ("sun", weekday(Weekday::Sun)),
    ("january", Term::Month(1)),
    ("february", Term::Month(2)),
    ("march", Term::Month(3)),
    ("april", Term::Month(4)),
    ("may", Term::Month(5)),
    ("june", Term::Month(6)),
    ("july", Term::Month(7)),
    ("august", Term::Month(8)),
    ("september", Term::Month(9)),
    ("october", Term::Month(10)),
    ("november", Term::Month(11)),
    ("december", Term::Month(12)),
    ("jan", Term::Month(1)),
    ("feb", Term::Month(2)),
    ("mar", Term::Month(3)),
    ("apr", Term::Month(4)),
    ("jun", Term::Month(6)),
    ("jul", Term::Month(7)),
    ("aug", Term::Month(8)),
    ("sep", Term::Month(9)),
    ("sept", Term::Month(9)),
    ("oct", Term::Month(10)),
    ("nov", Term::Month(11)),
    ("dec", Term::Month(12)),
    ("today", Term::Relative(Relative::Today)),
    ("tonight", Term::Relative(Relative::Tonight)),
    ("tomorrow", Term::Relative(Relative::Tomorrow)),
    ("tmrw", Term::Relative(Relative::Tomorrow)),
    ("breakfast", Term::Period(DayPeriod::Breakfast)),
    ("morning", Term::Period(DayPeriod::Morning)),
    ("noon", Term::Period(DayPeriod::Noon)),
    ("midday", Term::Period(DayPeriod::Noon)),
    ("lunch", Term::Period(DayPeriod::Lunch)),
    ("afternoon", Term::Period(DayPeriod::Afternoon)),
    ("evening", Term::Period(DayPeriod::Evening)),
    ("dinner", Term::Period(DayPeriod::Dinner)),
    ("night", Term::Period(DayPeriod::Night)),
    ("midnight", Term::Period(DayPeriod::Midnight)),
    ("first", Term::Ordinal(1)),
    ("second", Term::Ordinal(2)),
    ("third", Term::Ordinal(3)),
    ("fourth", Term::Ordinal(4)),
    ("fifth", Term::Ordinal(5)),
    ("sixth", Term::Ordinal(6)),
    ("seventh", Term::Ordinal(7)),
    ("eighth", Term::Ordinal(8)),
    ("ninth", Term::Ordinal(9)),
    ("tenth", Term::Ordinal(10)),
    ("one", Term::Number(1)),
    ("two", Term::Number(2)),
    ("three", Term::Number(3)),
    ("four", Term::Number(4)),
    ("five", Term::Number(5)),
    ("six", Term::Number(6)),
    ("seven", Term::Number(7)),
    ("eight", Term::Number(8)),
    ("nine", Term::Number(9)),
    ("ten", Term::Number(10)),
    ("eleven", Term::Number(11)),
    ("twelve", Term::Number(12)),
    ("minute", Term::Unit(Unit::Minute)),
    ("minutes", Term::Unit(Unit::Minute)),
    ("mins", Term::Unit(Unit::Minute)),
    ("hour", Term::Unit(Unit::Hour)),
    ("hours", Term::Unit(Unit::Hour)),
    ("hrs", Term::Unit(Unit::Hour)),
    ("day", Term::Unit(Unit::Day)),
    ("days", Term::Unit(Unit::Day)),
    ("week", Term::Unit(Unit::Week)),
    ("weeks", Term::Unit(Unit::Week)),
    ("every", Term::Keyword(Keyword::Every)),
    ("each", Term::Keyword(Keyword::Every)),
    ("next", Term::Keyword(Keyword::Next)),
    ("this", Term::Keyword(Keyword::This)),
    ("on", Term::Keyword(Keyword::On)),
    ("at", Term::Keyword(Keyword::At)),
    ("in", Term::Keyword(Keyword::In)),
    ("and", Term::Keyword(Keyword::And)),
    ("am", Term::Keyword(Keyword::Am)),
    ("pm", Term::Keyword(Keyword::Pm)),
    ("daily", Term::Keyword(Keyword::Daily)),
    ("weekly", Term::Keyword(Keyword::Weekly)),
    ("biweekly", Term::Keyword(Keyword::Biweekly)),
    ("fortnightly", Term::Keyword(Keyword::Biweekly)),
    ("other", Term::Keyword(Keyword::Other)),
    ("weekday", Term::Keyword(Keyword::Workdays)),
    ("weekdays", Term::Keyword(Keyword::Workdays)),
    ("weekend", Term::Keyword(Keyword::Weekends)),
    ("weekends", Term::Keyword(Keyword::Weekends)),
    ("of", Term::Keyword(Keyword::Of)),
    ("the", Term::Keyword(Keyword::The)),
];

/// Word list the corrector matches against and the parser reads from.
///
/// Owned and passed in rather than global so tests can build their own.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    words: HashMap<String, Term>,
}

impl Vocabulary {
    /// Weekday and month names, relative days, parts of the day, ordinals,
    /// small numbers, units and parser keywords.
    #[must_use]
    pub fn scheduling() -> Self {
        SCHEDULING_WORDS
            .iter()
            .map(|(word, term)| ((*word).to_string(), *term))
            .collect()
    }

    pub fn insert(&mut self, word: &str, term: Term) {
        self.words.insert(word.to_lowercase(), term);
    }

    #[must_use]
    pub fn lookup(&self, word: &str) -> Option<Term> {
        self.words.get(word).copied()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.contains_key(word)
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.words.keys().map(String::as_str)
    }

    /// Words of one category, sorted.
    #[must_use]
    pub fn words_in(&self, category: Category) -> Vec<&str> {
        let mut words: Vec<&str> = self
            .words
            .iter()
            .filter(|(_, term)| term.category() == category)
            .map(|(word, _)| word.as_str())
            .collect();
        words.sort_unstable();
        words
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

impl FromIterator<(String, Term)> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = (String, Term)>>(iter: I) -> Self {
        let mut vocabulary = Self::default();
        for (word, term) in iter {
            vocabulary.insert(&word, term);
        }
        vocabulary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduling_vocabulary_is_partitioned() {
        let vocabulary = Vocabulary::scheduling();
        let weekdays = vocabulary.words_in(Category::Weekday);
        assert!(weekdays.contains(&"wednesday"));
        assert!(weekdays.contains(&"fridays"));
        assert!(!weekdays.contains(&"march"));
        assert_eq!(vocabulary.words_in(Category::Month).len(), 24);
        assert_eq!(
            vocabulary.lookup("fridays"),
            Some(Term::Weekday {
                day: Weekday::Fri,
                plural: true
            })
        );
    }

    #[test]
    fn meal_periods_keep_title() {
        assert!(DayPeriod::Lunch.is_meal());
        assert!(!DayPeriod::Evening.is_meal());
        assert!(DayPeriod::Evening.implies_pm());
        assert_eq!(DayPeriod::Lunch.time(), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    }
}

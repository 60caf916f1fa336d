use std::collections::BTreeMap;

/// A dictionary word within some edit distance of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub word: String,
    pub distance: usize,
}

#[derive(Debug, Default, Clone)]
struct Node {
    children: BTreeMap<char, usize>,
    word: Option<String>,
}

/// Prefix tree over lowercase words, stored as an arena of nodes.
#[derive(Debug, Clone)]
pub struct Trie {
    nodes: Vec<Node>,
}

impl Default for Trie {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }
}

impl Trie {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, word: &str) {
        let mut current = 0;
        for ch in word.chars() {
            current = if let Some(&next) = self.nodes[current].children.get(&ch) {
                next
            } else {
                let next = self.nodes.len();
                self.nodes.push(Node::default());
                self.nodes[current].children.insert(ch, next);
                next
            };
        }
        self.nodes[current].word = Some(word.to_string());
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        let mut current = 0;
        for ch in word.chars() {
            match self.nodes[current].children.get(&ch) {
                Some(&next) => current = next,
                None => return false,
            }
        }
        self.nodes[current].word.is_some()
    }

    /// ## Summary
    /// Every stored word whose Levenshtein distance to `query` is at most `max_distance`.
    ///
    /// Walks the tree carrying one DP row per node; a branch is abandoned once
    /// the smallest entry of its row exceeds `max_distance`, since no longer
    /// word below it can get closer.
    #[must_use]
    pub fn search(&self, query: &str, max_distance: usize) -> Vec<Candidate> {
        let query: Vec<char> = query.chars().collect();
        let first_row: Vec<usize> = (0..=query.len()).collect();
        let mut found = Vec::new();

        for (&ch, &child) in &self.nodes[0].children {
            self.walk(child, ch, &query, &first_row, max_distance, &mut found);
        }

        found
    }

    fn walk(
        &self,
        node: usize,
        ch: char,
        query: &[char],
        previous: &[usize],
        max_distance: usize,
        found: &mut Vec<Candidate>,
    ) {
        let mut row = Vec::with_capacity(previous.len());
        row.push(previous[0] + 1);
        for (i, &q) in query.iter().enumerate() {
            let substitution = previous[i] + usize::from(q != ch);
            let insertion = row[i] + 1;
            let deletion = previous[i + 1] + 1;
            row.push(substitution.min(insertion).min(deletion));
        }

        let distance = row[query.len()];
        if distance <= max_distance
            && let Some(word) = &self.nodes[node].word
        {
            found.push(Candidate {
                word: word.clone(),
                distance,
            });
        }

        if row.iter().min().is_some_and(|&min| min <= max_distance) {
            for (&next_ch, &child) in &self.nodes[node].children {
                self.walk(child, next_ch, query, &row, max_distance, found);
            }
        }
    }
}

impl<'a> FromIterator<&'a str> for Trie {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut trie = Self::new();
        for word in iter {
            trie.insert(word);
        }
        trie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distances(trie: &Trie, query: &str, max: usize) -> Vec<(String, usize)> {
        let mut found: Vec<(String, usize)> = trie
            .search(query, max)
            .into_iter()
            .map(|c| (c.word, c.distance))
            .collect();
        found.sort();
        found
    }

    #[test]
    fn exact_match_has_distance_zero() {
        let trie: Trie = ["monday", "month", "morning"].into_iter().collect();
        assert!(trie.contains("month"));
        assert!(!trie.contains("mon"));
        assert_eq!(distances(&trie, "monday", 0), vec![("monday".into(), 0)]);
    }

    #[test]
    fn finds_words_within_distance() {
        let trie: Trie = ["monday", "sunday", "friday", "month"].into_iter().collect();
        assert_eq!(
            distances(&trie, "mondy", 2),
            vec![("monday".into(), 1), ("month".into(), 2)]
        );
    }

    #[test]
    fn distance_three_reaches_wednesday() {
        let trie: Trie = ["wednesday", "wed"].into_iter().collect();
        assert_eq!(distances(&trie, "wendsay", 3), vec![("wednesday".into(), 3)]);
    }
}

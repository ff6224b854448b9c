use std::collections::HashMap;

/// Acceptable lowercase terms per meaning, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SynonymIndex {
    terms: HashMap<String, Vec<String>>,
}

impl SynonymIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `term` (lowercased) under `meaning` unless it is already there.
    pub fn insert(&mut self, meaning: &str, term: &str) {
        let term = term.to_lowercase();
        let entry = self.terms.entry(meaning.to_string()).or_default();
        if !entry.contains(&term) {
            entry.push(term);
        }
    }

    pub fn terms(&self, meaning: &str) -> Option<&[String]> {
        self.terms.get(meaning).map(|v| v.as_slice())
    }

    /// Membership test; `term` is expected to already be lowercase.
    pub fn contains(&self, meaning: &str, term: &str) -> bool {
        self.terms
            .get(meaning)
            .is_some_and(|terms| terms.iter().any(|t| t == term))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_lowercases_and_dedupes() {
        let mut index = SynonymIndex::new();
        index.insert("放棄", "Give Up");
        index.insert("放棄", "give up");
        index.insert("放棄", "quit");
        assert_eq!(
            index.terms("放棄").unwrap(),
            &["give up".to_string(), "quit".to_string()]
        );
    }

    #[test]
    fn contains_is_scoped_to_meaning() {
        let mut index = SynonymIndex::new();
        index.insert("放棄", "quit");
        index.insert("開始", "start");
        assert!(index.contains("放棄", "quit"));
        assert!(!index.contains("放棄", "start"));
        assert!(!index.contains("未知", "quit"));
    }
}

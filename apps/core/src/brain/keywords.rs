//! Tokenizing and weighted term-overlap scoring.
//!
//! Scores free text against a set of query terms, weighting each term by an
//! IDF approximation so that "credit" counts for more than "time". The
//! scenario library search and the similar-scenario lookup both use it.

use std::collections::{HashMap, HashSet};

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "nor", "for", "yet", "so", "i", "you", "he", "she", "it",
    "we", "they", "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their",
    "mine", "yours", "hers", "ours", "theirs", "this", "that", "these", "those", "who", "whom",
    "which", "what", "whose", "is", "am", "are", "was", "were", "be", "been", "being", "have",
    "has", "had", "having", "do", "does", "did", "doing", "will", "would", "shall", "should",
    "can", "could", "may", "might", "must", "in", "on", "at", "to", "from", "by", "with", "about",
    "against", "between", "into", "through", "during", "before", "after", "above", "below", "up",
    "down", "out", "off", "over", "under", "again", "further", "here", "there", "where", "when",
    "why", "how", "all", "each", "every", "both", "few", "more", "most", "other", "some", "any",
    "no", "not", "only", "own", "same", "than", "too", "very", "just", "also", "now", "then",
    "once", "always", "never", "if", "because", "as", "until", "while", "although", "though",
    "yes", "maybe", "really", "keeps", "keep", "get", "got", "feel", "feels", "felt", "like",
    "want", "know", "think", "said", "says", "tell", "told", "don", "didn", "doesn", "isn",
    "wasn", "won", "can't", "don't", "i'm", "it's", "s", "t", "ve", "re", "ll", "d", "m",
];

pub struct KeywordExtractor {
    stopwords: HashSet<&'static str>,
    min_word_length: usize,
    /// IDF approximation for words that carry most of a situation's meaning
    idf_weights: HashMap<&'static str, f32>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl KeywordExtractor {
    pub fn new() -> Self {
        Self::with_min_word_length(3)
    }

    pub fn with_min_word_length(min_word_length: usize) -> Self {
        let stopwords: HashSet<&'static str> = STOPWORDS.iter().copied().collect();

        let mut idf_weights = HashMap::new();

        // Conflict-specific terms (high IDF)
        for term in [
            "credit", "deadline", "boundary", "trust", "jealous", "cancel", "loan", "interrupt",
            "chores", "gossip",
        ] {
            idf_weights.insert(term, 2.5);
        }

        // People (medium-high IDF)
        for term in [
            "boss", "manager", "coworker", "colleague", "friend", "partner", "spouse", "family",
        ] {
            idf_weights.insert(term, 2.0);
        }

        // Common situation words (medium IDF)
        for term in ["work", "meeting", "team", "time", "plans", "help", "talk"] {
            idf_weights.insert(term, 1.5);
        }

        Self {
            stopwords,
            min_word_length,
            idf_weights,
        }
    }

    fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Lowercased words of at least `min_word_length` characters, stopwords and numbers removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '\'' && c != '-')
            .map(|word| word.trim_matches(|c: char| c == '\'' || c == '-'))
            .filter(|w| {
                w.chars().count() >= self.min_word_length
                    && !self.is_stopword(w)
                    && !w.chars().all(|c| c.is_numeric())
            })
            .map(|s| s.to_string())
            .collect()
    }

    /// Distinct tokens of `text`, in first-seen order.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tokenize(text)
            .into_iter()
            .filter(|w| seen.insert(w.clone()))
            .collect()
    }

    fn get_idf(&self, word: &str) -> f32 {
        if let Some(&weight) = self.idf_weights.get(word) {
            return weight;
        }
        // Longer words tend to be more specific
        let length_factor = (word.chars().count() as f32 / 6.0).min(1.5);
        1.0 + length_factor
    }

    /// Weighted share of `query_terms` that occur in `text`, in `[0.0, 1.0]`.
    ///
    /// A query term counts when it equals a token of `text` or when one is a
    /// prefix of the other and the shorter has at least four characters, so
    /// "cancel" matches "cancelled".
    pub fn overlap_score(&self, query_terms: &[String], text: &str) -> f64 {
        let total: f32 = query_terms.iter().map(|term| self.get_idf(term)).sum();
        if total == 0.0 {
            return 0.0;
        }
        let tokens: HashSet<String> = self.tokenize(text).into_iter().collect();
        let matched: f32 = query_terms
            .iter()
            .filter(|term| tokens.iter().any(|token| terms_match(term, token)))
            .map(|term| self.get_idf(term))
            .sum();
        f64::from(matched / total)
    }
}

fn terms_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    short.chars().count() >= 4 && long.starts_with(short)
}

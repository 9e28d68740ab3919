//! Review text cleaning: case folding, punctuation stripping, stop-word removal, n-grams.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use unicode_segmentation::UnicodeSegmentation;

/// Default minimum length; tokens must be strictly longer.
pub const DEFAULT_MIN_LENGTH: usize = 3;

/// Built-in English stop words.
pub fn default_stop_words() -> &'static HashSet<String> {
    static SET: Lazy<HashSet<String>> = Lazy::new(|| {
        let words = [
            "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and",
            "any", "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below",
            "between", "both", "but", "by", "can", "cannot", "could", "couldn", "did", "didn",
            "do", "does", "doesn", "doing", "don", "down", "during", "each", "even", "ever",
            "every", "few", "for", "from", "further", "get", "got", "had", "hadn", "has", "hasn",
            "have", "haven", "having", "he", "her", "here", "hers", "herself", "him", "himself",
            "his", "how", "i", "if", "in", "into", "is", "isn", "it", "its", "itself", "just",
            "me", "more", "most", "much", "must", "my", "myself", "no", "nor", "not", "now", "of",
            "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over",
            "own", "same", "shan", "she", "should", "shouldn", "so", "some", "such", "than",
            "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these",
            "they", "this", "those", "through", "to", "too", "under", "until", "up", "very",
            "was", "wasn", "we", "were", "weren", "what", "when", "where", "which", "while",
            "who", "whom", "why", "will", "with", "won", "would", "wouldn", "you", "your",
            "yours", "yourself", "yourselves",
        ];
        words.iter().map(|s| s.to_string()).collect()
    });
    &SET
}

/// Tokenizer with stop-word, exclusion and length filters.
#[derive(Debug, Clone, Default)]
pub struct TextCleaner {
    pub stop_words: HashSet<String>,
    pub exclude_words: HashSet<String>,
    pub min_length: usize,
}

impl TextCleaner {
    pub fn new(stop_words: HashSet<String>, exclude_words: HashSet<String>, min_length: usize) -> Self {
        Self {
            stop_words,
            exclude_words,
            min_length,
        }
    }

    /// Cleaner using the built-in stop words and the default minimum length.
    pub fn english() -> Self {
        Self::new(default_stop_words().clone(), HashSet::new(), DEFAULT_MIN_LENGTH)
    }

    /// Clean `text` into unigrams (`n <= 1`) or space-joined n-grams.
    ///
    /// N-grams slide over the filtered token sequence, so removed words
    /// do not break a window.
    pub fn clean(&self, text: &str, n: usize) -> Vec<String> {
        let tokens = self.tokens(text);
        if n <= 1 {
            return tokens;
        }
        ngrams(&tokens, n)
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        let stripped: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();

        stripped
            .unicode_words()
            .filter(|t| t.chars().all(char::is_alphanumeric))
            .filter(|t| !self.stop_words.contains(*t))
            .filter(|t| !self.exclude_words.contains(*t))
            .filter(|t| t.chars().count() > self.min_length)
            .map(str::to_string)
            .collect()
    }
}

/// Sliding windows of `n` tokens joined by a single space.
pub fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if n == 0 || tokens.len() < n {
        return Vec::new();
    }
    tokens.windows(n).map(|w| w.join(" ")).collect()
}

//! Message tokenizer
//!
//! Normalizes a raw message into word tokens:
//! 1. URLs are replaced with [`URL_PLACEHOLDER`]
//! 2. every character outside `[a-zA-Z0-9]` becomes a space
//! 3. the text is split on whitespace
//! 4. each token is lemmatized, then lowercased and trimmed
//! 5. English stop words are dropped
//!
//! Stop words skip lemmatization, so "does" or "themselves" are never
//! reduced to forms outside the stop list.

use super::lemmatizer::Lemmatizer;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Token substituted for every URL found in a message
pub const URL_PLACEHOLDER: &str = "urlplaceholder";

const URL_PATTERN: &str =
    r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+";

/// Default English stop words list.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're",
    "you've", "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he",
    "him", "his", "himself", "she", "she's", "her", "hers", "herself", "it", "it's",
    "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "that'll", "these", "those", "am", "is", "are",
    "was", "were", "be", "been", "being", "have", "has", "had", "having", "do",
    "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because",
    "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to",
    "from", "up", "down", "in", "out", "on", "off", "over", "under", "again",
    "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor",
    "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
    "will", "just", "don", "don't", "should", "should've", "now", "d", "ll", "m", "o",
    "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn", "didn't",
    "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't",
    "shan", "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't",
    "won", "won't", "wouldn", "wouldn't",
];

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(URL_PATTERN).expect("URL pattern is a valid regex"));

static NON_ALPHANUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]").expect("character class is a valid regex"));

/// Default English stop words as a HashSet.
pub static ENGLISH_STOP_WORDS_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

/// Tokenizer for disaster-response messages.
///
/// Holds no state: the URL pattern, stop word set and lemmatizer are shared
/// process-wide, so the tokenizer can live inside a serialized pipeline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct MessageTokenizer;

impl MessageTokenizer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenize one message
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let text = URL_REGEX.replace_all(text, URL_PLACEHOLDER);
        let text = NON_ALPHANUMERIC.replace_all(&text, " ");
        let lemmatizer = Lemmatizer::shared();

        text.split_whitespace()
            .map(|token| {
                let lowered = token.to_lowercase();
                if is_stop_word(&lowered) {
                    lowered
                } else {
                    lemmatizer.lemmatize(token).to_lowercase().trim().to_string()
                }
            })
            .filter(|token| !token.is_empty())
            .filter(|token| !is_stop_word(token))
            .collect()
    }
}

/// Check a lowercase token against the English stop word list
pub fn is_stop_word(token: &str) -> bool {
    ENGLISH_STOP_WORDS_SET.contains(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        let tokens = MessageTokenizer::new().tokenize("We need WATER and food in the shelters!");
        assert_eq!(tokens, vec!["need", "water", "food", "shelter"]);
    }

    #[test]
    fn test_url_is_replaced() {
        let tokens = MessageTokenizer::new()
            .tokenize("Updates at http://bit.ly/2xYz?q=1 and https://example.org/help now");
        assert_eq!(tokens, vec!["update", URL_PLACEHOLDER, URL_PLACEHOLDER]);
    }

    #[test]
    fn test_punctuation_splits_tokens() {
        let tokens = MessageTokenizer::new().tokenize("earthquake-hit area;tents,blankets");
        assert_eq!(tokens, vec!["earthquake", "hit", "area", "tent", "blanket"]);
    }

    #[test]
    fn test_stop_words_only() {
        let tokens = MessageTokenizer::new().tokenize("The and of, to IS it!");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_every_stop_word_is_removed() {
        let tokenizer = MessageTokenizer::new();
        for &word in ENGLISH_STOP_WORDS {
            assert!(tokenizer.tokenize(word).is_empty(), "{:?} leaked", word);

            let mut capitalized = word[..1].to_uppercase();
            capitalized.push_str(&word[1..]);
            assert!(tokenizer.tokenize(&capitalized).is_empty(), "{:?} leaked", capitalized);
        }
    }

    #[test]
    fn test_plural_stop_words_keep_their_form() {
        let tokens = MessageTokenizer::new()
            .tokenize("does it matter? ourselves themselves yourselves does");
        assert_eq!(tokens, vec!["matter"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(MessageTokenizer::new().tokenize("").is_empty());
        assert!(MessageTokenizer::new().tokenize("  \t\n ").is_empty());
    }

    #[test]
    fn test_non_ascii_is_stripped() {
        let tokens = MessageTokenizer::new().tokenize("Séisme à Port-au-Prince");
        assert_eq!(tokens, vec!["isme", "port", "au", "prince"]);
    }

    #[test]
    fn test_stop_word_list_size() {
        assert_eq!(ENGLISH_STOP_WORDS.len(), 179);
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("water"));
    }
}

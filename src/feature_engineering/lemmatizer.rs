//! Rule-based noun lemmatizer
//!
//! Reduces inflected English nouns to their dictionary form. Irregular
//! plurals are looked up in an exception table; everything else goes through
//! an ordered list of suffix detachment rules. Rules only match lowercase
//! suffixes, so the lemmatizer leaves upper-case inflections untouched.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Irregular forms that the suffix rules would get wrong.
/// Words mapped to themselves are protected from detachment.
const NOUN_EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"),
    ("women", "woman"),
    ("men", "man"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("geese", "goose"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("oxen", "ox"),
    ("wolves", "wolf"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("lives", "life"),
    ("leaves", "leaf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("thieves", "thief"),
    ("loaves", "loaf"),
    ("calves", "calf"),
    ("data", "datum"),
    ("media", "medium"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("crises", "crisis"),
    ("diagnoses", "diagnosis"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("potatoes", "potato"),
    ("tomatoes", "tomato"),
    ("heroes", "hero"),
    ("echoes", "echo"),
    ("volcanoes", "volcano"),
    ("tornadoes", "tornado"),
    ("news", "news"),
    ("series", "series"),
    ("species", "species"),
    ("aids", "aids"),
    ("clothes", "clothes"),
    ("means", "means"),
    ("physics", "physics"),
    ("diabetes", "diabetes"),
    ("rabies", "rabies"),
    ("measles", "measles"),
];

/// Suffix detachment rules, tried in order. The first match wins.
const DETACHMENT_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("ies", "y"),
    ("xes", "x"),
    ("zzes", "zz"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("men", "man"),
    ("s", ""),
];

/// Suffixes that look plural but belong to the singular form.
const PROTECTED_ENDINGS: &[&str] = &["ss", "us", "is"];

/// Shortest word any rule may touch.
const MIN_WORD_LEN: usize = 4;

static SHARED: LazyLock<Lemmatizer> = LazyLock::new(Lemmatizer::new);

/// WordNet-style lemmatizer for nouns
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<&'static str, &'static str>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer {
    /// Create a lemmatizer with the built-in exception table
    pub fn new() -> Self {
        Self {
            exceptions: NOUN_EXCEPTIONS.iter().copied().collect(),
        }
    }

    /// Process-wide instance, built on first use
    pub fn shared() -> &'static Lemmatizer {
        &SHARED
    }

    /// Return the lemma of `word`, or the word itself when no rule applies
    pub fn lemmatize(&self, word: &str) -> String {
        if let Some(lemma) = self.exceptions.get(word) {
            return (*lemma).to_string();
        }

        if word.len() < MIN_WORD_LEN {
            return word.to_string();
        }

        if PROTECTED_ENDINGS.iter().any(|ending| word.ends_with(ending)) {
            return word.to_string();
        }

        for (suffix, replacement) in DETACHMENT_RULES {
            if let Some(stem) = word.strip_suffix(suffix) {
                // "ties" must fall through to the plain "s" rule
                if stem.len() + replacement.len() < 3 {
                    continue;
                }
                return format!("{}{}", stem, replacement);
            }
        }

        word.to_string()
    }
}

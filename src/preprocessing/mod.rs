//! Text normalization before embedding.
//!
//! Lowercase, strip every character that is neither a word character nor
//! whitespace, split into words, then drop words that are not purely
//! alphabetic or that are stopwords. Survivors are joined with single spaces.
//!
//! ```rust
//! use embedding_explorer::preprocessing::{preprocess_text, Language, TextNormalizer};
//!
//! assert_eq!(preprocess_text("Le chat mange."), "chat mange");
//!
//! let english = TextNormalizer::new(Language::English);
//! assert_eq!(english.normalize("The cat's 3 toys!"), "cats toys");
//! ```
//!
//! Normalizing is idempotent: normalized text has nothing left to remove.

mod stopwords;

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("static pattern"));
static WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+|[^\w\s]+").expect("static pattern"));

static FRENCH_NORMALIZER: Lazy<TextNormalizer> = Lazy::new(|| TextNormalizer::new(Language::French));

/// Stopword list selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// NLTK French list.
    French,
    /// NLTK English list.
    English,
}

impl Language {
    fn stopwords(self) -> &'static [&'static str] {
        match self {
            Language::French => stopwords::FRENCH,
            Language::English => stopwords::ENGLISH,
        }
    }
}

/// Cleans raw text against a fixed stopword set.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stopwords: HashSet<String>,
}

impl TextNormalizer {
    /// Normalizer using the built-in stopwords for `language`.
    pub fn new(language: Language) -> Self {
        Self::with_stopwords(language.stopwords())
    }

    /// Normalizer using a custom stopword list. Words are lowercased on insert.
    pub fn with_stopwords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stopwords: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Full normalization: lowercase, strip punctuation, drop stopwords and
    /// non-alphabetic words.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let stripped = NON_WORD.replace_all(&lowered, "");
        self.keep_content_words(&stripped)
    }

    /// Normalizes each text, preserving order.
    pub fn normalize_all<S: AsRef<str>>(&self, texts: &[S]) -> Vec<String> {
        texts.iter().map(|t| self.normalize(t.as_ref())).collect()
    }

    /// Lowercases and drops stopwords and non-alphabetic tokens, without the
    /// punctuation pass. Punctuation becomes separate tokens and is dropped.
    pub fn remove_stopwords(&self, text: &str) -> String {
        self.keep_content_words(&text.to_lowercase())
    }

    /// Whether `word` (already lowercase) is in the stopword set.
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    fn keep_content_words(&self, lowered: &str) -> String {
        WORDS
            .find_iter(lowered)
            .map(|m| m.as_str())
            .filter(|word| is_alphabetic(word) && !self.is_stopword(word))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_alphabetic(word: &str) -> bool {
    !word.is_empty() && word.chars().all(char::is_alphabetic)
}

/// Normalizes `text` with the French stopword list.
pub fn preprocess_text(text: &str) -> String {
    FRENCH_NORMALIZER.normalize(text)
}

/// Drops French stopwords and non-alphabetic tokens from `text`.
pub fn remove_stopwords(text: &str) -> String {
    FRENCH_NORMALIZER.remove_stopwords(text)
}

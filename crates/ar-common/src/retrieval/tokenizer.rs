use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::CatalogEntry;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

pub const MIN_TOKEN_CHARS: usize = 2;

/// Common English function words carrying no retrieval signal.
pub static STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "are", "as",
    "at", "be", "because", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "do", "does", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "he", "her", "here", "him", "his", "how", "i", "if", "in",
    "into", "is", "it", "its", "may", "me", "might", "more", "most", "must", "my", "no", "nor",
    "not", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom",
    "why", "will", "with", "would", "you", "your",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Per-field token weights for assessment documents.
pub const NAME_WEIGHT: f32 = 2.0;
pub const SKILL_WEIGHT: f32 = 1.5;
pub const TEST_TYPE_WEIGHT: f32 = 1.0;
pub const JOB_LEVEL_WEIGHT: f32 = 1.0;
pub const DESCRIPTION_WEIGHT: f32 = 1.0;
pub const DURATION_WEIGHT: f32 = 0.5;
pub const QUERY_WEIGHT: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedToken {
    pub token: String,
    pub weight: f32,
}

impl WeightedToken {
    pub fn new(token: impl Into<String>, weight: f32) -> Self {
        Self {
            token: token.into(),
            weight,
        }
    }
}

/// Lowercased `\w+` words, minus stop words and single characters.
pub fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS && !is_stop_word(w))
}

fn push_field(tokens: &mut Vec<WeightedToken>, text: &str, weight: f32) {
    tokens.extend(words(text).map(|w| WeightedToken::new(w, weight)));
}

pub fn tokenize_entry(entry: &CatalogEntry) -> Vec<WeightedToken> {
    let mut tokens = Vec::new();

    push_field(&mut tokens, &entry.name, NAME_WEIGHT);
    for skill in &entry.skills {
        push_field(&mut tokens, skill, SKILL_WEIGHT);
    }
    for tag in entry.tags() {
        push_field(&mut tokens, tag.label(), TEST_TYPE_WEIGHT);
    }
    push_field(&mut tokens, &entry.job_level, JOB_LEVEL_WEIGHT);
    push_field(&mut tokens, &entry.description, DESCRIPTION_WEIGHT);
    push_field(&mut tokens, &entry.duration, DURATION_WEIGHT);

    tokens
}

pub fn tokenize_query(query: &str) -> Vec<WeightedToken> {
    words(query)
        .map(|w| WeightedToken::new(w, QUERY_WEIGHT))
        .collect()
}

//! Composite Quality Function
//!
//! Aggregates the oracle's raw signals and the text-level KPIs of a haiku
//! into one `total_score`. Deterministic: identical verses and raw metrics
//! always give identical output.
//!
//! Weights of the aggregate:
//!
//! | Component | Weight |
//! |---|---|
//! | nature words | +2 each |
//! | repeated content words | -2 each |
//! | weak starts | -2 per verse |
//! | blacklisted verses | -3 per verse |
//! | proper nouns | -2 each |
//! | over-length verses | -3 per verse |
//! | sentiment | `(s - 0.5) * 4` |
//! | grammar | 1.5 |
//! | trigram flow | 0.2 |
//! | markov flow | 0.5 |
//! | uniqueness | 2 |
//! | alliteration | 1.5 |
//! | verse distance | 4 |
//! | line length balance | 1.5 |
//! | imagery density | 1.5 |
//! | semantic coherence | 2 |
//! | verb presence | 1 |

use crate::lexicon::{
    ALLOWED_REPEATS, COMMON_NAMES, NATURE_WORDS, SENSORY_WORDS, TITLES, VERB_TAGS,
};
use crate::oracle::PosTag;
use crate::types::QualityMetrics;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Verses at or beyond this many characters are penalised
pub const VERSE_MAX_LENGTH: usize = 30;

/// Characters and fragments that disqualify a verse
pub static BLACKLISTED_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@|[0-9]|Mr|Mrs|Dr|#|\[|\||\(|\)|"|“|”|'|‘|’|/|--|:|,|_|—|\+|=|\{|\}|\]|\*|\$|%|\r|\n|;|~|&"#)
        .expect("valid blacklist pattern")
});

/// Pronouns, existentials and conjunctions that open a verse without imagery
pub static WEAK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(it|there|this|that|they|we|he|she|i|and|or|but)\s")
        .expect("valid weak start pattern")
});

/// Signals supplied by the oracle, plus optional context for the KPIs
#[derive(Debug, Clone, PartialEq)]
pub struct RawMetrics {
    /// Mean per-verse sentiment, [0, 1]
    pub sentiment: f64,
    /// Mean per-verse grammar score, [0, 1]
    pub grammar: f64,
    /// [0, 10]
    pub trigram_flow: f64,
    /// [0, 10]
    pub markov_flow: f64,
    /// [0, 1]
    pub alliteration: f64,
    /// Extractor positions of the verses
    pub verse_indices: Option<Vec<usize>>,
    /// Number of quotes the positions are drawn from
    pub total_quotes: Option<usize>,
    pub pos_tags: Option<Vec<PosTag>>,
    /// Pre-computed coherence that replaces the word-overlap estimate
    pub embedding_coherence: Option<f64>,
}

impl RawMetrics {
    /// Neutral-low signals used when the oracle is not consulted
    pub fn neutral() -> Self {
        Self {
            sentiment: 0.5,
            grammar: 0.0,
            trigram_flow: 0.0,
            markov_flow: 0.0,
            alliteration: 0.0,
            verse_indices: None,
            total_quotes: None,
            pos_tags: None,
            embedding_coherence: None,
        }
    }
}

impl Default for RawMetrics {
    fn default() -> Self {
        Self::neutral()
    }
}

fn words_lower<S: AsRef<str>>(verses: &[S]) -> impl Iterator<Item = String> + '_ {
    verses
        .iter()
        .flat_map(|v| v.as_ref().split_whitespace().map(str::to_lowercase))
}

pub fn count_nature_words<S: AsRef<str>>(verses: &[S]) -> u32 {
    words_lower(verses)
        .filter(|w| NATURE_WORDS.contains(w.as_str()))
        .count() as u32
}

/// Content words already seen earlier in the haiku
pub fn count_repeated_words<S: AsRef<str>>(verses: &[S]) -> u32 {
    let mut seen = HashSet::new();
    let mut repeats = 0;
    for word in words_lower(verses) {
        if ALLOWED_REPEATS.contains(word.as_str()) {
            continue;
        }
        if !seen.insert(word) {
            repeats += 1;
        }
    }
    repeats
}

pub fn has_weak_start(text: &str) -> bool {
    WEAK_START.is_match(text)
}

pub fn has_blacklisted_chars(verse: &str) -> bool {
    BLACKLISTED_CHARS.is_match(verse)
}

pub fn count_blacklisted_verses<S: AsRef<str>>(verses: &[S]) -> u32 {
    verses
        .iter()
        .filter(|v| has_blacklisted_chars(v.as_ref()))
        .count() as u32
}

/// Titles anywhere, known first names in first position, capitalised words
/// elsewhere.
fn is_proper_noun(word: &str, is_first_word: bool) -> bool {
    let lower = word.to_lowercase();
    if TITLES.contains(lower.as_str()) {
        return true;
    }
    if is_first_word {
        return COMMON_NAMES.contains(lower.as_str());
    }
    word.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

pub fn count_proper_nouns<S: AsRef<str>>(verses: &[S]) -> u32 {
    verses
        .iter()
        .flat_map(|v| {
            v.as_ref()
                .split_whitespace()
                .enumerate()
                .filter(|(i, word)| is_proper_noun(word, *i == 0))
        })
        .count() as u32
}

pub fn count_long_verses<S: AsRef<str>>(verses: &[S]) -> u32 {
    verses
        .iter()
        .filter(|v| v.as_ref().chars().count() >= VERSE_MAX_LENGTH)
        .count() as u32
}

/// Unique words over total words; 0 for empty text
pub fn word_uniqueness<S: AsRef<str>>(verses: &[S]) -> f64 {
    let words: Vec<String> = words_lower(verses).collect();
    if words.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&String> = words.iter().collect();
    unique.len() as f64 / words.len() as f64
}

/// 1.0 for adjacent verses, shrinking with the span they cover in the source
pub fn verse_distance(indices: &[usize], total_quotes: usize) -> f64 {
    if indices.len() < 2 || total_quotes <= 1 {
        return 1.0;
    }
    let (Some(max), Some(min)) = (indices.iter().max(), indices.iter().min()) else {
        return 1.0;
    };
    (1.0 - (max - min) as f64 / total_quotes as f64).max(0.0)
}

/// One minus the coefficient of variation of verse lengths
pub fn line_length_balance<S: AsRef<str>>(verses: &[S]) -> f64 {
    if verses.is_empty() {
        return 1.0;
    }
    let lengths: Vec<f64> = verses
        .iter()
        .map(|v| v.as_ref().chars().count() as f64)
        .collect();
    let n = lengths.len() as f64;
    let mean = lengths.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 1.0;
    }
    let variance = lengths.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance.sqrt() / mean).max(0.0)
}

/// Sensory words, saturating at six
pub fn imagery_density<S: AsRef<str>>(verses: &[S]) -> f64 {
    let sensory = words_lower(verses)
        .filter(|w| SENSORY_WORDS.contains(w.as_str()))
        .count();
    (sensory as f64 / 6.0).min(1.0)
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Mean pairwise word overlap of the three verses (words longer than two
/// characters).
pub fn semantic_coherence<S: AsRef<str>>(verses: &[S]) -> f64 {
    if verses.len() < 3 {
        return 1.0;
    }
    let sets: Vec<HashSet<String>> = verses
        .iter()
        .take(3)
        .map(|v| {
            v.as_ref()
                .split_whitespace()
                .map(str::to_lowercase)
                .filter(|w| w.chars().count() > 2)
                .collect()
        })
        .collect();
    (jaccard(&sets[0], &sets[1]) + jaccard(&sets[0], &sets[2]) + jaccard(&sets[1], &sets[2]))
        / 3.0
}

/// Verbs among the tags, saturating at three
pub fn verb_presence(tags: &[PosTag]) -> f64 {
    let verbs = tags
        .iter()
        .filter(|t| VERB_TAGS.contains(t.tag.as_str()))
        .count();
    (verbs as f64 / 3.0).min(1.0)
}

/// Score one haiku
pub fn calculate_haiku_quality<S: AsRef<str>>(verses: &[S], raw: &RawMetrics) -> QualityMetrics {
    let nature_words = count_nature_words(verses);
    let repeated_words = count_repeated_words(verses);
    let weak_starts = verses.iter().filter(|v| has_weak_start(v.as_ref())).count() as u32;
    let blacklisted_verses = count_blacklisted_verses(verses);
    let proper_nouns = count_proper_nouns(verses);
    let verse_length_penalty = count_long_verses(verses);
    let uniqueness = word_uniqueness(verses);

    let verse_distance = match (&raw.verse_indices, raw.total_quotes) {
        (Some(indices), Some(total)) if total > 0 => verse_distance(indices, total),
        _ => 0.5,
    };
    let line_length_balance = line_length_balance(verses);
    let imagery_density = imagery_density(verses);
    let semantic_coherence = raw
        .embedding_coherence
        .unwrap_or_else(|| semantic_coherence(verses));
    let verb_presence = raw.pos_tags.as_deref().map_or(0.5, verb_presence);

    let penalties = 2.0 * repeated_words as f64
        + 2.0 * weak_starts as f64
        + 3.0 * blacklisted_verses as f64
        + 2.0 * proper_nouns as f64
        + 3.0 * verse_length_penalty as f64;
    let bonuses = 2.0 * nature_words as f64
        + (raw.sentiment - 0.5) * 4.0
        + raw.grammar * 1.5
        + raw.trigram_flow * 0.2
        + raw.markov_flow * 0.5
        + uniqueness * 2.0
        + raw.alliteration * 1.5
        + verse_distance * 4.0
        + line_length_balance * 1.5
        + imagery_density * 1.5
        + semantic_coherence * 2.0
        + verb_presence;

    QualityMetrics {
        total_score: bonuses - penalties,
        nature_words,
        repeated_words,
        weak_starts,
        blacklisted_verses,
        proper_nouns,
        verse_length_penalty,
        sentiment: raw.sentiment,
        grammar: raw.grammar,
        markov_flow: raw.markov_flow,
        trigram_flow: raw.trigram_flow,
        uniqueness,
        alliteration: raw.alliteration,
        verse_distance,
        line_length_balance,
        imagery_density,
        semantic_coherence,
        verb_presence,
    }
}

//! Sequential quote validation
//!
//! The non-evolutionary selection path: verses are picked one at a time
//! (5, 7, 5) from candidates that pass a chain of gates, and the finished
//! triple must clear the whole-haiku filters. Shares its scoring primitives
//! with the composite fitness function.

use crate::oracle::ScoringOracle;
use crate::quality::{
    count_repeated_words, has_weak_start, imagery_density, line_length_balance,
    semantic_coherence, verb_presence, verse_distance, word_uniqueness, VERSE_MAX_LENGTH,
};
use crate::random::SeededRandom;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::debug;

static UPPERCASE_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z\s!:.?]+$").expect("valid uppercase pattern"));

static INVALID_START_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(said|cried|inquired)").expect("valid start words pattern"));

static INVALID_END_WORDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(or|and|of)$").expect("valid end words pattern"));

/// Same as the scoring blacklist except apostrophes, which quotes may keep
static QUOTE_BLACKLIST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@|[0-9]|Mr|Mrs|Dr|#|\[|\||\(|\)|"|“|”|‘|’|/|--|:|,|_|—|\+|=|\{|\}|\]|\*|\$|%|\r|\n|;|~|&"#)
        .expect("valid quote blacklist pattern")
});

/// Single capital at the end, usually a truncated name
static LOST_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]\b$").expect("valid lost letter pattern"));

static CONJUNCTION_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(and|but|or|of)").expect("valid conjunction pattern"));

/// Minimum scores for each gate. A zero disables the optional gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScoreThresholds {
    pub sentiment: f64,
    pub markov: f64,
    /// Grammar score
    pub pos: f64,
    pub trigram: f64,
    pub tfidf: f64,
    pub phonetics: f64,
    pub uniqueness: f64,
    pub verse_distance: f64,
    pub line_length_balance: f64,
    pub imagery_density: f64,
    pub semantic_coherence: f64,
    pub verb_presence: f64,
    /// Repeated content words allowed across selected verses, 0 = unchecked
    pub max_repeated_words: u32,
    pub allow_weak_start: bool,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            sentiment: 0.5,
            markov: 0.1,
            pos: 0.3,
            trigram: 0.5,
            tfidf: 0.0,
            phonetics: 0.2,
            uniqueness: 0.6,
            verse_distance: 0.05,
            line_length_balance: 0.5,
            imagery_density: 0.0,
            semantic_coherence: 0.0,
            verb_presence: 0.3,
            max_repeated_words: 0,
            allow_weak_start: true,
        }
    }
}

/// A syllable-counted quote with its position in the chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteCandidate {
    pub quote: String,
    pub index: usize,
    pub syllable_count: u8,
}

impl QuoteCandidate {
    pub fn new(quote: impl Into<String>, index: usize, syllable_count: u8) -> Self {
        Self {
            quote: quote.into(),
            index,
            syllable_count,
        }
    }
}

/// Gate that turned a candidate down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Basic,
    Sentiment,
    Grammar,
    Tfidf,
    Markov,
    Trigram,
    Phonetics,
    Uniqueness,
    VerseDistance,
    LineLengthBalance,
    ImageryDensity,
    SemanticCoherence,
    VerbPresence,
}

/// Rejection counts per gate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionStats {
    pub sentiment: u64,
    pub markov: u64,
    pub grammar: u64,
    pub trigram: u64,
    pub tfidf: u64,
    pub phonetics: u64,
    pub uniqueness: u64,
    pub verse_distance: u64,
    pub line_length_balance: u64,
    pub imagery_density: u64,
    pub semantic_coherence: u64,
    pub verb_presence: u64,
    pub basic: u64,
    pub total: u64,
}

impl RejectionStats {
    pub fn record(&mut self, rejection: Rejection) {
        let slot = match rejection {
            Rejection::Basic => &mut self.basic,
            Rejection::Sentiment => &mut self.sentiment,
            Rejection::Grammar => &mut self.grammar,
            Rejection::Tfidf => &mut self.tfidf,
            Rejection::Markov => &mut self.markov,
            Rejection::Trigram => &mut self.trigram,
            Rejection::Phonetics => &mut self.phonetics,
            Rejection::Uniqueness => &mut self.uniqueness,
            Rejection::VerseDistance => &mut self.verse_distance,
            Rejection::LineLengthBalance => &mut self.line_length_balance,
            Rejection::ImageryDensity => &mut self.imagery_density,
            Rejection::SemanticCoherence => &mut self.semantic_coherence,
            Rejection::VerbPresence => &mut self.verb_presence,
        };
        *slot += 1;
        self.total += 1;
    }
}

/// Three verses picked by the sequential path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedHaiku {
    pub verses: [String; 3],
    pub indices: [usize; 3],
}

/// Quote gate backed by a scoring oracle
pub struct HaikuValidator<'a, O: ScoringOracle + ?Sized> {
    oracle: &'a O,
    sentiment_cache: HashMap<String, f64>,
    rejections: RejectionStats,
}

impl<'a, O: ScoringOracle + ?Sized> HaikuValidator<'a, O> {
    pub fn new(oracle: &'a O) -> Self {
        Self {
            oracle,
            sentiment_cache: HashMap::new(),
            rejections: RejectionStats::default(),
        }
    }

    pub fn rejection_stats(&self) -> RejectionStats {
        self.rejections
    }

    pub fn reset_rejection_stats(&mut self) {
        self.rejections = RejectionStats::default();
    }

    pub fn clear_cache(&mut self) {
        self.sentiment_cache.clear();
    }

    fn reject(&mut self, rejection: Rejection) -> bool {
        self.rejections.record(rejection);
        false
    }

    /// Basic, score and (once a verse is selected) sequence gates
    pub fn is_quote_valid_for_verse(
        &mut self,
        candidate: &QuoteCandidate,
        is_first_verse: bool,
        selected: &[QuoteCandidate],
        thresholds: &ScoreThresholds,
    ) -> bool {
        let quote = candidate.quote.replace('\n', " ");

        if !self.passes_basic_validation(&quote, is_first_verse, thresholds) {
            return false;
        }
        if !self.passes_score_validation(&quote, thresholds) {
            return false;
        }
        if selected.is_empty() {
            return true;
        }
        self.passes_sequence_validation(&quote, candidate.index, selected, thresholds)
    }

    pub fn passes_basic_validation(
        &mut self,
        quote: &str,
        is_first_verse: bool,
        thresholds: &ScoreThresholds,
    ) -> bool {
        if is_first_verse && CONJUNCTION_START.is_match(quote) {
            return self.reject(Rejection::Basic);
        }
        if is_quote_invalid(quote) {
            return self.reject(Rejection::Basic);
        }
        if !thresholds.allow_weak_start && has_weak_start(quote) {
            return self.reject(Rejection::Basic);
        }
        true
    }

    fn cached_sentiment(&mut self, quote: &str) -> f64 {
        if let Some(&score) = self.sentiment_cache.get(quote) {
            return score;
        }
        let score = self.oracle.analyze_sentiment(quote);
        self.sentiment_cache.insert(quote.to_string(), score);
        score
    }

    pub fn passes_score_validation(&mut self, quote: &str, thresholds: &ScoreThresholds) -> bool {
        if self.cached_sentiment(quote) < thresholds.sentiment {
            return self.reject(Rejection::Sentiment);
        }
        if thresholds.pos > 0.0 && self.oracle.analyze_grammar(quote).score < thresholds.pos {
            return self.reject(Rejection::Grammar);
        }
        if thresholds.tfidf > 0.0 && self.oracle.score_distinctiveness(quote) < thresholds.tfidf {
            return self.reject(Rejection::Tfidf);
        }
        true
    }

    /// Gates that depend on the verses already chosen. Out-of-order indices
    /// and repeated words reject without being counted.
    pub fn passes_sequence_validation(
        &mut self,
        quote: &str,
        index: usize,
        selected: &[QuoteCandidate],
        thresholds: &ScoreThresholds,
    ) -> bool {
        let Some(last) = selected.last() else {
            return true;
        };
        if index <= last.index {
            return false;
        }

        let verses: Vec<&str> = selected
            .iter()
            .map(|v| v.quote.as_str())
            .chain(std::iter::once(quote))
            .collect();

        if thresholds.max_repeated_words > 0
            && count_repeated_words(&verses) > thresholds.max_repeated_words
        {
            return false;
        }
        if self.oracle.evaluate_haiku(&verses) < thresholds.markov {
            return self.reject(Rejection::Markov);
        }
        if thresholds.trigram > 0.0
            && self.oracle.evaluate_haiku_trigrams(&verses) < thresholds.trigram
        {
            return self.reject(Rejection::Trigram);
        }
        if thresholds.phonetics > 0.0
            && self.oracle.analyze_phonetics(&verses).alliteration_score < thresholds.phonetics
        {
            return self.reject(Rejection::Phonetics);
        }
        if verses.len() == 3
            && thresholds.uniqueness > 0.0
            && word_uniqueness(&verses) < thresholds.uniqueness
        {
            return self.reject(Rejection::Uniqueness);
        }
        true
    }

    /// Filters on the finished triple
    pub fn passes_full_haiku_filters<S: AsRef<str>>(
        &mut self,
        verses: &[S],
        indices: &[usize],
        total_quotes: usize,
        thresholds: &ScoreThresholds,
    ) -> bool {
        if thresholds.verse_distance > 0.0
            && verse_distance(indices, total_quotes) < thresholds.verse_distance
        {
            return self.reject(Rejection::VerseDistance);
        }
        if thresholds.line_length_balance > 0.0
            && line_length_balance(verses) < thresholds.line_length_balance
        {
            return self.reject(Rejection::LineLengthBalance);
        }
        if thresholds.imagery_density > 0.0 && imagery_density(verses) < thresholds.imagery_density
        {
            return self.reject(Rejection::ImageryDensity);
        }
        if thresholds.semantic_coherence > 0.0
            && semantic_coherence(verses) < thresholds.semantic_coherence
        {
            return self.reject(Rejection::SemanticCoherence);
        }
        if thresholds.verb_presence > 0.0 {
            let tags: Vec<_> = verses
                .iter()
                .flat_map(|v| self.oracle.pos_tags(v.as_ref()))
                .collect();
            if verb_presence(&tags) < thresholds.verb_presence {
                return self.reject(Rejection::VerbPresence);
            }
        }
        true
    }

    /// Pick a 5-7-5 haiku verse by verse, uniformly among the candidates
    /// that pass every gate at each step. `total_quotes` defaults to the
    /// number of candidates.
    pub fn select_haiku(
        &mut self,
        quotes: &[QuoteCandidate],
        total_quotes: Option<usize>,
        thresholds: &ScoreThresholds,
        rng: &mut SeededRandom,
    ) -> Option<SelectedHaiku> {
        let mut selected: Vec<QuoteCandidate> = Vec::with_capacity(3);
        let mut used: HashSet<usize> = HashSet::new();

        for (position, target) in [5u8, 7, 5].into_iter().enumerate() {
            let matching: Vec<&QuoteCandidate> = quotes
                .iter()
                .filter(|q| q.syllable_count == target && !used.contains(&q.index))
                .filter(|q| self.is_quote_valid_for_verse(q, position == 0, &selected, thresholds))
                .collect();

            if matching.is_empty() {
                debug!("No valid {}-syllable quote for verse {}", target, position + 1);
                return None;
            }
            let pick = matching[rng.next_int(0, matching.len())].clone();
            used.insert(pick.index);
            selected.push(pick);
        }

        let verses: [String; 3] = [
            selected[0].quote.clone(),
            selected[1].quote.clone(),
            selected[2].quote.clone(),
        ];
        let indices = [selected[0].index, selected[1].index, selected[2].index];
        let total = total_quotes.unwrap_or(quotes.len());

        if !self.passes_full_haiku_filters(&verses, &indices, total, thresholds) {
            return None;
        }
        Some(SelectedHaiku { verses, indices })
    }
}

/// Headers, blacklisted fragments, dangling words and overlong quotes
pub fn is_quote_invalid(quote: &str) -> bool {
    UPPERCASE_TEXT.is_match(quote)
        || INVALID_START_WORDS.is_match(quote)
        || INVALID_END_WORDS.is_match(quote)
        || QUOTE_BLACKLIST.is_match(quote)
        || LOST_LETTER.is_match(quote)
        || quote.chars().count() >= VERSE_MAX_LENGTH
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{GrammarAnalysis, PhoneticsAnalysis, PosTag};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubOracle {
        sentiment: f64,
        grammar: f64,
        markov: f64,
        sentiment_calls: AtomicUsize,
    }

    impl StubOracle {
        fn passing() -> Self {
            Self {
                sentiment: 0.8,
                grammar: 1.0,
                markov: 5.0,
                sentiment_calls: AtomicUsize::new(0),
            }
        }
    }

    impl ScoringOracle for StubOracle {
        fn analyze_sentiment(&self, _text: &str) -> f64 {
            self.sentiment_calls.fetch_add(1, Ordering::SeqCst);
            self.sentiment
        }
        fn analyze_grammar(&self, _text: &str) -> GrammarAnalysis {
            GrammarAnalysis {
                score: self.grammar,
                ..Default::default()
            }
        }
        fn analyze_phonetics(&self, _verses: &[&str]) -> PhoneticsAnalysis {
            PhoneticsAnalysis {
                alliteration_score: 1.0,
                ..Default::default()
            }
        }
        fn pos_tags(&self, text: &str) -> Vec<PosTag> {
            text.split_whitespace().map(|w| PosTag::new(w, "VB")).collect()
        }
        fn evaluate_haiku(&self, _verses: &[&str]) -> f64 {
            self.markov
        }
        fn evaluate_haiku_trigrams(&self, _verses: &[&str]) -> f64 {
            self.markov
        }
    }

    fn relaxed() -> ScoreThresholds {
        ScoreThresholds {
            uniqueness: 0.0,
            verse_distance: 0.0,
            line_length_balance: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_is_quote_invalid() {
        assert!(is_quote_invalid("CHAPTER ONE"));
        assert!(is_quote_invalid("said the old man"));
        assert!(is_quote_invalid("the cat and"));
        assert!(is_quote_invalid("a walk with Mr Brown"));
        assert!(is_quote_invalid("we met at noon, then"));
        assert!(is_quote_invalid("he wrote to J"));
        assert!(is_quote_invalid("the moon over still water at dusk"));
        assert!(!is_quote_invalid("the moon over water"));
        assert!(!is_quote_invalid("the heron's cry"));
    }

    #[test]
    fn test_conjunction_only_rejected_on_first_verse() {
        let oracle = StubOracle::passing();
        let mut validator = HaikuValidator::new(&oracle);
        let thresholds = ScoreThresholds::default();

        assert!(!validator.passes_basic_validation("but the moon rises", true, &thresholds));
        assert!(validator.passes_basic_validation("but the moon rises", false, &thresholds));
        let stats = validator.rejection_stats();
        assert_eq!(stats.basic, 1);
        assert_eq!(stats.total, 1);
    }

    #[test]
    fn test_weak_start_gate() {
        let oracle = StubOracle::passing();
        let mut validator = HaikuValidator::new(&oracle);
        let strict = ScoreThresholds {
            allow_weak_start: false,
            ..Default::default()
        };
        assert!(!validator.passes_basic_validation("it rains on the hill", false, &strict));
        assert!(validator.passes_basic_validation(
            "it rains on the hill",
            false,
            &ScoreThresholds::default()
        ));
    }

    #[test]
    fn test_sentiment_is_memoized() {
        let oracle = StubOracle {
            sentiment: 0.2,
            ..StubOracle::passing()
        };
        let mut validator = HaikuValidator::new(&oracle);
        let thresholds = ScoreThresholds::default();

        assert!(!validator.passes_score_validation("cold rain falls", &thresholds));
        assert!(!validator.passes_score_validation("cold rain falls", &thresholds));
        assert_eq!(oracle.sentiment_calls.load(Ordering::SeqCst), 1);
        assert_eq!(validator.rejection_stats().sentiment, 2);

        validator.clear_cache();
        validator.passes_score_validation("cold rain falls", &thresholds);
        assert_eq!(oracle.sentiment_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_grammar_gate_counts() {
        let oracle = StubOracle {
            grammar: 0.1,
            ..StubOracle::passing()
        };
        let mut validator = HaikuValidator::new(&oracle);
        assert!(!validator.passes_score_validation("cold rain falls", &ScoreThresholds::default()));
        assert_eq!(validator.rejection_stats().grammar, 1);

        let no_grammar = ScoreThresholds {
            pos: 0.0,
            ..Default::default()
        };
        assert!(validator.passes_score_validation("cold rain falls", &no_grammar));
    }

    #[test]
    fn test_sequence_requires_later_index() {
        let oracle = StubOracle::passing();
        let mut validator = HaikuValidator::new(&oracle);
        let selected = [QuoteCandidate::new("an old silent pond", 10, 5)];

        assert!(!validator.passes_sequence_validation("a frog jumps in", 10, &selected, &relaxed()));
        assert!(!validator.passes_sequence_validation("a frog jumps in", 3, &selected, &relaxed()));
        assert_eq!(validator.rejection_stats().total, 0);
        assert!(validator.passes_sequence_validation("a frog jumps in", 11, &selected, &relaxed()));
    }

    #[test]
    fn test_sequence_markov_rejection() {
        let oracle = StubOracle {
            markov: 0.0,
            ..StubOracle::passing()
        };
        let mut validator = HaikuValidator::new(&oracle);
        let selected = [QuoteCandidate::new("an old silent pond", 1, 5)];
        assert!(!validator.passes_sequence_validation("a frog jumps in", 2, &selected, &relaxed()));
        assert_eq!(validator.rejection_stats().markov, 1);
    }

    #[test]
    fn test_full_filters_verse_distance() {
        let oracle = StubOracle::passing();
        let mut validator = HaikuValidator::new(&oracle);
        let verses = ["an old silent pond", "a frog jumps into the pond", "splash then silence"];
        let thresholds = ScoreThresholds {
            verse_distance: 0.5,
            line_length_balance: 0.0,
            ..Default::default()
        };

        assert!(validator.passes_full_haiku_filters(&verses, &[1, 2, 3], 100, &thresholds));
        assert!(!validator.passes_full_haiku_filters(&verses, &[0, 50, 90], 100, &thresholds));
        assert_eq!(validator.rejection_stats().verse_distance, 1);

        validator.reset_rejection_stats();
        assert_eq!(validator.rejection_stats(), RejectionStats::default());
    }

    #[test]
    fn test_select_haiku_follows_five_seven_five() {
        let oracle = StubOracle::passing();
        let mut validator = HaikuValidator::new(&oracle);
        let quotes = vec![
            QuoteCandidate::new("an old silent pond", 0, 5),
            QuoteCandidate::new("a frog jumps into the pond", 1, 7),
            QuoteCandidate::new("wind moves through tall grass", 2, 7),
            // Conjunction starts cannot open the haiku
            QuoteCandidate::new("but the rain returns", 3, 5),
            QuoteCandidate::new("the light of the moon is too long here", 4, 5),
            QuoteCandidate::new("of petals falling", 5, 5),
        ];
        let mut rng = SeededRandom::new(Some("select"));

        let haiku = validator
            .select_haiku(&quotes, None, &relaxed(), &mut rng)
            .unwrap();
        assert!(haiku.indices[0] < haiku.indices[1] && haiku.indices[1] < haiku.indices[2]);
        let syllables: Vec<u8> = haiku
            .indices
            .iter()
            .map(|&i| quotes[i].syllable_count)
            .collect();
        assert_eq!(syllables, vec![5, 7, 5]);
        assert_eq!(haiku.indices[0], 0);
        assert_ne!(haiku.indices[2], 4);
    }

    #[test]
    fn test_select_haiku_is_deterministic_per_seed() {
        let oracle = StubOracle::passing();
        let quotes: Vec<QuoteCandidate> = (0..30)
            .map(|i| QuoteCandidate::new(format!("quiet verse {}", "x".repeat(i % 5)), i, [5, 7][i % 2]))
            .collect();

        let pick = |seed: &str| {
            let mut validator = HaikuValidator::new(&oracle);
            let mut rng = SeededRandom::new(Some(seed));
            validator.select_haiku(&quotes, None, &relaxed(), &mut rng)
        };
        assert_eq!(pick("same"), pick("same"));
    }

    #[test]
    fn test_select_haiku_without_seven_syllable_quotes() {
        let oracle = StubOracle::passing();
        let mut validator = HaikuValidator::new(&oracle);
        let quotes = vec![
            QuoteCandidate::new("an old silent pond", 0, 5),
            QuoteCandidate::new("splash then silence", 2, 5),
        ];
        let mut rng = SeededRandom::new(Some("none"));
        assert!(validator
            .select_haiku(&quotes, None, &relaxed(), &mut rng)
            .is_none());
    }
}

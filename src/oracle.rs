//! Scoring Oracle
//!
//! The linguistic analyzers the evaluator consults: sentiment, grammar,
//! phonetics, part-of-speech tagging and Markov flow. The engine treats them
//! as pure functions of text and never retries or recovers from them.
//!
//! `HeuristicOracle` is a small self-contained implementation used by the
//! binaries. It trains its bigram and trigram tables on the verse pools of
//! the run.

use crate::types::VersePools;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// One tagged word (Penn Treebank tag set)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosTag {
    pub word: String,
    pub tag: String,
}

impl PosTag {
    pub fn new(word: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
    }
}

/// Grammar analysis of a single verse
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GrammarAnalysis {
    pub has_noun: bool,
    pub has_verb: bool,
    pub has_adjective: bool,
    /// [0, 1]
    pub score: f64,
}

/// Phonetic analysis across verses
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhoneticsAnalysis {
    /// Share of words whose leading sound repeats elsewhere, [0, 1]
    pub alliteration_score: f64,
    pub unique_sounds: usize,
    pub total_words: usize,
}

/// External scoring services consumed by the fitness evaluator and the
/// quote validator. Implementations are shared read-only with evaluation
/// worker threads.
pub trait ScoringOracle: Sync {
    /// Higher is more positive, [0, 1] with 0.5 neutral
    fn analyze_sentiment(&self, text: &str) -> f64;

    fn analyze_grammar(&self, text: &str) -> GrammarAnalysis;

    fn analyze_phonetics(&self, verses: &[&str]) -> PhoneticsAnalysis;

    fn pos_tags(&self, text: &str) -> Vec<PosTag>;

    /// Markov bigram flow across verse boundaries, [0, 10]
    fn evaluate_haiku(&self, verses: &[&str]) -> f64;

    /// Trigram flow across verse boundaries, [0, 10]
    fn evaluate_haiku_trigrams(&self, verses: &[&str]) -> f64;

    /// TF-IDF distinctiveness of a quote; oracles without a corpus report 0
    fn score_distinctiveness(&self, _text: &str) -> f64 {
        0.0
    }
}

impl<T: ScoringOracle + ?Sized> ScoringOracle for &T {
    fn analyze_sentiment(&self, text: &str) -> f64 {
        (**self).analyze_sentiment(text)
    }
    fn analyze_grammar(&self, text: &str) -> GrammarAnalysis {
        (**self).analyze_grammar(text)
    }
    fn analyze_phonetics(&self, verses: &[&str]) -> PhoneticsAnalysis {
        (**self).analyze_phonetics(verses)
    }
    fn pos_tags(&self, text: &str) -> Vec<PosTag> {
        (**self).pos_tags(text)
    }
    fn evaluate_haiku(&self, verses: &[&str]) -> f64 {
        (**self).evaluate_haiku(verses)
    }
    fn evaluate_haiku_trigrams(&self, verses: &[&str]) -> f64 {
        (**self).evaluate_haiku_trigrams(verses)
    }
    fn score_distinctiveness(&self, text: &str) -> f64 {
        (**self).score_distinctiveness(text)
    }
}

/// Lowercased alphabetic words of a text
pub fn extract_words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphabetic() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

static POSITIVE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "bright", "calm", "gentle", "warm", "soft", "sweet", "love", "joy", "peace", "light",
        "bloom", "blossom", "smile", "laugh", "hope", "golden", "beautiful", "fair", "glad",
        "happy", "serene", "tender", "kind", "grace", "dream", "shine", "glow", "sing", "song",
        "delight", "pleasant", "lovely", "fresh", "clear", "still", "quiet", "rest", "wonder",
        "spring", "dawn",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "dark", "cold", "death", "dead", "die", "grief", "sorrow", "pain", "fear", "cruel",
        "angry", "hate", "bitter", "cry", "tears", "weep", "lost", "alone", "lonely", "broken",
        "sick", "ill", "wrong", "evil", "terrible", "dreadful", "misery", "wretched", "gloom",
        "despair", "harsh", "ugly", "poor", "sad", "fall", "ruin", "shame", "war", "blood",
    ]
    .into_iter()
    .collect()
});

static DETERMINERS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "a", "an", "this", "that", "these", "those", "every", "each", "some", "no", "all",
    ]
    .into_iter()
    .collect()
});

static PREPOSITIONS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "in", "on", "at", "of", "to", "from", "with", "by", "for", "over", "under", "through",
        "into", "upon", "across", "beneath", "beyond", "among", "along", "toward", "towards",
        "above", "below", "near", "without", "within",
    ]
    .into_iter()
    .collect()
});

static PRONOUNS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "i", "you", "he", "she", "it", "we", "they", "me", "him", "her", "us", "them",
    ]
    .into_iter()
    .collect()
});

static CONJUNCTIONS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ["and", "but", "or", "nor", "for", "yet", "so"].into_iter().collect());

static COMMON_VERBS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "is", "are", "was", "were", "be", "been", "am", "has", "have", "had", "do", "does", "did",
        "go", "goes", "went", "come", "comes", "came", "see", "sees", "saw", "know", "knew",
        "fall", "falls", "fell", "rise", "rises", "rose", "sing", "sings", "sang", "lie", "lies",
        "lay", "stand", "stands", "stood", "sit", "sits", "sat", "run", "runs", "ran", "fly",
        "flies", "flew", "grow", "grows", "grew", "shine", "shines", "shone", "sleep", "sleeps",
        "slept", "dream", "dreams", "hear", "hears", "heard", "feel", "feels", "felt", "say",
        "says", "said", "take", "takes", "took", "give", "gives", "gave", "drift", "drifts",
        "wait", "waits", "turn", "turns", "hold", "holds", "held", "sweep", "sweeps", "swept",
    ]
    .into_iter()
    .collect()
});

static ADJECTIVE_SUFFIXES: &[&str] = &["ful", "ous", "ive", "less", "able", "ible", "ish", "ic"];

fn tag_word(word: &str) -> &'static str {
    if DETERMINERS.contains(word) {
        "DT"
    } else if PREPOSITIONS.contains(word) {
        "IN"
    } else if PRONOUNS.contains(word) {
        "PRP"
    } else if CONJUNCTIONS.contains(word) {
        "CC"
    } else if COMMON_VERBS.contains(word) {
        if word.ends_with('s') && word.len() > 3 {
            "VBZ"
        } else {
            "VB"
        }
    } else if word.len() > 4 && word.ends_with("ing") {
        "VBG"
    } else if word.len() > 3 && word.ends_with("ed") {
        "VBD"
    } else if word.len() > 3 && word.ends_with("ly") {
        "RB"
    } else if ADJECTIVE_SUFFIXES
        .iter()
        .any(|suffix| word.len() > suffix.len() + 2 && word.ends_with(suffix))
    {
        "JJ"
    } else if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        "NNS"
    } else {
        "NN"
    }
}

/// Lexicon and suffix heuristics plus n-gram tables trained on verse text
#[derive(Debug, Clone, Default)]
pub struct HeuristicOracle {
    bigrams: HashMap<String, HashMap<String, u32>>,
    trigrams: HashMap<(String, String), HashMap<String, u32>>,
}

impl HeuristicOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle trained on every candidate of both pools
    pub fn from_pools(pools: &VersePools) -> Self {
        let mut oracle = Self::new();
        for verse in pools.five_syllable.iter().chain(&pools.seven_syllable) {
            oracle.train(&verse.text);
        }
        oracle
    }

    /// Add the word transitions of one sentence to the n-gram tables
    pub fn train(&mut self, sentence: &str) {
        let words: Vec<String> = extract_words(sentence)
            .into_iter()
            .filter(|w| !CONJUNCTIONS.contains(w.as_str()))
            .collect();
        for pair in words.windows(2) {
            *self
                .bigrams
                .entry(pair[0].clone())
                .or_default()
                .entry(pair[1].clone())
                .or_insert(0) += 1;
        }
        for triple in words.windows(3) {
            *self
                .trigrams
                .entry((triple[0].clone(), triple[1].clone()))
                .or_default()
                .entry(triple[2].clone())
                .or_insert(0) += 1;
        }
    }

    pub fn bigram_count(&self) -> usize {
        self.bigrams.values().map(|m| m.len()).sum()
    }

    fn transition_score(&self, from: &str, to: &str) -> f64 {
        let from_words = extract_words(from);
        let to_words = extract_words(to);
        let (Some(last), Some(first)) = (from_words.last(), to_words.first()) else {
            return 0.0;
        };
        let Some(transitions) = self.bigrams.get(last) else {
            return 0.0;
        };
        let total: u32 = transitions.values().sum();
        match transitions.get(first) {
            Some(&count) if total > 0 => count as f64 / total as f64,
            _ => 0.0,
        }
    }

    fn trigram_score(&self, from: &str, to: &str) -> f64 {
        let from_words = extract_words(from);
        let to_words = extract_words(to);
        if from_words.len() < 2 || to_words.is_empty() {
            return 0.0;
        }
        let key = (
            from_words[from_words.len() - 2].clone(),
            from_words[from_words.len() - 1].clone(),
        );
        let Some(transitions) = self.trigrams.get(&key) else {
            return 0.0;
        };
        let total: u32 = transitions.values().sum();
        match transitions.get(&to_words[0]) {
            Some(&count) if total > 0 => count as f64 / total as f64,
            _ => 0.0,
        }
    }

    fn boundary_average(&self, verses: &[&str], score: impl Fn(&str, &str) -> f64) -> f64 {
        if verses.len() < 2 {
            return 0.0;
        }
        let total: f64 = verses.windows(2).map(|pair| score(pair[0], pair[1])).sum();
        (total / (verses.len() - 1) as f64 * 10.0).min(10.0)
    }
}

impl ScoringOracle for HeuristicOracle {
    fn analyze_sentiment(&self, text: &str) -> f64 {
        let words = extract_words(text);
        if words.is_empty() {
            return 0.5;
        }
        let balance: i32 = words
            .iter()
            .map(|w| {
                if POSITIVE_WORDS.contains(w.as_str()) {
                    1
                } else if NEGATIVE_WORDS.contains(w.as_str()) {
                    -1
                } else {
                    0
                }
            })
            .sum();
        0.5 + 0.5 * (balance as f64 / words.len() as f64 * 3.0).tanh()
    }

    fn analyze_grammar(&self, text: &str) -> GrammarAnalysis {
        let tags = self.pos_tags(text);
        if tags.is_empty() {
            return GrammarAnalysis::default();
        }
        let has_noun = tags.iter().any(|t| t.tag.starts_with("NN"));
        let has_verb = tags.iter().any(|t| t.tag.starts_with("VB"));
        let has_adjective = tags.iter().any(|t| t.tag.starts_with("JJ"));
        let score = match (has_noun, has_verb, has_adjective) {
            (true, true, _) => 1.0,
            (true, false, true) => 0.8,
            (true, false, false) => 0.5,
            (false, true, _) => 0.3,
            _ => 0.0,
        };
        GrammarAnalysis {
            has_noun,
            has_verb,
            has_adjective,
            score,
        }
    }

    fn analyze_phonetics(&self, verses: &[&str]) -> PhoneticsAnalysis {
        let words: Vec<String> = verses.iter().flat_map(|v| extract_words(v)).collect();
        if words.len() < 2 {
            return PhoneticsAnalysis::default();
        }
        // Leading letter stands in for the leading phoneme
        let mut sounds: HashMap<char, usize> = HashMap::new();
        for word in &words {
            if let Some(c) = word.chars().next() {
                *sounds.entry(c).or_insert(0) += 1;
            }
        }
        let repeated: usize = sounds.values().filter(|&&n| n > 1).sum();
        PhoneticsAnalysis {
            alliteration_score: repeated as f64 / words.len() as f64,
            unique_sounds: sounds.len(),
            total_words: words.len(),
        }
    }

    fn pos_tags(&self, text: &str) -> Vec<PosTag> {
        extract_words(text)
            .into_iter()
            .map(|word| {
                let tag = tag_word(&word);
                PosTag::new(word, tag)
            })
            .collect()
    }

    fn evaluate_haiku(&self, verses: &[&str]) -> f64 {
        self.boundary_average(verses, |a, b| self.transition_score(a, b))
    }

    fn evaluate_haiku_trigrams(&self, verses: &[&str]) -> f64 {
        self.boundary_average(verses, |a, b| self.trigram_score(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_words() {
        assert_eq!(
            extract_words("An old, silent pond!"),
            vec!["an", "old", "silent", "pond"]
        );
        assert!(extract_words("  ...  ").is_empty());
    }

    #[test]
    fn test_sentiment_neutral_and_bounded() {
        let oracle = HeuristicOracle::new();
        assert_eq!(oracle.analyze_sentiment("stone table chair"), 0.5);
        let positive = oracle.analyze_sentiment("gentle light of spring");
        let negative = oracle.analyze_sentiment("cold dark grief");
        assert!(positive > 0.5 && positive <= 1.0);
        assert!((0.0..0.5).contains(&negative));
    }

    #[test]
    fn test_grammar_noun_and_verb() {
        let oracle = HeuristicOracle::new();
        let analysis = oracle.analyze_grammar("the frog sits in water");
        assert!(analysis.has_noun);
        assert!(analysis.has_verb);
        assert_eq!(analysis.score, 1.0);
        assert_eq!(oracle.analyze_grammar("").score, 0.0);
    }

    #[test]
    fn test_pos_tags_verbs() {
        let oracle = HeuristicOracle::new();
        let tags = oracle.pos_tags("leaves falling slowly");
        let tag_names: Vec<&str> = tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tag_names, vec!["NNS", "VBG", "RB"]);
    }

    #[test]
    fn test_phonetics_alliteration() {
        let oracle = HeuristicOracle::new();
        let analysis = oracle.analyze_phonetics(&["silver snow", "soft sky"]);
        assert_eq!(analysis.alliteration_score, 1.0);
        assert_eq!(analysis.unique_sounds, 1);
        assert_eq!(oracle.analyze_phonetics(&["one"]).alliteration_score, 0.0);
    }

    #[test]
    fn test_markov_flow_from_training() {
        let mut oracle = HeuristicOracle::new();
        oracle.train("the old pond still water");
        assert!(oracle.bigram_count() > 0);
        // "pond" -> "still" is the only transition out of "pond"
        let flow = oracle.evaluate_haiku(&["an old pond", "still water", "x"]);
        assert!(flow > 0.0 && flow <= 10.0);
        assert_eq!(oracle.evaluate_haiku(&["nothing here"]), 0.0);

        let trigram = oracle.evaluate_haiku_trigrams(&["the old", "pond ripples"]);
        assert_eq!(trigram, 10.0);
    }

    #[test]
    fn test_distinctiveness_defaults_to_zero() {
        let oracle = HeuristicOracle::new();
        assert_eq!(oracle.score_distinctiveness("anything"), 0.0);
    }
}

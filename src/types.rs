//! Core data model shared by the codec, operators, evaluator and engine.

use serde::{Deserialize, Serialize};

/// Three pool indices: `[five, seven, five]`
pub type Genes = [usize; 3];

/// A sentence extracted upstream whose syllable count is 5 or 7
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseCandidate {
    pub text: String,
    pub syllable_count: u8,
    /// Position in the extractor's output, used for verse-distance scoring
    pub source_index: usize,
}

impl VerseCandidate {
    pub fn new(text: impl Into<String>, syllable_count: u8, source_index: usize) -> Self {
        Self {
            text: text.into(),
            syllable_count,
            source_index,
        }
    }
}

/// Read-only input of one evolution run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersePools {
    pub five_syllable: Vec<VerseCandidate>,
    pub seven_syllable: Vec<VerseCandidate>,
    #[serde(default)]
    pub book_id: String,
    #[serde(default)]
    pub chapter_id: String,
}

impl VersePools {
    /// Size of the search space (`five * seven * five`)
    pub fn search_space(&self) -> usize {
        let five = self.five_syllable.len();
        five.saturating_mul(self.seven_syllable.len())
            .saturating_mul(five)
    }
}

/// Component scores of one haiku plus the aggregate used as fitness.
///
/// Produced once by the composite quality function and never modified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityMetrics {
    pub total_score: f64,
    pub nature_words: u32,
    pub repeated_words: u32,
    pub weak_starts: u32,
    pub blacklisted_verses: u32,
    pub proper_nouns: u32,
    pub verse_length_penalty: u32,
    pub sentiment: f64,
    pub grammar: f64,
    pub markov_flow: f64,
    pub trigram_flow: f64,
    pub uniqueness: f64,
    pub alliteration: f64,
    pub verse_distance: f64,
    pub line_length_balance: f64,
    pub imagery_density: f64,
    pub semantic_coherence: f64,
    pub verb_presence: f64,
}

/// A candidate haiku encoded as pool indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chromosome {
    /// Canonical `"g0-g1-g2"`; equal genes always give equal ids
    pub id: String,
    pub genes: Genes,
    /// `0.0` together with `metrics == None` means "needs evaluation"
    pub fitness: f64,
    pub metrics: Option<QualityMetrics>,
    pub generation: u32,
    pub parent_ids: Option<(String, String)>,
}

impl Chromosome {
    /// Whether the evaluator still has to score this chromosome
    pub fn needs_evaluation(&self) -> bool {
        self.fitness == 0.0 || self.metrics.is_none()
    }
}

/// Canonical identifier for a gene triple
pub fn chromosome_id(genes: &Genes) -> String {
    format!("{}-{}-{}", genes[0], genes[1], genes[2])
}

/// Summary statistics of one generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationStatistics {
    pub best_fitness: f64,
    pub worst_fitness: f64,
    pub average_fitness: f64,
    pub median_fitness: f64,
    pub standard_deviation: f64,
    /// Fraction of chromosomes with a unique id
    pub diversity: f64,
    pub improvement_rate: f64,
}

/// Per-generation history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSnapshot {
    pub generation: u32,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub diversity: f64,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

/// Population state at a given generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Population {
    pub chromosomes: Vec<Chromosome>,
    pub generation: u32,
    pub statistics: PopulationStatistics,
    /// Append-only; empty unless history recording is enabled
    pub history: Vec<GenerationSnapshot>,
}

/// A chromosome decoded for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedHaiku {
    pub verses: [String; 3],
    pub metrics: QualityMetrics,
    pub fitness: f64,
    pub chromosome_id: String,
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Converged,
    MaxEvaluations,
    TimeLimit,
    Completed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Converged => "converged",
            StopReason::MaxEvaluations => "max_evaluations",
            StopReason::TimeLimit => "time_limit",
            StopReason::Completed => "completed",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress record yielded once per generation by the streaming run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionProgress {
    pub generation: u32,
    pub max_generations: u32,
    pub best_haiku: DecodedHaiku,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub diversity: f64,
    pub is_complete: bool,
    pub stop_reason: Option<StopReason>,
}

/// Final output of an evolution run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionResult {
    pub top_candidates: Vec<DecodedHaiku>,
    pub final_population: Population,
    pub convergence_generation: u32,
    pub total_evaluations: usize,
    pub execution_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chromosome_id_format() {
        assert_eq!(chromosome_id(&[3, 14, 15]), "3-14-15");
    }

    #[test]
    fn test_needs_evaluation() {
        let mut c = Chromosome {
            id: chromosome_id(&[0, 0, 0]),
            genes: [0, 0, 0],
            fitness: 0.0,
            metrics: None,
            generation: 0,
            parent_ids: None,
        };
        assert!(c.needs_evaluation());
        c.fitness = 4.2;
        c.metrics = Some(QualityMetrics::default());
        assert!(!c.needs_evaluation());
    }

    #[test]
    fn test_pools_deserialize_camel_case() {
        let json = r#"{
            "fiveSyllable": [{"text": "an old silent pond", "syllableCount": 5, "sourceIndex": 0}],
            "sevenSyllable": [],
            "bookId": "1342"
        }"#;
        let pools: VersePools = serde_json::from_str(json).unwrap();
        assert_eq!(pools.five_syllable[0].text, "an old silent pond");
        assert_eq!(pools.book_id, "1342");
        assert!(pools.chapter_id.is_empty());
        assert_eq!(pools.search_space(), 0);
    }

    #[test]
    fn test_stop_reason_serializes_snake_case() {
        let json = serde_json::to_string(&StopReason::MaxEvaluations).unwrap();
        assert_eq!(json, "\"max_evaluations\"");
        assert_eq!(StopReason::TimeLimit.to_string(), "time_limit");
    }
}

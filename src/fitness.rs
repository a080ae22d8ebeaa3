//! Fitness Evaluator
//!
//! Decodes chromosomes, consults the scoring oracle, aggregates the
//! composite quality score and memoizes the result by chromosome id. The
//! cache is keyed on genes only: identical verse triples always score
//! identically, whatever their generation or lineage.
//!
//! One evaluator belongs to one evolution run and is never shared.

use crate::chromosome::ChromosomeFactory;
use crate::oracle::ScoringOracle;
use crate::quality::{calculate_haiku_quality, RawMetrics};
use crate::telemetry;
use crate::types::{Chromosome, QualityMetrics};
use metrics::counter;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// How the final fitness is derived from the rule-based score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScoringMode {
    #[default]
    RuleBased,
    /// Weighted blend of the rule-based and neural scores
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringConfig {
    pub mode: ScoringMode,
    pub rule_weight: f64,
    pub neural_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            mode: ScoringMode::RuleBased,
            rule_weight: 0.6,
            neural_weight: 0.4,
        }
    }
}

/// Learned haiku scorer plugged into hybrid scoring
pub trait NeuralScorer {
    /// Score in [0, 1], or `None` when the model cannot score the text
    fn score(&self, haiku_text: &str) -> Option<f64>;
}

/// Evaluation counters for budget tracking
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvaluatorStats {
    pub evaluation_count: usize,
    pub cache_size: usize,
    pub cache_hit_rate: f64,
}

#[derive(Debug, Clone)]
struct CachedFitness {
    fitness: f64,
    metrics: QualityMetrics,
}

pub struct FitnessEvaluator<'a, O: ScoringOracle + ?Sized> {
    factory: ChromosomeFactory<'a>,
    oracle: &'a O,
    use_cache: bool,
    workers: usize,
    cache: HashMap<String, CachedFitness>,
    evaluation_count: usize,
    scoring: ScoringConfig,
    neural: Option<Box<dyn NeuralScorer + 'a>>,
}

impl<'a, O: ScoringOracle + ?Sized> FitnessEvaluator<'a, O> {
    pub fn new(factory: ChromosomeFactory<'a>, oracle: &'a O, use_cache: bool) -> Self {
        Self {
            factory,
            oracle,
            use_cache,
            workers: 1,
            cache: HashMap::new(),
            evaluation_count: 0,
            scoring: ScoringConfig::default(),
            neural: None,
        }
    }

    /// Score distinct uncached chromosomes on `workers` threads
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn set_neural_scorer(&mut self, scorer: Box<dyn NeuralScorer + 'a>) {
        self.neural = Some(scorer);
    }

    pub fn scoring_mode(&self) -> ScoringMode {
        self.scoring.mode
    }

    /// Replace the scoring blend. Cached fitness no longer applies, so the
    /// cache is cleared.
    pub fn set_scoring_config(&mut self, scoring: ScoringConfig) {
        self.scoring = scoring;
        self.clear_cache();
    }

    /// Populate `fitness` and `metrics`
    pub fn evaluate(&mut self, chromosome: &Chromosome) -> Chromosome {
        if let Some(scored) = self.from_cache(chromosome) {
            return scored;
        }
        let raw = self.raw_metrics(chromosome);
        self.finish(chromosome, &raw)
    }

    /// Evaluate only chromosomes that still need it; scored elites pass
    /// through untouched.
    pub fn evaluate_population(&mut self, chromosomes: Vec<Chromosome>) -> Vec<Chromosome> {
        if self.workers > 1 {
            self.prefetch_parallel(&chromosomes)
        } else {
            chromosomes
                .into_iter()
                .map(|c| {
                    if c.fitness == 0.0 {
                        self.evaluate(&c)
                    } else {
                        c
                    }
                })
                .collect()
        }
    }

    pub fn stats(&self) -> EvaluatorStats {
        let cache_size = self.cache.len();
        let hits = self.evaluation_count.saturating_sub(cache_size);
        EvaluatorStats {
            evaluation_count: self.evaluation_count,
            cache_size,
            cache_hit_rate: if self.evaluation_count > 0 {
                hits as f64 / self.evaluation_count as f64
            } else {
                0.0
            },
        }
    }

    pub fn evaluation_count(&self) -> usize {
        self.evaluation_count
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    fn from_cache(&self, chromosome: &Chromosome) -> Option<Chromosome> {
        if !self.use_cache {
            return None;
        }
        let cached = self.cache.get(&chromosome.id)?;
        counter!(telemetry::FITNESS_CACHE_HITS, 1);
        Some(Chromosome {
            fitness: cached.fitness,
            metrics: Some(cached.metrics.clone()),
            ..chromosome.clone()
        })
    }

    /// Oracle signals for one chromosome. Pure: no evaluator state changes.
    fn raw_metrics(&self, chromosome: &Chromosome) -> RawMetrics {
        raw_metrics_for(&self.factory, self.oracle, chromosome)
    }

    /// Aggregate, count, cache
    fn finish(&mut self, chromosome: &Chromosome, raw: &RawMetrics) -> Chromosome {
        let verses = self.factory.decode(chromosome);
        let metrics = calculate_haiku_quality(&verses, raw);
        let fitness = self.blend(&verses, metrics.total_score);

        self.evaluation_count += 1;
        counter!(telemetry::FITNESS_EVALUATIONS, 1);

        if self.use_cache {
            self.cache.insert(
                chromosome.id.clone(),
                CachedFitness {
                    fitness,
                    metrics: metrics.clone(),
                },
            );
        }

        Chromosome {
            fitness,
            metrics: Some(metrics),
            ..chromosome.clone()
        }
    }

    fn blend(&self, verses: &[String; 3], rule_score: f64) -> f64 {
        match self.scoring.mode {
            ScoringMode::RuleBased => rule_score,
            ScoringMode::Hybrid => {
                self.scoring.rule_weight * rule_score
                    + self.scoring.neural_weight * self.neural_score(verses)
            }
        }
    }

    /// Neural score rescaled from [0, 1] to the rule-based range [-5, 15]
    fn neural_score(&self, verses: &[String; 3]) -> f64 {
        self.neural
            .as_ref()
            .and_then(|scorer| scorer.score(&verses.join(" / ")))
            .map_or(0.0, |score| score * 20.0 - 5.0)
    }

    /// Oracle calls for the distinct uncached chromosomes run on scoped
    /// threads; aggregation, counting and caching happen afterwards in
    /// population order.
    fn prefetch_parallel(&mut self, chromosomes: &[Chromosome]) -> Vec<Chromosome> {
        let mut pending: Vec<&Chromosome> = Vec::new();
        let mut queued = HashSet::new();
        for c in chromosomes {
            let cached = self.use_cache && self.cache.contains_key(&c.id);
            if c.fitness == 0.0 && !cached && queued.insert(c.id.as_str()) {
                pending.push(c);
            }
        }

        let mut prefetched: HashMap<String, RawMetrics> = HashMap::with_capacity(pending.len());
        if !pending.is_empty() {
            let chunk_size = pending.len().div_ceil(self.workers);
            let factory = self.factory;
            let oracle = self.oracle;
            let results = crossbeam::thread::scope(|scope| {
                let handles: Vec<_> = pending
                    .chunks(chunk_size)
                    .map(|chunk| {
                        scope.spawn(move |_| {
                            chunk
                                .iter()
                                .map(|c| (c.id.clone(), raw_metrics_for(&factory, oracle, c)))
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .filter_map(|h| h.join().ok())
                    .flatten()
                    .collect::<Vec<_>>()
            });
            match results {
                Ok(results) => prefetched.extend(results),
                Err(_) => debug!("evaluation worker panicked, scoring sequentially"),
            }
        }

        chromosomes
            .iter()
            .map(|c| {
                if c.fitness != 0.0 {
                    return c.clone();
                }
                if let Some(scored) = self.from_cache(c) {
                    return scored;
                }
                let raw = match prefetched.remove(&c.id) {
                    Some(raw) => raw,
                    None => self.raw_metrics(c),
                };
                self.finish(c, &raw)
            })
            .collect()
    }
}

/// Neutral-low signals when any verse is empty or a gene is out of range;
/// the oracle is never called with malformed text.
fn raw_metrics_for<O: ScoringOracle + ?Sized>(
    factory: &ChromosomeFactory<'_>,
    oracle: &O,
    chromosome: &Chromosome,
) -> RawMetrics {
    let verses = factory.decode(chromosome);
    if verses.iter().any(|v| v.is_empty()) {
        return RawMetrics::neutral();
    }
    let Ok(indices) = factory.source_indices(chromosome) else {
        return RawMetrics::neutral();
    };
    let refs: [&str; 3] = [&verses[0], &verses[1], &verses[2]];
    let (five, seven) = factory.pool_sizes();

    let sentiment = refs.iter().map(|v| oracle.analyze_sentiment(v)).sum::<f64>() / 3.0;
    let grammar = refs
        .iter()
        .map(|v| oracle.analyze_grammar(v).score)
        .sum::<f64>()
        / 3.0;

    RawMetrics {
        sentiment,
        grammar,
        trigram_flow: oracle.evaluate_haiku_trigrams(&refs),
        markov_flow: oracle.evaluate_haiku(&refs),
        alliteration: oracle.analyze_phonetics(&refs).alliteration_score,
        verse_indices: Some(indices.to_vec()),
        total_quotes: Some(five + seven),
        pos_tags: Some(refs.iter().flat_map(|v| oracle.pos_tags(v)).collect()),
        embedding_coherence: None,
    }
}

//! Population Manager
//!
//! Owns one generation transition: elitism, selection, crossover, mutation,
//! evaluation of the genuinely new chromosomes, statistics and history.

use crate::chromosome::ChromosomeFactory;
use crate::config::EvolutionConfig;
use crate::fitness::FitnessEvaluator;
use crate::operators::{CrossoverOperator, MutationOperator, SelectionOperator};
use crate::oracle::ScoringOracle;
use crate::random::SeededRandom;
use crate::types::{Chromosome, GenerationSnapshot, Population, PopulationStatistics};
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

pub struct PopulationManager<'a, O: ScoringOracle + ?Sized> {
    config: &'a EvolutionConfig,
    factory: ChromosomeFactory<'a>,
    evaluator: FitnessEvaluator<'a, O>,
    selection: SelectionOperator,
    crossover: CrossoverOperator,
    mutation: MutationOperator,
}

impl<'a, O: ScoringOracle + ?Sized> PopulationManager<'a, O> {
    pub fn new(
        config: &'a EvolutionConfig,
        factory: ChromosomeFactory<'a>,
        evaluator: FitnessEvaluator<'a, O>,
    ) -> Self {
        Self {
            config,
            factory,
            evaluator,
            selection: SelectionOperator::from_config(config),
            crossover: CrossoverOperator::from_config(config),
            mutation: MutationOperator::from_config(config),
        }
    }

    pub fn factory(&self) -> &ChromosomeFactory<'a> {
        &self.factory
    }

    pub fn evaluator(&self) -> &FitnessEvaluator<'a, O> {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut FitnessEvaluator<'a, O> {
        &mut self.evaluator
    }

    /// Random generation 0, fully evaluated
    pub fn initialize(&mut self, rng: &mut SeededRandom) -> Population {
        let chromosomes: Vec<Chromosome> = (0..self.config.population_size)
            .map(|_| self.factory.create_random(rng, 0))
            .collect();
        let chromosomes = self.evaluator.evaluate_population(chromosomes);
        let statistics = calculate_statistics(&chromosomes, None);

        let history = if self.config.record_history {
            vec![snapshot(0, &statistics)]
        } else {
            Vec::new()
        };

        Population {
            chromosomes,
            generation: 0,
            statistics,
            history,
        }
    }

    /// Produce the next generation.
    ///
    /// Elites are cloned first with fitness kept; the rest is filled pairwise
    /// from selected parents. An odd remainder drops the second child of the
    /// last pair.
    pub fn evolve(&mut self, population: Population, rng: &mut SeededRandom) -> Population {
        let next_generation = population.generation + 1;
        let target = self.config.population_size;
        let mut next: Vec<Chromosome> = Vec::with_capacity(target);

        for elite in top_chromosomes(&population, self.config.elitism_count) {
            next.push(self.factory.clone_into_generation(&elite, next_generation));
        }

        while next.len() < target {
            let (Some(parent1), Some(parent2)) = (
                self.selection.select(&population.chromosomes, rng),
                self.selection.select(&population.chromosomes, rng),
            ) else {
                break;
            };

            let (child1, child2) =
                self.crossover
                    .crossover(&self.factory, parent1, parent2, next_generation, rng);
            let child1 = self.mutation.mutate(&self.factory, child1, rng);
            let child2 = self.mutation.mutate(&self.factory, child2, rng);

            next.push(child1);
            if next.len() < target {
                next.push(child2);
            }
        }

        let chromosomes = self.evaluator.evaluate_population(next);
        let statistics = calculate_statistics(&chromosomes, Some(&population.statistics));

        let mut history = population.history;
        if self.config.record_history {
            history.push(snapshot(next_generation, &statistics));
        } else {
            history.clear();
        }

        Population {
            chromosomes,
            generation: next_generation,
            statistics,
            history,
        }
    }

    /// Mean best-fitness change over the last `convergence_window` snapshots
    /// (the first counts as zero) below the threshold.
    ///
    /// Reads the history only: with history recording off this never
    /// reports convergence.
    pub fn has_converged(&self, population: &Population) -> bool {
        if !self.config.record_history {
            return false;
        }
        let window = self.config.convergence_window;
        if window == 0 || population.history.len() < window {
            return false;
        }
        let recent = &population.history[population.history.len() - window..];
        let total: f64 = recent
            .windows(2)
            .map(|pair| pair[1].best_fitness - pair[0].best_fitness)
            .sum();
        (total / window as f64).abs() < self.config.convergence_threshold
    }
}

/// Fitness-descending copy of the best `n`; ties keep population order
pub fn top_chromosomes(population: &Population, n: usize) -> Vec<Chromosome> {
    let mut sorted = population.chromosomes.clone();
    sorted.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
    sorted.truncate(n);
    sorted
}

/// Summary statistics. `improvement_rate` is the change in best fitness
/// since `previous`, 0 for the first generation.
pub fn calculate_statistics(
    chromosomes: &[Chromosome],
    previous: Option<&PopulationStatistics>,
) -> PopulationStatistics {
    if chromosomes.is_empty() {
        return PopulationStatistics::default();
    }
    let mut fitness: Vec<f64> = chromosomes.iter().map(|c| c.fitness).collect();
    fitness.sort_by(f64::total_cmp);

    let n = fitness.len() as f64;
    let average = fitness.iter().sum::<f64>() / n;
    let variance = fitness.iter().map(|f| (f - average).powi(2)).sum::<f64>() / n;
    let unique: HashSet<&str> = chromosomes.iter().map(|c| c.id.as_str()).collect();

    let best = fitness[fitness.len() - 1];
    PopulationStatistics {
        best_fitness: best,
        worst_fitness: fitness[0],
        average_fitness: average,
        median_fitness: fitness[fitness.len() / 2],
        standard_deviation: variance.sqrt(),
        diversity: unique.len() as f64 / n,
        improvement_rate: previous.map_or(0.0, |p| best - p.best_fitness),
    }
}

pub fn snapshot(generation: u32, statistics: &PopulationStatistics) -> GenerationSnapshot {
    GenerationSnapshot {
        generation,
        best_fitness: statistics.best_fitness,
        average_fitness: statistics.average_fitness,
        diversity: statistics.diversity,
        timestamp: now_millis(),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{GrammarAnalysis, PhoneticsAnalysis, PosTag};
    use crate::types::{chromosome_id, VerseCandidate, VersePools};

    /// Fitness follows the first verse's numeric suffix
    struct IndexOracle;

    impl ScoringOracle for IndexOracle {
        fn analyze_sentiment(&self, text: &str) -> f64 {
            let n: f64 = text
                .rsplit(' ')
                .next()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0.0);
            (n / 50.0).min(1.0)
        }
        fn analyze_grammar(&self, _text: &str) -> GrammarAnalysis {
            GrammarAnalysis::default()
        }
        fn analyze_phonetics(&self, _verses: &[&str]) -> PhoneticsAnalysis {
            PhoneticsAnalysis::default()
        }
        fn pos_tags(&self, _text: &str) -> Vec<PosTag> {
            Vec::new()
        }
        fn evaluate_haiku(&self, _verses: &[&str]) -> f64 {
            0.0
        }
        fn evaluate_haiku_trigrams(&self, _verses: &[&str]) -> f64 {
            0.0
        }
    }

    fn create_test_pools() -> VersePools {
        VersePools {
            five_syllable: (0..30)
                .map(|i| VerseCandidate::new(format!("verse {}", i), 5, i))
                .collect(),
            seven_syllable: (0..20)
                .map(|i| VerseCandidate::new(format!("longer verse {}", i), 7, i + 30))
                .collect(),
            ..Default::default()
        }
    }

    fn test_config() -> EvolutionConfig {
        EvolutionConfig {
            population_size: 21,
            elitism_count: 2,
            max_generations: 20,
            convergence_window: 3,
            seed: Some("population".to_string()),
            ..Default::default()
        }
    }

    fn chromosome(genes: [usize; 3], fitness: f64) -> Chromosome {
        Chromosome {
            id: chromosome_id(&genes),
            genes,
            fitness,
            metrics: None,
            generation: 0,
            parent_ids: None,
        }
    }

    #[test]
    fn test_initialize() {
        let pools = create_test_pools();
        let config = test_config();
        let factory = ChromosomeFactory::new(&pools);
        let evaluator = FitnessEvaluator::new(factory, &IndexOracle, true);
        let mut manager = PopulationManager::new(&config, factory, evaluator);
        let mut rng = SeededRandom::new(config.seed_str());

        let population = manager.initialize(&mut rng);
        assert_eq!(population.chromosomes.len(), 21);
        assert_eq!(population.generation, 0);
        assert_eq!(population.history.len(), 1);
        assert!(population.chromosomes.iter().all(|c| c.metrics.is_some()));
        assert!(population.statistics.best_fitness >= population.statistics.worst_fitness);
    }

    #[test]
    fn test_evolve_keeps_size_and_elites() {
        let pools = create_test_pools();
        let config = test_config();
        let factory = ChromosomeFactory::new(&pools);
        let evaluator = FitnessEvaluator::new(factory, &IndexOracle, true);
        let mut manager = PopulationManager::new(&config, factory, evaluator);
        let mut rng = SeededRandom::new(config.seed_str());

        let mut population = manager.initialize(&mut rng);
        for expected_generation in 1..=10 {
            let previous_best = population.statistics.best_fitness;
            let elites = top_chromosomes(&population, 2);
            population = manager.evolve(population, &mut rng);

            assert_eq!(population.generation, expected_generation);
            assert_eq!(population.chromosomes.len(), 21);
            assert!(population.statistics.best_fitness >= previous_best);
            for (elite, carried) in elites.iter().zip(&population.chromosomes) {
                assert_eq!(carried.id, elite.id);
                assert_eq!(carried.fitness, elite.fitness);
                assert_eq!(carried.generation, expected_generation);
                assert_eq!(
                    carried.parent_ids,
                    Some((elite.id.clone(), elite.id.clone()))
                );
            }
            assert!(population
                .chromosomes
                .iter()
                .all(|c| manager.factory().is_valid(c)));
        }
        assert_eq!(population.history.len(), 11);
    }

    #[test]
    fn test_history_disabled() {
        let pools = create_test_pools();
        let config = EvolutionConfig {
            record_history: false,
            ..test_config()
        };
        let factory = ChromosomeFactory::new(&pools);
        let evaluator = FitnessEvaluator::new(factory, &IndexOracle, true);
        let mut manager = PopulationManager::new(&config, factory, evaluator);
        let mut rng = SeededRandom::new(config.seed_str());

        let mut population = manager.initialize(&mut rng);
        for _ in 0..5 {
            population = manager.evolve(population, &mut rng);
        }
        assert!(population.history.is_empty());
        assert!(!manager.has_converged(&population));
    }

    #[test]
    fn test_convergence_window() {
        let pools = create_test_pools();
        let config = test_config();
        let factory = ChromosomeFactory::new(&pools);
        let evaluator = FitnessEvaluator::new(factory, &IndexOracle, true);
        let manager = PopulationManager::new(&config, factory, evaluator);

        let stats = |best: f64| PopulationStatistics {
            best_fitness: best,
            ..Default::default()
        };
        let mut population = Population::default();
        population.history.push(snapshot(0, &stats(1.0)));
        population.history.push(snapshot(1, &stats(1.0)));
        // Shorter than the window
        assert!(!manager.has_converged(&population));

        population.history.push(snapshot(2, &stats(1.0)));
        assert!(manager.has_converged(&population));

        population.history.push(snapshot(3, &stats(4.0)));
        assert!(!manager.has_converged(&population));
    }

    #[test]
    fn test_statistics() {
        let chromosomes = vec![
            chromosome([0, 0, 0], 1.0),
            chromosome([1, 0, 0], 3.0),
            chromosome([1, 0, 0], 3.0),
            chromosome([2, 0, 0], 5.0),
        ];
        let previous = PopulationStatistics {
            best_fitness: 4.0,
            ..Default::default()
        };
        let stats = calculate_statistics(&chromosomes, Some(&previous));
        assert_eq!(stats.best_fitness, 5.0);
        assert_eq!(stats.worst_fitness, 1.0);
        assert_eq!(stats.average_fitness, 3.0);
        assert_eq!(stats.median_fitness, 3.0);
        assert!((stats.standard_deviation - 2.0_f64.sqrt()).abs() < 1e-9);
        assert_eq!(stats.diversity, 0.75);
        assert_eq!(stats.improvement_rate, 1.0);

        assert_eq!(calculate_statistics(&[], None), PopulationStatistics::default());
    }

    #[test]
    fn test_top_chromosomes_order() {
        let population = Population {
            chromosomes: vec![
                chromosome([0, 0, 0], 2.0),
                chromosome([1, 0, 0], 9.0),
                chromosome([2, 0, 0], 5.0),
            ],
            ..Default::default()
        };
        let top = top_chromosomes(&population, 2);
        let fitness: Vec<f64> = top.iter().map(|c| c.fitness).collect();
        assert_eq!(fitness, vec![9.0, 5.0]);
        assert_eq!(top_chromosomes(&population, 10).len(), 3);
    }
}

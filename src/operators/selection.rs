//! Parent selection

use crate::config::{EvolutionConfig, SelectionMethod};
use crate::random::SeededRandom;
use crate::types::Chromosome;

#[derive(Debug, Clone, Copy)]
pub struct SelectionOperator {
    method: SelectionMethod,
    tournament_size: usize,
}

impl SelectionOperator {
    pub fn new(method: SelectionMethod, tournament_size: usize) -> Self {
        Self {
            method,
            tournament_size,
        }
    }

    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self::new(config.selection_method, config.tournament_size)
    }

    pub fn method(&self) -> SelectionMethod {
        self.method
    }

    /// Pick one parent. `None` only for an empty population.
    pub fn select<'p>(
        &self,
        chromosomes: &'p [Chromosome],
        rng: &mut SeededRandom,
    ) -> Option<&'p Chromosome> {
        match self.method {
            SelectionMethod::Tournament => self.tournament(chromosomes, rng),
            SelectionMethod::Roulette => roulette(chromosomes, rng),
            SelectionMethod::Rank => rank(chromosomes, rng),
        }
    }

    /// Best of `tournament_size` uniform draws with replacement. Ties keep
    /// the earliest draw.
    pub fn tournament<'p>(
        &self,
        chromosomes: &'p [Chromosome],
        rng: &mut SeededRandom,
    ) -> Option<&'p Chromosome> {
        let mut best: Option<&Chromosome> = None;
        for _ in 0..self.tournament_size {
            let candidate = chromosomes.get(rng.next_int(0, chromosomes.len()))?;
            if best.map_or(true, |b| candidate.fitness > b.fitness) {
                best = Some(candidate);
            }
        }
        best
    }
}

/// Fitness-proportional selection. Negative fitness is shifted so the
/// minimum becomes 1.
pub fn roulette<'p>(chromosomes: &'p [Chromosome], rng: &mut SeededRandom) -> Option<&'p Chromosome> {
    let min = chromosomes
        .iter()
        .map(|c| c.fitness)
        .fold(f64::INFINITY, f64::min);
    let shift = if min < 0.0 { min.abs() + 1.0 } else { 0.0 };
    let total: f64 = chromosomes.iter().map(|c| c.fitness + shift).sum();

    let threshold = rng.next() * total;
    let mut cumulative = 0.0;
    for chromosome in chromosomes {
        cumulative += chromosome.fitness + shift;
        if cumulative >= threshold {
            return Some(chromosome);
        }
    }
    chromosomes.last()
}

/// Rank-proportional selection: the worst has rank 1, the best rank n
pub fn rank<'p>(chromosomes: &'p [Chromosome], rng: &mut SeededRandom) -> Option<&'p Chromosome> {
    let mut sorted: Vec<&Chromosome> = chromosomes.iter().collect();
    sorted.sort_by(|a, b| a.fitness.total_cmp(&b.fitness));

    let n = sorted.len();
    let total_rank = (n * (n + 1)) as f64 / 2.0;
    let threshold = rng.next() * total_rank;
    let mut cumulative = 0.0;
    for (i, chromosome) in sorted.iter().enumerate() {
        cumulative += (i + 1) as f64;
        if cumulative >= threshold {
            return Some(chromosome);
        }
    }
    sorted.last().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chromosome_id;

    fn population(fitness: &[f64]) -> Vec<Chromosome> {
        fitness
            .iter()
            .enumerate()
            .map(|(i, &f)| {
                let genes = [i, 0, 0];
                Chromosome {
                    id: chromosome_id(&genes),
                    genes,
                    fitness: f,
                    metrics: None,
                    generation: 0,
                    parent_ids: None,
                }
            })
            .collect()
    }

    fn mean_selected(op: &SelectionOperator, pop: &[Chromosome], seed: &str, n: usize) -> f64 {
        let mut rng = SeededRandom::new(Some(seed));
        let total: f64 = (0..n)
            .map(|_| op.select(pop, &mut rng).map(|c| c.fitness).unwrap_or(0.0))
            .sum();
        total / n as f64
    }

    #[test]
    fn test_tournament_pressure() {
        let pop = population(&[1.0, 1.0, 1.0, 1.0, 100.0]);
        let op = SelectionOperator::new(SelectionMethod::Tournament, 3);
        assert!(mean_selected(&op, &pop, "tournament", 100) > 20.0);
    }

    #[test]
    fn test_tournament_draw_count() {
        let pop = population(&[1.0, 2.0, 3.0]);
        let op = SelectionOperator::new(SelectionMethod::Tournament, 7);
        let mut rng = SeededRandom::new(Some("draws"));
        op.select(&pop, &mut rng);
        assert_eq!(rng.call_count(), 7);
    }

    #[test]
    fn test_roulette_prefers_high_fitness() {
        let pop = population(&[1.0, 1.0, 1.0, 1.0, 100.0]);
        let op = SelectionOperator::new(SelectionMethod::Roulette, 0);
        assert!(mean_selected(&op, &pop, "roulette", 200) > 50.0);
    }

    #[test]
    fn test_roulette_handles_negative_fitness() {
        let pop = population(&[-10.0, -5.0, -1.0]);
        let mut rng = SeededRandom::new(Some("negative"));
        for _ in 0..100 {
            assert!(roulette(&pop, &mut rng).is_some());
        }
    }

    #[test]
    fn test_rank_ignores_magnitude() {
        // Rank selection picks the best with probability n / (n(n+1)/2)
        let pop = population(&[1.0, 2.0, 1_000_000.0]);
        let mut rng = SeededRandom::new(Some("rank"));
        let best_picks = (0..600)
            .filter(|_| rank(&pop, &mut rng).map(|c| c.fitness) == Some(1_000_000.0))
            .count();
        assert!((200..400).contains(&best_picks), "best picked {best_picks} times");
    }

    #[test]
    fn test_empty_population() {
        let mut rng = SeededRandom::new(Some("empty"));
        for method in [
            SelectionMethod::Tournament,
            SelectionMethod::Roulette,
            SelectionMethod::Rank,
        ] {
            let op = SelectionOperator::new(method, 3);
            assert!(op.select(&[], &mut rng).is_none());
        }
    }
}

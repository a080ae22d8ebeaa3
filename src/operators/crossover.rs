//! Gene recombination

use crate::chromosome::ChromosomeFactory;
use crate::config::{CrossoverMethod, EvolutionConfig};
use crate::random::SeededRandom;
use crate::types::{Chromosome, Genes};

#[derive(Debug, Clone, Copy)]
pub struct CrossoverOperator {
    method: CrossoverMethod,
    rate: f64,
}

impl CrossoverOperator {
    pub fn new(method: CrossoverMethod, rate: f64) -> Self {
        Self { method, rate }
    }

    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self::new(config.crossover_method, config.crossover_rate)
    }

    /// Recombine two parents into two children.
    ///
    /// With probability `1 - rate` both parents pass through as clones
    /// (fitness kept, no re-evaluation).
    pub fn crossover(
        &self,
        factory: &ChromosomeFactory<'_>,
        parent1: &Chromosome,
        parent2: &Chromosome,
        generation: u32,
        rng: &mut SeededRandom,
    ) -> (Chromosome, Chromosome) {
        if rng.next() > self.rate {
            return (
                factory.clone_into_generation(parent1, generation),
                factory.clone_into_generation(parent2, generation),
            );
        }
        match self.method {
            CrossoverMethod::SinglePoint => {
                let cut = rng.next_int(0, 3);
                single_point(factory, parent1, parent2, cut, generation)
            }
            CrossoverMethod::Uniform => uniform(factory, parent1, parent2, generation, rng),
        }
    }
}

fn children(
    factory: &ChromosomeFactory<'_>,
    parent1: &Chromosome,
    parent2: &Chromosome,
    genes: (Genes, Genes),
    generation: u32,
) -> (Chromosome, Chromosome) {
    (
        factory.create(
            genes.0,
            generation,
            Some((parent1.id.clone(), parent2.id.clone())),
        ),
        factory.create(
            genes.1,
            generation,
            Some((parent2.id.clone(), parent1.id.clone())),
        ),
    )
}

/// Swap every gene at or after `cut` between the two parents
pub fn single_point(
    factory: &ChromosomeFactory<'_>,
    parent1: &Chromosome,
    parent2: &Chromosome,
    cut: usize,
    generation: u32,
) -> (Chromosome, Chromosome) {
    let mut a = parent1.genes;
    let mut b = parent2.genes;
    for i in cut.min(3)..3 {
        std::mem::swap(&mut a[i], &mut b[i]);
    }
    children(factory, parent1, parent2, (a, b), generation)
}

/// A fair coin per gene decides which parent feeds which child; the two
/// children are complements.
pub fn uniform(
    factory: &ChromosomeFactory<'_>,
    parent1: &Chromosome,
    parent2: &Chromosome,
    generation: u32,
    rng: &mut SeededRandom,
) -> (Chromosome, Chromosome) {
    let mut a = [0; 3];
    let mut b = [0; 3];
    for i in 0..3 {
        if rng.next() < 0.5 {
            a[i] = parent1.genes[i];
            b[i] = parent2.genes[i];
        } else {
            a[i] = parent2.genes[i];
            b[i] = parent1.genes[i];
        }
    }
    children(factory, parent1, parent2, (a, b), generation)
}

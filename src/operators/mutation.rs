//! Gene perturbation

use crate::chromosome::{ChromosomeFactory, GenePool};
use crate::config::{EvolutionConfig, MutationMethod};
use crate::random::SeededRandom;
use crate::types::{chromosome_id, Chromosome, Genes};

#[derive(Debug, Clone, Copy)]
pub struct MutationOperator {
    method: MutationMethod,
    rate: f64,
}

impl MutationOperator {
    pub fn new(method: MutationMethod, rate: f64) -> Self {
        Self { method, rate }
    }

    pub fn from_config(config: &EvolutionConfig) -> Self {
        Self::new(config.mutation_method, config.mutation_rate)
    }

    /// Returns the input untouched when no gene changes, so scored
    /// chromosomes keep their fitness.
    pub fn mutate(
        &self,
        factory: &ChromosomeFactory<'_>,
        chromosome: Chromosome,
        rng: &mut SeededRandom,
    ) -> Chromosome {
        match self.method {
            MutationMethod::RandomReset => self.random_reset(factory, chromosome, rng),
            MutationMethod::Swap => self.swap(chromosome, rng),
        }
    }

    /// Each gene independently redrawn from its own pool with probability
    /// `rate`
    pub fn random_reset(
        &self,
        factory: &ChromosomeFactory<'_>,
        chromosome: Chromosome,
        rng: &mut SeededRandom,
    ) -> Chromosome {
        let mut genes = chromosome.genes;
        for (position, gene) in genes.iter_mut().enumerate() {
            if rng.next() < self.rate {
                *gene = rng.next_int(0, factory.pool_len(GenePool::for_position(position)));
            }
        }
        with_genes(chromosome, genes)
    }

    /// Exchange the two five-syllable genes with probability `rate`
    pub fn swap(&self, chromosome: Chromosome, rng: &mut SeededRandom) -> Chromosome {
        if rng.next() >= self.rate {
            return chromosome;
        }
        let [g0, g1, g2] = chromosome.genes;
        with_genes(chromosome, [g2, g1, g0])
    }
}

/// New genes get a new id and must be re-evaluated
fn with_genes(chromosome: Chromosome, genes: Genes) -> Chromosome {
    if genes == chromosome.genes {
        return chromosome;
    }
    Chromosome {
        id: chromosome_id(&genes),
        genes,
        fitness: 0.0,
        metrics: None,
        ..chromosome
    }
}

//! Chromosome codec
//!
//! Maps gene triples to verse text and back to canonical identifiers. Genes
//! 0 and 2 index the five-syllable pool, gene 1 the seven-syllable pool.

use crate::error::{HaikuForgeError, Result};
use crate::random::SeededRandom;
use crate::types::{chromosome_id, Chromosome, DecodedHaiku, Genes, VerseCandidate, VersePools};

/// Pool that a gene position indexes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenePool {
    FiveSyllable,
    SevenSyllable,
}

impl GenePool {
    pub fn for_position(position: usize) -> Self {
        if position == 1 {
            GenePool::SevenSyllable
        } else {
            GenePool::FiveSyllable
        }
    }
}

/// Builds, clones and decodes chromosomes over one set of verse pools
#[derive(Debug, Clone, Copy)]
pub struct ChromosomeFactory<'a> {
    pools: &'a VersePools,
}

impl<'a> ChromosomeFactory<'a> {
    pub fn new(pools: &'a VersePools) -> Self {
        Self { pools }
    }

    pub fn pools(&self) -> &'a VersePools {
        self.pools
    }

    /// Build a chromosome from explicit genes; it starts unevaluated
    pub fn create(
        &self,
        genes: Genes,
        generation: u32,
        parent_ids: Option<(String, String)>,
    ) -> Chromosome {
        Chromosome {
            id: chromosome_id(&genes),
            genes,
            fitness: 0.0,
            metrics: None,
            generation,
            parent_ids,
        }
    }

    /// Draw three random indices, one per verse slot
    pub fn create_random(&self, rng: &mut SeededRandom, generation: u32) -> Chromosome {
        let genes = [
            rng.next_int(0, self.pools.five_syllable.len()),
            rng.next_int(0, self.pools.seven_syllable.len()),
            rng.next_int(0, self.pools.five_syllable.len()),
        ];
        self.create(genes, generation, None)
    }

    /// Pass-through copy for the next generation. Fitness and metrics are
    /// kept; lineage points twice at the original.
    pub fn clone_into_generation(&self, chromosome: &Chromosome, generation: u32) -> Chromosome {
        Chromosome {
            generation,
            parent_ids: Some((chromosome.id.clone(), chromosome.id.clone())),
            ..chromosome.clone()
        }
    }

    /// Verse text for each slot. An out-of-range gene decodes to "".
    pub fn decode(&self, chromosome: &Chromosome) -> [String; 3] {
        let [g0, g1, g2] = chromosome.genes;
        [
            text_at(&self.pools.five_syllable, g0),
            text_at(&self.pools.seven_syllable, g1),
            text_at(&self.pools.five_syllable, g2),
        ]
    }

    /// Decode with metrics for the presentation layer
    pub fn decode_haiku(&self, chromosome: &Chromosome) -> DecodedHaiku {
        DecodedHaiku {
            verses: self.decode(chromosome),
            metrics: chromosome.metrics.clone().unwrap_or_default(),
            fitness: chromosome.fitness,
            chromosome_id: chromosome.id.clone(),
        }
    }

    /// Original extractor positions of the three verses
    pub fn source_indices(&self, chromosome: &Chromosome) -> Result<[usize; 3]> {
        let [g0, g1, g2] = chromosome.genes;
        let lookup = |pool: &[VerseCandidate], gene: usize| {
            pool.get(gene).map(|v| v.source_index).ok_or_else(|| {
                HaikuForgeError::InvalidChromosome(format!(
                    "gene {} out of bounds in chromosome {}",
                    gene, chromosome.id
                ))
            })
        };
        Ok([
            lookup(&self.pools.five_syllable, g0)?,
            lookup(&self.pools.seven_syllable, g1)?,
            lookup(&self.pools.five_syllable, g2)?,
        ])
    }

    /// Every gene lies within its pool
    pub fn is_valid(&self, chromosome: &Chromosome) -> bool {
        chromosome
            .genes
            .iter()
            .enumerate()
            .all(|(position, &gene)| gene < self.pool_len(GenePool::for_position(position)))
    }

    /// `(five_syllable, seven_syllable)` pool sizes
    pub fn pool_sizes(&self) -> (usize, usize) {
        (
            self.pools.five_syllable.len(),
            self.pools.seven_syllable.len(),
        )
    }

    pub fn pool_len(&self, pool: GenePool) -> usize {
        match pool {
            GenePool::FiveSyllable => self.pools.five_syllable.len(),
            GenePool::SevenSyllable => self.pools.seven_syllable.len(),
        }
    }
}

fn text_at(pool: &[VerseCandidate], gene: usize) -> String {
    pool.get(gene).map(|v| v.text.clone()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QualityMetrics;

    fn create_test_pools() -> VersePools {
        VersePools {
            five_syllable: (0..6)
                .map(|i| VerseCandidate::new(format!("five verse {}", i), 5, i * 10))
                .collect(),
            seven_syllable: (0..4)
                .map(|i| VerseCandidate::new(format!("seven verse {}", i), 7, i * 10 + 5))
                .collect(),
            book_id: "book".to_string(),
            chapter_id: "chapter".to_string(),
        }
    }

    #[test]
    fn test_create_sets_id_and_resets_fitness() {
        let pools = create_test_pools();
        let factory = ChromosomeFactory::new(&pools);
        let c = factory.create([1, 2, 3], 4, None);
        assert_eq!(c.id, "1-2-3");
        assert_eq!(c.fitness, 0.0);
        assert!(c.metrics.is_none());
        assert_eq!(c.generation, 4);
        assert!(c.needs_evaluation());
    }

    #[test]
    fn test_random_chromosomes_are_valid() {
        let pools = create_test_pools();
        let factory = ChromosomeFactory::new(&pools);
        let mut rng = SeededRandom::new(Some("codec"));
        for _ in 0..500 {
            let c = factory.create_random(&mut rng, 0);
            assert!(factory.is_valid(&c), "invalid genes {:?}", c.genes);
        }
    }

    #[test]
    fn test_is_valid_rejects_out_of_bounds() {
        let pools = create_test_pools();
        let factory = ChromosomeFactory::new(&pools);
        assert!(!factory.is_valid(&factory.create([6, 0, 0], 0, None)));
        assert!(!factory.is_valid(&factory.create([0, 4, 0], 0, None)));
        assert!(!factory.is_valid(&factory.create([0, 0, 6], 0, None)));
        // Gene 0 may exceed the seven-syllable pool but not its own
        assert!(factory.is_valid(&factory.create([5, 3, 5], 0, None)));
    }

    #[test]
    fn test_decode_and_source_indices() {
        let pools = create_test_pools();
        let factory = ChromosomeFactory::new(&pools);
        let c = factory.create([2, 1, 0], 0, None);
        assert_eq!(
            factory.decode(&c),
            [
                "five verse 2".to_string(),
                "seven verse 1".to_string(),
                "five verse 0".to_string()
            ]
        );
        assert_eq!(factory.source_indices(&c).unwrap(), [20, 15, 0]);
    }

    #[test]
    fn test_decode_out_of_range_is_empty() {
        let pools = create_test_pools();
        let factory = ChromosomeFactory::new(&pools);
        let c = factory.create([0, 9, 0], 0, None);
        assert!(factory.decode(&c)[1].is_empty());
        assert!(factory.source_indices(&c).is_err());
    }

    #[test]
    fn test_clone_preserves_fitness_and_marks_lineage() {
        let pools = create_test_pools();
        let factory = ChromosomeFactory::new(&pools);
        let mut c = factory.create([1, 1, 1], 2, None);
        c.fitness = 7.5;
        c.metrics = Some(QualityMetrics {
            total_score: 7.5,
            ..Default::default()
        });

        let clone = factory.clone_into_generation(&c, 3);
        assert_eq!(clone.id, c.id);
        assert_eq!(clone.fitness, 7.5);
        assert_eq!(clone.metrics, c.metrics);
        assert_eq!(clone.generation, 3);
        assert_eq!(
            clone.parent_ids,
            Some(("1-1-1".to_string(), "1-1-1".to_string()))
        );
    }

    #[test]
    fn test_pool_sizes() {
        let pools = create_test_pools();
        let factory = ChromosomeFactory::new(&pools);
        assert_eq!(factory.pool_sizes(), (6, 4));
        assert_eq!(factory.pool_len(GenePool::for_position(1)), 4);
    }
}

//! Seeded Random Source
//!
//! Every random decision of an evolution run (initial chromosomes, parent
//! selection, crossover points, mutations) draws from one `SeededRandom`.
//! Two instances built from the same seed and called in the same order
//! produce identical sequences. Tests and benchmarks must always pass a seed;
//! `None` draws the seed from OS entropy.

use rand::prelude::*;

/// FNV-1a over the seed string. Stable across platforms and releases.
fn hash_seed(seed: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    seed.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

fn build_rng(seed: Option<&str>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(hash_seed(s)),
        None => StdRng::from_entropy(),
    }
}

/// Deterministic random source for one evolution run
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
    call_count: u64,
}

impl SeededRandom {
    /// Create a source from an optional string seed
    pub fn new(seed: Option<&str>) -> Self {
        Self {
            rng: build_rng(seed),
            call_count: 0,
        }
    }

    /// Uniform float in [0, 1)
    pub fn next(&mut self) -> f64 {
        self.call_count += 1;
        self.rng.gen::<f64>()
    }

    /// Uniform integer in [min, max). Consumes exactly one draw.
    ///
    /// Returns `min` when the range is empty.
    pub fn next_int(&mut self, min: usize, max: usize) -> usize {
        let draw = self.next();
        if max <= min {
            return min;
        }
        let offset = (draw * (max - min) as f64).floor() as usize;
        min + offset.min(max - min - 1)
    }

    /// `true` with probability `p`
    pub fn next_bool(&mut self, p: f64) -> bool {
        self.next() < p
    }

    /// Fisher-Yates shuffle into a new vector
    pub fn shuffle<T: Clone>(&mut self, items: &[T]) -> Vec<T> {
        let mut result = items.to_vec();
        for i in (1..result.len()).rev() {
            let j = self.next_int(0, i + 1);
            result.swap(i, j);
        }
        result
    }

    /// `k` distinct elements (by position) in random order
    pub fn sample<T: Clone>(&mut self, items: &[T], k: usize) -> Vec<T> {
        let mut shuffled = self.shuffle(items);
        shuffled.truncate(k);
        shuffled
    }

    /// Number of `next()` draws since construction or the last reset
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Restart the sequence from a new seed
    pub fn reset(&mut self, seed: Option<&str>) {
        self.rng = build_rng(seed);
        self.call_count = 0;
    }
}

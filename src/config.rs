//! Evolution configuration
//!
//! Operator families are closed enums resolved once by the engine; the JSON
//! form uses the same tags as the GraphQL layer (`"tournament"`,
//! `"single_point"`, `"random_reset"`, ...).

use crate::error::{HaikuForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Parent selection strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    #[default]
    Tournament,
    Roulette,
    Rank,
}

/// Gene recombination strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMethod {
    #[default]
    SinglePoint,
    Uniform,
}

/// Gene perturbation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationMethod {
    #[default]
    RandomReset,
    Swap,
}

/// Configuration for the evolution process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvolutionConfig {
    /// Number of chromosomes in every generation
    pub population_size: usize,
    /// Best chromosomes carried forward unchanged
    pub elitism_count: usize,
    pub max_generations: u32,
    /// Minimum mean best-fitness delta over the window to keep going
    pub convergence_threshold: f64,
    /// Generations the convergence check looks back over
    pub convergence_window: usize,
    pub selection_method: SelectionMethod,
    pub tournament_size: usize,
    /// Probability of recombining a parent pair (0.0 - 1.0)
    pub crossover_rate: f64,
    pub crossover_method: CrossoverMethod,
    /// Per-gene mutation probability (0.0 - 1.0)
    pub mutation_rate: f64,
    pub mutation_method: MutationMethod,
    /// Random seed; tests and benchmarks must always set one
    pub seed: Option<String>,
    pub cache_evaluations: bool,
    /// Number of top candidates returned
    pub return_count: usize,
    /// Keep per-generation snapshots. Convergence detection reads them, so
    /// turning this off also turns convergence detection off.
    pub record_history: bool,
    /// Worker threads scoring new chromosomes of a generation
    pub evaluation_workers: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 150,
            elitism_count: 6,
            max_generations: 500,
            convergence_threshold: 0.005,
            convergence_window: 30,
            selection_method: SelectionMethod::Tournament,
            tournament_size: 7,
            crossover_rate: 0.9,
            crossover_method: CrossoverMethod::SinglePoint,
            mutation_rate: 0.12,
            mutation_method: MutationMethod::RandomReset,
            seed: None,
            cache_evaluations: true,
            return_count: 5,
            record_history: true,
            evaluation_workers: 1,
        }
    }
}

impl EvolutionConfig {
    /// Load a (possibly partial) JSON config over the defaults and validate it
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would build silently wrong populations
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(HaikuForgeError::Config(
                "population size must be positive".to_string(),
            ));
        }
        if self.elitism_count > self.population_size {
            return Err(HaikuForgeError::Config(format!(
                "elitism count {} exceeds population size {}",
                self.elitism_count, self.population_size
            )));
        }
        if self.tournament_size == 0 {
            return Err(HaikuForgeError::Config(
                "tournament size must be positive".to_string(),
            ));
        }
        check_rate("crossover rate", self.crossover_rate)?;
        check_rate("mutation rate", self.mutation_rate)?;
        if self.convergence_window == 0 {
            return Err(HaikuForgeError::Config(
                "convergence window must be positive".to_string(),
            ));
        }
        if !self.convergence_threshold.is_finite() || self.convergence_threshold < 0.0 {
            return Err(HaikuForgeError::Config(format!(
                "convergence threshold {} must be a non-negative number",
                self.convergence_threshold
            )));
        }
        if self.return_count == 0 {
            return Err(HaikuForgeError::Config(
                "return count must be positive".to_string(),
            ));
        }
        if self.evaluation_workers == 0 {
            return Err(HaikuForgeError::Config(
                "evaluation workers must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Seed as a borrowed string, for `SeededRandom::new`
    pub fn seed_str(&self) -> Option<&str> {
        self.seed.as_deref()
    }
}

fn check_rate(name: &str, rate: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&rate) {
        return Err(HaikuForgeError::Config(format!(
            "{} {} outside [0, 1]",
            name, rate
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evolution_config_default() {
        let config = EvolutionConfig::default();
        assert_eq!(config.population_size, 150);
        assert_eq!(config.elitism_count, 6);
        assert_eq!(config.max_generations, 500);
        assert_eq!(config.tournament_size, 7);
        assert_eq!(config.crossover_rate, 0.9);
        assert_eq!(config.mutation_rate, 0.12);
        assert_eq!(config.convergence_window, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_population_rejected() {
        let config = EvolutionConfig {
            population_size: 0,
            elitism_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HaikuForgeError::Config(_))));
    }

    #[test]
    fn test_elitism_larger_than_population_rejected() {
        let config = EvolutionConfig {
            population_size: 4,
            elitism_count: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        let config = EvolutionConfig {
            mutation_rate: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = EvolutionConfig {
            crossover_rate: -0.1,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_overlays_defaults() {
        let config = EvolutionConfig::from_json_str(
            r#"{"populationSize": 20, "selectionMethod": "rank", "mutationMethod": "swap", "seed": "abc"}"#,
        )
        .unwrap();
        assert_eq!(config.population_size, 20);
        assert_eq!(config.selection_method, SelectionMethod::Rank);
        assert_eq!(config.mutation_method, MutationMethod::Swap);
        assert_eq!(config.crossover_method, CrossoverMethod::SinglePoint);
        assert_eq!(config.seed_str(), Some("abc"));
        assert_eq!(config.max_generations, 500);
    }

    #[test]
    fn test_invalid_json_config_rejected() {
        let err = EvolutionConfig::from_json_str(r#"{"populationSize": 0}"#).unwrap_err();
        assert!(matches!(err, HaikuForgeError::Config(_)));

        let err = EvolutionConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, HaikuForgeError::Json(_)));
    }
}

//! Error Types for HaikuForge
//!
//! Expected conditions of an evolution run (small pools, exhausted budgets)
//! are reported through result fields, never through this type. Errors are
//! reserved for invalid configuration and unusable inputs.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for HaikuForge operations
#[derive(Debug, Clone, Error)]
pub enum HaikuForgeError {
    /// Invalid evolution configuration
    #[error("Configuration error: {0}")]
    Config(String),
    /// Chromosome genes outside their pool bounds
    #[error("Invalid chromosome: {0}")]
    InvalidChromosome(String),
    /// Scoring oracle unusable or returned malformed data
    #[error("Oracle error: {0}")]
    Oracle(String),
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(String),
    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(String),
}

/// Result type alias for HaikuForge operations
pub type Result<T> = std::result::Result<T, HaikuForgeError>;

impl From<std::io::Error> for HaikuForgeError {
    fn from(err: std::io::Error) -> Self {
        HaikuForgeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for HaikuForgeError {
    fn from(err: serde_json::Error) -> Self {
        HaikuForgeError::Json(err.to_string())
    }
}

/// Hard limits the evolution engine enforces on itself
#[derive(Debug, Clone)]
pub struct EngineLimits {
    /// Fitness evaluations before forced termination
    pub max_evaluations: usize,
    /// Wall-clock ceiling for one evolution run
    pub max_evolution_time: Duration,
    /// Smallest five-syllable pool worth evolving over
    pub min_five_syllable_pool: usize,
    /// Smallest seven-syllable pool worth evolving over
    pub min_seven_syllable_pool: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_evaluations: 50_000,
            max_evolution_time: Duration::from_secs(30),
            min_five_syllable_pool: 5,
            min_seven_syllable_pool: 4,
        }
    }
}

impl EngineLimits {
    /// Limits for quick interactive runs
    pub fn interactive() -> Self {
        Self {
            max_evaluations: 10_000,
            max_evolution_time: Duration::from_secs(5),
            ..Self::default()
        }
    }

    /// Check whether both pools are large enough for population dynamics
    pub fn pools_viable(&self, five_count: usize, seven_count: usize) -> bool {
        five_count >= self.min_five_syllable_pool && seven_count >= self.min_seven_syllable_pool
    }

    /// Check whether the evaluation budget is spent
    pub fn evaluations_exhausted(&self, evaluations: usize) -> bool {
        evaluations >= self.max_evaluations
    }

    /// Check whether the time budget is spent
    pub fn time_exhausted(&self, elapsed: Duration) -> bool {
        elapsed >= self.max_evolution_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HaikuForgeError::Config("population size must be positive".to_string());
        assert!(err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "pools.json");
        let err: HaikuForgeError = io.into();
        assert!(matches!(err, HaikuForgeError::Io(_)));
    }

    #[test]
    fn test_limits_default() {
        let limits = EngineLimits::default();
        assert!(limits.pools_viable(5, 4));
        assert!(!limits.pools_viable(3, 2));
        assert!(!limits.pools_viable(5, 3));
        assert!(limits.evaluations_exhausted(50_000));
        assert!(!limits.evaluations_exhausted(49_999));
    }

    #[test]
    fn test_limits_interactive() {
        let limits = EngineLimits::interactive();
        assert!(limits.time_exhausted(Duration::from_secs(5)));
        assert!(!limits.time_exhausted(Duration::from_secs(4)));
    }
}

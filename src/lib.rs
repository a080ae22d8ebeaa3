//! HaikuForge: evolutionary haiku selection
//!
//! Picks a five/seven/five haiku from verse pools extracted from a book
//! chapter. A genetic algorithm searches the pool index space, scoring each
//! triple with a composite quality function fed by a pluggable scoring
//! oracle. A sequential quote-validation gate offers the non-evolutionary
//! path over the same scoring primitives.

pub mod chromosome;
pub mod config;
pub mod error;
pub mod evolution;
pub mod fitness;
pub mod lexicon;
pub mod operators;
pub mod oracle;
pub mod population;
pub mod quality;
pub mod random;
pub mod telemetry;
pub mod types;
pub mod validator;

pub use chromosome::ChromosomeFactory;
pub use config::{CrossoverMethod, EvolutionConfig, MutationMethod, SelectionMethod};
pub use error::{EngineLimits, HaikuForgeError, Result};
pub use evolution::{EvolutionEngine, EvolutionRun};
pub use fitness::{FitnessEvaluator, ScoringConfig, ScoringMode};
pub use oracle::{HeuristicOracle, ScoringOracle};
pub use random::SeededRandom;
pub use types::{
    Chromosome, DecodedHaiku, EvolutionProgress, EvolutionResult, Population, StopReason,
    VerseCandidate, VersePools,
};
pub use validator::{HaikuValidator, QuoteCandidate, ScoreThresholds};

//! Genetic operators
//!
//! Each family is a closed set of strategies picked once from the
//! configuration. All randomness comes from the run's `SeededRandom`.

pub mod crossover;
pub mod mutation;
pub mod selection;

pub use crossover::CrossoverOperator;
pub use mutation::MutationOperator;
pub use selection::SelectionOperator;

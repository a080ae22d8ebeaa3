//! Logging and metrics setup shared by the binaries.
//!
//! Library code only emits `tracing` events and `metrics` samples; without
//! an installed subscriber or recorder both are no-ops.

use crate::error::{HaikuForgeError, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{fmt, EnvFilter};

pub const FITNESS_EVALUATIONS: &str = "haikuforge_fitness_evaluations_total";
pub const FITNESS_CACHE_HITS: &str = "haikuforge_fitness_cache_hits_total";
pub const GENERATIONS: &str = "haikuforge_generations_total";
pub const BEST_FITNESS: &str = "haikuforge_best_fitness";
pub const EVOLUTION_DURATION_MS: &str = "haikuforge_evolution_duration_ms";
pub const FALLBACK_RUNS: &str = "haikuforge_fallback_runs_total";

/// Install the global fmt subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (tests, embedding) keeps the first subscriber
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}

/// Install the Prometheus recorder and return the handle used to render it
pub fn install_prometheus() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| HaikuForgeError::Config(format!("metrics recorder: {}", e)))
}

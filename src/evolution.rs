//! Genetic Algorithm Evolution Engine
//!
//! Top-level driver. Each run moves through
//! `Validating -> {Fallback | Evolving} -> Finalizing`:
//!
//! - pools below the minimum sizes skip evolution and return randomly
//!   sampled candidates,
//! - otherwise a population is initialized and evolved until it converges,
//!   exhausts the evaluation or time budget, or reaches `max_generations`,
//! - the best `return_count` chromosomes are decoded into the result.
//!
//! Small pools and exhausted budgets are reported through result fields,
//! never as errors. Every run builds its own random source, codec, evaluator
//! and operators, so concurrent runs share nothing but the oracle.

use crate::chromosome::ChromosomeFactory;
use crate::config::EvolutionConfig;
use crate::error::{EngineLimits, Result};
use crate::fitness::FitnessEvaluator;
use crate::oracle::ScoringOracle;
use crate::population::{top_chromosomes, PopulationManager};
use crate::random::SeededRandom;
use crate::telemetry;
use crate::types::{
    DecodedHaiku, EvolutionProgress, EvolutionResult, Population, PopulationStatistics,
    StopReason, VersePools,
};
use metrics::{counter, gauge, histogram};
use std::time::Instant;
use tracing::{debug, info, warn};

/// The main evolution engine
pub struct EvolutionEngine<O: ScoringOracle> {
    config: EvolutionConfig,
    limits: EngineLimits,
    oracle: O,
}

impl<O: ScoringOracle> EvolutionEngine<O> {
    /// Validate the configuration and build an engine with default limits
    pub fn new(config: EvolutionConfig, oracle: O) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            limits: EngineLimits::default(),
            oracle,
        })
    }

    /// Replace the evaluation/time budgets and minimum pool sizes
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Run to completion and return the best candidates
    pub fn evolve(&self, pools: &VersePools) -> EvolutionResult {
        let started = Instant::now();
        if !self.pools_viable(pools) {
            return self.fallback(pools, started);
        }

        let mut run = self.start(pools, started);
        let max_generations = self.config.max_generations;
        for generation in 0..max_generations {
            if let Some(reason) = run.stop_reason(&self.limits) {
                self.log_stop(reason, &run, generation);
                run.convergence_generation = generation;
                break;
            }

            run.advance();

            if generation % 5 == 0 || generation + 1 == max_generations {
                let stats = &run.population.statistics;
                debug!(
                    "Generation {} complete: best={:.2} avg={:.2} diversity={:.2}",
                    generation, stats.best_fitness, stats.average_fitness, stats.diversity
                );
            }
        }

        self.finalize(run, "GA evolution complete")
    }

    /// Streaming variant: yields one progress record per generation.
    ///
    /// The run advances lazily on each `next()`; dropping it abandons the run
    /// and `finish()` returns the result of whatever state it reached.
    pub fn evolve_with_progress<'a>(&'a self, pools: &'a VersePools) -> EvolutionRun<'a, O> {
        let started = Instant::now();
        let stage = if self.pools_viable(pools) {
            Stage::Evolving {
                run: Box::new(self.start(pools, started)),
                generation: 0,
                pending_advance: false,
                complete: false,
            }
        } else {
            Stage::Fallback {
                result: Box::new(self.fallback(pools, started)),
                yielded: false,
            }
        };
        EvolutionRun {
            engine: self,
            stage,
        }
    }

    fn pools_viable(&self, pools: &VersePools) -> bool {
        let viable = self
            .limits
            .pools_viable(pools.five_syllable.len(), pools.seven_syllable.len());
        if !viable {
            warn!(
                "Pools too small for GA ({} five-syllable, {} seven-syllable), falling back to random sampling",
                pools.five_syllable.len(),
                pools.seven_syllable.len()
            );
        }
        viable
    }

    fn start<'a>(&'a self, pools: &'a VersePools, started: Instant) -> RunState<'a, O> {
        let factory = ChromosomeFactory::new(pools);
        let evaluator = FitnessEvaluator::new(factory, &self.oracle, self.config.cache_evaluations)
            .with_workers(self.config.evaluation_workers);
        let mut manager = PopulationManager::new(&self.config, factory, evaluator);
        let mut rng = SeededRandom::new(self.config.seed_str());

        debug!(
            "Initializing GA population of {} over pools of {} five-syllable and {} seven-syllable verses",
            self.config.population_size,
            pools.five_syllable.len(),
            pools.seven_syllable.len()
        );
        let population = manager.initialize(&mut rng);

        RunState {
            manager,
            rng,
            population,
            convergence_generation: self.config.max_generations,
            started,
        }
    }

    fn log_stop(&self, reason: StopReason, run: &RunState<'_, O>, generation: u32) {
        match reason {
            StopReason::Converged => debug!("Population converged at generation {}", generation),
            StopReason::MaxEvaluations => warn!(
                "Max evaluations reached: {}",
                run.manager.evaluator().evaluation_count()
            ),
            StopReason::TimeLimit => warn!(
                "Time limit reached after {} ms",
                run.started.elapsed().as_millis()
            ),
            StopReason::Completed => {}
        }
    }

    fn finalize(&self, run: RunState<'_, O>, label: &str) -> EvolutionResult {
        let factory = *run.manager.factory();
        let top_candidates: Vec<DecodedHaiku> =
            top_chromosomes(&run.population, self.config.return_count)
                .iter()
                .map(|c| factory.decode_haiku(c))
                .collect();

        let stats = run.manager.evaluator().stats();
        let execution_time_ms = run.started.elapsed().as_millis() as u64;

        gauge!(telemetry::BEST_FITNESS, run.population.statistics.best_fitness);
        histogram!(telemetry::EVOLUTION_DURATION_MS, execution_time_ms as f64);
        info!(
            "{}: generations={} convergence_generation={} best={:.2} evaluations={} cache_hit_rate={:.2} time={}ms",
            label,
            run.population.generation,
            run.convergence_generation,
            run.population.statistics.best_fitness,
            stats.evaluation_count,
            stats.cache_hit_rate,
            execution_time_ms
        );

        EvolutionResult {
            top_candidates,
            final_population: run.population,
            convergence_generation: run.convergence_generation,
            total_evaluations: stats.evaluation_count,
            execution_time_ms,
        }
    }

    /// Independent random chromosomes scored without the cache. The
    /// candidates carry `fallback-<i>` ids in sampling order.
    fn fallback(&self, pools: &VersePools, started: Instant) -> EvolutionResult {
        counter!(telemetry::FALLBACK_RUNS, 1);
        let factory = ChromosomeFactory::new(pools);
        let mut evaluator = FitnessEvaluator::new(factory, &self.oracle, false);
        let mut rng = SeededRandom::new(self.config.seed_str());

        let mut candidates: Vec<DecodedHaiku> = (0..self.config.return_count)
            .map(|i| {
                let chromosome = factory.create_random(&mut rng, 0);
                let evaluated = evaluator.evaluate(&chromosome);
                DecodedHaiku {
                    chromosome_id: format!("fallback-{}", i),
                    ..factory.decode_haiku(&evaluated)
                }
            })
            .collect();
        candidates.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        let count = candidates.len();
        let statistics = PopulationStatistics {
            best_fitness: candidates.first().map_or(0.0, |c| c.fitness),
            worst_fitness: candidates.last().map_or(0.0, |c| c.fitness),
            average_fitness: if count > 0 {
                candidates.iter().map(|c| c.fitness).sum::<f64>() / count as f64
            } else {
                0.0
            },
            median_fitness: candidates.get(count / 2).map_or(0.0, |c| c.fitness),
            standard_deviation: 0.0,
            diversity: 1.0,
            improvement_rate: 0.0,
        };

        EvolutionResult {
            top_candidates: candidates,
            final_population: Population {
                chromosomes: Vec::new(),
                generation: 0,
                statistics,
                history: Vec::new(),
            },
            convergence_generation: 0,
            total_evaluations: self.config.return_count,
            execution_time_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Mutable state of one evolving run
struct RunState<'a, O: ScoringOracle> {
    manager: PopulationManager<'a, O>,
    rng: SeededRandom,
    population: Population,
    convergence_generation: u32,
    started: Instant,
}

impl<O: ScoringOracle> RunState<'_, O> {
    /// Stop checks in priority order: convergence, evaluations, time
    fn stop_reason(&self, limits: &EngineLimits) -> Option<StopReason> {
        if self.manager.has_converged(&self.population) {
            Some(StopReason::Converged)
        } else if limits.evaluations_exhausted(self.manager.evaluator().evaluation_count()) {
            Some(StopReason::MaxEvaluations)
        } else if limits.time_exhausted(self.started.elapsed()) {
            Some(StopReason::TimeLimit)
        } else {
            None
        }
    }

    fn advance(&mut self) {
        let population = std::mem::take(&mut self.population);
        self.population = self.manager.evolve(population, &mut self.rng);
        counter!(telemetry::GENERATIONS, 1);
    }

    fn best_haiku(&self) -> Option<DecodedHaiku> {
        top_chromosomes(&self.population, 1)
            .first()
            .map(|c| self.manager.factory().decode_haiku(c))
    }
}

enum Stage<'a, O: ScoringOracle> {
    Fallback {
        result: Box<EvolutionResult>,
        yielded: bool,
    },
    Evolving {
        run: Box<RunState<'a, O>>,
        generation: u32,
        pending_advance: bool,
        complete: bool,
    },
}

/// An in-progress streaming run
pub struct EvolutionRun<'a, O: ScoringOracle> {
    engine: &'a EvolutionEngine<O>,
    stage: Stage<'a, O>,
}

impl<'a, O: ScoringOracle> EvolutionRun<'a, O> {
    /// Result for the state reached so far
    pub fn finish(self) -> EvolutionResult {
        match self.stage {
            Stage::Fallback { result, .. } => *result,
            Stage::Evolving { run, .. } => self
                .engine
                .finalize(*run, "Progressive GA evolution complete"),
        }
    }
}

impl<'a, O: ScoringOracle> Iterator for EvolutionRun<'a, O> {
    type Item = EvolutionProgress;

    fn next(&mut self) -> Option<EvolutionProgress> {
        let engine = self.engine;
        match &mut self.stage {
            Stage::Fallback { result, yielded } => {
                if *yielded {
                    return None;
                }
                *yielded = true;
                let best = result.top_candidates.first()?.clone();
                Some(EvolutionProgress {
                    generation: 1,
                    max_generations: 1,
                    best_fitness: best.fitness,
                    average_fitness: best.fitness,
                    best_haiku: best,
                    diversity: 1.0,
                    is_complete: true,
                    stop_reason: None,
                })
            }
            Stage::Evolving {
                run,
                generation,
                pending_advance,
                complete,
            } => {
                let max_generations = engine.config.max_generations;
                if *complete || *generation >= max_generations {
                    return None;
                }
                if *pending_advance {
                    run.advance();
                    *pending_advance = false;
                }

                let stop = run.stop_reason(&engine.limits);
                if let Some(reason) = stop {
                    engine.log_stop(reason, run, *generation);
                    run.convergence_generation = *generation;
                }
                let is_last = *generation + 1 >= max_generations;
                let stop_reason = stop.or(is_last.then_some(StopReason::Completed));
                let is_complete = stop_reason.is_some();

                let best_haiku = run.best_haiku()?;
                let stats = &run.population.statistics;
                let progress = EvolutionProgress {
                    generation: *generation + 1,
                    max_generations,
                    best_haiku,
                    best_fitness: stats.best_fitness,
                    average_fitness: stats.average_fitness,
                    diversity: stats.diversity,
                    is_complete,
                    stop_reason,
                };

                if is_complete {
                    *complete = true;
                } else {
                    *pending_advance = true;
                    *generation += 1;
                }
                Some(progress)
            }
        }
    }
}

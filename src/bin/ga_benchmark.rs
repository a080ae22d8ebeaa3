//! GA vs random sampling on the same verse pools and evaluation budget.

use clap::Parser;
use haikuforge::error::Result;
use haikuforge::telemetry;
use haikuforge::{
    ChromosomeFactory, EvolutionConfig, EvolutionEngine, FitnessEvaluator, HeuristicOracle,
    SeededRandom, VersePools,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Benchmark the GA against random sampling", long_about = None)]
struct Args {
    /// JSON file with the verse pools
    #[arg(long)]
    pools: PathBuf,

    /// Seeded runs per method
    #[arg(short = 'n', long, default_value_t = 10)]
    iterations: usize,

    #[arg(short, long, default_value_t = 50)]
    population: usize,

    #[arg(short, long, default_value_t = 30)]
    generations: u32,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default)]
struct Summary {
    best: Vec<f64>,
    evaluations: Vec<usize>,
    millis: Vec<u64>,
}

impl Summary {
    fn record(&mut self, best: f64, evaluations: usize, millis: u64) {
        self.best.push(best);
        self.evaluations.push(evaluations);
        self.millis.push(millis);
    }

    fn report(&self, label: &str) {
        let n = self.best.len().max(1) as f64;
        let mean = self.best.iter().sum::<f64>() / n;
        let min = self.best.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.best.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let evaluations = self.evaluations.iter().sum::<usize>() as f64 / n;
        let millis = self.millis.iter().sum::<u64>() as f64 / n;
        println!(
            "{:<8} best mean={:.3} min={:.3} max={:.3} | evaluations={:.0} | time={:.1} ms",
            label, mean, min, max, evaluations, millis
        );
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    telemetry::init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let text = std::fs::read_to_string(&args.pools)?;
    let pools: VersePools = serde_json::from_str(&text)?;
    let oracle = HeuristicOracle::from_pools(&pools);
    let budget = args.population.max(1) * args.generations.max(1) as usize;

    info!(
        "Benchmarking {} iterations over a search space of {} (budget {} evaluations)",
        args.iterations,
        pools.search_space(),
        budget
    );

    let mut ga = Summary::default();
    let mut random = Summary::default();
    let mut ga_wins = 0;

    for i in 0..args.iterations {
        let seed = format!("bench-{}", i);
        let config = EvolutionConfig {
            population_size: args.population.max(1),
            elitism_count: EvolutionConfig::default()
                .elitism_count
                .min(args.population.max(1)),
            max_generations: args.generations,
            seed: Some(seed.clone()),
            ..Default::default()
        };

        let engine = EvolutionEngine::new(config, &oracle)?;
        let result = engine.evolve(&pools);
        let ga_best = result.top_candidates.first().map_or(0.0, |c| c.fitness);
        ga.record(ga_best, result.total_evaluations, result.execution_time_ms);

        let started = Instant::now();
        let random_best = random_search(&pools, &oracle, &seed, budget);
        random.record(random_best, budget, started.elapsed().as_millis() as u64);

        if ga_best > random_best {
            ga_wins += 1;
        }
        info!(
            "Iteration {}: ga={:.3} random={:.3}",
            i + 1,
            ga_best,
            random_best
        );
    }

    ga.report("GA");
    random.report("Random");
    println!("GA won {}/{} iterations", ga_wins, args.iterations);
    Ok(())
}

/// Best fitness of `budget` independent random chromosomes
fn random_search(pools: &VersePools, oracle: &HeuristicOracle, seed: &str, budget: usize) -> f64 {
    let factory = ChromosomeFactory::new(pools);
    let mut evaluator = FitnessEvaluator::new(factory, oracle, false);
    let mut rng = SeededRandom::new(Some(seed));
    (0..budget)
        .map(|_| {
            let chromosome = factory.create_random(&mut rng, 0);
            evaluator.evaluate(&chromosome).fitness
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

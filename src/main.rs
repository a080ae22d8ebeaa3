use clap::Parser;
use haikuforge::error::{HaikuForgeError, Result};
use haikuforge::telemetry;
use haikuforge::{EvolutionConfig, EvolutionEngine, EvolutionResult, HeuristicOracle, VersePools};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Evolve a haiku from extracted verse pools", long_about = None)]
struct Args {
    /// JSON file with the five- and seven-syllable verse pools
    #[arg(long)]
    pools: PathBuf,

    /// JSON evolution config, overlaid on the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Population size (at least 10)
    #[arg(short, long)]
    population: Option<usize>,

    /// Maximum generations (at least 5)
    #[arg(short, long)]
    generations: Option<u32>,

    /// Crossover rate, clamped to [0, 1]
    #[arg(short, long)]
    crossover: Option<f64>,

    /// Mutation rate, clamped to [0, 1]
    #[arg(short, long)]
    mutation: Option<f64>,

    /// Seed for reproducible runs
    #[arg(short, long)]
    seed: Option<String>,

    /// Run every generation (disables convergence detection)
    #[arg(long)]
    no_early_stop: bool,

    /// Log progress after each generation
    #[arg(long)]
    progress: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Print Prometheus metrics after the run
    #[arg(long)]
    metrics: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
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
    let prometheus = if args.metrics {
        Some(telemetry::install_prometheus()?)
    } else {
        None
    };

    let config = build_config(args)?;
    let pools = load_pools(args)?;
    info!(
        "Loaded {} five-syllable and {} seven-syllable verses (search space {})",
        pools.five_syllable.len(),
        pools.seven_syllable.len(),
        pools.search_space()
    );

    let oracle = HeuristicOracle::from_pools(&pools);
    let engine = EvolutionEngine::new(config, oracle)?;

    let result = if args.progress {
        let mut run = engine.evolve_with_progress(&pools);
        for progress in run.by_ref() {
            info!(
                "Generation {}/{}: best={:.2} avg={:.2} diversity={:.2}{}",
                progress.generation,
                progress.max_generations,
                progress.best_fitness,
                progress.average_fitness,
                progress.diversity,
                progress
                    .stop_reason
                    .map(|r| format!(" ({})", r))
                    .unwrap_or_default()
            );
        }
        run.finish()
    } else {
        engine.evolve(&pools)
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_haikus(&result);
    }

    if let Some(handle) = prometheus {
        println!("{}", handle.render());
    }
    Ok(())
}

fn build_config(args: &Args) -> Result<EvolutionConfig> {
    let mut config = match &args.config {
        Some(path) => EvolutionConfig::from_json_file(path)?,
        None => EvolutionConfig::default(),
    };
    if let Some(population) = args.population {
        config.population_size = population.max(10);
        config.elitism_count = config.elitism_count.min(config.population_size);
    }
    if let Some(generations) = args.generations {
        config.max_generations = generations.max(5);
    }
    if let Some(rate) = args.crossover {
        config.crossover_rate = rate.clamp(0.0, 1.0);
    }
    if let Some(rate) = args.mutation {
        config.mutation_rate = rate.clamp(0.0, 1.0);
    }
    if args.seed.is_some() {
        config.seed = args.seed.clone();
    }
    if args.no_early_stop {
        config.record_history = false;
    }
    Ok(config)
}

fn load_pools(args: &Args) -> Result<VersePools> {
    let text = std::fs::read_to_string(&args.pools)?;
    let pools: VersePools = serde_json::from_str(&text)?;
    if pools.five_syllable.is_empty() && pools.seven_syllable.is_empty() {
        return Err(HaikuForgeError::Oracle(format!(
            "{} holds no verses to train on",
            args.pools.display()
        )));
    }
    Ok(pools)
}

fn print_haikus(result: &EvolutionResult) {
    println!(
        "Best haikus after {} generations ({} evaluations, {} ms):",
        result.convergence_generation, result.total_evaluations, result.execution_time_ms
    );
    for (rank, haiku) in result.top_candidates.iter().enumerate() {
        println!();
        println!("#{} fitness {:.2} [{}]", rank + 1, haiku.fitness, haiku.chromosome_id);
        for verse in &haiku.verses {
            println!("    {}", verse);
        }
    }
}

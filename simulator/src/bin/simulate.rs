use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info};

use emasim::config::ExperimentConfig;
use emasim::env_config;
use emasim::statistics::{save_summary, summarize};

#[derive(Parser, Debug)]
#[command(name = "ema-simulate")]
#[command(about = "Generate a synthetic EMA data set from a JSON experiment config")]
struct Cli {
    /// Experiment configuration (JSON)
    #[arg(long)]
    config: PathBuf,

    /// Directory for dataset.json and summary.json
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// RNG seed (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Min records per stage, inclusive (overrides the config)
    #[arg(long)]
    min_count: Option<usize>,

    /// Max records per stage, exclusive (overrides the config)
    #[arg(long)]
    max_count: Option<usize>,

    /// One independent generator per subject, subjects run on the rayon pool
    #[arg(long)]
    parallel: bool,
}

fn run(cli: &Cli) -> emasim::Result<()> {
    let cfg = ExperimentConfig::load(&cli.config)?;
    let seed = cli.seed.unwrap_or(cfg.seed);
    let min_count = cli.min_count.unwrap_or(cfg.min_count);
    let max_count = cli.max_count.unwrap_or(cfg.max_count);
    info!(config = %cli.config.display(), seed, min_count, max_count, "loaded config");

    let t0 = Instant::now();
    let mut rng = SmallRng::seed_from_u64(seed);
    let experiment = cfg.build_experiment(&mut rng)?;

    let ds = if cli.parallel {
        let threads = env_config::init_rayon_threads();
        info!(threads, "parallel generation");
        let par_seed: u64 = rng.random();
        experiment.generate_dataset_par(min_count, max_count, par_seed)?
    } else {
        experiment.generate_dataset(min_count, max_count, &mut rng)?
    };

    ds.save_json(cli.output.join("dataset.json"))?;
    let summary = summarize(&ds);
    save_summary(&summary, cli.output.join("summary.json"))?;

    for g in &summary.groups {
        println!(
            "{:<16} {:>5} subjects {:>8} records  ({}..{} per subject, mean {:.1})",
            g.id,
            g.n_subjects,
            g.n_records,
            g.records_per_subject.min,
            g.records_per_subject.max,
            g.records_per_subject.mean
        );
    }
    println!(
        "Wrote {} records to {} in {:.2}s",
        summary.n_records,
        cli.output.display(),
        t0.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() -> ExitCode {
    env_config::init_logging();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use tsp_anneal::anneal::{AnnealingConfig, AnnealingEngine};
use tsp_anneal::dataset::ProblemInput;
use tsp_anneal::{logging, output, Result};

/// Approximate a Euclidean TSP tour by simulated annealing.
///
/// Reads `n`, then `n` lines of `index x y`, then a time budget in seconds.
/// Prints the tour length followed by the vertex order starting at vertex 1.
#[derive(Debug, Parser)]
#[command(name = "tsp-anneal", version)]
struct Cli {
    /// Problem file; standard input when omitted.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    initial_temperature: Option<f64>,

    #[arg(long)]
    min_temperature: Option<f64>,

    /// Per-iteration multiplicative decay, in (0, 1).
    #[arg(long)]
    cooling_factor: Option<f64>,

    /// Relative length change below which an accepted move counts as stagnation.
    #[arg(long)]
    stagnation_threshold: Option<f64>,

    /// Stagnant iterations tolerated before a restart episode.
    #[arg(long)]
    stagnation_reset: Option<usize>,

    /// Random shuffles tried per restart episode.
    #[arg(long)]
    restart_attempts: Option<usize>,

    #[arg(long, default_value = "warn")]
    log_level: LevelFilter,
}

impl Cli {
    fn config(&self) -> AnnealingConfig {
        let mut config = AnnealingConfig::default();
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(t) = self.initial_temperature {
            config = config.with_initial_temperature(t);
        }
        if let Some(t) = self.min_temperature {
            config = config.with_min_temperature(t);
        }
        if let Some(factor) = self.cooling_factor {
            config = config.with_cooling_factor(factor);
        }
        if let Some(threshold) = self.stagnation_threshold {
            config = config.with_stagnation_threshold(threshold);
        }
        if let Some(n) = self.stagnation_reset {
            config = config.with_stagnation_reset(n);
        }
        if let Some(n) = self.restart_attempts {
            config = config.with_restart_attempts(n);
        }
        config
    }

    fn read_input(&self) -> Result<ProblemInput> {
        match &self.input {
            Some(path) => ProblemInput::from_reader(BufReader::new(File::open(path)?)),
            None => ProblemInput::from_reader(io::stdin().lock()),
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let input = cli.read_input()?;
    let mut engine = AnnealingEngine::new(input, cli.config())?;
    // Running out of time is a normal stop; the committed tour is printed either way.
    engine.run()?;

    let mut out = io::stdout().lock();
    output::write_solution(&mut out, engine.best())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init_logger(cli.log_level) {
        eprintln!("logger init failed: {e}");
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

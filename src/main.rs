//! Command-line driver for the parallel wave solver.
//!
//! ```bash
//! wave_rust -N 64 -T 200 -H 4 -f out.raw -t 150 --impulse 32,32,100
//! wave_rust --config run.toml --backend rayon
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wave_rust::{Backend, Impulse, Simulation, SimulationConfig, Stencil, Storage};

/// Explicit leapfrog solver for the 2D wave equation
#[derive(Parser, Debug)]
#[command(name = "wave_rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Grid edge length (N x N cells)
    #[arg(short = 'N', long)]
    size: Option<usize>,

    /// Number of time steps
    #[arg(short = 'T', long)]
    steps: Option<usize>,

    /// Number of worker threads
    #[arg(short = 'H', long)]
    threads: Option<usize>,

    /// Output file for the persisted step
    #[arg(short = 'f', long)]
    output: Option<PathBuf>,

    /// Step to persist
    #[arg(short = 't', long)]
    output_step: Option<usize>,

    /// TOML configuration file; other flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Update coefficient pd, overriding the configured physics
    #[arg(long)]
    pd: Option<f32>,

    #[arg(long, value_enum)]
    backend: Option<Backend>,

    #[arg(long, value_enum)]
    stencil: Option<Stencil>,

    #[arg(long, value_enum)]
    storage: Option<Storage>,

    /// Initial displacement as row,col,value (repeatable)
    #[arg(long = "impulse")]
    impulses: Vec<Impulse>,

    /// Print every retained step after the run
    #[arg(long)]
    show_grid: bool,

    /// Print the cells assigned to each worker
    #[arg(long)]
    show_partition: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_file(path)
                .with_context(|| format!("failed to load config '{}'", path.display()))?,
            None => SimulationConfig::new(
                self.size.context("--size is required without --config")?,
                self.steps.context("--steps is required without --config")?,
                self.threads.context("--threads is required without --config")?,
                self.output.clone().context("--output is required without --config")?,
                self.output_step
                    .context("--output-step is required without --config")?,
            ),
        };

        if let Some(size) = self.size {
            config.size = size;
        }
        if let Some(steps) = self.steps {
            config.steps = steps;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(output_step) = self.output_step {
            config.output_step = output_step;
        }
        if let Some(pd) = self.pd {
            config.physics.pd = Some(pd);
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(stencil) = self.stencil {
            config.stencil = stencil;
        }
        if let Some(storage) = self.storage {
            config.storage = storage;
        }
        config.impulses.extend(self.impulses);

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let directive = if cli.verbose { "wave_rust=debug" } else { "wave_rust=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(directive.parse().expect("valid directive")),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let show_grid = cli.show_grid;
    let show_partition = cli.show_partition;
    let config = cli.into_config()?;

    let simulation = Simulation::new(&config).context("failed to set up the simulation")?;
    if show_partition {
        print!("{}", simulation.assignment());
    }

    let outcome = simulation.run().context("simulation failed")?;
    if show_grid {
        print!("{}", outcome.grid());
    }

    let saved = outcome
        .persist(&config.output, config.output_step)
        .with_context(|| format!("failed to save step {}", config.output_step))?;
    if saved {
        tracing::info!(
            path = %config.output.display(),
            step = config.output_step,
            elapsed = ?outcome.elapsed(),
            "done"
        );
    }
    Ok(())
}

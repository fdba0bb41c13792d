//! Idea Market Simulator
//!
//! Command line front end: single batches, parameter sweeps that feed the
//! results file, and GML export of a finished network.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use market_core::{SimConfig, Simulation, DEFAULT_CONFIG_PATH};
use market_events::{ResultRow, TargetingMode};
use market_report::{compare, export_to_path, ResultsFile};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "idea_market")]
#[command(about = "Simulates how bots degrade content quality in a follower network")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a batch for one targeting mode and print its JSON summary
    Run {
        #[arg(long, default_value_t = TargetingMode::Random)]
        targeting: TargetingMode,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Sweep one parameter, comparing random and preferential targeting
    Sweep {
        #[arg(long, value_enum)]
        param: SweepParam,

        /// Comma-separated parameter values
        #[arg(long, value_delimiter = ',', required = true)]
        values: Vec<f64>,

        /// Results CSV, appended one row per value
        #[arg(long, default_value = "results.csv")]
        output: PathBuf,

        /// Sweep manifest (defaults to the results path with a .json extension)
        #[arg(long)]
        manifest: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Average human quality after each sweep, printed as JSON
    Timeline {
        #[arg(long, default_value_t = TargetingMode::Random)]
        targeting: TargetingMode,

        /// Number of sweeps to record
        #[arg(long, default_value_t = 100)]
        sweeps: usize,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Run once and write the annotated network as GML
    Export {
        #[arg(long, default_value_t = TargetingMode::Random)]
        targeting: TargetingMode,

        #[arg(long, default_value = "network.gml")]
        output: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Values that replace those read from the configuration file
#[derive(Args, Debug)]
struct Overrides {
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Base random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long)]
    n_runs: Option<usize>,

    #[arg(long)]
    n_humans: Option<usize>,

    #[arg(long)]
    beta: Option<f64>,

    #[arg(long)]
    gamma: Option<f64>,

    #[arg(long)]
    mu: Option<f64>,

    #[arg(long)]
    phi: Option<f64>,

    #[arg(long)]
    alpha: Option<usize>,

    #[arg(long)]
    max_steps: Option<u64>,

    #[arg(long)]
    window: Option<usize>,
}

impl Overrides {
    fn load(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                SimConfig::load(DEFAULT_CONFIG_PATH)?
            }
            None => SimConfig::default(),
        };

        if let Some(seed) = self.seed {
            config.runs.seed = Some(seed);
        }
        if let Some(n_runs) = self.n_runs {
            config.runs.n_runs = n_runs;
        }
        if let Some(n_humans) = self.n_humans {
            config.network.n_humans = n_humans;
        }
        if let Some(beta) = self.beta {
            config.network.beta = beta;
        }
        if let Some(gamma) = self.gamma {
            config.network.gamma = gamma;
        }
        if let Some(mu) = self.mu {
            config.diffusion.mu = mu;
        }
        if let Some(phi) = self.phi {
            config.diffusion.phi = phi;
        }
        if let Some(alpha) = self.alpha {
            config.diffusion.alpha = alpha;
        }
        if let Some(max_steps) = self.max_steps {
            config.convergence.max_steps = max_steps;
        }
        if let Some(window) = self.window {
            config.convergence.window = window;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Parameters a sweep can vary
#[derive(ValueEnum, Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum SweepParam {
    Gamma,
    Beta,
    Mu,
    Phi,
    Alpha,
}

impl SweepParam {
    fn apply(self, config: &mut SimConfig, value: f64) -> Result<()> {
        match self {
            SweepParam::Gamma => config.network.gamma = value,
            SweepParam::Beta => config.network.beta = value,
            SweepParam::Mu => config.diffusion.mu = value,
            SweepParam::Phi => config.diffusion.phi = value,
            SweepParam::Alpha => {
                if value < 1.0 || value.fract() != 0.0 {
                    bail!("alpha must be a positive integer, got {}", value);
                }
                config.diffusion.alpha = value as usize;
            }
        }
        Ok(())
    }
}

/// Record of one sweep invocation
#[derive(Serialize)]
struct SweepManifest {
    sweep_id: Uuid,
    param: SweepParam,
    results: PathBuf,
    config: SimConfig,
    rows: Vec<ResultRow>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            targeting,
            overrides,
        } => {
            let simulation = Simulation::new(overrides.load()?)?;
            let output = simulation.simulate(targeting)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Sweep {
            param,
            values,
            output,
            manifest,
            overrides,
        } => sweep(param, &values, &output, manifest, overrides.load()?)?,
        Command::Timeline {
            targeting,
            sweeps,
            overrides,
        } => {
            let simulation = Simulation::new(overrides.load()?)?;
            let timeline = simulation.timeline(targeting, sweeps)?;
            println!("{}", serde_json::to_string_pretty(&timeline)?);
        }
        Command::Export {
            targeting,
            output,
            overrides,
        } => {
            let mut config = overrides.load()?;
            config.runs.return_net = true;
            let result = Simulation::new(config)?.simulate(targeting)?;
            let network = result
                .network
                .context("run finished without a network snapshot")?;
            export_to_path(&network, &output)?;
            println!(
                "Wrote {} nodes, {} edges (quality {:.4}) to {}",
                network.node_count(),
                network.edge_count(),
                result.quality,
                output.display()
            );
        }
    }
    Ok(())
}

fn sweep(
    param: SweepParam,
    values: &[f64],
    output: &Path,
    manifest: Option<PathBuf>,
    mut config: SimConfig,
) -> Result<()> {
    // Both targeting modes share a base seed so runs pair up by index
    let base = config.runs.seed.unwrap_or_else(rand::random);
    config.runs.seed = Some(base);

    let sweep_id = Uuid::new_v4();
    let results = ResultsFile::new(output);
    let mut rows = Vec::with_capacity(values.len());

    tracing::info!(%sweep_id, param = ?param, points = values.len(), "Starting sweep");
    for &value in values {
        let mut point = config.clone();
        param.apply(&mut point, value)?;
        let simulation = Simulation::new(point)?;

        let random = simulation.simulate(TargetingMode::Random)?;
        let preferential = simulation.simulate(TargetingMode::Preferential)?;
        let row = compare(value, &random, &preferential)?;
        results.append(&row)?;

        tracing::info!(
            value,
            random = row.random_mean,
            preferential = row.preferential_mean,
            ratio = row.ratio_mean,
            exhausted = random.exhausted_count() + preferential.exhausted_count(),
            "Sweep point finished"
        );
        rows.push(row);
    }

    let manifest_path = manifest.unwrap_or_else(|| output.with_extension("json"));
    let record = SweepManifest {
        sweep_id,
        param,
        results: output.to_path_buf(),
        config,
        rows,
    };
    fs::write(&manifest_path, serde_json::to_string_pretty(&record)?)
        .with_context(|| format!("writing {}", manifest_path.display()))?;
    println!(
        "Sweep {} wrote {} rows to {}",
        sweep_id,
        record.rows.len(),
        output.display()
    );
    Ok(())
}

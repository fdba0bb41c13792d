//! Run Orchestrator
//!
//! Repeats build, diffusion and convergence for independent runs, in
//! parallel, and averages the steady-state human feed quality. Every run
//! owns its own `World` and a generator seeded from the base seed, the run
//! index and the attempt number, so results never depend on which thread
//! executed a run.

use bevy_ecs::prelude::*;
use market_events::{RunOutcome, RunSummary, SimulationOutput, TargetingMode};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::components::{MemeId, MemeRegistry, Network, Popularity};
use crate::config::{ConfigError, SimConfig};
use crate::output::{
    annotate, bot_followers, human_feed_quality, infiltration_estimate, low_quality_fraction,
    low_quality_gini, quality_by_degree, DegreeQuality,
};
use crate::setup::NetworkGenerator;
use crate::systems::{
    diffusion_schedule, ForgottenMemes, HumanFeedTally, QualityMonitor, RunClock, RunPhase,
    StepRecord, StepTrace,
};
use crate::SimRng;

/// Errors raised while running simulations
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("run {run}: no human ever received a meme")]
    NoHumanContent { run: usize },
}

impl SimError {
    /// Whether a fresh seed might succeed where this attempt failed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SimError::NoHumanContent { .. })
    }
}

/// Everything one run produced
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    /// Final network with its feeds
    pub network: Network,
    /// Step trace, when `record_steps` is enabled
    pub trace: Option<Vec<StepRecord>>,
    /// Per-meme post counts, when `track_memes` is enabled
    pub popularity: Option<HashMap<MemeId, Popularity>>,
}

impl RunReport {
    /// Final human feed quality grouped by follower count.
    pub fn quality_by_degree(&self) -> BTreeMap<usize, DegreeQuality> {
        quality_by_degree(&self.network)
    }
}

/// Validated simulation driver
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Base seed for this batch; drawn from entropy when not configured.
    pub fn base_seed(&self) -> u64 {
        self.config.runs.seed.unwrap_or_else(rand::random)
    }

    /// Run the configured batch for one targeting mode. Runs that still
    /// fail after their retries are listed in `failed_runs`; the batch only
    /// fails when every run does.
    pub fn simulate(&self, targeting: TargetingMode) -> Result<SimulationOutput, SimError> {
        let base = self.base_seed();

        if self.config.runs.return_net {
            let report = self.run_with_retries(targeting, 0, base)?;
            return Ok(SimulationOutput {
                targeting,
                quality: report.summary.quality,
                network: Some(annotate(&report.network)),
                runs: vec![report.summary],
                failed_runs: Vec::new(),
            });
        }

        tracing::info!(
            targeting = %targeting,
            runs = self.config.runs.n_runs,
            base_seed = base,
            "Starting simulation batch"
        );

        let results: Vec<Result<RunSummary, SimError>> = (0..self.config.runs.n_runs)
            .into_par_iter()
            .map(|run| {
                self.run_with_retries(targeting, run, base)
                    .map(|report| report.summary)
            })
            .collect();

        let mut runs = Vec::with_capacity(results.len());
        let mut failed_runs = Vec::new();
        let mut first_error = None;
        for (run, result) in results.into_iter().enumerate() {
            match result {
                Ok(summary) => runs.push(summary),
                Err(err) => {
                    tracing::warn!(run, error = %err, "Run failed; leaving it out of the batch");
                    failed_runs.push(run);
                    first_error.get_or_insert(err);
                }
            }
        }
        if runs.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        let quality = if runs.is_empty() {
            0.0
        } else {
            runs.iter().map(|r| r.quality).sum::<f64>() / runs.len() as f64
        };
        tracing::info!(
            targeting = %targeting,
            quality,
            failed = failed_runs.len(),
            "Simulation batch finished"
        );

        Ok(SimulationOutput {
            targeting,
            quality,
            runs,
            failed_runs,
            network: None,
        })
    }

    /// Run once, reseeding on retryable failures up to `retries` times.
    pub fn run_with_retries(
        &self,
        targeting: TargetingMode,
        run: usize,
        base: u64,
    ) -> Result<RunReport, SimError> {
        let mut attempt = 0;
        loop {
            let seed = derive_seed(base, run, attempt);
            match self.run_once(targeting, run, seed) {
                Err(err) if err.is_retryable() && attempt < self.config.runs.retries => {
                    tracing::warn!(run, attempt, error = %err, "Retrying run with a fresh seed");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    /// Build a network from `seed` and diffuse on it until the run ends.
    pub fn run_once(
        &self,
        targeting: TargetingMode,
        run: usize,
        seed: u64,
    ) -> Result<RunReport, SimError> {
        let generator = NetworkGenerator::new(self.config.network.clone(), targeting)?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let network = generator.generate(&mut rng);
        self.diffuse(network, rng, targeting, run, seed)
    }

    /// Single run on a caller-supplied network. `targeting` only labels the
    /// summary.
    pub fn simulate_on(
        &self,
        network: Network,
        targeting: TargetingMode,
    ) -> Result<RunReport, SimError> {
        let seed = derive_seed(self.base_seed(), 0, 0);
        self.diffuse(network, SmallRng::seed_from_u64(seed), targeting, 0, seed)
    }

    /// Human feed quality after each of `sweeps` sweeps, averaged over
    /// runs. Convergence is ignored; entries are `None` while no run has
    /// delivered a meme to a human.
    pub fn timeline(
        &self,
        targeting: TargetingMode,
        sweeps: usize,
    ) -> Result<Vec<Option<f64>>, SimError> {
        let base = self.base_seed();
        let generator = NetworkGenerator::new(self.config.network.clone(), targeting)?;

        let per_run: Vec<Vec<Option<f64>>> = (0..self.config.runs.n_runs)
            .into_par_iter()
            .map(|run| {
                let seed = derive_seed(base, run, 0);
                let mut rng = SmallRng::seed_from_u64(seed);
                let network = generator.generate(&mut rng);
                let n_agents = network.len() as u64;

                let mut clock = RunClock::new(sweeps as u64 * n_agents, n_agents);
                clock.stop_on_convergence = false;
                let mut world = self.build_world(network, rng, clock);
                let mut schedule = diffusion_schedule();

                (0..sweeps)
                    .map(|_| {
                        schedule.run(&mut world);
                        world.resource::<HumanFeedTally>().mean()
                    })
                    .collect()
            })
            .collect();

        Ok((0..sweeps)
            .map(|sweep| {
                let values: Vec<f64> = per_run.iter().filter_map(|r| r[sweep]).collect();
                if values.is_empty() {
                    None
                } else {
                    Some(values.iter().sum::<f64>() / values.len() as f64)
                }
            })
            .collect())
    }

    fn build_world(&self, mut network: Network, rng: SmallRng, clock: RunClock) -> World {
        let diffusion = &self.config.diffusion;
        network.init_feeds(diffusion.alpha);

        let mut world = World::new();
        world.insert_resource(SimRng(rng));
        world.insert_resource(network);
        world.insert_resource(if diffusion.track_memes {
            MemeRegistry::with_tracking()
        } else {
            MemeRegistry::new()
        });
        world.insert_resource(diffusion.clone());
        world.insert_resource(HumanFeedTally::default());
        world.insert_resource(QualityMonitor::from_params(&self.config.convergence));
        world.insert_resource(clock);
        if diffusion.record_steps {
            world.insert_resource(StepTrace::default());
        }
        if diffusion.count_forgotten {
            world.insert_resource(ForgottenMemes::default());
        }
        world
    }

    fn diffuse(
        &self,
        network: Network,
        rng: SmallRng,
        targeting: TargetingMode,
        run: usize,
        seed: u64,
    ) -> Result<RunReport, SimError> {
        if network.humans().all(|h| h.following.is_empty()) {
            return Err(SimError::NoHumanContent { run });
        }

        let infiltration = infiltration_estimate(&network);
        tracing::info!(
            run,
            seed,
            agents = network.len(),
            beta = infiltration.beta,
            gamma = infiltration.gamma,
            "Run started"
        );
        let clock = RunClock::new(self.config.convergence.max_steps, network.len() as u64);
        let mut world = self.build_world(network, rng, clock);
        let mut schedule = diffusion_schedule();
        while !world.resource::<RunClock>().phase.is_terminal() {
            schedule.run(&mut world);
        }

        let quality = world
            .resource::<QualityMonitor>()
            .window_mean()
            .ok_or(SimError::NoHumanContent { run })?;
        let (steps, phase) = {
            let clock = world.resource::<RunClock>();
            (clock.step, clock.phase)
        };
        let outcome = if phase == RunPhase::Converged {
            RunOutcome::Converged
        } else {
            tracing::warn!(run, steps, quality, "Step budget exhausted before convergence");
            RunOutcome::Exhausted
        };

        let network = world.remove_resource::<Network>().unwrap_or_default();
        let mut registry = world.remove_resource::<MemeRegistry>().unwrap_or_default();
        let summary = RunSummary {
            run,
            seed,
            targeting,
            outcome,
            quality,
            steps,
            human_memes: registry.human_memes(),
            bot_memes: registry.bot_memes(),
            reshares: registry.reshares(),
            low_quality_fraction: low_quality_fraction(&network),
            bot_followers: bot_followers(&network),
            low_quality_gini: low_quality_gini(&network),
            forgotten_by_degree: world
                .remove_resource::<ForgottenMemes>()
                .map(|f| f.0)
                .unwrap_or_default(),
        };
        tracing::info!(
            run,
            steps,
            quality,
            final_quality = human_feed_quality(&network).unwrap_or(0.0),
            outcome = ?outcome,
            "Run finished"
        );

        Ok(RunReport {
            summary,
            network,
            trace: world.remove_resource::<StepTrace>().map(|t| t.0),
            popularity: registry.take_popularity(),
        })
    }
}

/// Batch of runs for `targeting` under `config`.
pub fn simulate(
    targeting: TargetingMode,
    config: &SimConfig,
) -> Result<SimulationOutput, SimError> {
    Simulation::new(config.clone())?.simulate(targeting)
}

/// Per-sweep mean human quality for `targeting` under `config`.
pub fn simulate_timeline(
    targeting: TargetingMode,
    config: &SimConfig,
    sweeps: usize,
) -> Result<Vec<Option<f64>>, SimError> {
    Simulation::new(config.clone())?.timeline(targeting, sweeps)
}

/// Seed for one attempt of one run, mixed from the batch's base seed.
pub fn derive_seed(base: u64, run: usize, attempt: usize) -> u64 {
    let mut z = base
        .wrapping_add((run as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((attempt as u64).wrapping_mul(0xD1B5_4A32_D192_ED03));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConvergenceParams, NetworkParams, RunParams};
    use market_events::Role;

    fn small_config() -> SimConfig {
        SimConfig {
            network: NetworkParams {
                n_humans: 60,
                beta: 0.1,
                gamma: 0.05,
                ..NetworkParams::default()
            },
            convergence: ConvergenceParams {
                window: 100,
                max_steps: 50_000,
                ..ConvergenceParams::default()
            },
            runs: RunParams {
                n_runs: 4,
                seed: Some(11),
                ..RunParams::default()
            },
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_derive_seed_separates_runs_and_attempts() {
        let seeds = [
            derive_seed(1, 0, 0),
            derive_seed(1, 1, 0),
            derive_seed(1, 0, 1),
            derive_seed(2, 0, 0),
        ];
        for (i, a) in seeds.iter().enumerate() {
            for b in &seeds[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert_eq!(derive_seed(9, 3, 1), derive_seed(9, 3, 1));
    }

    #[test]
    fn test_simulate_collects_one_summary_per_run() {
        let output = simulate(TargetingMode::Random, &small_config()).unwrap();
        assert_eq!(output.runs.len(), 4);
        for (i, run) in output.runs.iter().enumerate() {
            assert_eq!(run.run, i);
            assert!((0.0..=1.0).contains(&run.quality));
            assert!(run.steps > 0);
        }
        let mean = output.qualities().iter().sum::<f64>() / 4.0;
        assert!((output.quality - mean).abs() < 1e-12);
        assert!(output.network.is_none());
    }

    #[test]
    fn test_return_net_runs_once_with_snapshot() {
        let mut config = small_config();
        config.runs.return_net = true;
        let output = simulate(TargetingMode::Preferential, &config).unwrap();
        assert_eq!(output.runs.len(), 1);
        let network = output.network.unwrap();
        assert_eq!(network.node_count(), 66);
        assert_eq!(network.bot_count(), 6);
    }

    #[test]
    fn test_invalid_config_fails_before_running() {
        let mut config = small_config();
        config.diffusion.mu = 1.5;
        assert!(matches!(
            simulate(TargetingMode::Random, &config),
            Err(SimError::Config(_))
        ));
    }

    #[test]
    fn test_isolated_humans_report_no_content() {
        let network = Network::from_edges(&[Role::Human, Role::Human], &[]).unwrap();
        let simulation = Simulation::new(small_config()).unwrap();
        let err = simulation
            .simulate_on(network, TargetingMode::Random)
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_simulate_on_supplied_network() {
        let network = Network::from_edges(
            &[Role::Human, Role::Human, Role::Human, Role::Bot],
            &[(0, 1), (1, 2), (2, 0), (0, 3)],
        )
        .unwrap();
        let mut config = small_config();
        config.diffusion.record_steps = true;
        config.diffusion.count_forgotten = true;
        let report = Simulation::new(config)
            .unwrap()
            .simulate_on(network, TargetingMode::Random)
            .unwrap();

        assert_eq!(report.network.len(), 4);
        assert_eq!(report.summary.bot_followers, 1);
        let trace = report.trace.unwrap();
        assert_eq!(trace.len() as u64, report.summary.steps);
        assert!(report.popularity.is_none());
    }

    /// One human and three bots: the human ends up following no bot, and so
    /// sees nothing, in roughly half of all generated networks.
    fn lonely_human_config(n_runs: usize, retries: usize) -> SimConfig {
        SimConfig {
            network: NetworkParams {
                n_humans: 1,
                beta: 3.0,
                gamma: 0.2,
                ..NetworkParams::default()
            },
            convergence: ConvergenceParams {
                window: 20,
                max_steps: 20_000,
                ..ConvergenceParams::default()
            },
            runs: RunParams {
                n_runs,
                retries,
                seed: Some(5),
                ..RunParams::default()
            },
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_step_budget_exhausted_run_is_flagged() {
        let mut config = small_config();
        config.convergence.window = 10_000;
        config.convergence.max_steps = 500;
        let simulation = Simulation::new(config).unwrap();

        let report = simulation.run_once(TargetingMode::Random, 0, 3).unwrap();
        assert_eq!(report.summary.outcome, RunOutcome::Exhausted);
        assert_eq!(report.summary.steps, 500);
        assert!((0.0..=1.0).contains(&report.summary.quality));

        let output = simulation.simulate(TargetingMode::Random).unwrap();
        assert_eq!(output.exhausted_count(), 4);
        assert!(!output.all_converged());
        for run in &output.runs {
            assert!((0.0..=1.0).contains(&run.quality));
        }
    }

    #[test]
    fn test_retry_recovers_with_fresh_seed() {
        let simulation = Simulation::new(lonely_human_config(10, 30)).unwrap();
        let output = simulation.simulate(TargetingMode::Random).unwrap();

        assert_eq!(output.runs.len(), 10);
        assert!(output.failed_runs.is_empty());
        let reseeded = output
            .runs
            .iter()
            .filter(|r| r.seed != derive_seed(5, r.run, 0))
            .count();
        assert!(reseeded > 0);
        for run in &output.runs {
            assert_eq!(run.bot_followers, 1);
            // every seed used comes from this run's own attempt sequence
            assert!((0..=30).any(|attempt| derive_seed(5, run.run, attempt) == run.seed));
        }
    }

    #[test]
    fn test_failed_runs_are_kept_out_of_the_mean() {
        let simulation = Simulation::new(lonely_human_config(40, 0)).unwrap();
        let output = simulation.simulate(TargetingMode::Random).unwrap();

        assert!(!output.failed_runs.is_empty());
        assert!(!output.runs.is_empty());
        assert_eq!(output.runs.len() + output.failed_runs.len(), 40);
        for run in &output.runs {
            assert!(!output.failed_runs.contains(&run.run));
        }
        let mean = output.qualities().iter().sum::<f64>() / output.runs.len() as f64;
        assert!((output.quality - mean).abs() < 1e-12);
    }

    #[test]
    fn test_batch_fails_when_every_run_fails() {
        let mut config = lonely_human_config(3, 2);
        config.network.gamma = 0.0;
        assert!(matches!(
            simulate(TargetingMode::Random, &config),
            Err(SimError::NoHumanContent { .. })
        ));
    }

    #[test]
    fn test_timeline_has_one_entry_per_sweep() {
        let mut config = small_config();
        config.runs.n_runs = 2;
        let timeline = simulate_timeline(TargetingMode::Random, &config, 20).unwrap();
        assert_eq!(timeline.len(), 20);
        let last = timeline.last().copied().flatten().unwrap();
        assert!((0.0..=1.0).contains(&last));
    }
}

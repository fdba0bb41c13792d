//! End-to-end behavior of batches of runs.

use market_core::{
    simulate, ConvergenceParams, NetworkGenerator, NetworkParams, RunParams, SimConfig,
};
use market_events::{SimulationOutput, TargetingMode};
use market_report::compare;
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn base_config() -> SimConfig {
    let mut config = SimConfig {
        network: NetworkParams {
            n_humans: 100,
            beta: 0.1,
            ..NetworkParams::default()
        },
        convergence: ConvergenceParams {
            window: 300,
            max_steps: 150_000,
            ..ConvergenceParams::default()
        },
        runs: RunParams {
            n_runs: 5,
            seed: Some(2024),
            ..RunParams::default()
        },
        ..SimConfig::default()
    };
    config.diffusion.mu = 0.5;
    config
}

fn run_pair(config: &SimConfig) -> (SimulationOutput, SimulationOutput) {
    (
        simulate(TargetingMode::Random, config).unwrap(),
        simulate(TargetingMode::Preferential, config).unwrap(),
    )
}

#[test]
fn test_small_market_terminates_with_valid_quality() {
    let mut config = base_config();
    config.network.gamma = 0.01;
    config.diffusion.phi = 5.0;

    let (random, preferential) = run_pair(&config);
    for run in random.runs.iter().chain(&preferential.runs) {
        assert!((0.0..=1.0).contains(&run.quality), "{:?}", run);
        assert!(run.steps <= config.convergence.max_steps);
    }

    let row = compare(0.01, &random, &preferential).unwrap();
    // preferential targeting hurts at least as much, within one standard error
    let tolerance = row.random_stderr + row.preferential_stderr;
    assert!(
        row.preferential_mean <= row.random_mean + tolerance,
        "{:?}",
        row
    );
}

#[test]
fn test_zero_infiltration_makes_targeting_irrelevant() {
    let mut config = base_config();
    config.network.gamma = 0.0;

    for seed in 0..5 {
        let random = NetworkGenerator::new(config.network.clone(), TargetingMode::Random)
            .unwrap()
            .generate(&mut SmallRng::seed_from_u64(seed));
        let preferential =
            NetworkGenerator::new(config.network.clone(), TargetingMode::Preferential)
                .unwrap()
                .generate(&mut SmallRng::seed_from_u64(seed));
        assert_eq!(
            random.edges().collect::<Vec<_>>(),
            preferential.edges().collect::<Vec<_>>()
        );
    }

    let (random, preferential) = run_pair(&config);
    let row = compare(0.0, &random, &preferential).unwrap();
    let tolerance = 4.0 * (row.random_stderr + row.preferential_stderr) + 0.05;
    assert!(
        (row.random_mean - row.preferential_mean).abs() <= tolerance,
        "{:?}",
        row
    );
}

#[test]
fn test_harmless_bots_give_ratio_near_one() {
    let mut config = base_config();
    config.network.gamma = 0.1;
    config.diffusion.phi = 1.0;
    config.diffusion.mu = 1.0;

    let (random, preferential) = run_pair(&config);
    let row = compare(0.1, &random, &preferential).unwrap();
    assert!((row.ratio_mean - 1.0).abs() < 0.15, "{:?}", row);
}

#[test]
fn test_more_infiltration_lowers_quality() {
    let mut clean = base_config();
    clean.network.gamma = 0.0;
    clean.diffusion.phi = 5.0;
    let mut infiltrated = clean.clone();
    infiltrated.network.gamma = 0.2;

    let clean_quality = simulate(TargetingMode::Random, &clean).unwrap().quality;
    let infiltrated_quality = simulate(TargetingMode::Random, &infiltrated).unwrap().quality;
    assert!(
        infiltrated_quality < clean_quality,
        "gamma 0.2 gave {} vs {} without bots",
        infiltrated_quality,
        clean_quality
    );
}

#[test]
fn test_forgotten_memes_recorded_when_enabled() {
    let mut config = base_config();
    config.network.gamma = 0.2;
    config.diffusion.phi = 2.0;
    config.diffusion.count_forgotten = true;
    config.runs.n_runs = 1;

    let output = simulate(TargetingMode::Influential, &config).unwrap();
    let run = &output.runs[0];
    assert!(run.bot_memes > 0);
    assert!(run.bot_followers > 0);
    assert!(!run.forgotten_by_degree.is_empty());
}

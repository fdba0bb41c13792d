//! Bot Infiltration
//!
//! Adds human -> bot follow edges under one of the targeting strategies.
//! Every strategy has the same expected number of edges, gamma per
//! (human, bot) pair, so their effect on quality can be compared.

use market_events::TargetingMode;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{AgentId, Network};

/// Add human -> bot edges to `network`.
pub fn infiltrate<R: Rng>(
    network: &mut Network,
    humans: &[AgentId],
    bots: &[AgentId],
    gamma: f64,
    mode: TargetingMode,
    rng: &mut R,
) {
    if humans.is_empty() || bots.is_empty() {
        return;
    }
    match mode {
        TargetingMode::Random => random_targeting(network, humans, bots, gamma, rng),
        TargetingMode::Preferential => preferential_targeting(network, humans, bots, gamma, rng),
        TargetingMode::Influential => influential_targeting(network, humans, bots, gamma, rng),
    }
}

/// Each pair independently with probability gamma.
fn random_targeting<R: Rng>(
    network: &mut Network,
    humans: &[AgentId],
    bots: &[AgentId],
    gamma: f64,
    rng: &mut R,
) {
    for &human in humans {
        for &bot in bots {
            if rng.gen::<f64>() < gamma {
                network.follow(human, bot);
            }
        }
    }
}

/// Rich-get-richer: a bot's follow probability scales with one plus its
/// current follower count, normalized so each human still expects
/// gamma * n_bots bot follows.
fn preferential_targeting<R: Rng>(
    network: &mut Network,
    humans: &[AgentId],
    bots: &[AgentId],
    gamma: f64,
    rng: &mut R,
) {
    let mut order = humans.to_vec();
    order.shuffle(rng);

    let mut attractiveness: Vec<f64> = bots
        .iter()
        .map(|&b| 1.0 + network.followers(b).len() as f64)
        .collect();
    let mut total: f64 = attractiveness.iter().sum();

    for human in order {
        let mean = total / bots.len() as f64;
        for (i, &bot) in bots.iter().enumerate() {
            let prob = (gamma * attractiveness[i] / mean).min(1.0);
            if rng.gen::<f64>() < prob && network.follow(human, bot) {
                attractiveness[i] += 1.0;
                total += 1.0;
            }
        }
    }
}

/// Each bot gets Binomial(n_humans, gamma) followers, picked among humans
/// weighted by the humans' own follower counts.
fn influential_targeting<R: Rng>(
    network: &mut Network,
    humans: &[AgentId],
    bots: &[AgentId],
    gamma: f64,
    rng: &mut R,
) {
    let weights: Vec<f64> = humans
        .iter()
        .map(|&h| network.followers(h).len() as f64)
        .collect();

    for &bot in bots {
        let n_followers = humans.iter().filter(|_| rng.gen::<f64>() < gamma).count();
        for human in sample_weighted_without_replacement(humans, &weights, n_followers, rng) {
            network.follow(human, bot);
        }
    }
}

/// Draw `k` distinct items with probability proportional to `weights`.
///
/// Uses Efraimidis-Spirakis keys. Zero-weight items are only drawn, uniformly,
/// once every positive-weight item has been taken.
pub fn sample_weighted_without_replacement<T: Copy, R: Rng>(
    items: &[T],
    weights: &[f64],
    k: usize,
    rng: &mut R,
) -> Vec<T> {
    debug_assert_eq!(items.len(), weights.len());
    let k = k.min(items.len());

    let mut keyed: Vec<(f64, T)> = Vec::new();
    let mut zeros: Vec<T> = Vec::new();
    for (&item, &w) in items.iter().zip(weights) {
        if w > 0.0 {
            // u in (0, 1]; larger keys win
            let u = 1.0 - rng.gen::<f64>();
            keyed.push((u.ln() / w, item));
        } else {
            zeros.push(item);
        }
    }

    if k <= keyed.len() {
        keyed.sort_by(|a, b| b.0.total_cmp(&a.0));
        keyed.truncate(k);
        return keyed.into_iter().map(|(_, item)| item).collect();
    }

    let shortfall = k - keyed.len();
    let mut sample: Vec<T> = keyed.into_iter().map(|(_, item)| item).collect();
    sample.extend(zeros.choose_multiple(rng, shortfall).copied());
    sample
}

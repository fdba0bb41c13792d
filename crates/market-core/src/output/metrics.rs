//! Network Diagnostics
//!
//! Measurements taken on a finished network: how much low-quality content
//! humans hold, who follows bots, and how bot content concentrates around
//! well-followed humans.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::components::Network;

/// Average quality of everything in human feeds.
pub fn human_feed_quality(network: &Network) -> Option<f64> {
    let (sum, count) = network
        .humans()
        .map(|h| network.feed(h.id))
        .fold((0.0, 0usize), |(s, c), f| (s + f.quality_sum(), c + f.len()));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Fraction of human feed slots holding zero-quality memes.
pub fn low_quality_fraction(network: &Network) -> f64 {
    let (zeros, count) = network
        .humans()
        .map(|h| network.feed(h.id))
        .fold((0usize, 0usize), |(z, c), f| (z + f.low_quality_count(), c + f.len()));
    if count == 0 {
        0.0
    } else {
        zeros as f64 / count as f64
    }
}

/// Number of humans following at least one bot.
pub fn bot_followers(network: &Network) -> usize {
    network
        .humans()
        .filter(|h| h.following.iter().any(|&f| network.role(f).is_bot()))
        .count()
}

/// Gini coefficient of low-quality memes across humans ordered by follower
/// count. Near 1 when bot content piles up on a few hubs; `None` when no
/// human holds any.
pub fn low_quality_gini(network: &Network) -> Option<f64> {
    let mut humans: Vec<(usize, usize)> = network
        .humans()
        .map(|h| (h.followers.len(), network.feed(h.id).low_quality_count()))
        .collect();
    let total: usize = humans.iter().map(|&(_, z)| z).sum();
    if total == 0 {
        return None;
    }
    humans.sort_by_key(|&(degree, _)| degree);

    let n = humans.len() as f64;
    let coefficient: f64 = humans
        .iter()
        .enumerate()
        .map(|(i, &(_, zeros))| (2.0 * (i as f64 + 1.0) - n - 1.0) * zeros as f64)
        .sum();
    Some(coefficient / (n * total as f64))
}

/// Realized bot infiltration of a network
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Infiltration {
    pub bots: usize,
    pub humans: usize,
    /// Bots per human
    pub beta: f64,
    /// Mean fraction of all bots each human follows
    pub gamma: f64,
}

/// Measure β and γ back from a built network. Both are zero when the
/// population they divide by is empty.
pub fn infiltration_estimate(network: &Network) -> Infiltration {
    let bots = network.bots().count();
    let humans = network.humans().count();
    let followed: usize = network
        .humans()
        .map(|h| h.following.iter().filter(|&&f| network.role(f).is_bot()).count())
        .sum();

    let beta = if humans == 0 {
        0.0
    } else {
        bots as f64 / humans as f64
    };
    let gamma = if humans == 0 || bots == 0 {
        0.0
    } else {
        followed as f64 / bots as f64 / humans as f64
    };
    Infiltration {
        bots,
        humans,
        beta,
        gamma,
    }
}

/// Feed statistics for humans sharing a follower count
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DegreeQuality {
    pub humans: usize,
    pub mean_quality: f64,
    pub mean_low_quality: f64,
}

/// Average feed quality and low-quality count, grouped by follower count.
/// Humans with empty feeds are skipped.
pub fn quality_by_degree(network: &Network) -> BTreeMap<usize, DegreeQuality> {
    let mut groups: BTreeMap<usize, (usize, f64, usize)> = BTreeMap::new();
    for human in network.humans() {
        let feed = network.feed(human.id);
        if let Some(quality) = feed.mean_quality() {
            let entry = groups.entry(human.followers.len()).or_insert((0, 0.0, 0));
            entry.0 += 1;
            entry.1 += quality;
            entry.2 += feed.low_quality_count();
        }
    }
    groups
        .into_iter()
        .map(|(degree, (humans, quality, zeros))| {
            (
                degree,
                DegreeQuality {
                    humans,
                    mean_quality: quality / humans as f64,
                    mean_low_quality: zeros as f64 / humans as f64,
                },
            )
        })
        .collect()
}

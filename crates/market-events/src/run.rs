//! Run Result Types
//!
//! Records produced by a finished simulation run and by a batch of runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{NetworkSnapshot, TargetingMode};

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Human feed quality settled within tolerance.
    Converged,
    /// The step budget ran out first; the quality is provisional.
    Exhausted,
}

impl RunOutcome {
    pub fn is_converged(self) -> bool {
        matches!(self, RunOutcome::Converged)
    }
}

/// Summary of a single simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Index of the run within its batch
    pub run: usize,
    /// Seed the run's generator was built from
    pub seed: u64,
    pub targeting: TargetingMode,
    pub outcome: RunOutcome,
    /// Steady-state average quality of human feeds, in [0, 1]
    pub quality: f64,
    /// Steps executed before the run stopped
    pub steps: u64,
    pub human_memes: u64,
    pub bot_memes: u64,
    pub reshares: u64,
    /// Fraction of human feed slots holding zero-quality memes at the end
    pub low_quality_fraction: f64,
    /// Humans following at least one bot
    pub bot_followers: usize,
    /// Concentration of zero-quality memes on well-followed humans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_quality_gini: Option<f64>,
    /// Zero-quality memes evicted from human feeds, keyed by follower count
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub forgotten_by_degree: BTreeMap<usize, u64>,
}

/// Result of a batch of runs for one targeting mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub targeting: TargetingMode,
    /// Mean run quality
    pub quality: f64,
    pub runs: Vec<RunSummary>,
    /// Indices of runs that never produced a result, even after retries
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_runs: Vec<usize>,
    /// Annotated final network, present only when it was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkSnapshot>,
}

impl SimulationOutput {
    /// Per-run qualities, in run order.
    pub fn qualities(&self) -> Vec<f64> {
        self.runs.iter().map(|r| r.quality).collect()
    }

    /// True when no run hit its step budget.
    pub fn all_converged(&self) -> bool {
        self.runs.iter().all(|r| r.outcome.is_converged())
    }

    /// Number of runs flagged as provisional.
    pub fn exhausted_count(&self) -> usize {
        self.runs.iter().filter(|r| !r.outcome.is_converged()).count()
    }

    /// Summary of run `run`, if it succeeded.
    pub fn run(&self, run: usize) -> Option<&RunSummary> {
        self.runs.iter().find(|r| r.run == run)
    }
}

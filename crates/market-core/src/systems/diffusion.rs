//! Diffusion System
//!
//! One step: a uniformly random agent posts a meme (new, or reshared from
//! its feed by fitness) and the meme lands at the front of every follower's
//! feed. The sweep system runs `steps_per_sweep` steps per schedule run and
//! feeds the human quality to the convergence monitor after every step.

use bevy_ecs::prelude::*;
use market_events::Role;
use rand::Rng;
use std::collections::BTreeMap;

use crate::components::{AgentId, MemeId, MemeRef, MemeRegistry, Network};
use crate::config::DiffusionParams;
use crate::SimRng;

use super::convergence::{QualityMonitor, Signal};

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPhase {
    #[default]
    Initializing,
    Running,
    Converged,
    Exhausted,
}

impl RunPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunPhase::Converged | RunPhase::Exhausted)
    }
}

/// Resource: step counter and run state
#[derive(Resource, Debug, Clone)]
pub struct RunClock {
    pub step: u64,
    pub max_steps: u64,
    pub steps_per_sweep: u64,
    pub sweeps: u64,
    pub phase: RunPhase,
    /// When false the run only stops at `max_steps`
    pub stop_on_convergence: bool,
}

impl RunClock {
    pub fn new(max_steps: u64, steps_per_sweep: u64) -> Self {
        Self {
            step: 0,
            max_steps,
            steps_per_sweep: steps_per_sweep.max(1),
            sweeps: 0,
            phase: RunPhase::Initializing,
            stop_on_convergence: true,
        }
    }
}

/// Resource: running sum of quality over every human feed slot
#[derive(Resource, Debug, Clone, Default)]
pub struct HumanFeedTally {
    sum: f64,
    count: u64,
}

impl HumanFeedTally {
    pub fn add(&mut self, quality: f64) {
        self.sum += quality;
        self.count += 1;
    }

    pub fn remove(&mut self, quality: f64) {
        self.sum -= quality;
        self.count = self.count.saturating_sub(1);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Average quality of human feed contents, if any human holds a meme.
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some((self.sum / self.count as f64).clamp(0.0, 1.0))
        }
    }

    /// Recompute from the feeds themselves.
    pub fn resync(&mut self, network: &Network) {
        let (sum, count) = network
            .humans()
            .map(|h| network.feed(h.id))
            .fold((0.0, 0u64), |(s, c), feed| {
                (s + feed.quality_sum(), c + feed.len() as u64)
            });
        self.sum = sum;
        self.count = count;
    }
}

/// Resource: zero-quality memes evicted from human feeds, keyed by the
/// evicting human's follower count
#[derive(Resource, Debug, Clone, Default)]
pub struct ForgottenMemes(pub BTreeMap<usize, u64>);

impl ForgottenMemes {
    pub fn record(&mut self, followers: usize, count: u64) {
        *self.0.entry(followers).or_insert(0) += count;
    }
}

/// What the acting agent did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Originated,
    Reshared,
}

/// One executed step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRecord {
    pub step: u64,
    pub agent: AgentId,
    pub kind: PostKind,
    pub meme: MemeId,
}

/// Resource: every step of the run, in order
#[derive(Resource, Debug, Clone, Default)]
pub struct StepTrace(pub Vec<StepRecord>);

/// Execute a single diffusion step.
pub fn step_once<R: Rng>(
    rng: &mut R,
    network: &mut Network,
    registry: &mut MemeRegistry,
    params: &DiffusionParams,
    tally: &mut HumanFeedTally,
    mut forgotten: Option<&mut ForgottenMemes>,
    step: u64,
) -> StepRecord {
    let agent = AgentId::from(rng.gen_range(0..network.len()));
    let role = network.role(agent);

    let (meme, kind) = choose_post(rng, network, registry, params, agent, role, step);
    registry.record_post(&meme, role, kind == PostKind::Reshared);

    network.propagate(agent, &meme, |receiver, evicted| {
        if receiver.is_bot() {
            return;
        }
        tally.add(meme.quality);
        if let Some(old) = evicted {
            tally.remove(old.quality);
            if old.is_low_quality() {
                if let Some(forgotten) = forgotten.as_deref_mut() {
                    forgotten.record(receiver.followers.len(), 1);
                }
            }
        }
    });

    StepRecord {
        step,
        agent,
        kind,
        meme: meme.id,
    }
}

/// Humans reshare with probability 1 - mu when their feed has something;
/// bots always post a fresh deceptive meme unless configured to reshare.
fn choose_post<R: Rng>(
    rng: &mut R,
    network: &Network,
    registry: &mut MemeRegistry,
    params: &DiffusionParams,
    agent: AgentId,
    role: Role,
    step: u64,
) -> (MemeRef, PostKind) {
    let may_reshare = role == Role::Human || params.bots_reshare;
    if may_reshare && rng.gen::<f64>() >= params.mu {
        if let Some(meme) = network.feed(agent).pick_by_fitness(rng) {
            return (meme.clone(), PostKind::Reshared);
        }
    }

    let (quality, fitness) = params.meme_model.draw(role, params.phi, rng);
    (
        registry.originate(role, quality, fitness, step),
        PostKind::Originated,
    )
}

/// System: run one sweep of steps, stopping early on a terminal phase
#[allow(clippy::too_many_arguments)]
pub fn diffusion_sweep(
    mut rng: ResMut<SimRng>,
    mut network: ResMut<Network>,
    mut registry: ResMut<MemeRegistry>,
    params: Res<DiffusionParams>,
    mut tally: ResMut<HumanFeedTally>,
    mut monitor: ResMut<QualityMonitor>,
    mut clock: ResMut<RunClock>,
    mut trace: Option<ResMut<StepTrace>>,
    mut forgotten: Option<ResMut<ForgottenMemes>>,
) {
    if clock.phase == RunPhase::Initializing {
        clock.phase = RunPhase::Running;
    }
    if clock.phase.is_terminal() {
        return;
    }

    for _ in 0..clock.steps_per_sweep {
        let step = clock.step;
        let record = step_once(
            &mut rng.0,
            &mut network,
            &mut registry,
            &params,
            &mut tally,
            forgotten.as_deref_mut(),
            step,
        );
        clock.step += 1;

        if let Some(trace) = trace.as_deref_mut() {
            trace.0.push(record);
        }

        if let Some(quality) = tally.mean() {
            let signal = monitor.observe(step, quality);
            if signal == Signal::Converged && clock.stop_on_convergence {
                clock.phase = RunPhase::Converged;
                break;
            }
        }

        if clock.step >= clock.max_steps {
            clock.phase = RunPhase::Exhausted;
            break;
        }
    }
    clock.sweeps += 1;
}

/// System: cancel floating-point drift in the running quality sum
pub fn resync_tally(network: Res<Network>, mut tally: ResMut<HumanFeedTally>) {
    tally.resync(&network);
}

/// System: per-sweep progress
pub fn log_progress(clock: Res<RunClock>, tally: Res<HumanFeedTally>, monitor: Res<QualityMonitor>) {
    tracing::debug!(
        sweep = clock.sweeps,
        step = clock.step,
        quality = tally.mean().unwrap_or(0.0),
        window_quality = monitor.window_mean().unwrap_or(0.0),
        stable_checks = monitor.streak(),
        "Sweep finished"
    );
}

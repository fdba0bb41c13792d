//! ECS Systems
//!
//! The diffusion process and the convergence monitor it reports to.

pub mod convergence;
pub mod diffusion;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

pub use convergence::{QualityMonitor, Signal};
pub use diffusion::{
    diffusion_sweep, log_progress, resync_tally, step_once, ForgottenMemes, HumanFeedTally,
    PostKind, RunClock, RunPhase, StepRecord, StepTrace,
};

/// Schedule executed once per sweep: diffuse, then resync the quality
/// tally, then report progress. Runs on the calling thread.
pub fn diffusion_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems((diffusion_sweep, resync_tally, log_progress).chain());
    schedule
}

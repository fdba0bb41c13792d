//! Idea Market Simulation Engine Library
//!
//! Simulates how bots degrade the quality of content seen by humans in a
//! follower network. A run builds a network, lets agents post and reshare
//! memes until human feed quality reaches a steady state, and reports that
//! quality. The orchestrator repeats runs in parallel and averages them.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::*;
pub use config::{
    ConfigError, ConvergenceParams, DiffusionParams, NetworkParams, RunParams, SimConfig,
    DEFAULT_CONFIG_PATH, MAX_AGENTS,
};
pub use setup::NetworkGenerator;
pub use simulation::{derive_seed, simulate, simulate_timeline, RunReport, SimError, Simulation};
pub use systems::{QualityMonitor, RunClock, RunPhase, Signal};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

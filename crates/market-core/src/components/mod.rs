//! Simulation State
//!
//! Agents with their feeds, the memes they pass around, and the follower
//! network that connects them.

pub mod agent;
pub mod meme;
pub mod network;

pub use agent::*;
pub use meme::*;
pub use network::*;

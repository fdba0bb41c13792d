//! Shared record types for the idea market simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace: the engine
//! produces these records and the reporting crate consumes them.

pub mod role;
pub mod run;
pub mod snapshot;
pub mod results;

// Re-export role types
pub use role::{ParseRoleError, Role, TargetingMode};

// Re-export run types
pub use run::{RunOutcome, RunSummary, SimulationOutput};

// Re-export snapshot types
pub use snapshot::{NetworkSnapshot, NodeSnapshot};

// Re-export results types
pub use results::ResultRow;

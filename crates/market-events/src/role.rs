//! Agent roles and bot targeting strategies.
//!
//! # Example
//!
//! ```
//! use market_events::TargetingMode;
//!
//! let mode: TargetingMode = "preferential".parse().unwrap();
//! assert_eq!(mode, TargetingMode::Preferential);
//! assert_eq!(mode.to_string(), "preferential");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether an account is genuine or automated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Human,
    Bot,
}

impl Role {
    pub fn is_bot(self) -> bool {
        matches!(self, Role::Bot)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Human => write!(f, "human"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Role::Human),
            "bot" => Ok(Role::Bot),
            _ => Err(ParseRoleError::InvalidRole(s.to_string())),
        }
    }
}

/// Strategy bots use to acquire human followers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetingMode {
    /// Every (human, bot) pair is linked independently with probability gamma.
    #[default]
    Random,
    /// Bots that already have followers are disproportionately likely to gain more.
    Preferential,
    /// Bots pick their followers among humans weighted by the humans' own
    /// follower counts (hub targeting).
    Influential,
}

impl TargetingMode {
    /// All modes, in display order.
    pub const ALL: [TargetingMode; 3] = [
        TargetingMode::Random,
        TargetingMode::Preferential,
        TargetingMode::Influential,
    ];
}

impl fmt::Display for TargetingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetingMode::Random => write!(f, "random"),
            TargetingMode::Preferential => write!(f, "preferential"),
            TargetingMode::Influential => write!(f, "influential"),
        }
    }
}

impl FromStr for TargetingMode {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "random" => Ok(TargetingMode::Random),
            "preferential" => Ok(TargetingMode::Preferential),
            "influential" => Ok(TargetingMode::Influential),
            _ => Err(ParseRoleError::InvalidTargeting(s.to_string())),
        }
    }
}

/// Error parsing a role or targeting mode from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseRoleError {
    InvalidRole(String),
    InvalidTargeting(String),
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseRoleError::InvalidRole(s) => {
                write!(f, "invalid role: '{}', expected 'human' or 'bot'", s)
            }
            ParseRoleError::InvalidTargeting(s) => write!(
                f,
                "invalid targeting mode: '{}', expected 'random', 'preferential' or 'influential'",
                s
            ),
        }
    }
}

impl std::error::Error for ParseRoleError {}

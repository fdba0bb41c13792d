//! Configuration System
//!
//! Simulation parameters, loadable from a TOML file. Every field has a
//! default, so a file only needs to list what it changes:
//!
//! ```toml
//! [network]
//! gamma = 0.01
//!
//! [diffusion]
//! phi = 5.0
//! ```

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::components::meme::MemeModel;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "idea_market.toml";

/// Largest network an `AgentId` can address
pub const MAX_AGENTS: usize = u32::MAX as usize;

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub network: NetworkParams,
    pub diffusion: DiffusionParams,
    pub convergence: ConvergenceParams,
    pub runs: RunParams,
}

/// Network construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// Number of human agents
    pub n_humans: usize,
    /// Bots per human; the bot count is ceil(n_humans * beta)
    pub beta: f64,
    /// Probability that a growth follow closes a triad instead of being random
    pub p: f64,
    /// Follows per new node within each role's subgraph
    pub k_out: usize,
    /// Infiltration: probability that a human follows a given bot
    pub gamma: f64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            n_humans: 1000,
            beta: 0.1,
            p: 0.5,
            k_out: 3,
            gamma: 0.1,
        }
    }
}

impl NetworkParams {
    /// Number of bots implied by the human count and ratio.
    pub fn bot_count(&self) -> usize {
        (self.n_humans as f64 * self.beta).ceil() as usize
    }

    pub fn agent_count(&self) -> usize {
        self.n_humans.saturating_add(self.bot_count())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.n_humans < 1 {
            return Err(ConfigError::invalid("n_humans", "must be at least 1"));
        }
        if self.n_humans > MAX_AGENTS {
            return Err(ConfigError::invalid(
                "n_humans",
                format!("must not exceed {}", MAX_AGENTS),
            ));
        }
        if !self.beta.is_finite() || self.beta < 0.0 {
            return Err(ConfigError::invalid("beta", "must be a non-negative number"));
        }
        let bots = (self.n_humans as f64 * self.beta).ceil();
        if bots > (MAX_AGENTS - self.n_humans) as f64 {
            return Err(ConfigError::invalid(
                "beta",
                format!(
                    "{} bots per human gives more than {} agents",
                    self.beta, MAX_AGENTS
                ),
            ));
        }
        check_probability("p", self.p)?;
        check_probability("gamma", self.gamma)?;
        if self.k_out < 1 {
            return Err(ConfigError::invalid("k_out", "must be at least 1"));
        }
        if self.k_out >= self.agent_count() {
            return Err(ConfigError::invalid(
                "k_out",
                format!(
                    "{} is not below the total agent count {}",
                    self.k_out,
                    self.agent_count()
                ),
            ));
        }
        Ok(())
    }
}

/// Per-step behavior of the diffusion process
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionParams {
    /// Feed depth: memes visible to each agent
    pub alpha: usize,
    /// Probability that a human posts a new meme rather than resharing
    pub mu: f64,
    /// Deception factor inflating bot meme fitness
    pub phi: f64,
    pub meme_model: MemeModel,
    /// Let bots reshare from their own feeds like humans do
    pub bots_reshare: bool,
    /// Tally zero-quality memes pushed out of human feeds
    pub count_forgotten: bool,
    /// Keep per-meme post counts
    pub track_memes: bool,
    /// Keep a trace of every step
    pub record_steps: bool,
}

impl Default for DiffusionParams {
    fn default() -> Self {
        Self {
            alpha: 15,
            mu: 0.75,
            phi: 1.0,
            meme_model: MemeModel::Reference,
            bots_reshare: false,
            count_forgotten: false,
            track_memes: false,
            record_steps: false,
        }
    }
}

impl DiffusionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.alpha < 1 {
            return Err(ConfigError::invalid("alpha", "feeds must hold at least one meme"));
        }
        check_probability("mu", self.mu)?;
        if !self.phi.is_finite() || self.phi < 1.0 {
            return Err(ConfigError::invalid("phi", "must be a number >= 1"));
        }
        Ok(())
    }
}

/// Steady-state detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceParams {
    /// Relative change in windowed quality treated as stable
    pub epsilon: f64,
    /// Observations per window
    pub window: usize,
    /// Consecutive stable checks required
    pub patience: usize,
    /// Step budget; a run reaching it is reported as exhausted
    pub max_steps: u64,
}

impl Default for ConvergenceParams {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            window: 1000,
            patience: 3,
            max_steps: 5_000_000,
        }
    }
}

impl ConvergenceParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(ConfigError::invalid("epsilon", "must be a positive number"));
        }
        if self.window < 1 {
            return Err(ConfigError::invalid("window", "must be at least 1"));
        }
        if self.patience < 1 {
            return Err(ConfigError::invalid("patience", "must be at least 1"));
        }
        if self.max_steps < 1 {
            return Err(ConfigError::invalid("max_steps", "must be at least 1"));
        }
        Ok(())
    }
}

/// Repetition and reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunParams {
    /// Independent runs to average
    pub n_runs: usize,
    /// Extra attempts for a run that produced no measurable human content
    pub retries: usize,
    /// Base seed; drawn from entropy when absent
    pub seed: Option<u64>,
    /// Return the final network of a single run instead of averaging
    pub return_net: bool,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            n_runs: 10,
            retries: 2,
            seed: None,
            return_net: false,
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default path, or use defaults if not found
    pub fn load_or_default() -> Self {
        if !Path::new(DEFAULT_CONFIG_PATH).exists() {
            return Self::default();
        }
        Self::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", DEFAULT_CONFIG_PATH, e);
            Self::default()
        })
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every parameter group
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        self.diffusion.validate()?;
        self.convergence.validate()?;
        if self.runs.n_runs < 1 {
            return Err(ConfigError::invalid("n_runs", "must be at least 1"));
        }
        Ok(())
    }
}

fn check_probability(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(name, format!("{} is outside [0, 1]", value)))
    }
}

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.network.n_humans, 1000);
        assert_eq!(config.network.k_out, 3);
        assert_eq!(config.diffusion.alpha, 15);
        assert_eq!(config.diffusion.mu, 0.75);
        assert_eq!(config.diffusion.phi, 1.0);
        assert_eq!(config.network.gamma, 0.1);
        assert_eq!(config.convergence.epsilon, 0.01);
        assert_eq!(config.runs.n_runs, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bot_count_rounds_up() {
        let params = NetworkParams {
            n_humans: 15,
            beta: 0.1,
            ..NetworkParams::default()
        };
        assert_eq!(params.bot_count(), 2);
        assert_eq!(params.agent_count(), 17);
    }

    #[test]
    fn test_rejects_network_too_large_to_address() {
        let params = NetworkParams {
            n_humans: 10,
            beta: 1e30,
            ..NetworkParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::Invalid { name: "beta", .. })
        ));

        let params = NetworkParams {
            n_humans: MAX_AGENTS,
            beta: 1.0,
            ..NetworkParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::Invalid { name: "beta", .. })
        ));

        let params = NetworkParams {
            n_humans: MAX_AGENTS,
            beta: 0.0,
            ..NetworkParams::default()
        };
        assert!(params.validate().is_ok());
        assert_eq!(params.agent_count(), MAX_AGENTS);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SimConfig::from_toml(
            r#"
            [network]
            gamma = 0.01

            [diffusion]
            phi = 5.0
            meme_model = "deceptive"

            [runs]
            seed = 7
            "#,
        )
        .unwrap();

        assert_eq!(config.network.gamma, 0.01);
        assert_eq!(config.network.n_humans, 1000);
        assert_eq!(config.diffusion.phi, 5.0);
        assert_eq!(config.diffusion.meme_model, MemeModel::Deceptive);
        assert_eq!(config.runs.seed, Some(7));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = SimConfig::default();
        config.runs.seed = Some(99);
        let text = config.to_toml().unwrap();
        assert_eq!(SimConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_sample_config_file_parses() {
        let config = SimConfig::from_toml(include_str!("../../../config/idea_market.toml")).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = SimConfig::default();
        config.network.gamma = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "gamma", .. })
        ));

        let mut config = SimConfig::default();
        config.network.n_humans = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "n_humans", .. })
        ));

        let mut config = SimConfig::default();
        config.network.n_humans = 3;
        config.network.beta = 0.0;
        config.network.k_out = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { name: "k_out", .. })
        ));

        let mut config = SimConfig::default();
        config.diffusion.phi = 0.5;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.diffusion.alpha = 0;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default();
        config.runs.n_runs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unreadable_file() {
        let err = SimConfig::load("/nonexistent/idea_market.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

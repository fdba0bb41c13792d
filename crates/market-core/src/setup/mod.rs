//! Network Setup
//!
//! Builds the follower network for a run: a human subgraph and a bot
//! subgraph grown independently, then human -> bot infiltration edges.

pub mod growth;
pub mod targeting;

pub use growth::grow_random_walk;
pub use targeting::{infiltrate, sample_weighted_without_replacement};

use market_events::{Role, TargetingMode};
use rand::Rng;

use crate::components::{AgentId, Network};
use crate::config::{ConfigError, NetworkParams};

/// Validated network recipe
#[derive(Debug, Clone)]
pub struct NetworkGenerator {
    params: NetworkParams,
    targeting: TargetingMode,
}

impl NetworkGenerator {
    /// Fails if the parameters cannot produce a network.
    pub fn new(params: NetworkParams, targeting: TargetingMode) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self { params, targeting })
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub fn targeting(&self) -> TargetingMode {
        self.targeting
    }

    /// Humans take ids `0..n_humans`, bots the ids after them.
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Network {
        let n_humans = self.params.n_humans;
        let n_bots = self.params.bot_count();

        let roles = std::iter::repeat(Role::Human)
            .take(n_humans)
            .chain(std::iter::repeat(Role::Bot).take(n_bots));
        let mut network = Network::with_roles(roles);

        let humans: Vec<AgentId> = (0..n_humans).map(AgentId::from).collect();
        let bots: Vec<AgentId> = (n_humans..n_humans + n_bots).map(AgentId::from).collect();

        grow_random_walk(&mut network, &humans, self.params.p, self.params.k_out, rng);
        grow_random_walk(&mut network, &bots, self.params.p, self.params.k_out, rng);
        infiltrate(
            &mut network,
            &humans,
            &bots,
            self.params.gamma,
            self.targeting,
            rng,
        );

        tracing::debug!(
            humans = n_humans,
            bots = n_bots,
            edges = network.edge_count(),
            targeting = %self.targeting,
            "Generated network"
        );
        network
    }
}

//! Follower Network
//!
//! Arena of agents indexed by `AgentId`. An edge "A follows B" is stored
//! twice: B in `A.following` and A in `B.followers`. Posts flow from B to A.
//! Feeds live in a parallel vector so a post can be pushed into every
//! follower's feed while the poster's follower list is borrowed.

use bevy_ecs::prelude::*;
use market_events::Role;

use super::agent::{Agent, AgentId, Feed, DEFAULT_FEED_CAPACITY};
use super::meme::MemeRef;
use crate::config::{ConfigError, MAX_AGENTS};

/// Resource: the agents of one run
#[derive(Resource, Debug, Clone, Default)]
pub struct Network {
    agents: Vec<Agent>,
    feeds: Vec<Feed>,
    edge_count: usize,
}

impl Network {
    /// Network with one unconnected agent per role, ids in order.
    pub fn with_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let agents: Vec<Agent> = roles
            .into_iter()
            .enumerate()
            .map(|(i, role)| Agent::new(AgentId::from(i), role))
            .collect();
        let feeds = agents
            .iter()
            .map(|_| Feed::new(DEFAULT_FEED_CAPACITY))
            .collect();
        Self {
            agents,
            feeds,
            edge_count: 0,
        }
    }

    /// Build a network from explicit roles and (follower, followee) edges.
    pub fn from_edges(roles: &[Role], edges: &[(u32, u32)]) -> Result<Self, ConfigError> {
        if !roles.iter().any(|r| *r == Role::Human) {
            return Err(ConfigError::invalid("network", "needs at least one human"));
        }
        if roles.len() > MAX_AGENTS {
            return Err(ConfigError::invalid(
                "network",
                format!("more than {} agents", MAX_AGENTS),
            ));
        }
        let mut network = Self::with_roles(roles.iter().copied());
        for &(follower, followee) in edges {
            let (a, b) = (AgentId(follower), AgentId(followee));
            if a.index() >= roles.len() || b.index() >= roles.len() {
                return Err(ConfigError::invalid(
                    "network",
                    format!("edge ({}, {}) references an unknown agent", follower, followee),
                ));
            }
            if a == b {
                return Err(ConfigError::invalid(
                    "network",
                    format!("agent {} cannot follow itself", follower),
                ));
            }
            if !network.follow(a, b) {
                return Err(ConfigError::invalid(
                    "network",
                    format!("duplicate edge ({}, {})", follower, followee),
                ));
            }
        }
        Ok(network)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn agent(&self, id: AgentId) -> &Agent {
        &self.agents[id.index()]
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn role(&self, id: AgentId) -> Role {
        self.agents[id.index()].role
    }

    pub fn humans(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| !a.is_bot())
    }

    pub fn bots(&self) -> impl Iterator<Item = &Agent> {
        self.agents.iter().filter(|a| a.is_bot())
    }

    pub fn human_count(&self) -> usize {
        self.humans().count()
    }

    pub fn bot_count(&self) -> usize {
        self.bots().count()
    }

    pub fn followers(&self, id: AgentId) -> &[AgentId] {
        &self.agents[id.index()].followers
    }

    pub fn following(&self, id: AgentId) -> &[AgentId] {
        &self.agents[id.index()].following
    }

    pub fn follows(&self, follower: AgentId, followee: AgentId) -> bool {
        self.agents[follower.index()].follows(followee)
    }

    /// Add "follower follows followee". Returns false for self-loops and
    /// edges that already exist.
    pub fn follow(&mut self, follower: AgentId, followee: AgentId) -> bool {
        if follower == followee || self.follows(follower, followee) {
            return false;
        }
        self.agents[follower.index()].following.push(followee);
        self.agents[followee.index()].followers.push(follower);
        self.edge_count += 1;
        true
    }

    /// All (follower, followee) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (AgentId, AgentId)> + '_ {
        self.agents
            .iter()
            .flat_map(|a| a.following.iter().map(move |&b| (a.id, b)))
    }

    pub fn feed(&self, id: AgentId) -> &Feed {
        &self.feeds[id.index()]
    }

    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    /// Replace every feed with an empty one of the given depth.
    pub fn init_feeds(&mut self, capacity: usize) {
        for feed in &mut self.feeds {
            *feed = Feed::new(capacity);
        }
    }

    /// Push `meme` into the feed of every follower of `poster`.
    ///
    /// `on_push` sees each receiving agent and the meme its feed evicted.
    pub fn propagate<F>(&mut self, poster: AgentId, meme: &MemeRef, mut on_push: F)
    where
        F: FnMut(&Agent, Option<MemeRef>),
    {
        let agents = &self.agents;
        let feeds = &mut self.feeds;
        for &follower in &agents[poster.index()].followers {
            let evicted = feeds[follower.index()].push(meme.clone());
            on_push(&agents[follower.index()], evicted);
        }
    }

    /// True when every follower list mirrors the following lists.
    pub fn is_consistent(&self) -> bool {
        self.agents.iter().all(|a| {
            a.following
                .iter()
                .all(|b| self.agents[b.index()].followers.contains(&a.id))
                && a.followers
                    .iter()
                    .all(|b| self.agents[b.index()].following.contains(&a.id))
        }) && self.edges().count() == self.edge_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::meme::MemeRegistry;

    fn triangle() -> Network {
        Network::from_edges(
            &[Role::Human, Role::Human, Role::Bot],
            &[(0, 1), (1, 0), (0, 2)],
        )
        .unwrap()
    }

    #[test]
    fn test_follow_is_mirrored() {
        let network = triangle();
        assert_eq!(network.edge_count(), 3);
        assert!(network.follows(AgentId(0), AgentId(2)));
        assert_eq!(network.followers(AgentId(2)), &[AgentId(0)]);
        assert_eq!(network.following(AgentId(0)), &[AgentId(1), AgentId(2)]);
        assert!(network.is_consistent());
        assert_eq!(network.human_count(), 2);
        assert_eq!(network.bot_count(), 1);
    }

    #[test]
    fn test_follow_rejects_loops_and_duplicates() {
        let mut network = triangle();
        assert!(!network.follow(AgentId(1), AgentId(1)));
        assert!(!network.follow(AgentId(0), AgentId(1)));
        assert_eq!(network.edge_count(), 3);
    }

    #[test]
    fn test_from_edges_validation() {
        let roles = [Role::Human, Role::Bot];
        assert!(Network::from_edges(&roles, &[(0, 0)]).is_err());
        assert!(Network::from_edges(&roles, &[(0, 5)]).is_err());
        assert!(Network::from_edges(&roles, &[(0, 1), (0, 1)]).is_err());
        assert!(Network::from_edges(&[Role::Bot], &[]).is_err());
    }

    #[test]
    fn test_propagate_reaches_followers_only() {
        let mut network = triangle();
        network.init_feeds(2);
        let mut registry = MemeRegistry::new();
        let meme = registry.originate(Role::Bot, 0.0, 1.0, 0);

        let mut reached = Vec::new();
        network.propagate(AgentId(2), &meme, |agent, evicted| {
            assert!(evicted.is_none());
            reached.push(agent.id);
        });

        assert_eq!(reached, vec![AgentId(0)]);
        assert_eq!(network.feed(AgentId(0)).len(), 1);
        assert!(network.feed(AgentId(1)).is_empty());
        assert!(network.feed(AgentId(2)).is_empty());
    }

    #[test]
    fn test_propagate_reports_evictions() {
        let mut network = triangle();
        network.init_feeds(1);
        let mut registry = MemeRegistry::new();
        let first = registry.originate(Role::Human, 0.3, 0.3, 0);
        let second = registry.originate(Role::Human, 0.6, 0.6, 1);

        network.propagate(AgentId(1), &first, |_, _| {});
        let mut evicted_ids = Vec::new();
        network.propagate(AgentId(1), &second, |_, evicted| {
            evicted_ids.extend(evicted.map(|m| m.id));
        });

        assert_eq!(evicted_ids, vec![first.id]);
        assert_eq!(network.feed(AgentId(0)).newest().unwrap().id, second.id);
    }
}

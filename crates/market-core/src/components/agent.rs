//! Agent State
//!
//! Agents, their follow relations, and their bounded feeds.

use market_events::Role;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::meme::MemeRef;

/// Feed depth used until a run sets its own
pub const DEFAULT_FEED_CAPACITY: usize = 15;

/// Stable agent identifier; also the agent's index in the network arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for AgentId {
    fn from(index: usize) -> Self {
        AgentId(index as u32)
    }
}

/// An account and its follow relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: AgentId,
    pub role: Role,
    /// Agents that receive this agent's posts
    pub followers: Vec<AgentId>,
    /// Agents whose posts reach this agent's feed
    pub following: Vec<AgentId>,
}

impl Agent {
    pub fn new(id: AgentId, role: Role) -> Self {
        Self {
            id,
            role,
            followers: Vec::new(),
            following: Vec::new(),
        }
    }

    pub fn is_bot(&self) -> bool {
        self.role.is_bot()
    }

    pub fn follows(&self, other: AgentId) -> bool {
        self.following.contains(&other)
    }
}

/// Bounded, newest-first buffer of visible memes
#[derive(Debug, Clone)]
pub struct Feed {
    items: VecDeque<MemeRef>,
    capacity: usize,
}

impl Default for Feed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

impl Feed {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Put `meme` at the front, returning the meme pushed out the back.
    pub fn push(&mut self, meme: MemeRef) -> Option<MemeRef> {
        self.items.push_front(meme);
        if self.items.len() > self.capacity {
            self.items.pop_back()
        } else {
            None
        }
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &MemeRef> {
        self.items.iter()
    }

    pub fn newest(&self) -> Option<&MemeRef> {
        self.items.front()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn quality_sum(&self) -> f64 {
        self.items.iter().map(|m| m.quality).sum()
    }

    pub fn mean_quality(&self) -> Option<f64> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.quality_sum() / self.items.len() as f64)
        }
    }

    /// Memes with zero quality
    pub fn low_quality_count(&self) -> usize {
        self.items.iter().filter(|m| m.is_low_quality()).count()
    }

    /// Pick a meme with probability proportional to its fitness.
    ///
    /// The scan runs newest-first, so the newest meme wins when every fitness
    /// is zero and when rounding leaves the roll past the last boundary.
    pub fn pick_by_fitness<R: Rng>(&self, rng: &mut R) -> Option<&MemeRef> {
        let newest = self.items.front()?;
        let total: f64 = self.items.iter().map(|m| m.fitness).sum();
        if total <= 0.0 {
            return Some(newest);
        }

        let roll = rng.gen::<f64>() * total;
        let mut cumulative = 0.0;
        for meme in &self.items {
            cumulative += meme.fitness;
            if roll < cumulative {
                return Some(meme);
            }
        }
        Some(newest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::meme::MemeRegistry;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn meme(registry: &mut MemeRegistry, quality: f64, fitness: f64) -> MemeRef {
        registry.originate(Role::Human, quality, fitness, 0)
    }

    #[test]
    fn test_feed_is_newest_first_and_bounded() {
        let mut registry = MemeRegistry::new();
        let mut feed = Feed::new(3);
        let memes: Vec<_> = (0..5).map(|i| meme(&mut registry, i as f64 / 10.0, 0.1)).collect();

        assert!(feed.push(memes[0].clone()).is_none());
        assert!(feed.push(memes[1].clone()).is_none());
        assert!(feed.push(memes[2].clone()).is_none());
        let evicted = feed.push(memes[3].clone()).unwrap();
        assert_eq!(evicted.id, memes[0].id);
        let evicted = feed.push(memes[4].clone()).unwrap();
        assert_eq!(evicted.id, memes[1].id);

        assert_eq!(feed.len(), 3);
        let ids: Vec<_> = feed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![memes[4].id, memes[3].id, memes[2].id]);
        assert_eq!(feed.newest().unwrap().id, memes[4].id);
    }

    #[test]
    fn test_mean_quality() {
        let mut registry = MemeRegistry::new();
        let mut feed = Feed::new(5);
        assert!(feed.mean_quality().is_none());

        feed.push(meme(&mut registry, 0.2, 0.2));
        feed.push(meme(&mut registry, 0.6, 0.6));
        feed.push(registry.originate(Role::Bot, 0.0, 1.0, 2));

        let mean = feed.mean_quality().unwrap();
        assert!((mean - 0.8 / 3.0).abs() < 1e-12);
        assert_eq!(feed.low_quality_count(), 1);
    }

    #[test]
    fn test_pick_by_fitness_prefers_fit_memes() {
        let mut registry = MemeRegistry::new();
        let mut feed = Feed::new(2);
        let weak = meme(&mut registry, 0.1, 0.1);
        let strong = meme(&mut registry, 0.9, 0.9);
        feed.push(weak.clone());
        feed.push(strong.clone());

        let mut rng = SmallRng::seed_from_u64(12345);
        let mut strong_count = 0;
        for _ in 0..1000 {
            if feed.pick_by_fitness(&mut rng).unwrap().id == strong.id {
                strong_count += 1;
            }
        }

        // Expect ~900
        assert!(strong_count > 850 && strong_count < 950, "{}", strong_count);
    }

    #[test]
    fn test_pick_by_fitness_zero_total_takes_newest() {
        let mut registry = MemeRegistry::new();
        let mut feed = Feed::new(3);
        feed.push(meme(&mut registry, 0.0, 0.0));
        let newest = meme(&mut registry, 0.0, 0.0);
        feed.push(newest.clone());

        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(feed.pick_by_fitness(&mut rng).unwrap().id, newest.id);
    }

    #[test]
    fn test_pick_from_empty_feed() {
        let feed = Feed::new(3);
        let mut rng = SmallRng::seed_from_u64(7);
        assert!(feed.pick_by_fitness(&mut rng).is_none());
    }
}

//! Network Snapshot Types
//!
//! The finished follower graph of a run, annotated for visualization.
//! Edges point from follower to followee; content flows the other way.

use serde::{Deserialize, Serialize};

use crate::Role;

/// One agent in an exported network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: u32,
    pub role: Role,
    /// Mean quality of the agent's final feed (0.0 for an empty feed)
    pub quality: f64,
    /// Number of memes in the final feed
    pub feed_len: usize,
    pub followers: usize,
    pub following: usize,
}

/// Annotated follower graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub nodes: Vec<NodeSnapshot>,
    /// (follower, followee) pairs
    pub edges: Vec<(u32, u32)>,
}

impl NetworkSnapshot {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn bot_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.role.is_bot()).count()
    }

    /// Mean feed quality over humans with non-empty feeds.
    pub fn human_quality(&self) -> Option<f64> {
        let (sum, count) = self
            .nodes
            .iter()
            .filter(|n| !n.role.is_bot() && n.feed_len > 0)
            .fold((0.0, 0usize), |(s, c), n| (s + n.quality, c + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: u32, role: Role, quality: f64, feed_len: usize) -> NodeSnapshot {
        NodeSnapshot {
            id,
            role,
            quality,
            feed_len,
            followers: 0,
            following: 0,
        }
    }

    #[test]
    fn test_human_quality_skips_bots_and_empty_feeds() {
        let snapshot = NetworkSnapshot {
            nodes: vec![
                node(0, Role::Human, 0.8, 3),
                node(1, Role::Human, 0.0, 0),
                node(2, Role::Human, 0.4, 5),
                node(3, Role::Bot, 0.0, 2),
            ],
            edges: vec![(0, 2), (2, 0), (0, 3)],
        };

        assert_eq!(snapshot.node_count(), 4);
        assert_eq!(snapshot.edge_count(), 3);
        assert_eq!(snapshot.bot_count(), 1);
        let q = snapshot.human_quality().unwrap();
        assert!((q - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_snapshot_has_no_quality() {
        assert!(NetworkSnapshot::default().human_quality().is_none());
    }
}

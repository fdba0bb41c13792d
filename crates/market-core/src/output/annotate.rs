//! Network Annotation
//!
//! Converts a finished run's network into the serializable snapshot used
//! for GML export and JSON output.

use market_events::{NetworkSnapshot, NodeSnapshot};

use crate::components::Network;

/// Snapshot of every agent with its final mean feed quality.
pub fn annotate(network: &Network) -> NetworkSnapshot {
    let nodes = network
        .agents()
        .iter()
        .map(|agent| {
            let feed = network.feed(agent.id);
            NodeSnapshot {
                id: agent.id.0,
                role: agent.role,
                quality: feed.mean_quality().unwrap_or(0.0),
                feed_len: feed.len(),
                followers: agent.followers.len(),
                following: agent.following.len(),
            }
        })
        .collect();
    let edges = network.edges().map(|(a, b)| (a.0, b.0)).collect();
    NetworkSnapshot { nodes, edges }
}

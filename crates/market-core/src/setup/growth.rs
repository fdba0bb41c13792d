//! Random-Walk Growth
//!
//! Small-world subgraph generator. Nodes join one at a time; each follows a
//! random existing node and then, for each remaining follow, either one of
//! that node's followees (closing a triad, probability `p`) or another
//! random existing node.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::components::{AgentId, Network};

/// Connect `members` (already present in `network`) with `k_out` follows
/// per node. Groups of at most `k_out + 1` become a full clique.
pub fn grow_random_walk<R: Rng>(
    network: &mut Network,
    members: &[AgentId],
    p: f64,
    k_out: usize,
    rng: &mut R,
) {
    if members.len() <= k_out + 1 {
        connect_clique(network, members);
        return;
    }

    connect_clique(network, &members[..k_out]);

    let mut friends: Vec<AgentId> = Vec::with_capacity(k_out);
    for joined in k_out..members.len() {
        let newcomer = members[joined];
        let existing = &members[..joined];

        friends.clear();
        let target = existing[rng.gen_range(0..existing.len())];
        friends.push(target);

        let clustered = (0..k_out - 1).filter(|_| rng.gen::<f64>() < p).count();
        let neighbors: Vec<AgentId> = network.following(target).to_vec();
        friends.extend(neighbors.choose_multiple(rng, clustered).copied());

        // Fill the rest uniformly; `existing` has at least k_out distinct nodes
        while friends.len() < k_out {
            let candidate = existing[rng.gen_range(0..existing.len())];
            if !friends.contains(&candidate) {
                friends.push(candidate);
            }
        }

        for &friend in &friends {
            network.follow(newcomer, friend);
        }
    }
}

fn connect_clique(network: &mut Network, members: &[AgentId]) {
    for &a in members {
        for &b in members {
            if a != b {
                network.follow(a, b);
            }
        }
    }
}

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::mesh::{Link, NodeId};

use super::filter::FilteredView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HopDepth {
    Limited(u32),
    Unlimited,
}

impl HopDepth {
    pub const CHOICES: [HopDepth; 6] = [
        HopDepth::Limited(1),
        HopDepth::Limited(2),
        HopDepth::Limited(3),
        HopDepth::Limited(4),
        HopDepth::Limited(5),
        HopDepth::Unlimited,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("unlimited") || raw.eq_ignore_ascii_case("all") {
            return Some(Self::Unlimited);
        }
        raw.parse().ok().map(Self::Limited)
    }
}

impl Default for HopDepth {
    fn default() -> Self {
        Self::Limited(1)
    }
}

impl fmt::Display for HopDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(1) => f.write_str("1 hop"),
            Self::Limited(hops) => write!(f, "{hops} hops"),
            Self::Unlimited => f.write_str("Unlimited"),
        }
    }
}

/// Undirected breadth-first search over `links`, stopping after `max_hops`
/// frontier expansions. The start node is always part of the result.
pub fn nodes_within_hops(links: &[Link], start: NodeId, max_hops: u32) -> HashSet<NodeId> {
    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for link in links {
        adjacency
            .entry(link.from_node_id)
            .or_default()
            .push(link.to_node_id);
        adjacency
            .entry(link.to_node_id)
            .or_default()
            .push(link.from_node_id);
    }

    let mut visited = HashSet::from([start]);
    let mut frontier = vec![start];
    let mut hops = 0u32;

    while !frontier.is_empty() && hops < max_hops {
        let mut next_frontier = Vec::new();
        for node_id in &frontier {
            let Some(neighbors) = adjacency.get(node_id) else {
                continue;
            };

            for &next in neighbors {
                if visited.insert(next) {
                    next_frontier.push(next);
                }
            }
        }
        frontier = next_frontier;
        hops += 1;
    }

    visited
}

/// Node ids to draw around `selected`.
///
/// Traversal runs over every loaded link (`all_links`), not just the visible
/// ones, so hop counts follow the real topology. The result is then narrowed
/// to the filtered node set: hop limiting never adds nodes.
pub fn reachable_subgraph(
    filtered: &FilteredView,
    all_links: &[Link],
    selected: NodeId,
    depth: HopDepth,
) -> HashSet<NodeId> {
    let filtered_ids = filtered.node_ids();

    match depth {
        HopDepth::Unlimited => filtered_ids,
        HopDepth::Limited(max_hops) => nodes_within_hops(all_links, selected, max_hops)
            .into_iter()
            .filter(|node_id| filtered_ids.contains(node_id))
            .collect(),
    }
}

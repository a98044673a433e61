use std::collections::{BTreeSet, HashMap};

use super::model::{Link, Node, NodeId};
use super::parse::LocationsPayload;

/// Unfiltered node and link collections for the current session.
///
/// Replaced wholesale on every reload. Traceroute and packet links between
/// the same pair are kept as separate records.
#[derive(Clone, Debug, Default)]
pub struct EntityStore {
    nodes: Vec<Node>,
    links: Vec<Link>,
    index_by_id: HashMap<NodeId, usize>,
}

impl EntityStore {
    pub fn new(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            index_by_id.entry(node.node_id).or_insert(index);
        }

        Self {
            nodes,
            links,
            index_by_id,
        }
    }

    pub fn from_payload(payload: LocationsPayload) -> Self {
        let mut links = payload.traceroute_links;
        links.extend(payload.packet_links);
        Self::new(payload.nodes, links)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.index_by_id
            .get(&node_id)
            .and_then(|&index| self.nodes.get(index))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty()
    }

    /// Distinct primary channels, sorted. Used when no channel endpoint exists.
    pub fn channels(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter_map(|node| node.primary_channel.clone())
            .filter(|channel| !channel.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

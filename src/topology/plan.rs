use crate::mesh::{Link, Node, NodeId};

use super::hops::HopDepth;
use super::precision::Precision;

#[derive(Clone, Debug, PartialEq)]
pub struct PlannedLink {
    pub link: Link,
    /// The link touches the selected node.
    pub emphasized: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionDetail {
    pub node: Node,
    pub precision: Precision,
    pub hop_depth: HopDepth,
}

/// Everything a renderer needs for one frame. Both renderers consume the same
/// plan, so neither applies filtering of its own.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderPlan {
    pub generated_at: f64,
    /// Filtered nodes, narrowed to the hop-bounded subgraph when selected.
    pub nodes: Vec<Node>,
    /// Links of the enabled types whose endpoints are both in `nodes`.
    pub links: Vec<PlannedLink>,
    pub selected_id: Option<NodeId>,
    pub selection: Option<SelectionDetail>,
    pub fit_viewport: bool,
    pub total_node_count: usize,
    pub filtered_node_count: usize,
}

impl RenderPlan {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.node_id == node_id)
    }

    /// Display name for a link endpoint, falling back to `!hex`.
    pub fn endpoint_name(&self, node_id: NodeId) -> String {
        self.node(node_id)
            .map(Node::title)
            .unwrap_or_else(|| crate::util::node_hex(node_id))
    }

    pub fn latest_timestamp(&self) -> Option<f64> {
        self.nodes
            .iter()
            .filter_map(Node::reported_at)
            .max_by(f64::total_cmp)
    }

    pub fn links_touching(&self, node_id: NodeId) -> impl Iterator<Item = &PlannedLink> {
        self.links
            .iter()
            .filter(move |planned| planned.link.touches(node_id))
    }
}

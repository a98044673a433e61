mod filter;
mod hops;
mod plan;
mod precision;
mod search;
mod state;
mod view;

pub use filter::FilterCriteria;
pub use hops::HopDepth;
pub use plan::RenderPlan;
pub use precision::{Precision, PrecisionLevel};
pub use search::{search_nodes, sorted_by_name};
pub use state::{Command, LinkToggles, ViewState};
pub use view::TopologyView;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::mesh::{EntityStore, Link, LinkType, Node, NodeId};

    pub fn node(node_id: NodeId) -> Node {
        Node {
            node_id,
            display_name: format!("Node {node_id}"),
            short_name: None,
            role: None,
            latitude: Some(40.0 + f64::from(node_id) * 0.01),
            longitude: Some(-105.0 - f64::from(node_id) * 0.01),
            altitude: None,
            precision_meters: None,
            timestamp: None,
            hw_model: None,
            primary_channel: None,
        }
    }

    pub fn link(from: NodeId, to: NodeId) -> Link {
        Link {
            from_node_id: from,
            to_node_id: to,
            link_type: LinkType::Traceroute,
            success_rate: 90.0,
            total_hops_seen: Some(1),
            avg_snr: None,
            avg_rssi: None,
            last_seen_str: None,
        }
    }

    pub fn packet_link(from: NodeId, to: NodeId) -> Link {
        Link {
            link_type: LinkType::Packet,
            ..link(from, to)
        }
    }

    pub fn store(nodes: Vec<Node>, links: Vec<Link>) -> EntityStore {
        EntityStore::new(nodes, links)
    }
}

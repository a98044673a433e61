use std::collections::HashSet;

use crate::mesh::{EntityStore, Link, LinkType, Node, NodeId, Role};

/// Filter values derived from the controls on every apply. Never persisted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCriteria {
    /// `Some(Role::Unknown)` selects nodes with no role or an unknown one.
    pub role: Option<Role>,
    pub channel: Option<String>,
    pub start: Option<f64>,
    pub end: Option<f64>,
    /// Links need at least this many contacts; values of 0 or 1 disable it.
    pub min_contacts: u64,
}

impl FilterCriteria {
    pub fn has_time_window(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    fn within_window(&self, timestamp: f64) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

/// Output of the filter pipeline and the sole input to rendering and to the
/// hop-bounded subgraph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilteredView {
    pub nodes: Vec<Node>,
    pub traceroute_links: Vec<Link>,
    pub packet_links: Vec<Link>,
}

impl FilteredView {
    pub fn node_ids(&self) -> HashSet<NodeId> {
        self.nodes.iter().map(|node| node.node_id).collect()
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.traceroute_links.iter().chain(self.packet_links.iter())
    }
}

#[cfg(test)]
impl FilteredView {
    pub fn link_count(&self) -> usize {
        self.traceroute_links.len() + self.packet_links.len()
    }
}

pub fn apply_filters(store: &EntityStore, criteria: &FilterCriteria) -> FilteredView {
    let nodes = store
        .nodes()
        .iter()
        .filter(|node| role_matches(node, criteria.role.as_ref()))
        .filter(|node| {
            criteria
                .channel
                .as_deref()
                .is_none_or(|channel| node.primary_channel.as_deref() == Some(channel))
        })
        .filter(|node| {
            !criteria.has_time_window()
                || node
                    .timestamp
                    .is_some_and(|timestamp| criteria.within_window(timestamp))
        })
        .cloned()
        .collect::<Vec<_>>();

    // Node visibility decides link visibility, so endpoints are checked only
    // against the nodes that survived the passes above.
    let visible_ids = nodes.iter().map(|node| node.node_id).collect::<HashSet<_>>();

    let (traceroute_links, packet_links): (Vec<_>, Vec<_>) = store
        .links()
        .iter()
        .filter(|link| meets_contact_threshold(link, criteria.min_contacts))
        .filter(|link| {
            visible_ids.contains(&link.from_node_id) && visible_ids.contains(&link.to_node_id)
        })
        .filter(|link| link_within_window(link, criteria))
        .cloned()
        .partition(|link| link.link_type == LinkType::Traceroute);

    FilteredView {
        nodes,
        traceroute_links,
        packet_links,
    }
}

fn role_matches(node: &Node, role: Option<&Role>) -> bool {
    match role {
        None => true,
        Some(Role::Unknown) => node.has_unknown_role(),
        Some(role) => node.role.as_ref() == Some(role),
    }
}

fn meets_contact_threshold(link: &Link, min_contacts: u64) -> bool {
    if min_contacts <= 1 {
        return true;
    }
    link.total_hops_seen
        .is_some_and(|contacts| contacts >= min_contacts)
}

fn link_within_window(link: &Link, criteria: &FilterCriteria) -> bool {
    if !criteria.has_time_window() {
        return true;
    }
    link.last_seen()
        .is_none_or(|last_seen| criteria.within_window(last_seen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::test_support::{link, node, packet_link, store};

    const NOW: f64 = 1_700_000_000.0;

    fn ids(view: &FilteredView) -> Vec<NodeId> {
        let mut ids = view.nodes.iter().map(|node| node.node_id).collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    fn assert_endpoints_visible(view: &FilteredView) {
        let visible = view.node_ids();
        for link in view.links() {
            assert!(visible.contains(&link.from_node_id), "{link:?}");
            assert!(visible.contains(&link.to_node_id), "{link:?}");
        }
    }

    #[test]
    fn unknown_role_matches_missing_and_unknown_spellings() {
        let mut missing = node(1);
        missing.role = None;
        let mut upper = node(2);
        upper.role = Some(Role::from("UNKNOWN"));
        let mut lower = node(3);
        lower.role = Some(Role::from("Unknown"));
        let mut router = node(4);
        router.role = Some(Role::Router);
        let mut blank = node(5);
        blank.role = Some(Role::from(""));

        let criteria = FilterCriteria {
            role: Some(Role::Unknown),
            ..FilterCriteria::default()
        };
        let nodes = vec![missing, upper, lower, router, blank];
        let view = apply_filters(&store(nodes, vec![]), &criteria);
        assert_eq!(ids(&view), vec![1, 2, 3, 5]);
    }

    #[test]
    fn exact_role_and_channel_filters_compose() {
        let mut a = node(1);
        a.role = Some(Role::Router);
        a.primary_channel = Some("LongFast".to_owned());
        let mut b = node(2);
        b.role = Some(Role::Router);
        b.primary_channel = Some("MediumFast".to_owned());
        let mut c = node(3);
        c.role = Some(Role::Client);
        c.primary_channel = Some("LongFast".to_owned());

        let criteria = FilterCriteria {
            role: Some(Role::Router),
            channel: Some("LongFast".to_owned()),
            ..FilterCriteria::default()
        };
        let view = apply_filters(&store(vec![a, b, c], vec![]), &criteria);
        assert_eq!(ids(&view), vec![1]);
    }

    #[test]
    fn time_bounds_are_independent_and_inclusive() {
        let nodes = (1..=4)
            .map(|id| {
                let mut n = node(id);
                n.timestamp = Some(NOW - f64::from(id) * 3600.0);
                n
            })
            .collect::<Vec<_>>();
        let mut undated = node(9);
        undated.timestamp = None;
        let mut all = nodes;
        all.push(undated);
        let store = store(all, vec![]);

        let start_only = FilterCriteria {
            start: Some(NOW - 2.0 * 3600.0),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&store, &start_only)), vec![1, 2]);

        let end_only = FilterCriteria {
            end: Some(NOW - 3.0 * 3600.0),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&store, &end_only)), vec![3, 4]);

        let both = FilterCriteria {
            start: Some(NOW - 3.0 * 3600.0),
            end: Some(NOW - 2.0 * 3600.0),
            ..FilterCriteria::default()
        };
        assert_eq!(ids(&apply_filters(&store, &both)), vec![2, 3]);

        assert_eq!(
            ids(&apply_filters(&store, &FilterCriteria::default())),
            vec![1, 2, 3, 4, 9]
        );
    }

    #[test]
    fn contact_threshold_drops_low_and_missing_counts() {
        let mut low = link(1, 2);
        low.total_hops_seen = Some(3);
        let mut missing = link(2, 3);
        missing.total_hops_seen = None;
        let mut enough = link(1, 3);
        enough.total_hops_seen = Some(5);

        let store = store(vec![node(1), node(2), node(3)], vec![low, missing, enough]);
        let criteria = FilterCriteria {
            min_contacts: 5,
            ..FilterCriteria::default()
        };
        let view = apply_filters(&store, &criteria);
        assert_eq!(view.traceroute_links.len(), 1);
        assert_eq!(view.traceroute_links[0].total_hops_seen, Some(5));

        let disabled = FilterCriteria {
            min_contacts: 1,
            ..FilterCriteria::default()
        };
        assert_eq!(apply_filters(&store, &disabled).traceroute_links.len(), 3);
    }

    #[test]
    fn links_to_filtered_out_nodes_are_dropped() {
        let mut a = node(1);
        a.role = Some(Role::Router);
        a.timestamp = Some(NOW);
        let mut b = node(2);
        b.role = Some(Role::Client);
        b.timestamp = Some(NOW - 30.0 * 3600.0);
        let mut a_b = link(1, 2);
        a_b.success_rate = 60.0;

        let store = store(vec![a, b], vec![a_b]);
        let criteria = FilterCriteria {
            role: Some(Role::Router),
            ..FilterCriteria::default()
        };
        let view = apply_filters(&store, &criteria);
        assert_eq!(ids(&view), vec![1]);
        assert_eq!(view.link_count(), 0);
    }

    #[test]
    fn links_referencing_absent_nodes_are_silently_excluded() {
        let store = store(vec![node(1), node(2)], vec![link(1, 2), link(1, 99)]);
        let view = apply_filters(&store, &FilterCriteria::default());
        assert_eq!(view.link_count(), 1);
        assert_endpoints_visible(&view);
    }

    #[test]
    fn link_window_uses_last_seen_and_keeps_unparseable() {
        let mut nodes = vec![node(1), node(2)];
        for n in &mut nodes {
            n.timestamp = Some(NOW);
        }
        let mut old = link(1, 2);
        old.last_seen_str = Some("2000-01-01T00:00:00Z".to_owned());
        let mut undated = link(2, 1);
        undated.last_seen_str = None;
        let mut garbage = packet_link(1, 2);
        garbage.last_seen_str = Some("last tuesday".to_owned());

        let store = store(nodes, vec![old, undated, garbage]);
        let criteria = FilterCriteria {
            start: Some(NOW - 3600.0),
            ..FilterCriteria::default()
        };
        let view = apply_filters(&store, &criteria);
        assert_eq!(view.traceroute_links.len(), 1);
        assert_eq!(view.traceroute_links[0].from_node_id, 2);
        assert_eq!(view.packet_links.len(), 1);
    }

    #[test]
    fn output_is_partitioned_by_link_type() {
        let store = store(
            vec![node(1), node(2)],
            vec![link(1, 2), packet_link(1, 2), packet_link(2, 1)],
        );
        let view = apply_filters(&store, &FilterCriteria::default());
        assert_eq!(view.traceroute_links.len(), 1);
        assert_eq!(view.packet_links.len(), 2);
        assert!(view.packet_links.iter().all(|link| link.link_type == LinkType::Packet));
    }

    #[test]
    fn endpoint_invariant_holds_across_criteria_combinations() {
        let roles = [Role::Router, Role::Client, Role::Repeater];
        let channels = ["LongFast", "MediumFast"];
        let nodes = (1..=12u32)
            .map(|id| {
                let mut n = node(id);
                n.role = (id % 4 != 0).then(|| roles[id as usize % roles.len()].clone());
                n.primary_channel = Some(channels[id as usize % 2].to_owned());
                n.timestamp = Some(NOW - f64::from(id) * 3600.0 * 5.0);
                n
            })
            .collect::<Vec<_>>();
        let links = (1..=12u32)
            .flat_map(|id| {
                let mut forward = link(id, id % 12 + 1);
                forward.total_hops_seen = Some(u64::from(id));
                let mut skip = packet_link(id, (id + 4) % 14);
                skip.total_hops_seen = (id % 3 != 0).then_some(u64::from(id) * 2);
                [forward, skip]
            })
            .collect::<Vec<_>>();
        let store = store(nodes, links);

        let role_options = [None, Some(Role::Router), Some(Role::Unknown), Some(Role::Sensor)];
        let channel_options = [None, Some("LongFast".to_owned())];
        let window_options = [
            (None, None),
            (Some(NOW - 30.0 * 3600.0), None),
            (None, Some(NOW - 20.0 * 3600.0)),
        ];
        let contact_options = [0, 1, 4, 10];

        for role in &role_options {
            for channel in &channel_options {
                for (start, end) in window_options {
                    for min_contacts in contact_options {
                        let criteria = FilterCriteria {
                            role: role.clone(),
                            channel: channel.clone(),
                            start,
                            end,
                            min_contacts,
                        };
                        assert_endpoints_visible(&apply_filters(&store, &criteria));
                    }
                }
            }
        }
    }
}

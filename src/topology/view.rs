use std::collections::HashSet;

use tracing::debug;

use crate::mesh::{EntityStore, Node, NodeId};

use super::filter::{FilterCriteria, FilteredView, apply_filters};
use super::hops::{HopDepth, reachable_subgraph};
use super::plan::{PlannedLink, RenderPlan, SelectionDetail};
use super::precision::estimate;
use super::state::{Command, Selection, ViewState};

/// The pipeline stage a command re-entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Filter,
    Subgraph,
    Redraw,
    Unchanged,
}

impl Stage {
    pub fn needs_render(self) -> bool {
        self != Self::Unchanged
    }
}

/// Selection state machine over the entity store and filter pipeline.
///
/// Filter output and the hop-bounded subgraph are cached and recomputed only
/// from the stage a command touches; [`TopologyView::plan`] is cheap.
pub struct TopologyView {
    store: EntityStore,
    criteria: FilterCriteria,
    state: ViewState,
    filtered: FilteredView,
    subgraph: Option<HashSet<NodeId>>,
}

impl TopologyView {
    pub fn new(store: EntityStore, criteria: FilterCriteria, state: ViewState) -> Self {
        let mut view = Self {
            store,
            criteria,
            state,
            filtered: FilteredView::default(),
            subgraph: None,
        };
        view.refilter();
        view
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn filtered(&self) -> &FilteredView {
        &self.filtered
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.state
            .selection
            .node_id()
            .and_then(|node_id| self.store.node(node_id))
    }

    pub fn dispatch(&mut self, command: Command) -> Stage {
        debug!(?command, "dispatching view command");

        match command {
            Command::Loaded(store) => {
                self.store = store;
                self.refilter();
                Stage::Filter
            }
            Command::SetFilters(criteria) => self.set_criteria(criteria),
            Command::SetRoleFilter(role) => {
                let criteria = FilterCriteria {
                    role,
                    ..self.criteria.clone()
                };
                self.set_criteria(criteria)
            }
            Command::SetChannelFilter(channel) => {
                let criteria = FilterCriteria {
                    channel,
                    ..self.criteria.clone()
                };
                self.set_criteria(criteria)
            }
            Command::SetTimeWindow { start, end } => {
                let criteria = FilterCriteria {
                    start,
                    end,
                    ..self.criteria.clone()
                };
                self.set_criteria(criteria)
            }
            Command::SetMinContacts(min_contacts) => {
                let criteria = FilterCriteria {
                    min_contacts,
                    ..self.criteria.clone()
                };
                self.set_criteria(criteria)
            }
            Command::SelectNode(node_id) => {
                if self.store.node(node_id).is_none() {
                    debug!(node_id, "ignoring selection of unknown node");
                    return Stage::Unchanged;
                }
                self.state.selection = Selection::Selected(node_id);
                self.refresh_subgraph();
                Stage::Subgraph
            }
            Command::ClearSelection => {
                self.state.selection = Selection::Unselected;
                self.state.hop_depth = HopDepth::default();
                self.subgraph = None;
                Stage::Redraw
            }
            Command::SetHopDepth(depth) => {
                if self.state.hop_depth == depth {
                    return Stage::Unchanged;
                }
                self.state.hop_depth = depth;
                if self.state.selection == Selection::Unselected {
                    return Stage::Unchanged;
                }
                self.refresh_subgraph();
                Stage::Subgraph
            }
            Command::SetLinkVisibility(link_type, visible) => {
                if self.state.set_link_visibility(link_type, visible) {
                    Stage::Redraw
                } else {
                    Stage::Unchanged
                }
            }
        }
    }

    /// Records that the viewport was fitted; later renders keep the view.
    pub fn mark_displayed(&mut self) {
        self.state.first_display = false;
    }

    pub fn plan(&self, now: f64) -> RenderPlan {
        let selected_id = self.state.selection.node_id();

        let nodes = match &self.subgraph {
            Some(visible) => self
                .filtered
                .nodes
                .iter()
                .filter(|node| visible.contains(&node.node_id))
                .cloned()
                .collect::<Vec<_>>(),
            None => self.filtered.nodes.clone(),
        };
        let visible_ids = nodes.iter().map(|node| node.node_id).collect::<HashSet<_>>();

        // At depth one only the selected node's own links are drawn.
        let focus_only = selected_id.filter(|_| self.state.hop_depth == HopDepth::Limited(1));

        let links = self
            .filtered
            .links()
            .filter(|link| self.state.links.shows(link.link_type))
            .filter(|link| {
                visible_ids.contains(&link.from_node_id) && visible_ids.contains(&link.to_node_id)
            })
            .filter(|link| focus_only.is_none_or(|focus| link.touches(focus)))
            .map(|link| PlannedLink {
                link: link.clone(),
                emphasized: selected_id.is_some_and(|selected| link.touches(selected)),
            })
            .collect();

        let selection = self.selected_node().map(|node| SelectionDetail {
            node: node.clone(),
            precision: estimate(Some(node), now),
            hop_depth: self.state.hop_depth,
        });

        RenderPlan {
            generated_at: now,
            nodes,
            links,
            selected_id,
            selection,
            fit_viewport: self.state.first_display,
            total_node_count: self.store.nodes().len(),
            filtered_node_count: self.filtered.nodes.len(),
        }
    }

    fn set_criteria(&mut self, criteria: FilterCriteria) -> Stage {
        if criteria == self.criteria {
            return Stage::Unchanged;
        }
        self.criteria = criteria;
        self.refilter();
        Stage::Filter
    }

    fn refilter(&mut self) {
        self.filtered = apply_filters(&self.store, &self.criteria);
        self.refresh_subgraph();
    }

    fn refresh_subgraph(&mut self) {
        self.subgraph = self.state.selection.node_id().map(|selected| {
            reachable_subgraph(
                &self.filtered,
                self.store.links(),
                selected,
                self.state.hop_depth,
            )
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{LinkType, Role};
    use crate::topology::test_support::{link, node, packet_link, store};

    const NOW: f64 = 1_700_000_000.0;

    fn chain_view() -> TopologyView {
        // 1 - 2 - 3 - 4, plus a packet link 1 - 3 and an isolated 5.
        let nodes = (1..=5).map(node).collect();
        let links = vec![link(1, 2), link(2, 3), link(3, 4), packet_link(1, 3)];
        TopologyView::new(store(nodes, links), FilterCriteria::default(), ViewState::default())
    }

    fn plan_ids(plan: &RenderPlan) -> Vec<NodeId> {
        let mut ids = plan.nodes.iter().map(|node| node.node_id).collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn unselected_plan_is_the_filtered_view() {
        let view = chain_view();
        let plan = view.plan(NOW);
        assert_eq!(plan_ids(&plan), vec![1, 2, 3, 4, 5]);
        // Packet links are hidden by default.
        assert_eq!(plan.link_count(), 3);
        assert!(plan.selection.is_none());
        assert!(plan.fit_viewport);
    }

    #[test]
    fn selecting_limits_to_the_hop_subgraph() {
        let mut view = chain_view();
        assert_eq!(view.dispatch(Command::SelectNode(2)), Stage::Subgraph);

        let plan = view.plan(NOW);
        assert_eq!(plan_ids(&plan), vec![1, 2, 3]);
        assert_eq!(plan.selected_id, Some(2));
        assert!(plan.links.iter().all(|planned| planned.emphasized));
        assert_eq!(plan.link_count(), 2);

        let detail = plan.selection.expect("selection detail");
        assert_eq!(detail.node.node_id, 2);
        assert_eq!(detail.hop_depth, HopDepth::Limited(1));
    }

    #[test]
    fn hop_traversal_uses_hidden_link_types() {
        let mut view = chain_view();
        view.dispatch(Command::SelectNode(1));
        // 1 reaches 3 over the packet link even though packet links are hidden.
        assert_eq!(plan_ids(&view.plan(NOW)), vec![1, 2, 3]);
    }

    #[test]
    fn deeper_hops_draw_every_link_inside_the_subgraph() {
        let mut view = chain_view();
        view.dispatch(Command::SelectNode(2));
        assert_eq!(view.dispatch(Command::SetHopDepth(HopDepth::Limited(2))), Stage::Subgraph);

        let plan = view.plan(NOW);
        assert_eq!(plan_ids(&plan), vec![1, 2, 3, 4]);
        assert_eq!(plan.link_count(), 3);
        let emphasized = plan.links.iter().filter(|planned| planned.emphasized).count();
        assert_eq!(emphasized, 2);
    }

    #[test]
    fn hop_depth_change_without_selection_renders_nothing_new() {
        let mut view = chain_view();
        assert_eq!(view.dispatch(Command::SetHopDepth(HopDepth::Limited(3))), Stage::Unchanged);
        assert_eq!(view.state().hop_depth, HopDepth::Limited(3));
        assert_eq!(plan_ids(&view.plan(NOW)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn clearing_restores_pre_selection_counts_and_resets_depth() {
        let mut view = chain_view();
        view.dispatch(Command::SetLinkVisibility(LinkType::Packet, true));
        let before = view.plan(NOW);

        view.dispatch(Command::SelectNode(4));
        view.dispatch(Command::SetHopDepth(HopDepth::Limited(2)));
        assert_ne!(view.plan(NOW).node_count(), before.node_count());

        assert_eq!(view.dispatch(Command::ClearSelection), Stage::Redraw);
        let after = view.plan(NOW);
        assert_eq!(after.node_count(), before.node_count());
        assert_eq!(after.link_count(), before.link_count());
        assert_eq!(view.state().hop_depth, HopDepth::Limited(1));
        assert_eq!(view.state().selection, Selection::Unselected);
    }

    #[test]
    fn reselection_replaces_the_previous_subgraph() {
        let mut view = chain_view();
        view.dispatch(Command::SelectNode(1));
        view.dispatch(Command::SelectNode(5));

        let plan = view.plan(NOW);
        assert_eq!(plan_ids(&plan), vec![5]);
        assert_eq!(plan.link_count(), 0);
        assert_eq!(plan.selection.map(|detail| detail.node.node_id), Some(5));
    }

    #[test]
    fn unknown_node_selection_is_ignored() {
        let mut view = chain_view();
        assert_eq!(view.dispatch(Command::SelectNode(99)), Stage::Unchanged);
        assert_eq!(view.state().selection, Selection::Unselected);
    }

    #[test]
    fn link_toggle_respects_the_hop_subgraph_while_selected() {
        let mut view = chain_view();
        view.dispatch(Command::SelectNode(1));
        assert_eq!(
            view.dispatch(Command::SetLinkVisibility(LinkType::Packet, true)),
            Stage::Redraw
        );
        let plan = view.plan(NOW);
        assert_eq!(plan.link_count(), 2);
        assert_eq!(
            view.dispatch(Command::SetLinkVisibility(LinkType::Packet, true)),
            Stage::Unchanged
        );

        view.dispatch(Command::SetLinkVisibility(LinkType::Traceroute, false));
        let plan = view.plan(NOW);
        assert_eq!(plan.link_count(), 1);
        assert_eq!(plan.links[0].link.link_type, LinkType::Packet);
    }

    #[test]
    fn filter_changes_keep_selection_and_narrow_the_subgraph() {
        let mut nodes = (1..=3).map(node).collect::<Vec<_>>();
        nodes[0].role = Some(Role::Router);
        nodes[1].role = Some(Role::Client);
        nodes[2].role = Some(Role::Router);
        let mut view = TopologyView::new(
            store(nodes, vec![link(1, 2), link(2, 3)]),
            FilterCriteria::default(),
            ViewState::default(),
        );
        view.dispatch(Command::SelectNode(1));
        view.dispatch(Command::SetHopDepth(HopDepth::Unlimited));

        assert_eq!(view.dispatch(Command::SetRoleFilter(Some(Role::Router))), Stage::Filter);
        let plan = view.plan(NOW);
        assert_eq!(plan_ids(&plan), vec![1, 3]);
        assert_eq!(plan.link_count(), 0);
        assert_eq!(plan.selected_id, Some(1));
        assert_eq!(
            view.dispatch(Command::SetRoleFilter(Some(Role::Router))),
            Stage::Unchanged
        );
    }

    #[test]
    fn reload_replaces_store_but_keeps_view_state() {
        let mut view = chain_view();
        view.dispatch(Command::SelectNode(2));
        view.mark_displayed();

        let stage = view.dispatch(Command::Loaded(store(
            vec![node(2), node(6)],
            vec![link(2, 6)],
        )));
        assert_eq!(stage, Stage::Filter);

        let plan = view.plan(NOW);
        assert_eq!(plan_ids(&plan), vec![2, 6]);
        assert_eq!(plan.total_node_count, 2);
        assert!(!plan.fit_viewport);
        assert_eq!(view.state().selection, Selection::Selected(2));
    }

    #[test]
    fn router_filter_scenario_hides_the_client_and_its_link() {
        let mut a = node(1);
        a.role = Some(Role::Router);
        a.timestamp = Some(NOW);
        let mut b = node(2);
        b.role = Some(Role::Client);
        b.timestamp = Some(NOW - 30.0 * 3600.0);
        let mut a_b = link(1, 2);
        a_b.success_rate = 60.0;

        let mut view = TopologyView::new(
            store(vec![a, b], vec![a_b]),
            FilterCriteria::default(),
            ViewState::default(),
        );
        assert_eq!(view.plan(NOW).link_count(), 1);

        view.dispatch(Command::SetRoleFilter(Some(Role::Router)));
        let plan = view.plan(NOW);
        assert_eq!(plan_ids(&plan), vec![1]);
        assert_eq!(plan.link_count(), 0);
    }
}

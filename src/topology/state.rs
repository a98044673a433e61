use crate::mesh::{EntityStore, LinkType, NodeId, Role};

use super::filter::FilterCriteria;
use super::hops::HopDepth;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(NodeId),
}

impl Selection {
    pub fn node_id(self) -> Option<NodeId> {
        match self {
            Self::Unselected => None,
            Self::Selected(node_id) => Some(node_id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkToggles {
    pub traceroute: bool,
    pub packet: bool,
}

impl LinkToggles {
    pub fn shows(self, link_type: LinkType) -> bool {
        match link_type {
            LinkType::Traceroute => self.traceroute,
            LinkType::Packet => self.packet,
        }
    }

    fn set(&mut self, link_type: LinkType, visible: bool) {
        match link_type {
            LinkType::Traceroute => self.traceroute = visible,
            LinkType::Packet => self.packet = visible,
        }
    }
}

impl Default for LinkToggles {
    fn default() -> Self {
        Self {
            traceroute: true,
            packet: false,
        }
    }
}

/// Process-lifetime view state. Survives reloads and filter changes; only an
/// explicit clear resets the selection.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    /// Lookup key only; the node may disappear on reload or filter change.
    pub selection: Selection,
    pub hop_depth: HopDepth,
    pub links: LinkToggles,
    /// True until the first interactive render has fitted the viewport.
    pub first_display: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            selection: Selection::Unselected,
            hop_depth: HopDepth::default(),
            links: LinkToggles::default(),
            first_display: true,
        }
    }
}

impl ViewState {
    pub(super) fn set_link_visibility(&mut self, link_type: LinkType, visible: bool) -> bool {
        if self.links.shows(link_type) == visible {
            return false;
        }
        self.links.set(link_type, visible);
        true
    }
}

/// Typed UI events consumed by [`super::TopologyView::dispatch`].
#[derive(Clone, Debug)]
pub enum Command {
    Loaded(EntityStore),
    SetFilters(FilterCriteria),
    SetRoleFilter(Option<Role>),
    SetChannelFilter(Option<String>),
    SetTimeWindow { start: Option<f64>, end: Option<f64> },
    SetMinContacts(u64),
    SelectNode(NodeId),
    ClearSelection,
    SetHopDepth(HopDepth),
    SetLinkVisibility(LinkType, bool),
}

use std::fmt;

use crate::mesh::NodeId;
use crate::topology::{Precision, RenderPlan};
use crate::util::{age_hours, format_age, node_hex};

use super::{RenderOutcome, Renderer};

pub const FALLBACK_CAPTION: &str = "Interactive map unavailable - showing fallback summary";
pub const EMPTY_MESSAGE: &str = "No nodes with location data yet.";
pub const SELECT_PROMPT: &str = "Select a node to see location details.";

#[derive(Clone, Debug, PartialEq)]
pub struct FallbackSelection {
    pub node_id: NodeId,
    pub title: String,
    pub position: Option<(f64, f64)>,
    pub last_seen: String,
    pub role: Option<String>,
    pub altitude: Option<f64>,
    pub precision: Precision,
}

/// Textual stand-in for the map, built from the same plan the map draws.
#[derive(Clone, Debug, PartialEq)]
pub struct FallbackSummary {
    pub total_nodes: usize,
    pub visible_links: usize,
    /// Age of the newest report among visible nodes, or `--`.
    pub last_update: String,
    pub selected: Option<FallbackSelection>,
}

impl FallbackSummary {
    pub fn from_plan(plan: &RenderPlan) -> Self {
        let last_update = plan
            .latest_timestamp()
            .map(|latest| {
                format_age(age_hours(Some(latest), plan.generated_at).map(|h| h.max(0.0)))
            })
            .unwrap_or_else(|| "--".to_owned());

        let selected = plan.selection.as_ref().map(|detail| {
            let node = &detail.node;
            FallbackSelection {
                node_id: node.node_id,
                title: node.title(),
                position: node.position(),
                last_seen: format_age(age_hours(node.reported_at(), plan.generated_at)),
                role: node.role.as_ref().map(ToString::to_string),
                altitude: node.altitude.filter(|altitude| altitude.is_finite()),
                precision: detail.precision,
            }
        });

        Self {
            total_nodes: plan.node_count(),
            visible_links: plan.link_count(),
            last_update,
            selected,
        }
    }

    /// The line shown below the counts when nothing is selected.
    pub fn empty_message(&self) -> Option<&'static str> {
        match (&self.selected, self.total_nodes) {
            (Some(_), _) => None,
            (None, 0) => Some(EMPTY_MESSAGE),
            (None, _) => Some(SELECT_PROMPT),
        }
    }
}

impl fmt::Display for FallbackSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{FALLBACK_CAPTION}")?;
        writeln!(f)?;
        writeln!(f, "Total nodes:   {}", self.total_nodes)?;
        writeln!(f, "Visible links: {}", self.visible_links)?;
        writeln!(f, "Last update:   {}", self.last_update)?;
        writeln!(f)?;

        let Some(selected) = &self.selected else {
            if let Some(message) = self.empty_message() {
                writeln!(f, "{message}")?;
            }
            return Ok(());
        };

        writeln!(f, "{}", selected.title)?;
        writeln!(f, "{}", node_hex(selected.node_id))?;
        writeln!(
            f,
            "{}  {}",
            selected.precision.summary(),
            selected.precision.description()
        )?;
        match selected.position {
            Some((lat, lon)) => writeln!(f, "Coordinates: {lat:.5}, {lon:.5}")?,
            None => writeln!(f, "Coordinates: unknown")?,
        }
        writeln!(f, "Last seen: {}", selected.last_seen)?;
        if let Some(role) = &selected.role {
            writeln!(f, "Role: {role}")?;
        }
        if let Some(altitude) = selected.altitude {
            writeln!(f, "Altitude: {altitude} m")?;
        }
        Ok(())
    }
}

pub struct FallbackRenderer;

impl Renderer for FallbackRenderer {
    fn render(&mut self, plan: &RenderPlan) -> RenderOutcome {
        RenderOutcome::Fallback(FallbackSummary::from_plan(plan))
    }
}

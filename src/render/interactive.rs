use tracing::debug;

use crate::topology::RenderPlan;

use super::style::{link_stroke, marker_label, role_color};
use super::{GeoBounds, GeoPoint, MapBackend, MarkerSpec, PolylineSpec, RenderOutcome, Renderer};

/// What an interactive render pushed to the backend.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InteractiveReport {
    pub markers: usize,
    pub polylines: usize,
    /// Nodes in the plan without a usable position.
    pub skipped_nodes: usize,
    /// Links with an endpoint that got no marker.
    pub skipped_links: usize,
    pub precision_radius: Option<f64>,
    pub fitted: bool,
}

pub struct InteractiveRenderer<'a, B: MapBackend> {
    backend: &'a mut B,
}

impl<'a, B: MapBackend> InteractiveRenderer<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self { backend }
    }
}

impl<B: MapBackend> Renderer for InteractiveRenderer<'_, B> {
    fn render(&mut self, plan: &RenderPlan) -> RenderOutcome {
        let mut report = InteractiveReport::default();
        self.backend.clear();

        let mut placed = Vec::with_capacity(plan.nodes.len());
        for node in &plan.nodes {
            let Some((lat, lon)) = node.position() else {
                report.skipped_nodes += 1;
                continue;
            };
            let position = GeoPoint { lat, lon };
            placed.push((node.node_id, position));
            self.backend.add_marker(MarkerSpec {
                node_id: node.node_id,
                position,
                label: marker_label(node),
                title: node.title(),
                color: role_color(node.role.as_ref()),
                selected: plan.selected_id == Some(node.node_id),
            });
            report.markers += 1;
        }

        let position_of = |node_id| {
            placed
                .iter()
                .find(|(placed_id, _)| *placed_id == node_id)
                .map(|(_, position)| *position)
        };

        for planned in &plan.links {
            let link = &planned.link;
            let (Some(from), Some(to)) =
                (position_of(link.from_node_id), position_of(link.to_node_id))
            else {
                report.skipped_links += 1;
                continue;
            };
            self.backend.add_polyline(PolylineSpec {
                from_node_id: link.from_node_id,
                to_node_id: link.to_node_id,
                link_type: link.link_type,
                points: [from, to],
                stroke: link_stroke(link, planned.emphasized),
            });
            report.polylines += 1;
        }

        if let Some(detail) = &plan.selection
            && let Some(center) = position_of(detail.node.node_id)
        {
            self.backend
                .add_precision_circle(center, detail.precision.radius_meters);
            report.precision_radius = Some(detail.precision.radius_meters);
        }

        if plan.fit_viewport {
            let positions = placed.iter().map(|(_, position)| *position).collect::<Vec<_>>();
            if let Some(bounds) = GeoBounds::fit(&positions) {
                self.backend.fit_bounds(bounds);
                report.fitted = true;
            }
        }

        debug!(
            markers = report.markers,
            polylines = report.polylines,
            skipped_nodes = report.skipped_nodes,
            skipped_links = report.skipped_links,
            "rendered interactive map"
        );
        RenderOutcome::Interactive(report)
    }
}

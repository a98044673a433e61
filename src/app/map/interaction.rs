use eframe::egui::{self, Pos2, Rect, Ui};

use crate::mesh::NodeId;

use super::super::ViewModel;
use super::super::render_utils::distance_to_segment;

pub(super) const MARKER_RADIUS: f32 = 14.0;
const LINK_HOVER_SLOP: f32 = 4.0;

impl ViewModel {
    pub(super) fn handle_map_zoom(&mut self, ui: &Ui, rect: Rect, response: &egui::Response) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = f64::from((1.0 + (scroll * 0.0025)).clamp(0.8, 1.25));
        self.scene.zoom_at(rect, pointer, zoom_factor);
    }

    pub(super) fn handle_map_pan(&mut self, response: &egui::Response) {
        if response.dragged() {
            self.scene.pan_by(response.drag_delta());
        }
    }

    /// Topmost marker under the pointer. Later markers are painted on top.
    pub(super) fn hovered_marker(&self, rect: Rect, pointer: Pos2) -> Option<NodeId> {
        self.scene
            .markers
            .iter()
            .rev()
            .find(|marker| {
                self.scene.to_screen(rect, marker.position).distance(pointer) <= MARKER_RADIUS
            })
            .map(|marker| marker.node_id)
    }

    /// Index into the plan's links of the line nearest the pointer.
    pub(super) fn hovered_link(&self, rect: Rect, pointer: Pos2) -> Option<usize> {
        let line = self
            .scene
            .polylines
            .iter()
            .map(|line| {
                let start = self.scene.to_screen(rect, line.points[0]);
                let end = self.scene.to_screen(rect, line.points[1]);
                (line, distance_to_segment(pointer, start, end))
            })
            .filter(|(line, distance)| *distance <= line.stroke.weight + LINK_HOVER_SLOP)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(line, _)| line)?;

        self.plan.links.iter().position(|planned| {
            planned.link.from_node_id == line.from_node_id
                && planned.link.to_node_id == line.to_node_id
                && planned.link.link_type == line.link_type
        })
    }
}

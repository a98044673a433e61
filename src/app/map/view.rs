use eframe::egui::{self, Align2, Color32, FontId, RichText, Sense, Shape, Stroke, Ui, vec2};
use tracing::info;

use crate::render::{FALLBACK_CAPTION, FallbackSummary, MapBackend, RenderOutcome, render_plan};
use crate::topology::Command;
use crate::util::node_hex;

use super::super::ViewModel;
use super::super::render_utils::{
    blend_color, circle_visible, draw_background, rgb, segment_visible, with_opacity,
};
use super::super::ui::link_summary_lines;
use super::interaction::MARKER_RADIUS;

const SELECTED_RING: Color32 = Color32::from_rgb(245, 206, 93);
const PRECISION_COLOR: Color32 = Color32::from_rgb(13, 110, 253);

impl ViewModel {
    pub(in crate::app) fn draw_map(&mut self, ui: &mut Ui) {
        let rect = ui.available_rect_before_wrap();
        self.scene.set_viewport(Some(rect));
        self.scene.set_suppressed(self.text_only);
        self.render_if_needed();

        if let Some(summary) = self.fallback.clone() {
            self.draw_fallback(ui, &summary);
            return;
        }

        let (rect, response) = ui.allocate_exact_size(rect.size(), Sense::click_and_drag());
        self.handle_map_zoom(ui, rect, &response);
        self.handle_map_pan(&response);

        let pointer = response.hover_pos();
        self.hovered_node = pointer.and_then(|pointer| self.hovered_marker(rect, pointer));
        self.hovered_link = match (self.hovered_node, pointer) {
            (None, Some(pointer)) => self.hovered_link(rect, pointer),
            _ => None,
        };

        if response.clicked()
            && let Some(node_id) = self.hovered_node
        {
            self.dispatch(Command::SelectNode(node_id));
        }

        let painter = ui.painter_at(rect);
        draw_background(&painter, rect, self.scene.grid_origin(rect));
        self.paint_links(&painter, rect);
        self.paint_precision(&painter, rect);
        self.paint_markers(&painter, rect);

        if self.scene.markers.is_empty() {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "No nodes with location data for the current filters.",
                FontId::proportional(15.0),
                Color32::from_gray(200),
            );
        }

        if let Some(hover_text) = self.hover_text() {
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                hover_text,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }

    /// Renders the current plan when it changed or when the canvas became
    /// (un)available since the last render.
    fn render_if_needed(&mut self) {
        let available = self.scene.is_available();
        if !self.render_pending && self.interactive == Some(available) {
            return;
        }

        let outcome = render_plan(&self.plan, Some(&mut self.scene));
        let interactive = !outcome.is_fallback();
        if self.interactive != Some(interactive) {
            info!(
                mode = if interactive { "interactive" } else { "fallback" },
                "map renderer mode switched"
            );
        }
        if outcome.fitted_viewport() {
            self.view.mark_displayed();
            self.plan.fit_viewport = false;
        }

        self.fallback = match outcome {
            RenderOutcome::Fallback(summary) => Some(summary),
            RenderOutcome::Interactive(_) => None,
        };
        self.interactive = Some(interactive);
        self.render_pending = false;
    }

    fn paint_links(&self, painter: &egui::Painter, rect: egui::Rect) {
        let hovered = self
            .hovered_link
            .and_then(|index| self.plan.links.get(index))
            .map(|planned| &planned.link);

        for line in &self.scene.polylines {
            let start = self.scene.to_screen(rect, line.points[0]);
            let end = self.scene.to_screen(rect, line.points[1]);
            if !segment_visible(rect, start, end, line.stroke.weight) {
                continue;
            }

            let is_hovered = hovered.is_some_and(|link| {
                link.from_node_id == line.from_node_id
                    && link.to_node_id == line.to_node_id
                    && link.link_type == line.link_type
            });
            let mut color = with_opacity(rgb(line.stroke.color), line.stroke.opacity);
            let mut weight = line.stroke.weight;
            if is_hovered {
                color = blend_color(color, Color32::WHITE, 0.35);
                weight += 1.0;
            }
            let stroke = Stroke::new(weight, color);

            match line.stroke.dash {
                Some(dash) => painter.extend(Shape::dashed_line(
                    &[start, end],
                    stroke,
                    dash.dash,
                    dash.gap,
                )),
                None => {
                    painter.line_segment([start, end], stroke);
                }
            }
        }
    }

    fn paint_precision(&self, painter: &egui::Painter, rect: egui::Rect) {
        let Some((center, radius_meters)) = self.scene.precision else {
            return;
        };
        let position = self.scene.to_screen(rect, center);
        let radius = self.scene.meters_to_pixels(center, radius_meters);
        if radius < 1.0 || !circle_visible(rect, position, radius) {
            return;
        }

        painter.circle(
            position,
            radius,
            with_opacity(PRECISION_COLOR, 0.12),
            Stroke::new(1.5, with_opacity(PRECISION_COLOR, 0.6)),
        );
    }

    fn paint_markers(&self, painter: &egui::Painter, rect: egui::Rect) {
        for marker in &self.scene.markers {
            let position = self.scene.to_screen(rect, marker.position);
            if !circle_visible(rect, position, MARKER_RADIUS + 4.0) {
                continue;
            }

            let mut color = rgb(marker.color);
            if self.hovered_node == Some(marker.node_id) {
                color = blend_color(color, Color32::WHITE, 0.25);
            }

            painter.circle_filled(position, MARKER_RADIUS, color);
            painter.circle_stroke(
                position,
                MARKER_RADIUS,
                Stroke::new(1.5, Color32::from_rgba_unmultiplied(255, 255, 255, 200)),
            );
            if marker.selected {
                painter.circle_stroke(
                    position,
                    MARKER_RADIUS + 4.0,
                    Stroke::new(2.5, SELECTED_RING),
                );
            }
            painter.text(
                position,
                Align2::CENTER_CENTER,
                marker.label.as_str(),
                FontId::proportional(10.0),
                Color32::WHITE,
            );
        }
    }

    fn hover_text(&self) -> Option<String> {
        if let Some(node_id) = self.hovered_node {
            let node = self.plan.node(node_id)?;
            let mut parts = vec![node.title(), node_hex(node_id)];
            if let Some(role) = &node.role {
                parts.push(role.to_string());
            }
            if let Some(hw_model) = &node.hw_model {
                parts.push(hw_model.clone());
            }
            return Some(parts.join("  |  "));
        }

        let planned = self.plan.links.get(self.hovered_link?)?;
        Some(link_summary_lines(&self.plan, &planned.link).join("  |  "))
    }

    fn draw_fallback(&self, ui: &mut Ui, summary: &FallbackSummary) {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.set_max_width(420.0);
                ui.label(RichText::new(FALLBACK_CAPTION).italics());
                ui.add_space(8.0);

                egui::Grid::new("fallback_summary")
                    .num_columns(2)
                    .spacing([16.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Total nodes");
                        ui.label(summary.total_nodes.to_string());
                        ui.end_row();
                        ui.label("Visible links");
                        ui.label(summary.visible_links.to_string());
                        ui.end_row();
                        ui.label("Last update");
                        ui.label(summary.last_update.as_str());
                        ui.end_row();
                    });
                ui.add_space(8.0);

                let Some(selected) = &summary.selected else {
                    if let Some(message) = summary.empty_message() {
                        ui.label(message);
                    }
                    return;
                };

                ui.label(RichText::new(selected.title.as_str()).strong());
                ui.small(node_hex(selected.node_id));
                ui.label(selected.precision.summary());
                ui.small(selected.precision.description());
                match selected.position {
                    Some((lat, lon)) => ui.label(format!("Coordinates: {lat:.5}, {lon:.5}")),
                    None => ui.label("Coordinates: unknown"),
                };
                ui.label(format!("Last seen: {}", selected.last_seen));
                if let Some(role) = &selected.role {
                    ui.label(format!("Role: {role}"));
                }
                if let Some(altitude) = selected.altitude {
                    ui.label(format!("Altitude: {altitude} m"));
                }
            });
        });
    }
}

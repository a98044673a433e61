use eframe::egui::{self, Color32, RichText, Sense, Stroke, Ui, vec2};

use crate::mesh::Link;
use crate::render::{LinkQuality, role_color};
use crate::topology::{PrecisionLevel, RenderPlan};
use crate::util::{
    AgeClass, age_hours, format_age, node_hex, node_page_url, traceroute_history_url,
};

use super::super::ViewModel;
use super::super::render_utils::{age_color, rgb};

/// Link fields shown in the details panel and in the map hover text.
pub(in crate::app) fn link_summary_lines(plan: &RenderPlan, link: &Link) -> Vec<String> {
    let mut lines = vec![
        link.link_type.title().to_owned(),
        format!("From: {}", plan.endpoint_name(link.from_node_id)),
        format!("To: {}", plan.endpoint_name(link.to_node_id)),
        format!("Success rate: {:.1}%", link.success_rate),
    ];
    if let Some(attempts) = link.total_hops_seen {
        lines.push(format!("Attempts: {attempts}"));
    }
    if let Some(last_seen) = &link.last_seen_str {
        lines.push(format!("Last seen: {last_seen}"));
    }
    if let Some(snr) = link.avg_snr {
        lines.push(format!("Avg SNR: {snr:.1} dB"));
    }
    if let Some(rssi) = link.avg_rssi {
        lines.push(format!("Avg RSSI: {rssi:.0} dBm"));
    }
    lines
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui, base_url: &str) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(detail) = self.plan.selection.as_ref() else {
            ui.label("Select a node on the map or in the node list.");
            return;
        };
        let node = &detail.node;
        let precision = detail.precision;
        let age = age_hours(node.reported_at(), self.plan.generated_at);

        ui.label(RichText::new(node.title()).strong());
        ui.small(node_hex(node.node_id));
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            let side = precision.level.display_size() / 4.0;
            let (rect, _) = ui.allocate_exact_size(vec2(side, side), Sense::hover());
            let fill = match precision.level {
                PrecisionLevel::Tight => Color32::from_rgba_unmultiplied(40, 167, 69, 90),
                PrecisionLevel::Medium => Color32::from_rgba_unmultiplied(255, 193, 7, 90),
                PrecisionLevel::Wide => Color32::from_rgba_unmultiplied(220, 53, 69, 90),
                PrecisionLevel::None => Color32::from_rgba_unmultiplied(108, 117, 125, 90),
            };
            ui.painter()
                .circle(rect.center(), side / 2.0, fill, Stroke::new(1.0, Color32::GRAY));
            ui.vertical(|ui| {
                ui.label(precision.summary());
                ui.small(precision.description());
            });
        });
        ui.add_space(6.0);

        egui::Grid::new("selected_node_fields")
            .num_columns(2)
            .spacing([10.0, 4.0])
            .show(ui, |ui| {
                if let Some(short_name) = &node.short_name {
                    ui.label("Short name");
                    ui.label(short_name.as_str());
                    ui.end_row();
                }
                ui.label("Location");
                match node.position() {
                    Some((lat, lon)) => ui.label(format!("{lat:.6}, {lon:.6}")),
                    None => ui.label("unknown"),
                };
                ui.end_row();
                ui.label("Age");
                ui.colored_label(age_color(AgeClass::of(age)), format_age(age));
                ui.end_row();
                if let Some(role) = &node.role {
                    ui.label("Role");
                    ui.label(
                        RichText::new(format!(" {role} "))
                            .background_color(rgb(role_color(Some(role)))),
                    );
                    ui.end_row();
                }
                if let Some(altitude) = node.altitude {
                    ui.label("Altitude");
                    ui.label(format!("{altitude} m"));
                    ui.end_row();
                }
                if let Some(hw_model) = &node.hw_model {
                    ui.label("Hardware");
                    ui.label(hw_model.as_str());
                    ui.end_row();
                }
                if let Some(channel) = &node.primary_channel {
                    ui.label("Channel");
                    ui.label(channel.as_str());
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        if ui.button("View node details").clicked() {
            ui.ctx()
                .open_url(egui::OpenUrl::new_tab(node_page_url(base_url, node.node_id)));
        }

        ui.separator();
        let links = self.plan.links_touching(node.node_id).collect::<Vec<_>>();
        ui.label(RichText::new(format!("Visible links ({})", links.len())).strong());
        if links.is_empty() {
            ui.label("No visible links for this node.");
            return;
        }

        egui::ScrollArea::vertical()
            .id_salt("selected_links_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                for planned in links {
                    let link = &planned.link;
                    let quality = rgb(LinkQuality::of(link.success_rate).color());
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        let lines = link_summary_lines(&self.plan, link);
                        for (index, line) in lines.iter().enumerate() {
                            if index == 0 {
                                ui.label(RichText::new(line.as_str()).strong());
                            } else if line.starts_with("Success rate") {
                                ui.colored_label(quality, line.as_str());
                            } else {
                                ui.label(line.as_str());
                            }
                        }
                        if ui.small_button("History").clicked() {
                            ui.ctx().open_url(egui::OpenUrl::new_tab(traceroute_history_url(
                                base_url,
                                link.from_node_id,
                                link.to_node_id,
                            )));
                        }
                    });
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::test_support::{link, node, store};
    use crate::topology::{FilterCriteria, TopologyView, ViewState};

    #[test]
    fn link_summary_includes_optional_radio_metrics() {
        let mut a_b = link(1, 2);
        a_b.success_rate = 66.666;
        a_b.total_hops_seen = Some(12);
        a_b.avg_snr = Some(7.26);
        a_b.avg_rssi = Some(-97.4);
        a_b.last_seen_str = Some("2024-05-01 10:00:00".to_owned());
        let view = TopologyView::new(
            store(vec![node(1)], vec![a_b.clone()]),
            FilterCriteria::default(),
            ViewState::default(),
        );
        let plan = view.plan(0.0);

        assert_eq!(
            link_summary_lines(&plan, &a_b),
            vec![
                "Traceroute RF Hop",
                "From: Node 1",
                "To: !00000002",
                "Success rate: 66.7%",
                "Attempts: 12",
                "Last seen: 2024-05-01 10:00:00",
                "Avg SNR: 7.3 dB",
                "Avg RSSI: -97 dBm",
            ]
        );
    }

    #[test]
    fn link_summary_skips_missing_fields() {
        let mut bare = link(3, 4);
        bare.total_hops_seen = None;
        let view = TopologyView::new(
            store(vec![node(3), node(4)], vec![bare.clone()]),
            FilterCriteria::default(),
            ViewState::default(),
        );
        let lines = link_summary_lines(&view.plan(0.0), &bare);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[3], "Success rate: 90.0%");
    }
}

use eframe::egui::{self, RichText, Ui};

use crate::mesh::{Node, NodeId};
use crate::render::role_color;
use crate::topology::{Command, search_nodes, sorted_by_name};
use crate::util::{AgeClass, age_hours, format_age, node_hex};

use super::super::ViewModel;
use super::super::render_utils::{age_color, rgb};

const ROW_HEIGHT: f32 = 38.0;

impl ViewModel {
    pub(in crate::app) fn draw_node_list(&mut self, ui: &mut Ui) {
        ui.heading("Nodes");
        ui.add_space(4.0);

        let clear_clicked = ui
            .horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.search)
                        .hint_text("Search name, id or hardware")
                        .desired_width(ui.available_width() - 56.0),
                );
                ui.button("Clear").clicked()
            })
            .inner;
        if clear_clicked {
            self.search.clear();
            self.dispatch(Command::ClearSelection);
        }

        let now = self.plan.generated_at;
        let selected_id = self.plan.selected_id;
        let rows = if self.search.trim().is_empty() {
            sorted_by_name(&self.plan.nodes)
        } else {
            search_nodes(&self.view.filtered().nodes, &self.search)
        };

        if rows.is_empty() {
            ui.label(if self.search.trim().is_empty() {
                "No nodes match the current filters."
            } else {
                "No nodes match the search."
            });
            return;
        }
        ui.small(format!("{} nodes", rows.len()));

        let mut clicked: Option<NodeId> = None;
        egui::ScrollArea::vertical()
            .id_salt("node_list_scroll")
            .max_height(420.0)
            .auto_shrink([false, true])
            .show_rows(ui, ROW_HEIGHT, rows.len(), |ui, row_range| {
                for node in &rows[row_range] {
                    if node_row(ui, node, now, selected_id == Some(node.node_id)) {
                        clicked = Some(node.node_id);
                    }
                }
            });

        if let Some(node_id) = clicked {
            self.dispatch(Command::SelectNode(node_id));
        }
    }
}

fn node_row(ui: &mut Ui, node: &Node, now: f64, selected: bool) -> bool {
    let age = age_hours(node.reported_at(), now);
    let mut clicked = false;

    ui.horizontal(|ui| {
        let badge = node
            .role
            .as_ref()
            .map(|role| role.abbreviation())
            .unwrap_or("?");
        ui.label(
            RichText::new(format!(" {badge} "))
                .background_color(rgb(role_color(node.role.as_ref())))
                .strong(),
        );

        ui.vertical(|ui| {
            if ui.selectable_label(selected, node.title()).clicked() {
                clicked = true;
            }
            ui.horizontal(|ui| {
                ui.small(node_hex(node.node_id));
                ui.small(RichText::new(format_age(age)).color(age_color(AgeClass::of(age))));
                if let Some(hw_model) = &node.hw_model {
                    ui.small(hw_model.as_str());
                }
            });
        });
    });

    clicked
}

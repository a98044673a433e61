use eframe::egui::{self, Color32, RichText, Ui};

use crate::mesh::{LinkType, Role};
use crate::topology::{Command, FilterCriteria, HopDepth};
use crate::util::{format_window_bound, now_seconds, parse_window_bound};

use super::super::ViewModel;

const MAX_AGE_PRESETS: [u32; 6] = [1, 6, 24, 72, 168, 720];
const MIN_CONTACTS_LIMIT: u64 = 50;

fn max_age_label(hours: Option<u32>) -> String {
    match hours {
        None => "No limit".to_owned(),
        Some(1) => "1 hour".to_owned(),
        Some(hours) if hours > 24 && hours % 24 == 0 => format!("{} days", hours / 24),
        Some(hours) => format!("{hours} hours"),
    }
}

fn role_label(role: Option<&Role>) -> String {
    match role {
        None => "All roles".to_owned(),
        Some(Role::Unknown) => "Unknown".to_owned(),
        Some(role) => role.as_str().to_owned(),
    }
}

/// Window for a preset ending at `now`, or no window at all.
fn preset_window(hours: Option<u32>, now: f64) -> (Option<f64>, Option<f64>) {
    match hours {
        Some(hours) => (Some(now - f64::from(hours) * 3600.0), Some(now)),
        None => (None, None),
    }
}

fn parse_bound_input(raw: &str, which: &str) -> Result<Option<f64>, String> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_window_bound(raw)
        .map(Some)
        .ok_or_else(|| format!("Unrecognised {which} time \"{}\"", raw.trim()))
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui, channels: &[String]) {
        ui.heading("Filters");
        ui.add_space(4.0);

        let current_role = self.view.criteria().role.clone();
        let mut role = current_role.clone();
        egui::ComboBox::from_label("Role")
            .selected_text(role_label(role.as_ref()))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut role, None, "All roles");
                for known in Role::KNOWN {
                    let label = known.as_str().to_owned();
                    ui.selectable_value(&mut role, Some(known), label);
                }
                ui.selectable_value(&mut role, Some(Role::Unknown), "Unknown");
            });
        if role != current_role {
            self.dispatch(Command::SetRoleFilter(role));
        }

        let current_channel = self.view.criteria().channel.clone();
        let mut channel = current_channel.clone();
        egui::ComboBox::from_label("Channel")
            .selected_text(channel.as_deref().unwrap_or("All channels"))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut channel, None, "All channels");
                for name in channels {
                    ui.selectable_value(&mut channel, Some(name.clone()), name.as_str());
                }
            });
        if channel != current_channel {
            self.dispatch(Command::SetChannelFilter(channel));
        }

        ui.add_space(6.0);
        let mut max_age = self.max_age_hours;
        egui::ComboBox::from_label("Max age")
            .selected_text(max_age_label(max_age))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut max_age, None, max_age_label(None));
                for hours in MAX_AGE_PRESETS {
                    ui.selectable_value(&mut max_age, Some(hours), max_age_label(Some(hours)));
                }
            });
        if max_age != self.max_age_hours {
            self.apply_max_age(max_age);
        }

        egui::Grid::new("time_window")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("Start");
                ui.add(
                    egui::TextEdit::singleline(&mut self.start_input).hint_text("YYYY-MM-DDTHH:MM"),
                );
                ui.end_row();
                ui.label("End");
                ui.add(
                    egui::TextEdit::singleline(&mut self.end_input).hint_text("YYYY-MM-DDTHH:MM"),
                );
                ui.end_row();
            });
        let (apply_dates, clear_dates) = ui
            .horizontal(|ui| {
                (
                    ui.button("Apply dates").clicked(),
                    ui.button("Clear dates").clicked(),
                )
            })
            .inner;
        if apply_dates {
            self.apply_time_inputs();
        }
        if clear_dates {
            self.apply_max_age(None);
        }
        if let Some(error) = &self.window_error {
            ui.colored_label(Color32::from_rgb(220, 53, 69), error.as_str());
        }

        ui.add_space(6.0);
        let contacts_response = ui
            .add(
                egui::Slider::new(&mut self.min_contacts, 1..=MIN_CONTACTS_LIMIT)
                    .text("Min contacts"),
            )
            .on_hover_text("Hide links observed fewer times than this");
        if contacts_response.changed() {
            self.dispatch(Command::SetMinContacts(self.min_contacts));
        }

        if ui.button("Reset filters").clicked() {
            self.max_age_hours = None;
            self.start_input.clear();
            self.end_input.clear();
            self.window_error = None;
            self.min_contacts = 1;
            self.dispatch(Command::SetFilters(FilterCriteria::default()));
        }

        ui.separator();
        ui.label(RichText::new("Links").strong());
        let toggles = self.view.state().links;
        let mut traceroute = toggles.traceroute;
        if ui.checkbox(&mut traceroute, "Traceroute links").changed() {
            self.dispatch(Command::SetLinkVisibility(LinkType::Traceroute, traceroute));
        }
        let mut packet = toggles.packet;
        if ui.checkbox(&mut packet, "Packet links").changed() {
            self.dispatch(Command::SetLinkVisibility(LinkType::Packet, packet));
        }

        let Some(selected) = self.view.selected_node().map(|node| node.title()) else {
            return;
        };

        ui.separator();
        ui.label(RichText::new("Selection").strong());
        ui.label(format!("Focused on {selected}"));

        let current_depth = self.view.state().hop_depth;
        let mut depth = current_depth;
        egui::ComboBox::from_label("Hop depth")
            .selected_text(depth.to_string())
            .show_ui(ui, |ui| {
                for choice in HopDepth::CHOICES {
                    ui.selectable_value(&mut depth, choice, choice.to_string());
                }
            });
        if depth != current_depth {
            self.dispatch(Command::SetHopDepth(depth));
        }

        if ui.button("Clear selection").clicked() {
            self.dispatch(Command::ClearSelection);
        }
    }

    fn apply_max_age(&mut self, hours: Option<u32>) {
        let (start, end) = preset_window(hours, now_seconds());
        self.max_age_hours = hours;
        self.start_input = start.map(format_window_bound).unwrap_or_default();
        self.end_input = end.map(format_window_bound).unwrap_or_default();
        self.window_error = None;
        self.dispatch(Command::SetTimeWindow { start, end });
    }

    fn apply_time_inputs(&mut self) {
        let bounds = parse_bound_input(&self.start_input, "start")
            .and_then(|start| parse_bound_input(&self.end_input, "end").map(|end| (start, end)));

        match bounds {
            Ok((start, end)) => {
                self.window_error = None;
                self.max_age_hours = None;
                self.dispatch(Command::SetTimeWindow { start, end });
            }
            Err(error) => self.window_error = Some(error),
        }
    }
}

use eframe::egui::{self, Align, Color32, Context, Layout, RichText};
use tracing::info;

use crate::mesh::{EntityStore, LinkType};
use crate::topology::{Command, TopologyView};
use crate::util::{format_clock, format_window_bound, now_seconds};

use super::super::map::MapScene;
use super::super::{StartupView, ViewModel};

impl ViewModel {
    pub(in crate::app) fn new(store: EntityStore, generation: u64, startup: &StartupView) -> Self {
        let mut view = TopologyView::new(store, startup.criteria.clone(), startup.state.clone());
        if let Some(node_id) = startup.select {
            view.dispatch(Command::SelectNode(node_id));
        }

        let now = now_seconds();
        let plan = view.plan(now);
        let criteria = view.criteria();
        info!(
            generation,
            nodes = plan.total_node_count,
            visible = plan.node_count(),
            "topology view ready"
        );

        Self {
            start_input: criteria.start.map(format_window_bound).unwrap_or_default(),
            end_input: criteria.end.map(format_window_bound).unwrap_or_default(),
            min_contacts: criteria.min_contacts.max(1),
            max_age_hours: startup.max_age_hours,
            view,
            plan,
            plan_dirty: false,
            render_pending: true,
            scene: MapScene::default(),
            fallback: None,
            interactive: None,
            text_only: false,
            hovered_node: None,
            hovered_link: None,
            search: String::new(),
            window_error: None,
            load_error: None,
            last_updated: now,
            generation,
        }
    }

    pub(in crate::app) fn apply_store(&mut self, generation: u64, store: EntityStore) {
        info!(
            generation,
            nodes = store.nodes().len(),
            links = store.links().len(),
            "applying reloaded topology"
        );
        self.generation = generation;
        self.last_updated = now_seconds();
        self.load_error = None;
        self.dispatch(Command::Loaded(store));
    }

    pub(in crate::app) fn dispatch(&mut self, command: Command) {
        if self.view.dispatch(command).needs_render() {
            self.plan_dirty = true;
        }
    }

    pub(in crate::app) fn refresh_plan(&mut self) {
        if !self.plan_dirty {
            return;
        }
        self.plan = self.view.plan(now_seconds());
        self.plan_dirty = false;
        self.render_pending = true;
        if self
            .hovered_link
            .is_some_and(|index| index >= self.plan.links.len())
        {
            self.hovered_link = None;
        }
    }

    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        channels: &[String],
        base_url: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        self.refresh_plan();

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Malla map");
                    ui.separator();
                    let store = self.view.store();
                    let traceroute = store
                        .links()
                        .iter()
                        .filter(|link| link.link_type == LinkType::Traceroute)
                        .count();
                    let packet = store.links().len() - traceroute;
                    ui.label(format!("nodes: {}", store.nodes().len()));
                    ui.label(format!("links: {}", traceroute + packet))
                        .on_hover_text(format!("{traceroute} traceroute, {packet} packet"));
                    ui.label(format!("updated: {}", format_clock(self.last_updated)));

                    let refresh_label = if is_loading { "Refreshing..." } else { "Refresh" };
                    if ui.add_enabled(!is_loading, egui::Button::new(refresh_label)).clicked() {
                        *reload_requested = true;
                    }
                    if is_loading {
                        ui.spinner();
                    }
                    if ui
                        .checkbox(&mut self.text_only, "Text summary")
                        .on_hover_text("Show the textual summary instead of the map")
                        .changed()
                    {
                        self.render_pending = true;
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(format!(
                            "showing {} of {} nodes, {} links",
                            self.plan.node_count(),
                            self.plan.filtered_node_count,
                            self.plan.link_count()
                        ));
                    });
                });
            });

        if let Some(error) = self.load_error.clone() {
            egui::TopBottomPanel::top("load_error")
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.colored_label(
                            Color32::from_rgb(220, 53, 69),
                            RichText::new("Refresh failed").strong(),
                        );
                        ui.label(error.as_str());
                        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.load_error = None;
                            }
                            if ui.add_enabled(!is_loading, egui::Button::new("Retry")).clicked() {
                                *reload_requested = true;
                            }
                        });
                    });
                });
        }

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        self.draw_controls(ui, channels);
                        ui.separator();
                        self.draw_node_list(ui);
                    });
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| self.draw_details(ui, base_url));

        egui::CentralPanel::default().show(ctx, |ui| self.draw_map(ui));
    }
}

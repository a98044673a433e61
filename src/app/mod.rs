use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

use eframe::egui::{self, Context};
use tracing::{debug, warn};

use crate::mesh::{DataSource, EntityStore, NodeId};
use crate::render::FallbackSummary;
use crate::topology::{FilterCriteria, RenderPlan, TopologyView, ViewState};

mod loader;
mod map;
mod render_utils;
mod ui;

use loader::{LoadResult, Loader};
use map::MapScene;

/// View configuration from the command line, applied to the first load.
#[derive(Clone, Debug, Default)]
pub struct StartupView {
    pub criteria: FilterCriteria,
    pub state: ViewState,
    pub select: Option<NodeId>,
    pub max_age_hours: Option<u32>,
}

pub struct MallaMapApp {
    source: Arc<DataSource>,
    base_url: String,
    startup: StartupView,
    state: AppState,
    loader: Loader,
    channels: Vec<String>,
    channels_rx: Option<Receiver<Vec<String>>>,
    channels_requested: bool,
}

enum AppState {
    Loading,
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    view: TopologyView,
    plan: RenderPlan,
    plan_dirty: bool,
    render_pending: bool,
    scene: MapScene,
    fallback: Option<FallbackSummary>,
    /// Mode of the last render, `None` before the first one.
    interactive: Option<bool>,
    text_only: bool,
    hovered_node: Option<NodeId>,
    hovered_link: Option<usize>,
    search: String,
    max_age_hours: Option<u32>,
    start_input: String,
    end_input: String,
    window_error: Option<String>,
    min_contacts: u64,
    load_error: Option<String>,
    last_updated: f64,
    generation: u64,
}

impl MallaMapApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        source: DataSource,
        base_url: String,
        startup: StartupView,
    ) -> Self {
        let mut app = Self {
            source: Arc::new(source),
            base_url,
            startup,
            state: AppState::Loading,
            loader: Loader::new(),
            channels: Vec::new(),
            channels_rx: None,
            channels_requested: false,
        };
        app.loader.spawn(Arc::clone(&app.source));
        app
    }

    /// Channel names are fetched once per session, after the first load.
    fn request_channels(&mut self, store: &EntityStore) {
        if self.channels_requested {
            return;
        }
        self.channels_requested = true;

        let (tx, rx) = mpsc::channel();
        let source = Arc::clone(&self.source);
        let store = store.clone();
        thread::spawn(move || {
            let channels = source.channels(&store).unwrap_or_else(|error| {
                warn!(%error, "failed to load channel list");
                Vec::new()
            });
            let _ = tx.send(channels);
        });
        self.channels_rx = Some(rx);
    }

    fn poll_channels(&mut self) {
        let Some(rx) = self.channels_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(channels) => {
                debug!(count = channels.len(), "channel list loaded");
                self.channels = channels;
            }
            Err(TryRecvError::Empty) => self.channels_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                warn!("channel list worker disconnected");
            }
        }
    }

    fn apply_load(&mut self, generation: u64, result: LoadResult) {
        if let Ok(store) = &result {
            self.request_channels(store);
        }

        // A failed reload keeps the data already on screen.
        if let AppState::Ready(model) = &mut self.state {
            match result {
                Ok(store) => model.apply_store(generation, store),
                Err(error) => model.load_error = Some(error),
            }
            return;
        }

        self.state = match result {
            Ok(store) => AppState::Ready(Box::new(ViewModel::new(
                store,
                generation,
                &self.startup,
            ))),
            Err(error) => AppState::Error(error),
        };
    }
}

impl eframe::App for MallaMapApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.poll_channels();
        if let Some((generation, result)) = self.loader.poll() {
            self.apply_load(generation, result);
        }

        let is_loading = self.loader.is_loading();
        if is_loading || self.channels_rx.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        let mut transition = None;
        let mut reload_requested = false;

        match &mut self.state {
            AppState::Loading => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading mesh topology...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load mesh topology");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        reload_requested = true;
                        transition = Some(AppState::Loading);
                    }
                });
            }
            AppState::Ready(model) => {
                model.show(
                    ctx,
                    &self.channels,
                    &self.base_url,
                    &mut reload_requested,
                    is_loading,
                );
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
        if reload_requested {
            self.loader.spawn(Arc::clone(&self.source));
        }
    }
}

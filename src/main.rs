mod app;
mod mesh;
mod render;
mod topology;
mod util;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use crate::app::{MallaMapApp, StartupView};
use crate::mesh::{DataSource, MeshClient, NodeId, Role};
use crate::render::{FallbackRenderer, RenderOutcome, Renderer};
use crate::topology::{Command, FilterCriteria, HopDepth, LinkToggles, TopologyView, ViewState};
use crate::util::{node_hex, now_seconds, parse_node_id, parse_window_bound};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Origin of the mesh web service.
    #[arg(long, default_value = "http://127.0.0.1:5008")]
    base_url: String,
    /// Read a saved `/api/locations` response instead of querying the service.
    #[arg(long)]
    snapshot: Option<PathBuf>,
    #[arg(long, default_value_t = 15)]
    timeout_secs: u64,
    /// Print the text summary instead of opening a window.
    #[arg(long)]
    text: bool,
    #[arg(long)]
    role: Option<String>,
    #[arg(long)]
    channel: Option<String>,
    /// Window start, `YYYY-MM-DDTHH:MM` local time or RFC 3339.
    #[arg(long, value_parser = parse_bound)]
    start: Option<f64>,
    #[arg(long, value_parser = parse_bound)]
    end: Option<f64>,
    /// Only nodes reported in the last N hours. Replaces --start/--end.
    #[arg(long)]
    max_age_hours: Option<u32>,
    #[arg(long, default_value_t = 1)]
    min_contacts: u64,
    /// Node to focus on: decimal, `!hex` or `0xhex`.
    #[arg(long, value_parser = parse_select)]
    select: Option<NodeId>,
    /// Hop depth around the selected node, or `unlimited`.
    #[arg(long, value_parser = parse_hops, default_value = "1")]
    hops: HopDepth,
    #[arg(long)]
    packet_links: bool,
    #[arg(long)]
    no_traceroute_links: bool,
}

fn parse_bound(raw: &str) -> Result<f64, String> {
    parse_window_bound(raw).ok_or_else(|| format!("unrecognised time `{raw}`"))
}

fn parse_select(raw: &str) -> Result<NodeId, String> {
    parse_node_id(raw).ok_or_else(|| format!("invalid node id `{raw}`"))
}

fn parse_hops(raw: &str) -> Result<HopDepth, String> {
    match HopDepth::parse(raw) {
        Some(HopDepth::Limited(0)) | None => {
            Err(format!("expected a hop count of at least 1 or `unlimited`, got `{raw}`"))
        }
        Some(depth) => Ok(depth),
    }
}

impl Args {
    fn data_source(&self) -> DataSource {
        match &self.snapshot {
            Some(path) => DataSource::Snapshot(path.clone()),
            None => DataSource::Http(MeshClient::new(
                &self.base_url,
                Duration::from_secs(self.timeout_secs),
            )),
        }
    }

    fn startup_view(&self, now: f64) -> StartupView {
        let (start, end) = match self.max_age_hours {
            Some(hours) => (Some(now - f64::from(hours) * 3600.0), Some(now)),
            None => (self.start, self.end),
        };

        StartupView {
            criteria: FilterCriteria {
                role: self
                    .role
                    .as_deref()
                    .map(|role| Role::from(role.trim().to_ascii_uppercase())),
                channel: self.channel.clone().filter(|channel| !channel.is_empty()),
                start,
                end,
                min_contacts: self.min_contacts,
            },
            state: ViewState {
                hop_depth: self.hops,
                links: LinkToggles {
                    traceroute: !self.no_traceroute_links,
                    packet: self.packet_links,
                },
                ..ViewState::default()
            },
            select: self.select,
            max_age_hours: self.max_age_hours,
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();
}

fn run_text(source: &DataSource, startup: &StartupView) -> anyhow::Result<()> {
    let store = source.load().context("failed to load mesh locations")?;
    let mut view = TopologyView::new(store, startup.criteria.clone(), startup.state.clone());
    if let Some(node_id) = startup.select
        && !view.dispatch(Command::SelectNode(node_id)).needs_render()
    {
        warn!(node = %node_hex(node_id), "selected node is not in the loaded data");
    }

    let plan = view.plan(now_seconds());
    if let RenderOutcome::Fallback(summary) = FallbackRenderer.render(&plan) {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{summary}").context("failed to write summary")?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let source = args.data_source();
    let startup = args.startup_view(now_seconds());

    if args.text {
        return run_text(&source, &startup);
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };
    let window_source = source.clone();
    let window_startup = startup.clone();
    let base_url = args.base_url.clone();

    let result = eframe::run_native(
        "Malla map",
        options,
        Box::new(move |cc| {
            Ok(Box::new(MallaMapApp::new(
                cc,
                window_source,
                base_url,
                window_startup,
            )))
        }),
    );

    if let Err(error) = result {
        info!(%error, "map window unavailable, printing text summary instead");
        return run_text(&source, &startup);
    }
    Ok(())
}

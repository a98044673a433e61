use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use anyhow::Context as _;
use tracing::{debug, warn};

use crate::mesh::{DataSource, EntityStore};

pub(super) type LoadResult = Result<EntityStore, String>;

struct LoadMessage {
    generation: u64,
    result: LoadResult,
}

/// Runs location loads on background threads. Every request gets a new
/// generation; results from anything older than the newest request are
/// dropped, so a slow earlier fetch never overwrites a newer one.
pub(super) struct Loader {
    tx: Sender<LoadMessage>,
    rx: Receiver<LoadMessage>,
    latest: u64,
    in_flight: usize,
}

impl Loader {
    pub(super) fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            latest: 0,
            in_flight: 0,
        }
    }

    pub(super) fn spawn(&mut self, source: Arc<DataSource>) -> u64 {
        self.spawn_with(move || {
            source
                .load()
                .context("failed to load mesh locations")
                .map_err(|error| {
                    warn!("{error:#}");
                    format!("{error:#}")
                })
        })
    }

    fn spawn_with(&mut self, job: impl FnOnce() -> LoadResult + Send + 'static) -> u64 {
        self.latest += 1;
        self.in_flight += 1;
        let generation = self.latest;
        let tx = self.tx.clone();

        thread::spawn(move || {
            let result = job();
            let _ = tx.send(LoadMessage { generation, result });
        });

        generation
    }

    pub(super) fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// The newest-generation result that arrived since the last poll.
    pub(super) fn poll(&mut self) -> Option<(u64, LoadResult)> {
        let mut accepted = None;
        while let Ok(message) = self.rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            if message.generation < self.latest {
                debug!(
                    generation = message.generation,
                    latest = self.latest,
                    "discarding stale load result"
                );
                continue;
            }
            accepted = Some((message.generation, message.result));
        }
        accepted
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use super::parse::{LocationsPayload, parse_channels, parse_locations};
use super::store::EntityStore;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read response body from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON payload: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("server reported an error: {0}")]
    Server(String),
    #[error("failed to read snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where a session's node/link records come from.
#[derive(Clone, Debug)]
pub enum DataSource {
    Http(MeshClient),
    Snapshot(PathBuf),
}

impl DataSource {
    pub fn load(&self) -> Result<EntityStore, FetchError> {
        let payload = match self {
            Self::Http(client) => client.fetch_locations()?,
            Self::Snapshot(path) => read_snapshot(path)?,
        };
        let store = EntityStore::from_payload(payload);
        info!(
            nodes = store.nodes().len(),
            links = store.links().len(),
            "loaded mesh topology"
        );
        Ok(store)
    }

    /// Primary channel names for the channel filter. A snapshot has no
    /// channel endpoint, so the names are taken from `store` instead.
    pub fn channels(&self, store: &EntityStore) -> Result<Vec<String>, FetchError> {
        match self {
            Self::Http(client) => client.fetch_channels(),
            Self::Snapshot(_) => Ok(store.channels()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MeshClient {
    base_url: String,
    agent: ureq::Agent,
}

impl MeshClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            agent,
        }
    }

    pub fn fetch_locations(&self) -> Result<LocationsPayload, FetchError> {
        let body = self.get("/api/locations")?;
        parse_locations(&body)
    }

    pub fn fetch_channels(&self) -> Result<Vec<String>, FetchError> {
        let body = self.get("/api/meshtastic/channels")?;
        parse_channels(&body)
    }

    fn get(&self, path: &str) -> Result<String, FetchError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%url, "fetching");

        let response = match self.agent.get(&url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                return Err(FetchError::Status { url, status });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport {
                    url,
                    source: Box::new(transport),
                });
            }
        };

        response
            .into_string()
            .map_err(|source| FetchError::Read { url, source })
    }
}

fn read_snapshot(path: &Path) -> Result<LocationsPayload, FetchError> {
    let raw = std::fs::read_to_string(path).map_err(|source| FetchError::Snapshot {
        path: path.to_path_buf(),
        source,
    })?;
    parse_locations(&raw)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn write_snapshot(name: &str, body: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "malla-map-{name}-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, body).expect("snapshot written");
        path
    }

    #[test]
    fn snapshot_source_loads_and_derives_channels() {
        let body = json!({
            "locations": [
                {"node_id": 1, "display_name": "a", "primary_channel": "LongFast"},
                {"node_id": 2, "display_name": "b", "primary_channel": "MediumFast"},
                {"node_id": 3, "display_name": "c", "primary_channel": "LongFast"}
            ],
            "traceroute_links": [{"from_node_id": 1, "to_node_id": 2}],
            "packet_links": [{"from_node_id": 2, "to_node_id": 3}]
        })
        .to_string();
        let path = write_snapshot("load", &body);

        let source = DataSource::Snapshot(path.clone());
        let store = source.load().expect("snapshot loads");
        assert_eq!(store.nodes().len(), 3);
        assert_eq!(store.links().len(), 2);
        assert_eq!(
            source.channels(&store).expect("channels"),
            vec!["LongFast".to_owned(), "MediumFast".to_owned()]
        );

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn missing_snapshot_is_reported_with_its_path() {
        let source = DataSource::Snapshot(PathBuf::from("/nonexistent/malla-map.json"));
        let error = source.load().expect_err("missing file fails");
        assert!(matches!(error, FetchError::Snapshot { .. }));
        assert!(error.to_string().contains("/nonexistent/malla-map.json"));
    }

    #[test]
    fn client_normalises_trailing_slash() {
        let client = MeshClient::new("http://mesh.local:5008/", Duration::from_secs(1));
        assert_eq!(client.base_url, "http://mesh.local:5008");
    }
}

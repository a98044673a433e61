use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::fetch::FetchError;
use super::model::{Link, LinkType, Node};

#[derive(Debug, Default, Deserialize)]
struct RawLocations {
    #[serde(default)]
    locations: Vec<Value>,
    #[serde(default)]
    traceroute_links: Vec<Value>,
    #[serde(default)]
    packet_links: Vec<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawChannels {
    #[serde(default)]
    channels: Vec<String>,
}

/// Decoded `/api/locations` body. Links are already tagged with their source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationsPayload {
    pub nodes: Vec<Node>,
    pub traceroute_links: Vec<Link>,
    pub packet_links: Vec<Link>,
    pub skipped_records: usize,
}

pub(super) fn parse_locations(raw: &str) -> Result<LocationsPayload, FetchError> {
    let parsed: RawLocations = serde_json::from_str(raw).map_err(FetchError::Parse)?;

    if let Some(error) = parsed.error.filter(|error| !error.is_empty()) {
        return Err(FetchError::Server(error));
    }

    let mut skipped_records = 0usize;
    let nodes = decode_each::<Node>(parsed.locations, &mut skipped_records);
    let traceroute_links = tag_links(
        decode_each::<Link>(parsed.traceroute_links, &mut skipped_records),
        LinkType::Traceroute,
    );
    let packet_links = tag_links(
        decode_each::<Link>(parsed.packet_links, &mut skipped_records),
        LinkType::Packet,
    );

    if skipped_records > 0 {
        warn!(skipped_records, "skipped malformed records in locations payload");
    }

    Ok(LocationsPayload {
        nodes,
        traceroute_links,
        packet_links,
        skipped_records,
    })
}

pub(super) fn parse_channels(raw: &str) -> Result<Vec<String>, FetchError> {
    let parsed: RawChannels = serde_json::from_str(raw).map_err(FetchError::Parse)?;
    Ok(parsed.channels)
}

fn decode_each<T: for<'de> Deserialize<'de>>(values: Vec<Value>, skipped: &mut usize) -> Vec<T> {
    let mut decoded = Vec::with_capacity(values.len());
    for value in values {
        match T::deserialize(value) {
            Ok(entry) => decoded.push(entry),
            Err(_) => *skipped += 1,
        }
    }
    decoded
}

fn tag_links(mut links: Vec<Link>, link_type: LinkType) -> Vec<Link> {
    for link in &mut links {
        link.link_type = link_type;
    }
    links
}

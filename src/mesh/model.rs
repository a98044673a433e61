use std::fmt;

use serde::{Deserialize, Deserializer};

pub type NodeId = u32;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Role {
    Client,
    ClientMute,
    Router,
    RouterLate,
    Repeater,
    RouterClient,
    Sensor,
    Unknown,
    Other(String),
}

impl Role {
    pub const KNOWN: [Role; 7] = [
        Role::Client,
        Role::ClientMute,
        Role::Router,
        Role::RouterLate,
        Role::Repeater,
        Role::RouterClient,
        Role::Sensor,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Client => "CLIENT",
            Self::ClientMute => "CLIENT_MUTE",
            Self::Router => "ROUTER",
            Self::RouterLate => "ROUTER_LATE",
            Self::Repeater => "REPEATER",
            Self::RouterClient => "ROUTER_CLIENT",
            Self::Sensor => "SENSOR",
            Self::Unknown => "UNKNOWN",
            Self::Other(raw) => raw,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::Client => "C",
            Self::ClientMute => "CM",
            Self::Router => "R",
            Self::RouterLate => "RL",
            Self::Repeater => "RP",
            Self::RouterClient => "RC",
            Self::Sensor => "S",
            Self::Unknown | Self::Other(_) => "?",
        }
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "CLIENT" => Self::Client,
            "CLIENT_MUTE" => Self::ClientMute,
            "ROUTER" => Self::Router,
            "ROUTER_LATE" => Self::RouterLate,
            "REPEATER" => Self::Repeater,
            "ROUTER_CLIENT" => Self::RouterClient,
            "SENSOR" => Self::Sensor,
            "UNKNOWN" | "Unknown" => Self::Unknown,
            _ if raw.trim().is_empty() => Self::Unknown,
            _ => Self::Other(raw),
        }
    }
}

impl From<&str> for Role {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_owned())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads an explicit `null` the same way as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A mesh participant as reported by `/api/locations`.
///
/// Coordinates are optional at the record level so a single bad row does not
/// poison the whole payload; [`Node::position`] is the only accessor the
/// renderers use and it rejects non-finite values.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Node {
    pub node_id: NodeId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub precision_meters: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub hw_model: Option<String>,
    #[serde(default)]
    pub primary_channel: Option<String>,
}

impl Node {
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }

    /// Seconds since epoch of the last position update, if one was reported.
    pub fn reported_at(&self) -> Option<f64> {
        self.timestamp.filter(|ts| ts.is_finite() && *ts > 0.0)
    }

    pub fn has_unknown_role(&self) -> bool {
        matches!(self.role, None | Some(Role::Unknown))
    }

    pub fn title(&self) -> String {
        if self.display_name.trim().is_empty() {
            crate::util::node_hex(self.node_id)
        } else {
            self.display_name.clone()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LinkType {
    #[default]
    Traceroute,
    Packet,
}

impl LinkType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Traceroute => "traceroute",
            Self::Packet => "packet",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Traceroute => "Traceroute RF Hop",
            Self::Packet => "Direct Packet Link",
        }
    }
}

/// An observed relation between two nodes. `link_type` is not part of the
/// wire record; the store tags it according to which list the link came from.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Link {
    pub from_node_id: NodeId,
    pub to_node_id: NodeId,
    #[serde(skip)]
    pub link_type: LinkType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub success_rate: f64,
    #[serde(default)]
    pub total_hops_seen: Option<u64>,
    #[serde(default)]
    pub avg_snr: Option<f64>,
    #[serde(default)]
    pub avg_rssi: Option<f64>,
    #[serde(default)]
    pub last_seen_str: Option<String>,
}

impl Link {
    pub fn touches(&self, node_id: NodeId) -> bool {
        self.from_node_id == node_id || self.to_node_id == node_id
    }

    pub fn last_seen(&self) -> Option<f64> {
        self.last_seen_str
            .as_deref()
            .and_then(crate::util::parse_timestamp)
    }
}
